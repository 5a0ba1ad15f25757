//! Trigger DDL executor
//!
//! Creating a trigger needs TRIGGER on the subject table. Its actions are
//! compiled under the definer; the records used become dependency edges.

use sqlauthz_ast::{CreateTriggerStmt, TriggerEvent};
use sqlauthz_catalog::{CatalogError, Dependent, DependentKind, ObjectId, PrivilegeKind};
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    compile::{compile_statement, qualify_statement, Requirement},
    errors::ExecutorError,
    exec_context::ExecContext,
    resolve::{qualify, resolve_relation, RelationTarget},
    schema_ddl::prepare_schema,
};

/// Executor for CREATE TRIGGER
pub struct TriggerDdlExecutor;

impl TriggerDdlExecutor {
    pub fn execute_create_trigger(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &CreateTriggerStmt,
    ) -> Result<ObjectId, ExecutorError> {
        let (schema, name) = qualify(&stmt.name, &ctx.default_schema);
        let qualified = format!("{}.{}", schema, name);
        prepare_schema(state, ctx, &schema)?;

        let relation = resolve_relation(&state.catalog, &ctx.temp, &stmt.table, &ctx.default_schema)?;
        let table = match relation.target {
            RelationTarget::Table(id) => id,
            RelationTarget::Temporary(_) => return Err(ExecutorError::SessionSchemaReference(qualified)),
            RelationTarget::SystemTable(_) => {
                return Err(CatalogError::SystemSchema {
                    operation: "CREATE TRIGGER".to_string(),
                    schema: relation.schema,
                }
                .into());
            }
            RelationTarget::View(_) => {
                return Err(ExecutorError::InvalidStatement(format!(
                    "triggers are not allowed on view '{}'",
                    relation.qualified_name()
                )));
            }
        };
        if stmt.actions.is_empty() {
            return Err(ExecutorError::InvalidStatement("trigger has no actions".to_string()));
        }

        let update_columns = match &stmt.event {
            TriggerEvent::Update(Some(columns)) => relation.column_positions(columns)?,
            _ => Vec::new(),
        };

        let mut requirements = vec![Requirement::table(PrivilegeKind::Trigger, table)];
        let mut actions = Vec::with_capacity(stmt.actions.len());
        for action in &stmt.actions {
            let compiled = compile_statement(&state.catalog, &ctx.temp, action, &ctx.default_schema)?;
            if compiled.references_session() {
                return Err(ExecutorError::SessionSchemaReference(qualified));
            }
            requirements.extend(compiled.requirements());
            actions.push(qualify_statement(&state.catalog, action, &compiled));
        }

        let definer = state.catalog.schema_owner(&schema)?.to_string();
        let providers = ctx.authorize_for(&state.catalog, &definer, &requirements)?;
        let id = state.catalog.create_trigger(&schema, &name, table, stmt.event.clone(), update_columns, actions)?;

        let dependent = Dependent::new(id, DependentKind::Trigger);
        for provider in providers {
            state.catalog.dependencies_mut().register(dependent, provider);
        }
        debug!(trigger = %qualified, table = %relation.qualified_name(), definer = %definer, "created trigger");
        Ok(id)
    }
}
