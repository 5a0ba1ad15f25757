//! DROP executor
//!
//! Every DROP is RESTRICT: the catalog refuses while another object depends
//! on the target. Only the schema owner (or the DBA) may drop.

use sqlauthz_ast::{DropObjectType, DropStmt, RoutineKind};
use sqlauthz_catalog::{CatalogError, ObjectId, RelationKind, SESSION_SCHEMA};
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    errors::ExecutorError,
    exec_context::ExecContext,
    resolve::qualify,
    schema_ddl::{require_schema_owner, SchemaExecutor},
};

/// Executor for DROP statements
pub struct DropExecutor;

impl DropExecutor {
    pub fn execute(
        state: &mut DatabaseState,
        ctx: &mut ExecContext<'_>,
        stmt: &DropStmt,
    ) -> Result<(), ExecutorError> {
        if stmt.object_type == DropObjectType::Schema {
            return SchemaExecutor::execute_drop_schema(state, ctx, &stmt.name.name);
        }

        let (schema, name) = qualify(&stmt.name, &ctx.default_schema);
        let qualified = format!("{}.{}", schema, name);
        if schema == SESSION_SCHEMA {
            return match stmt.object_type {
                DropObjectType::Table => Ok(ctx.temp.drop_table(&name)?),
                _ => Err(ExecutorError::InvalidStatement(format!(
                    "only temporary tables live in schema {}",
                    SESSION_SCHEMA
                ))),
            };
        }
        require_schema_owner(state, ctx, &schema)?;

        match stmt.object_type {
            DropObjectType::Table => {
                let id = Self::relation(state, &schema, &name, RelationKind::Table)?;
                state.catalog.drop_table(id)?;
                state.drop_table_storage(id);
            }
            DropObjectType::View => {
                let id = Self::relation(state, &schema, &name, RelationKind::View)?;
                state.catalog.drop_view(id)?;
            }
            DropObjectType::Synonym => {
                let id = Self::relation(state, &schema, &name, RelationKind::Synonym)?;
                state.catalog.drop_synonym(id)?;
            }
            DropObjectType::Trigger => {
                let id = state
                    .catalog
                    .lookup_trigger(&schema, &name)
                    .map(|t| t.id)
                    .ok_or_else(|| CatalogError::ObjectNotFound { kind: "TRIGGER", name: qualified.clone() })?;
                state.catalog.drop_trigger(id)?;
            }
            DropObjectType::Function | DropObjectType::Procedure => {
                let kind = if stmt.object_type == DropObjectType::Function {
                    RoutineKind::Function
                } else {
                    RoutineKind::Procedure
                };
                let id = state.catalog.find_routine(&schema, &name, kind)?.id;
                state.catalog.drop_routine(id)?;
            }
            DropObjectType::Schema => {
                return SchemaExecutor::execute_drop_schema(state, ctx, &stmt.name.name);
            }
        }
        debug!(object = %qualified, kind = ?stmt.object_type, "dropped object");
        Ok(())
    }

    fn relation(
        state: &DatabaseState,
        schema: &str,
        name: &str,
        expected: RelationKind,
    ) -> Result<ObjectId, ExecutorError> {
        let qualified = format!("{}.{}", schema, name);
        match state.catalog.lookup_relation(schema, name) {
            Some((id, kind)) if kind == expected => Ok(id),
            Some(_) => Err(ExecutorError::InvalidStatement(format!(
                "'{}' is not a {}",
                qualified,
                match expected {
                    RelationKind::Table => "table",
                    RelationKind::View => "view",
                    RelationKind::Synonym => "synonym",
                }
            ))),
            None => match expected {
                RelationKind::Synonym => Err(CatalogError::ObjectNotFound { kind: "SYNONYM", name: qualified }.into()),
                _ => Err(CatalogError::TableNotFound(qualified).into()),
            },
        }
    }
}
