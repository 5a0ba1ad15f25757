//! View DDL executor
//!
//! A view is compiled under its definer. Every record that satisfied one of
//! the definer's SELECT or EXECUTE checks becomes a dependency edge, so
//! revoking that record drops the view.

use sqlauthz_ast::CreateViewStmt;
use sqlauthz_catalog::{normalize_identifier, Dependent, DependentKind, ObjectId};
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    compile::compile_query,
    errors::ExecutorError,
    exec_context::ExecContext,
    resolve::qualify,
    schema_ddl::prepare_schema,
};

/// Executor for view DDL statements
pub struct ViewExecutor;

impl ViewExecutor {
    pub fn execute_create_view(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &CreateViewStmt,
    ) -> Result<ObjectId, ExecutorError> {
        let (schema, name) = qualify(&stmt.name, &ctx.default_schema);
        prepare_schema(state, ctx, &schema)?;

        let compiled = compile_query(&state.catalog, &ctx.temp, &stmt.query, &ctx.default_schema)?;
        if compiled.references_session() {
            return Err(ExecutorError::SessionSchemaReference(format!("{}.{}", schema, name)));
        }
        let columns = match &stmt.columns {
            Some(names) if names.len() != compiled.columns.len() => {
                return Err(ExecutorError::ColumnCountMismatch {
                    expected: compiled.columns.len(),
                    provided: names.len(),
                });
            }
            Some(names) => names.iter().map(|n| normalize_identifier(n)).collect(),
            None => compiled.columns.clone(),
        };

        let definer = state.catalog.schema_owner(&schema)?.to_string();
        let providers = ctx.authorize_for(&state.catalog, &definer, &compiled.requirements)?;
        let query = compiled.qualified(&state.catalog);
        let id = state.catalog.create_view(&schema, &name, columns, query)?;

        let dependent = Dependent::new(id, DependentKind::View);
        for provider in providers {
            state.catalog.dependencies_mut().register(dependent, provider);
        }
        debug!(view = %id, name = %format!("{}.{}", schema, name), definer = %definer, "created view");
        Ok(id)
    }
}
