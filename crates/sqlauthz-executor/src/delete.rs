//! DELETE executor

use sqlauthz_ast::DeleteStmt;
use sqlauthz_catalog::CatalogError;
use sqlauthz_storage::{DatabaseState, Row};
use tracing::debug;

use crate::{
    compile::{compile_delete, BoundFilter},
    constraint_validator::validate_referenced,
    errors::ExecutorError,
    exec_context::ExecContext,
    resolve::RelationTarget,
    trigger_execution::{TriggerAction, TriggerExecutor},
};

/// Executor for DELETE statements
pub struct DeleteExecutor;

impl DeleteExecutor {
    /// Delete matching rows, returning how many were deleted.
    pub fn execute(
        state: &mut DatabaseState,
        ctx: &mut ExecContext<'_>,
        stmt: &DeleteStmt,
    ) -> Result<usize, ExecutorError> {
        let compiled = compile_delete(&state.catalog, &ctx.temp, stmt, &ctx.default_schema)?;
        for requirement in &compiled.requirements {
            ctx.require(&state.catalog, requirement)?;
        }

        match &compiled.target.target {
            RelationTarget::Temporary(name) => {
                let table = ctx
                    .temp
                    .get_mut(name)
                    .ok_or_else(|| CatalogError::TableNotFound(compiled.target.qualified_name()))?;
                let (kept, deleted) = retain(&table.rows, compiled.filter.as_ref());
                table.rows = kept;
                Ok(deleted)
            }
            RelationTarget::Table(id) => {
                let (kept, deleted) = retain(state.rows(*id), compiled.filter.as_ref());
                validate_referenced(state, *id, &kept)?;

                *state.rows_mut(*id)? = kept;
                debug!(table = %compiled.target.qualified_name(), rows = deleted, "deleted rows");
                TriggerExecutor::fire(state, ctx, *id, TriggerAction::Delete)?;
                Ok(deleted)
            }
            RelationTarget::SystemTable(_) | RelationTarget::View(_) => Ok(0),
        }
    }
}

/// Rows the filter rejects, plus the number removed. No filter removes all.
fn retain(rows: &[Row], filter: Option<&BoundFilter>) -> (Vec<Row>, usize) {
    let kept: Vec<Row> = rows
        .iter()
        .filter(|row| filter.is_some_and(|f| !row.get(f.column).is_some_and(|v| f.matches(v))))
        .cloned()
        .collect();
    let deleted = rows.len() - kept.len();
    (kept, deleted)
}
