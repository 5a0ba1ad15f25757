//! INSERT executor

use sqlauthz_ast::{InsertStmt, SqlValue};
use sqlauthz_catalog::CatalogError;
use sqlauthz_storage::{DatabaseState, Row};
use tracing::debug;

use crate::{
    compile::compile_insert,
    constraint_validator::{check_columns, validate_table},
    errors::ExecutorError,
    exec_context::ExecContext,
    resolve::RelationTarget,
    trigger_execution::{TriggerAction, TriggerExecutor},
};

/// Executor for INSERT statements
pub struct InsertExecutor;

impl InsertExecutor {
    /// Insert rows, returning how many were inserted.
    pub fn execute(
        state: &mut DatabaseState,
        ctx: &mut ExecContext<'_>,
        stmt: &InsertStmt,
    ) -> Result<usize, ExecutorError> {
        let compiled = compile_insert(&state.catalog, &ctx.temp, stmt, &ctx.default_schema)?;
        for requirement in &compiled.requirements {
            ctx.require(&state.catalog, requirement)?;
        }

        let width = compiled.target.columns.len();
        let mut new_rows = Vec::with_capacity(stmt.rows.len());
        for values in &stmt.rows {
            if values.len() != compiled.columns.len() {
                return Err(ExecutorError::ColumnCountMismatch {
                    expected: compiled.columns.len(),
                    provided: values.len(),
                });
            }
            let mut row = Row::new(vec![SqlValue::Null; width]);
            for (position, value) in compiled.columns.iter().zip(values) {
                row.set(*position, value.clone());
            }
            new_rows.push(row);
        }
        let count = new_rows.len();

        match &compiled.target.target {
            RelationTarget::Temporary(name) => {
                let table = ctx
                    .temp
                    .get_mut(name)
                    .ok_or_else(|| CatalogError::TableNotFound(compiled.target.qualified_name()))?;
                for row in &new_rows {
                    check_columns(&compiled.target.qualified_name(), &table.columns, &[], row)?;
                }
                table.rows.extend(new_rows);
            }
            RelationTarget::Table(id) => {
                let table = state
                    .catalog
                    .table(*id)
                    .ok_or_else(|| CatalogError::TableNotFound(compiled.target.qualified_name()))?;
                let mut rows = state.rows(*id).to_vec();
                let first_new = rows.len();
                rows.extend(new_rows);
                let changed: Vec<usize> = (first_new..rows.len()).collect();
                validate_table(state, table, &rows, &changed)?;

                *state.rows_mut(*id)? = rows;
                debug!(table = %compiled.target.qualified_name(), rows = count, "inserted rows");
                TriggerExecutor::fire(state, ctx, *id, TriggerAction::Insert)?;
            }
            RelationTarget::SystemTable(_) | RelationTarget::View(_) => {}
        }
        Ok(count)
    }
}
