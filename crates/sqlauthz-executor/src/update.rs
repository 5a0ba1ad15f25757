//! UPDATE executor

use sqlauthz_ast::UpdateStmt;
use sqlauthz_catalog::CatalogError;
use sqlauthz_storage::{DatabaseState, Row};
use tracing::debug;

use crate::{
    compile::{compile_update, BoundFilter},
    constraint_validator::{check_columns, validate_referenced, validate_table},
    errors::ExecutorError,
    exec_context::ExecContext,
    resolve::RelationTarget,
    trigger_execution::{TriggerAction, TriggerExecutor},
};

/// Executor for UPDATE statements
pub struct UpdateExecutor;

impl UpdateExecutor {
    /// Update matching rows, returning how many were updated.
    pub fn execute(
        state: &mut DatabaseState,
        ctx: &mut ExecContext<'_>,
        stmt: &UpdateStmt,
    ) -> Result<usize, ExecutorError> {
        let compiled = compile_update(&state.catalog, &ctx.temp, stmt, &ctx.default_schema)?;
        for requirement in &compiled.requirements {
            ctx.require(&state.catalog, requirement)?;
        }
        let assignments: Vec<_> = compiled
            .columns
            .iter()
            .zip(stmt.assignments.iter().map(|(_, v)| v))
            .map(|(p, v)| (*p, v.clone()))
            .collect();

        match &compiled.target.target {
            RelationTarget::Temporary(name) => {
                let table = ctx
                    .temp
                    .get_mut(name)
                    .ok_or_else(|| CatalogError::TableNotFound(compiled.target.qualified_name()))?;
                let mut rows = table.rows.clone();
                let changed = apply(&mut rows, compiled.filter.as_ref(), &assignments);
                for index in &changed {
                    check_columns(&compiled.target.qualified_name(), &table.columns, &[], &rows[*index])?;
                }
                table.rows = rows;
                Ok(changed.len())
            }
            RelationTarget::Table(id) => {
                let table = state
                    .catalog
                    .table(*id)
                    .ok_or_else(|| CatalogError::TableNotFound(compiled.target.qualified_name()))?;
                let mut rows = state.rows(*id).to_vec();
                let changed = apply(&mut rows, compiled.filter.as_ref(), &assignments);
                validate_table(state, table, &rows, &changed)?;
                validate_referenced(state, *id, &rows)?;

                *state.rows_mut(*id)? = rows;
                debug!(table = %compiled.target.qualified_name(), rows = changed.len(), "updated rows");
                TriggerExecutor::fire(state, ctx, *id, TriggerAction::Update(compiled.columns.clone()))?;
                Ok(changed.len())
            }
            RelationTarget::SystemTable(_) | RelationTarget::View(_) => Ok(0),
        }
    }
}

/// Apply assignments to every row the filter accepts; returns their indexes.
fn apply(rows: &mut [Row], filter: Option<&BoundFilter>, assignments: &[(usize, sqlauthz_ast::SqlValue)]) -> Vec<usize> {
    let mut changed = Vec::new();
    for (index, row) in rows.iter_mut().enumerate() {
        let selected = filter.map_or(true, |f| row.get(f.column).is_some_and(|v| f.matches(v)));
        if selected {
            for (position, value) in assignments {
                row.set(*position, value.clone());
            }
            changed.push(index);
        }
    }
    changed
}
