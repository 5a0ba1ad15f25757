//! SELECT executor
//!
//! Privileges are checked for the principal of the current frame. A view is
//! read under its definer, so the caller only needs SELECT on the view.

use sqlauthz_ast::{Query, SqlValue};
use sqlauthz_storage::DatabaseState;

use crate::{
    compile::{compile_query, CompiledQuery},
    context::FrameKind,
    errors::ExecutorError,
    exec_context::ExecContext,
    procedural::RoutineExecutor,
    resolve::{RelationTarget, ResolvedRelation},
    result::ResultSet,
    system_tables,
};

/// Executor for queries
pub struct SelectExecutor;

impl SelectExecutor {
    pub fn execute(
        state: &DatabaseState,
        ctx: &mut ExecContext<'_>,
        query: &Query,
    ) -> Result<ResultSet, ExecutorError> {
        let compiled = compile_query(&state.catalog, &ctx.temp, query, &ctx.default_schema)?;
        for requirement in &compiled.requirements {
            ctx.require(&state.catalog, requirement)?;
        }
        for function in &compiled.functions {
            RoutineExecutor::invoke_function(state, ctx, *function)?;
        }
        Self::materialize(state, ctx, &compiled)
    }

    fn materialize(
        state: &DatabaseState,
        ctx: &mut ExecContext<'_>,
        compiled: &CompiledQuery,
    ) -> Result<ResultSet, ExecutorError> {
        // Cross product of the projected relations.
        let mut rows: Vec<Vec<SqlValue>> = vec![Vec::new()];
        for (index, (relation, positions)) in compiled.relations.iter().enumerate() {
            let filter = compiled.filter.as_ref().filter(|f| f.relation == index);
            let projected: Vec<Vec<SqlValue>> = Self::relation_rows(state, ctx, relation)?
                .into_iter()
                .filter(|row| filter.map_or(true, |f| row.get(f.column).is_some_and(|v| f.matches(v))))
                .map(|row| positions.iter().map(|p| row.get(*p).cloned().unwrap_or(SqlValue::Null)).collect())
                .collect();

            rows = rows
                .iter()
                .flat_map(|left| {
                    projected.iter().map(move |right| {
                        let mut combined = left.clone();
                        combined.extend(right.iter().cloned());
                        combined
                    })
                })
                .collect();
        }
        Ok(ResultSet::new(compiled.columns.clone(), rows))
    }

    fn relation_rows(
        state: &DatabaseState,
        ctx: &mut ExecContext<'_>,
        relation: &ResolvedRelation,
    ) -> Result<Vec<Vec<SqlValue>>, ExecutorError> {
        match &relation.target {
            RelationTarget::Table(id) => Ok(state.rows(*id).iter().map(|r| r.values.clone()).collect()),
            RelationTarget::SystemTable(_) => Ok(system_tables::rows(&state.catalog, &relation.name)),
            RelationTarget::Temporary(name) => Ok(ctx
                .temp
                .get(name)
                .map(|t| t.rows.iter().map(|r| r.values.clone()).collect())
                .unwrap_or_default()),
            RelationTarget::View(id) => {
                let view = state
                    .catalog
                    .view(*id)
                    .ok_or_else(|| sqlauthz_catalog::CatalogError::TableNotFound(relation.qualified_name()))?;
                let definer = state.catalog.owner_of(*id).unwrap_or(state.catalog.dba()).to_string();
                let role = state.catalog.compiled_role(*id);
                let result = ctx.as_definer(FrameKind::View(*id), &definer, role, |ctx| {
                    Self::execute(state, ctx, &view.query)
                })?;
                Ok(result.rows)
            }
        }
    }
}
