//! Routine execution and the statements allowed in routine and trigger
//! bodies.
//!
//! Routines run with invoker rights: the body is checked against the session
//! user even when called from a view or trigger. A function may only read.

use sqlauthz_ast::ProceduralStatement;
use sqlauthz_catalog::ObjectId;
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    delete::DeleteExecutor, errors::ExecutorError, exec_context::ExecContext, insert::InsertExecutor,
    resolve::resolve_routine, select::SelectExecutor, update::UpdateExecutor,
};

/// Executor for CALL and routine bodies
pub struct RoutineExecutor;

impl RoutineExecutor {
    /// Run a function's body. Any statement that would modify data fails.
    pub fn invoke_function(
        state: &DatabaseState,
        ctx: &mut ExecContext<'_>,
        function: ObjectId,
    ) -> Result<(), ExecutorError> {
        let Some(routine) = state.catalog.routine(function) else { return Ok(()) };
        if routine.system {
            return Ok(());
        }
        debug!(function = %routine.qualified_name(), user = ctx.security.session_user(), "invoking function");
        let name = routine.qualified_name();
        Self::in_routine_schema(ctx, &routine.schema, |ctx| {
            ctx.as_invoker(function, |ctx| {
                for stmt in &routine.body {
                    match stmt {
                        ProceduralStatement::Select(query) => {
                            SelectExecutor::execute(state, ctx, query)?;
                        }
                        _ => return Err(ExecutorError::RoutineModifiesData(name.clone())),
                    }
                }
                Ok(())
            })
        })
    }

    /// CALL: check EXECUTE for the current principal, then run the body.
    pub fn execute_call(
        state: &mut DatabaseState,
        ctx: &mut ExecContext<'_>,
        call: &sqlauthz_ast::CallStmt,
    ) -> Result<(), ExecutorError> {
        let routine = resolve_routine(
            &state.catalog,
            &call.procedure,
            sqlauthz_ast::RoutineKind::Procedure,
            &ctx.default_schema,
        )?;
        let requirement = crate::compile::Requirement::execute(routine.id, routine.kind);
        ctx.require(&state.catalog, &requirement)?;
        if routine.system {
            return Ok(());
        }

        let id = routine.id;
        let schema = routine.schema.clone();
        let body = routine.body.clone();
        debug!(procedure = %routine.qualified_name(), user = ctx.security.session_user(), "calling procedure");
        Self::in_routine_schema(ctx, &schema, |ctx| {
            ctx.as_invoker(id, |ctx| {
                for stmt in &body {
                    Self::run_statement(state, ctx, stmt)?;
                }
                Ok(())
            })
        })
    }

    /// Run one statement of a procedure body or trigger action.
    pub fn run_statement(
        state: &mut DatabaseState,
        ctx: &mut ExecContext<'_>,
        stmt: &ProceduralStatement,
    ) -> Result<(), ExecutorError> {
        match stmt {
            ProceduralStatement::Select(query) => SelectExecutor::execute(state, ctx, query).map(|_| ()),
            ProceduralStatement::Insert(insert) => InsertExecutor::execute(state, ctx, insert).map(|_| ()),
            ProceduralStatement::Update(update) => UpdateExecutor::execute(state, ctx, update).map(|_| ()),
            ProceduralStatement::Delete(delete) => DeleteExecutor::execute(state, ctx, delete).map(|_| ()),
            ProceduralStatement::Call(call) => Self::execute_call(state, ctx, call),
        }
    }

    /// Unqualified names in a routine body resolve in the routine's schema.
    fn in_routine_schema<'a, T>(
        ctx: &mut ExecContext<'a>,
        schema: &str,
        f: impl FnOnce(&mut ExecContext<'a>) -> Result<T, ExecutorError>,
    ) -> Result<T, ExecutorError> {
        let previous = std::mem::replace(&mut ctx.default_schema, schema.to_string());
        let output = f(ctx);
        ctx.default_schema = previous;
        output
    }
}
