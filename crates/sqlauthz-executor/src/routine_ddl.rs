//! Routine and synonym DDL executors
//!
//! Routine bodies are stored unchecked: they run with the invoker's
//! privileges, so nothing is authorized (and nothing depends) at creation.

use sqlauthz_ast::{CreateRoutineStmt, CreateSynonymStmt, ObjectName};
use sqlauthz_catalog::ObjectId;
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    errors::ExecutorError, exec_context::ExecContext, resolve::qualify, schema_ddl::prepare_schema,
};

/// Executor for CREATE FUNCTION and CREATE PROCEDURE
pub struct RoutineDdlExecutor;

impl RoutineDdlExecutor {
    pub fn execute_create_routine(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &CreateRoutineStmt,
    ) -> Result<ObjectId, ExecutorError> {
        let (schema, name) = qualify(&stmt.name, &ctx.default_schema);
        prepare_schema(state, ctx, &schema)?;
        let id = state.catalog.create_routine(&schema, &name, stmt.kind, stmt.body.clone())?;
        debug!(routine = %id, name = %format!("{}.{}", schema, name), kind = stmt.kind.name(), "created routine");
        Ok(id)
    }
}

/// Executor for CREATE SYNONYM
pub struct SynonymExecutor;

impl SynonymExecutor {
    /// The target is stored qualified against the creator's default schema
    /// and is not required to exist.
    pub fn execute_create_synonym(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &CreateSynonymStmt,
    ) -> Result<ObjectId, ExecutorError> {
        let (schema, name) = qualify(&stmt.name, &ctx.default_schema);
        prepare_schema(state, ctx, &schema)?;
        let (target_schema, target_name) = qualify(&stmt.target, &ctx.default_schema);
        if target_schema == schema && target_name == name {
            return Err(ExecutorError::InvalidStatement(format!(
                "synonym '{}.{}' cannot refer to itself",
                schema, name
            )));
        }
        let target = ObjectName::qualified(target_schema, target_name);
        Ok(state.catalog.create_synonym(&schema, &name, target)?)
    }
}
