//! Schema DDL and the ownership checks every other DDL statement relies on.

use sqlauthz_ast::CreateSchemaStmt;
use sqlauthz_catalog::{normalize_identifier, SESSION_SCHEMA};
use sqlauthz_storage::DatabaseState;
use tracing::debug;

use crate::{
    errors::{AuthError, ExecutorError},
    exec_context::ExecContext,
};

/// Executor for CREATE SCHEMA and DROP SCHEMA
pub struct SchemaExecutor;

impl SchemaExecutor {
    /// Only the DBA may create a schema other than the caller's own, or one
    /// owned by someone else.
    pub fn execute_create_schema(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &CreateSchemaStmt,
    ) -> Result<(), ExecutorError> {
        let schema = normalize_identifier(&stmt.schema_name);
        let principal = ctx.principal();
        let owner = stmt.authorization.as_deref().map(normalize_identifier).unwrap_or_else(|| principal.clone());
        if schema == SESSION_SCHEMA {
            return Err(ExecutorError::InvalidStatement("schema SESSION is reserved".to_string()));
        }
        let own_schema = owner == principal && schema == principal;
        if ctx.config.security.sql_authorization && !own_schema && principal != state.catalog.dba() {
            return Err(AuthError::SchemaNotOwned { principal, schema }.into());
        }
        state.catalog.create_schema(&schema, &owner)?;
        debug!(schema = %schema, owner = %owner, "created schema");
        Ok(())
    }

    pub fn execute_drop_schema(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        schema: &str,
    ) -> Result<(), ExecutorError> {
        let schema = normalize_identifier(schema);
        require_schema_owner(state, ctx, &schema)?;
        state.catalog.drop_schema(&schema)?;
        Ok(())
    }
}

/// DDL in an existing schema requires its owner or the DBA.
pub(crate) fn require_schema_owner(
    state: &DatabaseState,
    ctx: &ExecContext<'_>,
    schema: &str,
) -> Result<(), ExecutorError> {
    let owner = state.catalog.schema_owner(schema)?;
    let principal = ctx.security.current_principal();
    if ctx.config.security.sql_authorization && principal != owner && principal != state.catalog.dba() {
        return Err(AuthError::SchemaNotOwned { principal: principal.to_string(), schema: schema.to_string() }.into());
    }
    Ok(())
}

/// Prepare `schema` for a CREATE: check ownership, or create the schema
/// implicitly when it is named after the caller (or the caller is the DBA).
/// The caller becomes the owner of an implicitly created schema.
pub(crate) fn prepare_schema(
    state: &mut DatabaseState,
    ctx: &ExecContext<'_>,
    schema: &str,
) -> Result<(), ExecutorError> {
    if state.catalog.schema(schema).is_some() {
        return require_schema_owner(state, ctx, schema);
    }
    let principal = ctx.principal();
    let allowed = !ctx.config.security.sql_authorization
        || principal == schema
        || principal == state.catalog.dba();
    if !allowed {
        return Err(AuthError::SchemaNotOwned { principal, schema: schema.to_string() }.into());
    }
    state.catalog.create_schema(schema, &principal)?;
    debug!(schema, owner = %principal, "created schema implicitly");
    Ok(())
}
