//! Role DDL executor
//!
//! Only the database owner may create, drop, grant or revoke roles. Revoking a
//! role or dropping it drops every view, trigger and constraint compiled under
//! it, or under a role that inherits it.

use sqlauthz_ast::{CreateRoleStmt, DropRoleStmt, GrantRoleStmt, Grantee, RevokeRoleStmt};
use sqlauthz_catalog::{normalize_identifier, Catalog, Principal};
use sqlauthz_storage::DatabaseState;
use tracing::info;

use crate::{
    errors::{AuthError, ExecutorError},
    exec_context::ExecContext,
    grant::principal_of,
    result::Warning,
};

/// Executor for role statements
pub struct RoleExecutor;

impl RoleExecutor {
    /// Execute CREATE ROLE
    pub fn execute_create_role(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &CreateRoleStmt,
    ) -> Result<(), ExecutorError> {
        Self::require_owner(&state.catalog, ctx, "CREATE ROLE")?;
        let name = normalize_identifier(&stmt.role_name);
        let id = state.catalog.create_role(&name, &ctx.principal())?;
        info!(role = %name, %id, "role created");
        Ok(())
    }

    /// Execute DROP ROLE
    pub fn execute_drop_role(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &DropRoleStmt,
    ) -> Result<Vec<Warning>, ExecutorError> {
        Self::require_owner(&state.catalog, ctx, "DROP ROLE")?;
        let name = normalize_identifier(&stmt.role_name);
        let dropped = state.catalog.drop_role(&name)?;
        Ok(dropped.iter().map(Warning::dropped).collect())
    }

    /// Execute GRANT role. Granting a role that is already granted is a no-op.
    pub fn execute_grant_role(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &GrantRoleStmt,
    ) -> Result<(), ExecutorError> {
        Self::require_owner(&state.catalog, ctx, "GRANT ROLE")?;
        let grantor = ctx.principal();
        let (roles, grantees) = Self::validate(&state.catalog, &stmt.roles, &stmt.grantees)?;
        for role in &roles {
            for grantee in &grantees {
                let added = state.catalog.grant_role(role, grantee, &grantor)?;
                info!(role = %role, grantee = %grantee, grantor = %grantor, added, "grant role");
            }
        }
        Ok(())
    }

    /// Execute REVOKE role. A grant that does not exist is reported as a
    /// warning.
    pub fn execute_revoke_role(
        state: &mut DatabaseState,
        ctx: &ExecContext<'_>,
        stmt: &RevokeRoleStmt,
    ) -> Result<Vec<Warning>, ExecutorError> {
        Self::require_owner(&state.catalog, ctx, "REVOKE ROLE")?;
        let (roles, grantees) = Self::validate(&state.catalog, &stmt.roles, &stmt.grantees)?;
        let mut warnings = Vec::new();
        for role in &roles {
            for grantee in &grantees {
                match state.catalog.revoke_role(role, grantee)? {
                    Some(dropped) => {
                        info!(role = %role, grantee = %grantee, dropped = dropped.len(), "revoke role");
                        warnings.extend(dropped.iter().map(Warning::dropped));
                    }
                    None => warnings.push(Warning::role_not_revoked(role, &grantee.to_string())),
                }
            }
        }
        Ok(warnings)
    }

    fn require_owner(catalog: &Catalog, ctx: &ExecContext<'_>, operation: &'static str) -> Result<(), AuthError> {
        if ctx.config.security.sql_authorization && ctx.principal() != catalog.dba() {
            return Err(AuthError::RoleAdministration { operation });
        }
        Ok(())
    }

    /// Normalize the role names and resolve the grantees. A grantee naming a
    /// role becomes that role.
    fn validate(
        catalog: &Catalog,
        roles: &[String],
        grantees: &[Grantee],
    ) -> Result<(Vec<String>, Vec<Principal>), ExecutorError> {
        if roles.is_empty() || grantees.is_empty() {
            return Err(ExecutorError::InvalidStatement("no roles or grantees named".to_string()));
        }
        let mut names = Vec::with_capacity(roles.len());
        for role in roles {
            let name = normalize_identifier(role);
            if name == "PUBLIC" {
                return Err(AuthError::PublicRole.into());
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let mut principals = Vec::with_capacity(grantees.len());
        for grantee in grantees {
            let principal = principal_of(catalog, grantee);
            if !principals.contains(&principal) {
                principals.push(principal);
            }
        }
        Ok((names, principals))
    }
}
