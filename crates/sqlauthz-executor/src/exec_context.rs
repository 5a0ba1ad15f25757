//! Per-statement execution state.

use std::collections::BTreeSet;

use sqlauthz_catalog::{Catalog, ObjectId, Principal, Provider};

use crate::{
    compile::Requirement,
    config::EngineConfig,
    context::{FrameKind, SecurityContext},
    errors::{AuthError, ExecutorError},
    privilege_resolver::{Authorization, PrivilegeResolver},
    result::Warning,
    temporary::TemporaryTables,
};

/// What one statement needs while it runs: who is acting, where unqualified
/// names resolve, and the warnings collected so far.
pub struct ExecContext<'a> {
    pub config: &'a EngineConfig,
    pub security: SecurityContext,
    pub default_schema: String,
    /// Statement-local copy of the session's temporary tables
    pub temp: TemporaryTables,
    pub warnings: Vec<Warning>,
}

impl<'a> ExecContext<'a> {
    pub fn new(
        config: &'a EngineConfig,
        session_user: &str,
        default_schema: &str,
        temp: TemporaryTables,
    ) -> Self {
        ExecContext {
            config,
            security: SecurityContext::new(session_user),
            default_schema: default_schema.to_string(),
            temp,
            warnings: Vec::new(),
        }
    }

    /// Run the statement under the session's current role.
    pub fn with_role(mut self, role: Option<&str>) -> Self {
        self.security = self.security.with_role(role);
        self
    }

    pub fn principal(&self) -> String {
        self.security.current_principal().to_string()
    }

    /// Resolver for the current frame: its principal may use its role.
    pub fn resolver<'c>(&'c self, catalog: &'c Catalog) -> PrivilegeResolver<'c> {
        PrivilegeResolver::new(catalog, &self.config.security)
            .with_role(self.security.current_principal(), self.security.current_role())
    }

    /// Check one requirement for the current principal.
    pub fn require(&self, catalog: &Catalog, requirement: &Requirement) -> Result<Authorization, AuthError> {
        self.resolver(catalog).require(
            self.security.current_principal(),
            requirement.kind,
            requirement.target,
            requirement.columns.as_ref(),
        )
    }

    /// Check every requirement for `principal` (the definer of the object
    /// being compiled) and collect the providers the object binds to: each
    /// target object, each permission record used, and the current role if
    /// any record used was granted to a role.
    pub fn authorize_for(
        &self,
        catalog: &Catalog,
        principal: &str,
        requirements: &[Requirement],
    ) -> Result<BTreeSet<Provider>, AuthError> {
        let resolver = self.resolver(catalog);
        let mut providers = BTreeSet::new();
        let mut via_role = false;
        for requirement in requirements {
            let authorization = resolver.require(
                principal,
                requirement.kind,
                requirement.target,
                requirement.columns.as_ref(),
            )?;
            providers.insert(Provider::Object(requirement.target.object_id()));
            for record in authorization.records() {
                providers.insert(Provider::Permission(*record));
                via_role |= catalog
                    .permissions()
                    .get(*record)
                    .is_some_and(|r| matches!(r.grantee, Principal::Role(_)));
            }
        }
        if via_role {
            if let Some(role) = resolver.active_role(principal).and_then(|r| catalog.role(r)) {
                providers.insert(Provider::Role(role.id));
            }
        }
        Ok(providers)
    }

    /// Run `f` under the definer of a view or trigger, with the role the
    /// object was compiled under.
    pub fn as_definer<T>(
        &mut self,
        kind: FrameKind,
        definer: &str,
        role: Option<&str>,
        f: impl FnOnce(&mut Self) -> Result<T, ExecutorError>,
    ) -> Result<T, ExecutorError> {
        self.check_nesting()?;
        self.security.push_definer(kind, definer, role);
        let output = f(self);
        self.security.pop();
        output
    }

    /// Run `f` as the session user inside a routine body.
    pub fn as_invoker<T>(
        &mut self,
        routine: ObjectId,
        f: impl FnOnce(&mut Self) -> Result<T, ExecutorError>,
    ) -> Result<T, ExecutorError> {
        self.check_nesting()?;
        self.security.push_invoker(routine);
        let output = f(self);
        self.security.pop();
        output
    }

    fn check_nesting(&self) -> Result<(), ExecutorError> {
        let depth = self.config.execution.max_nesting_depth;
        if self.security.frames().len() > depth {
            return Err(ExecutorError::NestingTooDeep { depth });
        }
        Ok(())
    }
}
