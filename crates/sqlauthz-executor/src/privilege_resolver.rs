//! Privilege resolution
//!
//! Decides whether a principal may perform an action on a table, set of
//! columns or routine, and names the permission records that allowed it so
//! compiled objects can bind to exactly those records.
//!
//! Order, first match wins:
//!
//! 1. SQL authorization disabled
//! 2. owner of the object's schema
//! 3. the DBA
//! 4. built-in `SYSFUN` function, or SELECT on a system catalog table
//! 5. the principal's table-level record, then a column-level record covering
//!    the request
//! 6. the same against the current role and every role it inherits
//! 7. the same against `PUBLIC`
//! 8. column-level records of all of the above that together cover the
//!    request
//!
//! A table-level request (no column set) is only satisfied by table-level
//! records. The current role only counts while it is still granted to the
//! principal (or to `PUBLIC`); a role revoked or dropped under a session is
//! silently ignored from then on.

use sqlauthz_catalog::{
    Catalog, ColumnBitset, ObjectRef, PermissionRecord, PermissionRecordId, Principal,
    PrivilegeKind, SYSTEM_FUNCTION_SCHEMA,
};

use crate::{config::SecurityConfig, errors::AuthError};

/// Why access was allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Unchecked,
    Owner,
    Dba,
    BuiltIn,
    SystemCatalog,
    /// Allowed by these permission records, in resolution order
    Granted(Vec<PermissionRecordId>),
}

impl Authorization {
    /// Records a compiled object must bind to.
    pub fn records(&self) -> &[PermissionRecordId] {
        match self {
            Authorization::Granted(records) => records,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DenialReason {
    NoPrivilege,
    /// Some, but not all, requested columns are covered
    PartialColumns { missing: ColumnBitset },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    Allowed(Authorization),
    Denied(DenialReason),
}

/// The role a principal is acting under.
struct ActiveRole<'a> {
    principal: &'a str,
    role: &'a str,
}

/// Privilege checks against one catalog version.
pub struct PrivilegeResolver<'a> {
    catalog: &'a Catalog,
    security: &'a SecurityConfig,
    role: Option<ActiveRole<'a>>,
}

impl<'a> PrivilegeResolver<'a> {
    pub fn new(catalog: &'a Catalog, security: &'a SecurityConfig) -> Self {
        PrivilegeResolver { catalog, security, role: None }
    }

    /// Let `principal` also use the privileges of `role` and the roles it
    /// inherits.
    pub fn with_role(mut self, principal: &'a str, role: Option<&'a str>) -> Self {
        self.role = role.map(|role| ActiveRole { principal, role });
        self
    }

    /// The role `principal` may use right now, if any.
    pub fn active_role(&self, principal: &str) -> Option<&'a str> {
        let active = self.role.as_ref()?;
        (active.principal == principal && self.catalog.role_settable(active.role, principal))
            .then_some(active.role)
    }

    /// Grantees whose records apply to `principal`, in preference order.
    fn grantees(&self, principal: &str) -> Vec<Principal> {
        let mut grantees = vec![Principal::user(principal)];
        if let Some(role) = self.active_role(principal) {
            let mut inherited = self.catalog.role_closure(role);
            inherited.remove(role);
            grantees.push(Principal::Role(role.to_string()));
            grantees.extend(inherited.into_iter().map(Principal::Role));
        }
        grantees.push(Principal::Public);
        grantees
    }

    pub fn check(
        &self,
        principal: &str,
        kind: PrivilegeKind,
        target: ObjectRef,
        columns: Option<&ColumnBitset>,
    ) -> Access {
        if !self.security.sql_authorization {
            return Access::Allowed(Authorization::Unchecked);
        }
        if let Some(authorization) = self.bypass(principal, target) {
            return Access::Allowed(authorization);
        }
        if let Some(authorization) = self.implicitly_allowed(kind, target) {
            return Access::Allowed(authorization);
        }
        match self.find_records(principal, kind, target, columns, false) {
            Ok(records) => Access::Allowed(Authorization::Granted(records)),
            Err(reason) => Access::Denied(reason),
        }
    }

    /// Like [`check`](Self::check), failing with `NoPrivilege`.
    pub fn require(
        &self,
        principal: &str,
        kind: PrivilegeKind,
        target: ObjectRef,
        columns: Option<&ColumnBitset>,
    ) -> Result<Authorization, AuthError> {
        match self.check(principal, kind, target, columns) {
            Access::Allowed(authorization) => Ok(authorization),
            Access::Denied(reason) => {
                let missing = match (&reason, columns) {
                    (DenialReason::PartialColumns { missing }, _) => Some(self.column_names(target, missing)),
                    (DenialReason::NoPrivilege, Some(requested)) => {
                        Some(self.column_names(target, requested))
                    }
                    (DenialReason::NoPrivilege, None) => None,
                };
                Err(AuthError::NoPrivilege {
                    principal: principal.to_string(),
                    privilege: kind,
                    object: self.object_name(target),
                    missing_columns: missing,
                })
            }
        }
    }

    /// Whether `principal` may grant `kind` on `target` (for `columns`) to
    /// others: owner, DBA or a WITH GRANT OPTION record.
    pub fn check_grantable(
        &self,
        principal: &str,
        kind: PrivilegeKind,
        target: ObjectRef,
        columns: Option<&ColumnBitset>,
    ) -> bool {
        !self.security.sql_authorization
            || self.bypass(principal, target).is_some()
            || self.find_records(principal, kind, target, columns, true).is_ok()
    }

    fn bypass(&self, principal: &str, target: ObjectRef) -> Option<Authorization> {
        if self.catalog.owner_of(target.object_id()) == Some(principal) {
            Some(Authorization::Owner)
        } else if principal == self.catalog.dba() {
            Some(Authorization::Dba)
        } else {
            None
        }
    }

    fn implicitly_allowed(&self, kind: PrivilegeKind, target: ObjectRef) -> Option<Authorization> {
        match target {
            ObjectRef::Routine { id, .. } => {
                let routine = self.catalog.routine(id)?;
                (routine.system
                    && routine.schema == SYSTEM_FUNCTION_SCHEMA
                    && self.security.is_builtin_function(&routine.name))
                .then_some(Authorization::BuiltIn)
            }
            ObjectRef::Table(id) => {
                let table = self.catalog.table(id)?;
                (kind == PrivilegeKind::Select && table.is_system())
                    .then_some(Authorization::SystemCatalog)
            }
        }
    }

    fn find_records(
        &self,
        principal: &str,
        kind: PrivilegeKind,
        target: ObjectRef,
        columns: Option<&ColumnBitset>,
        grant_option: bool,
    ) -> Result<Vec<PermissionRecordId>, DenialReason> {
        let grantees = self.grantees(principal);

        for grantee in &grantees {
            let records = self.candidates(grantee, kind, target, grant_option);
            if let Some(record) = records.iter().find(|r| r.is_table_level()) {
                return Ok(vec![record.id]);
            }
            if let Some(requested) = columns {
                if let Some(record) = records.iter().find(|r| r.covers(Some(requested))) {
                    return Ok(vec![record.id]);
                }
            }
        }

        let Some(requested) = columns else {
            return Err(DenialReason::NoPrivilege);
        };
        // Union of column-level records, in grantee order.
        let mut covered = ColumnBitset::new();
        let mut used = Vec::new();
        for record in grantees.iter().flat_map(|g| self.candidates(g, kind, target, grant_option)) {
            let Some(granted) = &record.columns else { continue };
            let useful = granted.difference(&covered);
            if useful.intersects(requested) {
                covered = covered.union(granted);
                used.push(record.id);
            }
            if covered.covers(requested) {
                return Ok(used);
            }
        }
        if covered.intersects(requested) {
            Err(DenialReason::PartialColumns { missing: requested.difference(&covered) })
        } else {
            Err(DenialReason::NoPrivilege)
        }
    }

    fn candidates(
        &self,
        grantee: &Principal,
        kind: PrivilegeKind,
        target: ObjectRef,
        grant_option: bool,
    ) -> Vec<&'a PermissionRecord> {
        let catalog: &'a Catalog = self.catalog;
        catalog
            .permissions()
            .lookup(grantee, target, kind)
            .into_iter()
            .filter(|r| !grant_option || r.with_grant_option)
            .collect()
    }

    fn object_name(&self, target: ObjectRef) -> String {
        self.catalog
            .object(target.object_id())
            .map(|o| o.qualified_name())
            .unwrap_or_else(|| target.object_id().to_string())
    }

    fn column_names(&self, target: ObjectRef, columns: &ColumnBitset) -> Vec<String> {
        match target {
            ObjectRef::Table(id) => {
                if let Some(table) = self.catalog.table(id) {
                    return table.names_of(columns);
                }
                if let Some(view) = self.catalog.view(id) {
                    return columns.positions().filter_map(|p| view.columns.get(p).cloned()).collect();
                }
                Vec::new()
            }
            ObjectRef::Routine { .. } => Vec::new(),
        }
    }
}
