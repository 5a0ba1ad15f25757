//! Role management operations for the catalog.
//!
//! Role grants form a directed acyclic graph: granting role `A` to role `B`
//! makes `B` inherit `A`. A grant that would close a cycle is rejected.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::{
    errors::CatalogError, DroppedObject, ObjectId, Principal, Provider, RoleDefinition, RoleGrant, RoleId,
};

/// Names that can never be roles.
const RESERVED_ROLE_NAMES: &[&str] = &["PUBLIC", "NONE"];

impl super::Catalog {
    pub fn create_role(&mut self, name: &str, creator: &str) -> Result<RoleId, CatalogError> {
        if RESERVED_ROLE_NAMES.contains(&name) {
            return Err(CatalogError::ReservedRoleName(name.to_string()));
        }
        if name.starts_with("SYS") {
            return Err(CatalogError::SystemRoleName(name.to_string()));
        }
        if self.roles.contains_key(name) || name == self.dba {
            return Err(CatalogError::RoleAlreadyExists(name.to_string()));
        }
        self.next_role += 1;
        let id = RoleId(self.next_role);
        self.roles.insert(
            name.to_string(),
            RoleDefinition { id, name: name.to_string(), creator: creator.to_string() },
        );
        debug!(role = name, %id, "created role");
        Ok(id)
    }

    pub fn role(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.get(name)
    }

    pub fn roles(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.values()
    }

    pub fn role_grants(&self) -> impl Iterator<Item = &RoleGrant> {
        self.role_grants.values()
    }

    fn existing_role(&self, name: &str) -> Result<&RoleDefinition, CatalogError> {
        self.roles.get(name).ok_or_else(|| CatalogError::RoleNotFound(name.to_string()))
    }

    /// Grant `role` to `grantee`. Returns false if the grant already existed.
    pub fn grant_role(&mut self, role: &str, grantee: &Principal, grantor: &str) -> Result<bool, CatalogError> {
        self.existing_role(role)?;
        if let Principal::Role(inheritor) = grantee {
            self.existing_role(inheritor)?;
            if self.role_closure(role).contains(inheritor) {
                return Err(CatalogError::CircularRoleGrant {
                    role: role.to_string(),
                    grantee: inheritor.clone(),
                });
            }
        }
        let key = (role.to_string(), grantee.clone());
        if self.role_grants.contains_key(&key) {
            return Ok(false);
        }
        self.role_grants.insert(
            key,
            RoleGrant { role: role.to_string(), grantee: grantee.clone(), grantor: grantor.to_string() },
        );
        debug!(role, grantee = %grantee, grantor, "granted role");
        Ok(true)
    }

    /// Revoke `role` from `grantee`. `None` if it was never granted.
    ///
    /// Everything compiled under `role` or under any role inheriting it is
    /// dropped, whether or not another path still reaches `role`.
    pub fn revoke_role(
        &mut self,
        role: &str,
        grantee: &Principal,
    ) -> Result<Option<Vec<DroppedObject>>, CatalogError> {
        self.existing_role(role)?;
        let affected = self.roles_inheriting(role);
        if self.role_grants.remove(&(role.to_string(), grantee.clone())).is_none() {
            return Ok(None);
        }
        info!(role, grantee = %grantee, "revoked role");
        Ok(Some(self.invalidate_roles(&affected)))
    }

    /// DROP ROLE. Dependents compiled under the role (or a role inheriting
    /// it) or bound to a record granted to the role are dropped; the role's
    /// records and every grant of or to the role go with it.
    pub fn drop_role(&mut self, name: &str) -> Result<Vec<DroppedObject>, CatalogError> {
        self.existing_role(name)?;
        let affected = self.roles_inheriting(name);
        let mut dropped = self.invalidate_roles(&affected);

        let grantee = Principal::Role(name.to_string());
        let records: Vec<_> = self.permissions.records().filter(|r| r.grantee == grantee).map(|r| r.id).collect();
        for record in records {
            dropped.extend(self.invalidate_record(record));
            self.permissions.remove(record);
            self.dependencies.forget_permission(record);
        }
        self.role_grants.retain(|(role, to), _| role != name && *to != grantee);
        self.roles.remove(name);
        info!(role = name, dropped = dropped.len(), "dropped role");
        Ok(dropped)
    }

    fn invalidate_roles(&mut self, roles: &BTreeSet<String>) -> Vec<DroppedObject> {
        let ids: Vec<RoleId> = roles.iter().filter_map(|r| self.roles.get(r)).map(|r| r.id).collect();
        ids.into_iter().flat_map(|id| self.invalidate_role(id)).collect()
    }

    /// `role` and every role it inherits, directly or transitively.
    pub fn role_closure(&self, role: &str) -> BTreeSet<String> {
        let mut closure = BTreeSet::new();
        let mut pending = vec![role.to_string()];
        while let Some(current) = pending.pop() {
            if !closure.insert(current.clone()) {
                continue;
            }
            let inherited = self
                .role_grants
                .values()
                .filter(|g| g.grantee == Principal::Role(current.clone()))
                .map(|g| g.role.clone());
            pending.extend(inherited);
        }
        closure
    }

    /// `role` and every role that inherits it.
    fn roles_inheriting(&self, role: &str) -> BTreeSet<String> {
        self.roles.keys().filter(|r| self.role_closure(r).contains(role)).cloned().collect()
    }

    /// Whether `user` may make `role` its current role: the DBA may set any
    /// role, anyone else needs a grant to themselves or to `PUBLIC`.
    pub fn role_settable(&self, role: &str, user: &str) -> bool {
        if !self.roles.contains_key(role) {
            return false;
        }
        user == self.dba
            || self.role_grants.contains_key(&(role.to_string(), Principal::user(user)))
            || self.role_grants.contains_key(&(role.to_string(), Principal::Public))
    }

    /// The role `dependent` was compiled under, if it used one.
    pub fn compiled_role(&self, dependent: ObjectId) -> Option<&str> {
        self.dependencies.providers_of(dependent).into_iter().find_map(|provider| match provider {
            Provider::Role(id) => self.roles.values().find(|r| r.id == id).map(|r| r.name.as_str()),
            _ => None,
        })
    }
}
