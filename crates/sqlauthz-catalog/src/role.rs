//! Roles and role grants.

use crate::{Principal, RoleId};

/// A named collection of privileges.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleDefinition {
    pub id: RoleId,
    pub name: String,
    pub creator: String,
}

/// `role` granted to `grantee`. A user or `PUBLIC` grantee may set the role;
/// a role grantee inherits every privilege of `role`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoleGrant {
    pub role: String,
    pub grantee: Principal,
    pub grantor: String,
}
