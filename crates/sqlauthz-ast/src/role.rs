//! Role statements
//!
//! ```sql
//! CREATE ROLE reader;
//! GRANT reader TO user1, PUBLIC;
//! GRANT reader TO auditor;          -- auditor inherits reader
//! SET ROLE reader;
//! SET ROLE NONE;
//! REVOKE reader FROM user1;
//! DROP ROLE reader;
//! ```

use crate::Grantee;

/// CREATE ROLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoleStmt {
    pub role_name: String,
}

/// DROP ROLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropRoleStmt {
    pub role_name: String,
}

/// GRANT role statement. A grantee that names a role inherits the granted
/// roles.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantRoleStmt {
    pub roles: Vec<String>,
    pub grantees: Vec<Grantee>,
}

impl GrantRoleStmt {
    pub fn new(roles: &[&str], grantees: Vec<Grantee>) -> Self {
        GrantRoleStmt { roles: roles.iter().map(|r| r.to_string()).collect(), grantees }
    }
}

/// REVOKE role statement
#[derive(Debug, Clone, PartialEq)]
pub struct RevokeRoleStmt {
    pub roles: Vec<String>,
    pub grantees: Vec<Grantee>,
}

impl RevokeRoleStmt {
    pub fn new(roles: &[&str], grantees: Vec<Grantee>) -> Self {
        RevokeRoleStmt { roles: roles.iter().map(|r| r.to_string()).collect(), grantees }
    }
}

/// SET ROLE statement; `None` is `SET ROLE NONE`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetRoleStmt {
    pub role: Option<String>,
}

impl SetRoleStmt {
    pub fn role(name: impl Into<String>) -> Self {
        SetRoleStmt { role: Some(name.into()) }
    }

    pub fn none() -> Self {
        SetRoleStmt { role: None }
    }
}
