//! GRANT statement AST structures
//!
//! This module defines AST structures for GRANT statements that assign privileges
//! to users or PUBLIC on tables, views and routines.

use std::fmt;

use crate::ObjectName;

/// Privilege types that can be granted on database objects.
#[derive(Debug, Clone, PartialEq)]
pub enum PrivilegeType {
    /// SELECT privilege, optionally restricted to a column list
    Select(Option<Vec<String>>),
    /// INSERT privilege (table-level only)
    Insert,
    /// UPDATE privilege, optionally restricted to a column list
    Update(Option<Vec<String>>),
    /// DELETE privilege (table-level only)
    Delete,
    /// REFERENCES privilege (foreign key access), optionally restricted to a column list
    References(Option<Vec<String>>),
    /// TRIGGER privilege (create triggers on the table)
    Trigger,
    /// EXECUTE privilege (function/procedure execution)
    Execute,
    /// ALL PRIVILEGES (all applicable privileges for the object type)
    AllPrivileges,
}

impl PrivilegeType {
    /// The column list attached to this privilege, if any.
    pub fn columns(&self) -> Option<&[String]> {
        match self {
            PrivilegeType::Select(cols)
            | PrivilegeType::Update(cols)
            | PrivilegeType::References(cols) => cols.as_deref(),
            _ => None,
        }
    }

    /// Whether this privilege applies to tables (and views).
    pub fn is_table_privilege(&self) -> bool {
        !matches!(self, PrivilegeType::Execute)
    }
}

impl fmt::Display for PrivilegeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, cols) = match self {
            PrivilegeType::Select(cols) => ("SELECT", cols),
            PrivilegeType::Insert => ("INSERT", &None),
            PrivilegeType::Update(cols) => ("UPDATE", cols),
            PrivilegeType::Delete => ("DELETE", &None),
            PrivilegeType::References(cols) => ("REFERENCES", cols),
            PrivilegeType::Trigger => ("TRIGGER", &None),
            PrivilegeType::Execute => ("EXECUTE", &None),
            PrivilegeType::AllPrivileges => ("ALL PRIVILEGES", &None),
        };
        match cols {
            Some(cols) => write!(f, "{}({})", name, cols.join(", ")),
            None => write!(f, "{}", name),
        }
    }
}

/// Types of database objects that can have privileges granted on them.
///
/// Views are addressed as tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Table,
    Function,
    Procedure,
}

/// Receiver of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Grantee {
    User(String),
    Public,
}

impl Grantee {
    pub fn user(name: impl Into<String>) -> Self {
        Grantee::User(name.into())
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::User(name) => write!(f, "{}", name),
            Grantee::Public => write!(f, "PUBLIC"),
        }
    }
}

/// GRANT statement - assigns privileges to users or PUBLIC.
///
/// Example SQL:
/// ```sql
/// GRANT SELECT ON TABLE s1.t1 TO PUBLIC;
/// GRANT SELECT (c1, c2), UPDATE (c2) ON s1.t1 TO user1;
/// GRANT EXECUTE ON FUNCTION s1.f1 TO user2 WITH GRANT OPTION;
/// ```
///
/// `objects` holds every object the statement names so that multi-target
/// statements can be rejected during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantStmt {
    /// List of privileges being granted
    pub privileges: Vec<PrivilegeType>,
    /// Type of object (TABLE, FUNCTION, PROCEDURE)
    pub object_type: ObjectType,
    /// Objects named by the statement; exactly one is accepted
    pub objects: Vec<ObjectName>,
    /// Users (or PUBLIC) receiving the privileges
    pub grantees: Vec<Grantee>,
    /// Whether grantees can grant these privileges to others
    pub with_grant_option: bool,
}

impl GrantStmt {
    /// Single-object grant on a table or view.
    pub fn on_table(
        privileges: Vec<PrivilegeType>,
        table: impl Into<ObjectName>,
        grantees: Vec<Grantee>,
    ) -> Self {
        GrantStmt {
            privileges,
            object_type: ObjectType::Table,
            objects: vec![table.into()],
            grantees,
            with_grant_option: false,
        }
    }

    /// Single-object EXECUTE grant on a function or procedure.
    pub fn on_routine(
        object_type: ObjectType,
        routine: impl Into<ObjectName>,
        grantees: Vec<Grantee>,
    ) -> Self {
        GrantStmt {
            privileges: vec![PrivilegeType::Execute],
            object_type,
            objects: vec![routine.into()],
            grantees,
            with_grant_option: false,
        }
    }

    pub fn with_grant_option(mut self) -> Self {
        self.with_grant_option = true;
        self
    }
}
