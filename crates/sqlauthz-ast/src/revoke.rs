//! REVOKE statement AST structures
//!
//! This module defines AST structures for REVOKE statements that remove privileges
//! from users or PUBLIC.

use crate::grant::{Grantee, ObjectType, PrivilegeType};
use crate::ObjectName;

/// REVOKE statement - removes privileges from users or PUBLIC.
///
/// Example SQL:
/// ```sql
/// REVOKE SELECT ON TABLE s1.t1 FROM PUBLIC;
/// REVOKE SELECT (c111) ON m1.t11 FROM m2;
/// REVOKE EXECUTE ON FUNCTION s1.f1 FROM user1 RESTRICT;
/// ```
///
/// EXECUTE revocations must carry RESTRICT; table privilege revocations must not.
#[derive(Debug, Clone, PartialEq)]
pub struct RevokeStmt {
    /// List of privileges being revoked
    pub privileges: Vec<PrivilegeType>,
    /// Type of object (TABLE, FUNCTION, PROCEDURE)
    pub object_type: ObjectType,
    /// Objects named by the statement; exactly one is accepted
    pub objects: Vec<ObjectName>,
    /// Users (or PUBLIC) losing the privileges
    pub grantees: Vec<Grantee>,
    /// RESTRICT: fail if dependent objects still require the privilege
    pub restrict: bool,
}

impl RevokeStmt {
    /// Single-object revoke on a table or view.
    pub fn on_table(
        privileges: Vec<PrivilegeType>,
        table: impl Into<ObjectName>,
        grantees: Vec<Grantee>,
    ) -> Self {
        RevokeStmt {
            privileges,
            object_type: ObjectType::Table,
            objects: vec![table.into()],
            grantees,
            restrict: false,
        }
    }

    /// Single-object `REVOKE EXECUTE ... RESTRICT` on a routine.
    pub fn on_routine(
        object_type: ObjectType,
        routine: impl Into<ObjectName>,
        grantees: Vec<Grantee>,
    ) -> Self {
        RevokeStmt {
            privileges: vec![PrivilegeType::Execute],
            object_type,
            objects: vec![routine.into()],
            grantees,
            restrict: true,
        }
    }
}
