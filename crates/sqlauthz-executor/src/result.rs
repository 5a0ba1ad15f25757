//! Statement results and advisory warnings.

use sqlauthz_ast::SqlValue;
use sqlauthz_catalog::{DependentKind, DroppedObject};

/// Non-fatal conditions reported next to a successful statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    PrivilegeNotRevoked,
    RoleNotRevoked,
    ConstraintDropped,
    ViewDropped,
    TriggerDropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn privilege_not_revoked(privilege: &str, grantee: &str, object: &str) -> Self {
        Warning {
            kind: WarningKind::PrivilegeNotRevoked,
            message: format!("Privilege {} on '{}' not revoked from '{}'", privilege, object, grantee),
        }
    }

    pub fn role_not_revoked(role: &str, grantee: &str) -> Self {
        Warning {
            kind: WarningKind::RoleNotRevoked,
            message: format!("Role '{}' not revoked from '{}'", role, grantee),
        }
    }

    /// Warning for a dependent dropped as a side effect of a revoke or DROP ROLE.
    pub fn dropped(object: &DroppedObject) -> Self {
        let kind = match object.kind {
            DependentKind::View => WarningKind::ViewDropped,
            DependentKind::Constraint => WarningKind::ConstraintDropped,
            DependentKind::Trigger => WarningKind::TriggerDropped,
        };
        Warning {
            kind,
            message: format!("{} '{}' dropped", object.kind.name(), object.qualified_name()),
        }
    }

    pub fn sql_state(&self) -> &'static str {
        match self.kind {
            WarningKind::PrivilegeNotRevoked => "01006",
            WarningKind::RoleNotRevoked => "01007",
            WarningKind::ConstraintDropped => "01500",
            WarningKind::ViewDropped => "01501",
            WarningKind::TriggerDropped => "01502",
        }
    }
}

/// Rows returned by a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        ResultSet { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows inserted, updated or deleted
    RowCount(usize),
    Rows(ResultSet),
    /// DDL, GRANT/REVOKE and transaction control
    Done,
}

/// Outcome of a successful statement plus its warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementResult {
    pub outcome: Outcome,
    pub warnings: Vec<Warning>,
}

impl StatementResult {
    pub fn done() -> Self {
        StatementResult { outcome: Outcome::Done, warnings: Vec::new() }
    }

    pub fn row_count(count: usize) -> Self {
        StatementResult { outcome: Outcome::RowCount(count), warnings: Vec::new() }
    }

    pub fn rows(rows: ResultSet) -> Self {
        StatementResult { outcome: Outcome::Rows(rows), warnings: Vec::new() }
    }

    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn result_set(&self) -> Option<&ResultSet> {
        match &self.outcome {
            Outcome::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn warning_states(&self) -> Vec<&'static str> {
        self.warnings.iter().map(Warning::sql_state).collect()
    }
}
