//! Table constraints

use sqlauthz_ast::{CompareOp, SqlValue};

use crate::{ConglomerateId, ObjectId};

/// Constraint kinds, with columns resolved to positions.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    PrimaryKey { columns: Vec<usize> },
    Unique { columns: Vec<usize> },
    ForeignKey { columns: Vec<usize>, parent: ObjectId, parent_columns: Vec<usize> },
    Check { column: usize, op: CompareOp, value: SqlValue, routines: Vec<ObjectId> },
}

impl ConstraintKind {
    /// Columns of a key constraint (the ones a conglomerate indexes).
    pub fn key_columns(&self) -> Option<&[usize]> {
        match self {
            ConstraintKind::PrimaryKey { columns }
            | ConstraintKind::Unique { columns }
            | ConstraintKind::ForeignKey { columns, .. } => Some(columns),
            ConstraintKind::Check { .. } => None,
        }
    }

    /// One-letter code used in `SYSCONSTRAINTS.TYPE`.
    pub fn code(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey { .. } => "P",
            ConstraintKind::Unique { .. } => "U",
            ConstraintKind::ForeignKey { .. } => "F",
            ConstraintKind::Check { .. } => "C",
        }
    }
}

/// Constraint definition stored in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDefinition {
    pub id: ObjectId,
    pub schema: String,
    pub name: String,
    pub table: ObjectId,
    pub kind: ConstraintKind,
    pub conglomerate: Option<ConglomerateId>,
}
