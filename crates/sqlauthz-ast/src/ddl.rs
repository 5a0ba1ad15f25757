//! Data Definition Language (DDL) AST nodes
//!
//! Schemas, tables, constraints, views, triggers, routines and synonyms.

use crate::{CompareOp, ObjectName, ProceduralStatement, Query, SqlValue};

/// CREATE SCHEMA statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSchemaStmt {
    pub schema_name: String,
    /// AUTHORIZATION clause; defaults to the creating user
    pub authorization: Option<String>,
}

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Varchar,
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDef { name: name.into(), data_type, nullable: true }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// `column <op> value`, optionally invoking routines (which need EXECUTE).
#[derive(Debug, Clone, PartialEq)]
pub struct CheckExpr {
    pub column: String,
    pub op: CompareOp,
    pub value: SqlValue,
    pub routines: Vec<ObjectName>,
}

/// Table-level constraint kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraintKind {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    ForeignKey {
        columns: Vec<String>,
        references: ObjectName,
        /// Referenced columns; defaults to the parent's primary key
        referenced_columns: Option<Vec<String>>,
    },
    Check(CheckExpr),
}

/// Table-level constraint
#[derive(Debug, Clone, PartialEq)]
pub struct TableConstraint {
    pub name: Option<String>,
    pub kind: TableConstraintKind,
}

impl TableConstraint {
    pub fn named(name: impl Into<String>, kind: TableConstraintKind) -> Self {
        TableConstraint { name: Some(name.into()), kind }
    }

    pub fn unnamed(kind: TableConstraintKind) -> Self {
        TableConstraint { name: None, kind }
    }
}

/// CREATE TABLE statement
///
/// `temporary` declares a session-scoped table (`DECLARE GLOBAL TEMPORARY
/// TABLE SESSION.t`). Temporary tables live in schema `SESSION`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub name: ObjectName,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub temporary: bool,
}

impl CreateTableStmt {
    pub fn new(name: impl Into<ObjectName>, columns: Vec<ColumnDef>) -> Self {
        CreateTableStmt { name: name.into(), columns, constraints: Vec::new(), temporary: false }
    }

    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// ALTER TABLE actions
#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableAction {
    AddColumn(ColumnDef),
    AddConstraint(TableConstraint),
    DropConstraint(String),
}

/// ALTER TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStmt {
    pub table: ObjectName,
    pub action: AlterTableAction,
}

/// CREATE VIEW statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewStmt {
    pub name: ObjectName,
    /// Optional column names for the view
    pub columns: Option<Vec<String>>,
    pub query: Query,
}

/// Trigger event (INSERT, UPDATE [OF columns], DELETE)
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    Insert,
    Update(Option<Vec<String>>),
    Delete,
}

/// CREATE TRIGGER statement (AFTER ... FOR EACH STATEMENT)
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTriggerStmt {
    pub name: ObjectName,
    pub table: ObjectName,
    pub event: TriggerEvent,
    pub actions: Vec<ProceduralStatement>,
}

/// Function or procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoutineKind {
    Function,
    Procedure,
}

impl RoutineKind {
    pub fn name(self) -> &'static str {
        match self {
            RoutineKind::Function => "FUNCTION",
            RoutineKind::Procedure => "PROCEDURE",
        }
    }
}

/// CREATE FUNCTION / CREATE PROCEDURE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoutineStmt {
    pub name: ObjectName,
    pub kind: RoutineKind,
    pub body: Vec<ProceduralStatement>,
}

/// CREATE SYNONYM statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSynonymStmt {
    pub name: ObjectName,
    pub target: ObjectName,
}

/// Object kinds accepted by DROP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropObjectType {
    Schema,
    Table,
    View,
    Trigger,
    Function,
    Procedure,
    Synonym,
}

/// DROP statement (always RESTRICT)
#[derive(Debug, Clone, PartialEq)]
pub struct DropStmt {
    pub object_type: DropObjectType,
    pub name: ObjectName,
}
