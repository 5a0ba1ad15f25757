//! Data Manipulation Language (DML) AST nodes
//!
//! Queries are reduced to the relations they read and the columns they touch.
//! Joins are cross products of the listed relations.

use crate::{ObjectName, SqlValue};

/// Columns read from one relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*` - every column of the relation
    All,
    Columns(Vec<String>),
}

/// One relation in a FROM list.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: ObjectName,
    pub projection: Projection,
}

impl TableRef {
    pub fn all(name: impl Into<ObjectName>) -> Self {
        TableRef { name: name.into(), projection: Projection::All }
    }

    pub fn columns(name: impl Into<ObjectName>, columns: &[&str]) -> Self {
        TableRef {
            name: name.into(),
            projection: Projection::Columns(columns.iter().map(|c| c.to_string()).collect()),
        }
    }
}

/// SELECT query: cross product of `from`, projected per relation.
///
/// `routines` are functions invoked by the query (in the select list or
/// predicates); each is called once per evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub from: Vec<TableRef>,
    pub routines: Vec<ObjectName>,
    pub filter: Option<Filter>,
}

impl Query {
    pub fn select(tables: Vec<TableRef>) -> Self {
        Query { from: tables, routines: Vec::new(), filter: None }
    }

    pub fn calling(mut self, routine: impl Into<ObjectName>) -> Self {
        self.routines.push(routine.into());
        self
    }

    pub fn filtered(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Comparison operators usable in filters and check constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// `column <op> value` predicate. Reading the column requires SELECT on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: CompareOp,
    pub value: SqlValue,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: CompareOp, value: impl Into<SqlValue>) -> Self {
        Filter { column: column.into(), op, value: value.into() }
    }
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: ObjectName,
    /// Target columns; `None` means every column in table order
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl InsertStmt {
    pub fn values(table: impl Into<ObjectName>, rows: Vec<Vec<SqlValue>>) -> Self {
        InsertStmt { table: table.into(), columns: None, rows }
    }
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table: ObjectName,
    pub assignments: Vec<(String, SqlValue)>,
    pub filter: Option<Filter>,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table: ObjectName,
    pub filter: Option<Filter>,
}

/// CALL statement (procedure invocation)
#[derive(Debug, Clone, PartialEq)]
pub struct CallStmt {
    pub procedure: ObjectName,
}

/// Statements allowed inside trigger actions and routine bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum ProceduralStatement {
    Select(Query),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    Call(CallStmt),
}
