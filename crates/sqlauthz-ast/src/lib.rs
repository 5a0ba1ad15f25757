//! Abstract Syntax Tree (AST) for the sqlauthz engine
//!
//! Statements arrive already shaped; there is no SQL text parser. The tree
//! carries exactly what the authorization layer needs to see: which objects a
//! statement names, which columns it reads or writes, and which routines it
//! calls.

mod ddl;
mod dml;
mod grant;
mod name;
mod revoke;
mod role;
mod statement;
mod value;

pub use ddl::{
    AlterTableAction, AlterTableStmt, CheckExpr, ColumnDef, CreateRoutineStmt, CreateSchemaStmt,
    CreateSynonymStmt, CreateTableStmt, CreateTriggerStmt, CreateViewStmt, DataType,
    DropObjectType, DropStmt, RoutineKind, TableConstraint, TableConstraintKind, TriggerEvent,
};
pub use dml::{
    CallStmt, CompareOp, DeleteStmt, Filter, InsertStmt, ProceduralStatement, Projection, Query,
    TableRef, UpdateStmt,
};
pub use grant::{GrantStmt, Grantee, ObjectType, PrivilegeType};
pub use name::ObjectName;
pub use revoke::RevokeStmt;
pub use role::{CreateRoleStmt, DropRoleStmt, GrantRoleStmt, RevokeRoleStmt, SetRoleStmt};
pub use statement::Statement;
pub use value::SqlValue;
