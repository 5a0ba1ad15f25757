//! Top-level statement type

use crate::{
    AlterTableStmt, CallStmt, CreateRoleStmt, CreateRoutineStmt, CreateSchemaStmt,
    CreateSynonymStmt, CreateTableStmt, CreateTriggerStmt, CreateViewStmt, DeleteStmt,
    DropRoleStmt, DropStmt, GrantRoleStmt, GrantStmt, InsertStmt, Query, RevokeRoleStmt,
    RevokeStmt, SetRoleStmt, UpdateStmt,
};

/// A SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Query),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    Call(CallStmt),
    CreateSchema(CreateSchemaStmt),
    CreateTable(CreateTableStmt),
    AlterTable(AlterTableStmt),
    CreateView(CreateViewStmt),
    CreateTrigger(CreateTriggerStmt),
    CreateRoutine(CreateRoutineStmt),
    CreateSynonym(CreateSynonymStmt),
    Drop(DropStmt),
    Grant(GrantStmt),
    Revoke(RevokeStmt),
    CreateRole(CreateRoleStmt),
    DropRole(DropRoleStmt),
    GrantRole(GrantRoleStmt),
    RevokeRole(RevokeRoleStmt),
    SetRole(SetRoleStmt),
    BeginTransaction,
    Commit,
    Rollback,
}
