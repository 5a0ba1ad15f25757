//! Common test utilities for executor integration tests

use sqlauthz_ast::{
    ColumnDef, CreateTableStmt, CreateViewStmt, DataType, DeleteStmt, Filter, GrantStmt, Grantee, InsertStmt,
    PrivilegeType, Query, RevokeStmt, SqlValue, Statement, TableConstraint, TableConstraintKind,
    TableRef, UpdateStmt,
};
use sqlauthz_catalog::PermissionRecord;
use sqlauthz_executor::{Engine, Session, StatementResult};

/// Execute `stmt`, panicking with the SQLSTATE if it fails.
#[allow(dead_code)]
pub fn exec(session: &mut Session, stmt: Statement) -> StatementResult {
    match session.execute(&stmt) {
        Ok(result) => result,
        Err(err) => panic!("{} failed with {}: {}", session.user(), err.sql_state(), err),
    }
}

/// Execute `stmt`, expecting it to fail, and return the SQLSTATE.
#[allow(dead_code)]
pub fn exec_err(session: &mut Session, stmt: Statement) -> &'static str {
    match session.execute(&stmt) {
        Ok(result) => panic!("{} expected to fail, got {:?}", session.user(), result),
        Err(err) => err.sql_state(),
    }
}

/// Number of rows `SELECT * FROM table` returns.
#[allow(dead_code)]
pub fn count(session: &mut Session, table: &str) -> usize {
    exec(session, select_all(table)).result_set().map(|rs| rs.len()).unwrap_or_default()
}

/// Create `name` with integer columns; the first column is the primary key.
#[allow(dead_code)]
pub fn create_table(session: &mut Session, name: &str, columns: &[&str]) {
    let defs = columns.iter().map(|c| ColumnDef::new(*c, DataType::Integer)).collect();
    let stmt = CreateTableStmt::new(name, defs).constraint(TableConstraint::unnamed(
        TableConstraintKind::PrimaryKey(vec![columns[0].to_string()]),
    ));
    exec(session, Statement::CreateTable(stmt));
}

/// Create `name` with nullable integer columns and no constraints.
#[allow(dead_code)]
pub fn create_plain_table(session: &mut Session, name: &str, columns: &[&str]) {
    let defs = columns.iter().map(|c| ColumnDef::new(*c, DataType::Integer)).collect();
    exec(session, Statement::CreateTable(CreateTableStmt::new(name, defs)));
}

#[allow(dead_code)]
pub fn create_view(session: &mut Session, name: &str, query: Query) -> StatementResult {
    exec(session, Statement::CreateView(CreateViewStmt { name: name.into(), columns: None, query }))
}

#[allow(dead_code)]
pub fn select_all(table: &str) -> Statement {
    Statement::Select(Query::select(vec![TableRef::all(table)]))
}

#[allow(dead_code)]
pub fn select_columns(table: &str, columns: &[&str]) -> Statement {
    Statement::Select(Query::select(vec![TableRef::columns(table, columns)]))
}

#[allow(dead_code)]
pub fn insert(table: &str, values: &[i64]) -> Statement {
    let row = values.iter().map(|v| SqlValue::from(*v)).collect();
    Statement::Insert(InsertStmt::values(table, vec![row]))
}

#[allow(dead_code)]
pub fn update(table: &str, column: &str, value: i64, filter: Option<Filter>) -> Statement {
    Statement::Update(UpdateStmt {
        table: table.into(),
        assignments: vec![(column.to_string(), SqlValue::from(value))],
        filter,
    })
}

#[allow(dead_code)]
pub fn delete(table: &str) -> Statement {
    Statement::Delete(DeleteStmt { table: table.into(), filter: None })
}

#[allow(dead_code)]
pub fn users(names: &[&str]) -> Vec<Grantee> {
    names
        .iter()
        .map(|n| if n.eq_ignore_ascii_case("PUBLIC") { Grantee::Public } else { Grantee::user(*n) })
        .collect()
}

#[allow(dead_code)]
pub fn grant(privileges: Vec<PrivilegeType>, table: &str, grantees: &[&str]) -> Statement {
    Statement::Grant(GrantStmt::on_table(privileges, table, users(grantees)))
}

#[allow(dead_code)]
pub fn grant_wgo(privileges: Vec<PrivilegeType>, table: &str, grantees: &[&str]) -> Statement {
    Statement::Grant(GrantStmt::on_table(privileges, table, users(grantees)).with_grant_option())
}

#[allow(dead_code)]
pub fn revoke(privileges: Vec<PrivilegeType>, table: &str, grantees: &[&str]) -> Statement {
    Statement::Revoke(RevokeStmt::on_table(privileges, table, users(grantees)))
}

#[allow(dead_code)]
pub fn cols(columns: &[&str]) -> Option<Vec<String>> {
    Some(columns.iter().map(|c| c.to_string()).collect())
}

/// Every permission record in the committed state.
#[allow(dead_code)]
pub fn permissions(engine: &Engine) -> Vec<PermissionRecord> {
    engine.database().snapshot().catalog.permissions().records().cloned().collect()
}

/// Engine with table `M1.T1(C1, C2, C3)` owned by M1, plus an M1 session.
#[allow(dead_code)]
pub fn setup_t1() -> (Engine, Session) {
    let engine = Engine::default();
    let mut m1 = engine.connect("M1");
    create_table(&mut m1, "T1", &["C1", "C2", "C3"]);
    exec(&mut m1, insert("T1", &[1, 10, 100]));
    (engine, m1)
}
