//! Tests for REVOKE EXECUTE ... RESTRICT

use sqlauthz_ast::{
    CheckExpr, ColumnDef, CompareOp, CreateRoutineStmt, CreateTableStmt, DataType, GrantStmt,
    ObjectType, Query, RevokeStmt, RoutineKind, SqlValue, Statement, TableConstraint,
    TableConstraintKind, TableRef,
};

use crate::common::{count, create_view, exec, exec_err, permissions, setup_t1, users};

fn create_function(session: &mut sqlauthz_executor::Session, name: &str) {
    exec(
        session,
        Statement::CreateRoutine(CreateRoutineStmt { name: name.into(), kind: RoutineKind::Function, body: Vec::new() }),
    );
}

fn grant_execute(function: &str, grantee: &str) -> Statement {
    Statement::Grant(GrantStmt::on_routine(ObjectType::Function, function, users(&[grantee])))
}

fn revoke_execute(function: &str, grantee: &str) -> Statement {
    Statement::Revoke(RevokeStmt::on_routine(ObjectType::Function, function, users(&[grantee])))
}

#[test]
fn test_restrict_blocks_revoke_with_dependent_view() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    create_function(&mut m1, "F1");
    exec(&mut m1, grant_execute("F1", "M2"));
    exec(&mut m1, crate::common::grant(vec![sqlauthz_ast::PrivilegeType::Select(None)], "T1", &["M2"]));
    create_view(&mut m2, "V1", Query::select(vec![TableRef::all("M1.T1")]).calling("M1.F1"));
    let before = permissions(&engine);

    assert_eq!(exec_err(&mut m1, revoke_execute("F1", "M2")), "X0Y25");
    assert_eq!(permissions(&engine), before);
    assert_eq!(count(&mut m2, "V1"), 1);
}

#[test]
fn test_restrict_blocks_revoke_with_dependent_check_constraint() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    create_function(&mut m1, "F1");
    exec(&mut m1, grant_execute("F1", "M2"));

    let check = TableConstraintKind::Check(CheckExpr {
        column: "A".to_string(),
        op: CompareOp::Gt,
        value: SqlValue::from(0),
        routines: vec!["M1.F1".into()],
    });
    let table = CreateTableStmt::new("T2", vec![ColumnDef::new("A", DataType::Integer)])
        .constraint(TableConstraint::named("POSITIVE", check));
    exec(&mut m2, Statement::CreateTable(table));

    assert_eq!(exec_err(&mut m1, revoke_execute("F1", "M2")), "X0Y25");
    assert_eq!(exec_err(&mut m2, crate::common::insert("T2", &[-1])), "23513");
}

#[test]
fn test_restrict_allows_revoke_without_dependents() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    create_function(&mut m1, "F1");
    exec(&mut m1, grant_execute("F1", "M2"));
    exec(&mut m2, Statement::Select(Query::default().calling("M1.F1")));

    let result = exec(&mut m1, revoke_execute("F1", "M2"));
    assert!(result.warnings.is_empty());
    assert!(permissions(&engine).is_empty());
    assert_eq!(exec_err(&mut m2, Statement::Select(Query::default().calling("M1.F1"))), "42504");
}

#[test]
fn test_public_execute_dependents_block_revoke_from_public() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    create_function(&mut m1, "F1");
    exec(&mut m1, grant_execute("F1", "PUBLIC"));
    exec(&mut m1, crate::common::grant(vec![sqlauthz_ast::PrivilegeType::Select(None)], "T1", &["M2"]));
    create_view(&mut m2, "V1", Query::select(vec![TableRef::all("M1.T1")]).calling("M1.F1"));

    let result = exec(&mut m1, revoke_execute("F1", "M2"));
    assert_eq!(result.warning_states(), vec!["01006"]);
    assert_eq!(exec_err(&mut m1, revoke_execute("F1", "PUBLIC")), "X0Y25");
}
