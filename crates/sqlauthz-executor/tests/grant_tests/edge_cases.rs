//! Tests for rejected grants and invalid grant targets

use rstest::rstest;
use sqlauthz_ast::{
    ColumnDef, CreateSynonymStmt, CreateTableStmt, DataType, GrantStmt, ObjectName, ObjectType,
    PrivilegeType, RevokeStmt, Statement,
};

use crate::common::{cols, exec, exec_err, grant, permissions, revoke, setup_t1, users};

#[rstest]
#[case::owner("M1")]
#[case::dba("DBA")]
fn test_self_grant_and_revoke_rejected(#[case] user: &str) {
    let (engine, _m1) = setup_t1();
    let mut session = engine.connect(user);

    assert_eq!(exec_err(&mut session, grant(vec![PrivilegeType::Select(None)], "M1.T1", &[user])), "42509");
    assert_eq!(exec_err(&mut session, revoke(vec![PrivilegeType::Select(None)], "M1.T1", &[user])), "42509");
    assert!(permissions(&engine).is_empty());
}

#[test]
fn test_self_grant_rejected_for_grant_option_holder() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, crate::common::grant_wgo(vec![PrivilegeType::Select(None)], "T1", &["M2"]));

    assert_eq!(exec_err(&mut m2, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["M2"])), "42509");
}

#[rstest]
#[case::owner("M1")]
#[case::dba("DBA")]
fn test_grant_to_owner_or_dba_rejected(#[case] grantee: &str) {
    let engine = setup_t1().0;
    let mut other = engine.connect(if grantee == "M1" { "DBA" } else { "M1" });

    assert_eq!(exec_err(&mut other, grant(vec![PrivilegeType::Insert], "M1.T1", &[grantee])), "42509");
}

#[rstest]
#[case::dba("DBA")]
#[case::user("M1")]
fn test_system_table_grant_rejected(#[case] user: &str) {
    let engine = setup_t1().0;
    let mut session = engine.connect(user);

    assert_eq!(
        exec_err(&mut session, grant(vec![PrivilegeType::Select(None)], "SYS.SYSTABLES", &["ANYONE"])),
        "42509"
    );
}

#[test]
fn test_builtin_function_grant_rejected() {
    let engine = setup_t1().0;
    let mut dba = engine.connect("DBA");
    let stmt = GrantStmt::on_routine(ObjectType::Function, "SYSFUN.SQRT", users(&["M2"]));

    assert_eq!(exec_err(&mut dba, Statement::Grant(stmt)), "42509");
}

#[test]
fn test_grantable_system_procedure() {
    let engine = setup_t1().0;
    let mut dba = engine.connect("DBA");
    let mut m2 = engine.connect("M2");
    let call = Statement::Call(sqlauthz_ast::CallStmt { procedure: "SYSCS_UTIL.SYSCS_EXPORT_TABLE".into() });

    assert_eq!(exec_err(&mut m2, call.clone()), "42504");
    let stmt = GrantStmt::on_routine(ObjectType::Procedure, "SYSCS_UTIL.SYSCS_EXPORT_TABLE", users(&["M2"]));
    exec(&mut dba, Statement::Grant(stmt));
    exec(&mut m2, call);

    let freeze = GrantStmt::on_routine(ObjectType::Procedure, "SYSCS_UTIL.SYSCS_FREEZE_DATABASE", users(&["M2"]));
    assert_eq!(exec_err(&mut dba, Statement::Grant(freeze)), "42509");
}

#[test]
fn test_temporary_table_and_synonym_are_not_grantable() {
    let (engine, mut m1) = setup_t1();
    let mut temp = CreateTableStmt::new("SESSION.TT", vec![ColumnDef::new("A", DataType::Integer)]);
    temp.temporary = true;
    exec(&mut m1, Statement::CreateTable(temp));
    exec(
        &mut m1,
        Statement::CreateSynonym(CreateSynonymStmt { name: "S1".into(), target: "T1".into() }),
    );

    assert_eq!(exec_err(&mut m1, grant(vec![PrivilegeType::Select(None)], "SESSION.TT", &["M2"])), "0A000");
    assert_eq!(exec_err(&mut m1, grant(vec![PrivilegeType::Select(None)], "S1", &["M2"])), "0A000");
    assert!(permissions(&engine).is_empty());
}

#[test]
fn test_invalid_targets() {
    let (_engine, mut m1) = setup_t1();

    assert_eq!(exec_err(&mut m1, grant(vec![PrivilegeType::Select(None)], "NOPE", &["M2"])), "42X05");
    assert_eq!(exec_err(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C9"]))], "T1", &["M2"])), "42X14");
    assert_eq!(exec_err(&mut m1, grant(vec![PrivilegeType::Execute], "T1", &["M2"])), "42X01");
    assert_eq!(exec_err(&mut m1, grant(Vec::new(), "T1", &["M2"])), "42X01");
    assert_eq!(exec_err(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &[])), "42X01");

    let mut two = GrantStmt::on_table(vec![PrivilegeType::Select(None)], "T1", users(&["M2"]));
    two.objects.push(ObjectName::new("T1"));
    assert_eq!(exec_err(&mut m1, Statement::Grant(two)), "42X01");

    let routine = GrantStmt::on_routine(ObjectType::Function, "NO_SUCH_FUNCTION", users(&["M2"]));
    assert_eq!(exec_err(&mut m1, Statement::Grant(routine)), "42Y03");
}

#[test]
fn test_revoke_execute_requires_restrict() {
    let (_engine, mut m1) = setup_t1();
    exec(
        &mut m1,
        Statement::CreateRoutine(sqlauthz_ast::CreateRoutineStmt {
            name: "F1".into(),
            kind: sqlauthz_ast::RoutineKind::Function,
            body: Vec::new(),
        }),
    );

    let mut stmt = RevokeStmt::on_routine(ObjectType::Function, "F1", users(&["M2"]));
    stmt.restrict = false;
    assert_eq!(exec_err(&mut m1, Statement::Revoke(stmt)), "42X01");

    let mut table = RevokeStmt::on_table(vec![PrivilegeType::Select(None)], "T1", users(&["M2"]));
    table.restrict = true;
    assert_eq!(exec_err(&mut m1, Statement::Revoke(table)), "42X01");
}

#[test]
fn test_non_owner_cannot_grant() {
    let (engine, _m1) = setup_t1();
    let mut m2 = engine.connect("M2");

    assert_eq!(exec_err(&mut m2, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["M3"])), "42506");
    assert_eq!(exec_err(&mut m2, revoke(vec![PrivilegeType::Select(None)], "M1.T1", &["M3"])), "42506");
}

#[test]
fn test_owner_grantee_rejected_before_grant_authority() {
    let (engine, _m1) = setup_t1();
    let mut m2 = engine.connect("M2");

    assert_eq!(exec_err(&mut m2, revoke(vec![PrivilegeType::Select(None)], "M1.T1", &["M1"])), "42509");
    assert_eq!(exec_err(&mut m2, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["DBA"])), "42509");
    assert_eq!(exec_err(&mut m2, revoke(vec![PrivilegeType::Delete], "M1.T1", &["M3", "M1"])), "42509");
}

#[test]
fn test_dba_grants_on_any_table() {
    let (engine, _m1) = setup_t1();
    let mut dba = engine.connect("DBA");
    let mut m2 = engine.connect("M2");

    exec(&mut dba, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["M2"]));
    assert_eq!(crate::common::count(&mut m2, "M1.T1"), 1);
    assert_eq!(permissions(&engine)[0].grantor, "DBA");
}
