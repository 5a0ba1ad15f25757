//! Tests for WITH GRANT OPTION and who may grant

use sqlauthz_ast::{ObjectType, PrivilegeType, RevokeStmt, Statement};
use sqlauthz_catalog::Principal;

use crate::common::{
    cols, count, exec, exec_err, grant, grant_wgo, permissions, revoke, select_all, select_columns,
    setup_t1,
};

#[test]
fn test_grantee_without_grant_option_cannot_grant() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2"]));

    assert_eq!(exec_err(&mut m2, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["M3"])), "42506");
}

#[test]
fn test_grant_option_lets_grantee_grant_onward() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    let mut m3 = engine.connect("M3");
    exec(&mut m1, grant_wgo(vec![PrivilegeType::Select(None)], "T1", &["M2"]));

    exec(&mut m2, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["M3"]));
    assert_eq!(count(&mut m3, "M1.T1"), 1);

    let from_m2: Vec<_> = permissions(&engine).into_iter().filter(|r| r.grantor == "M2").collect();
    assert_eq!(from_m2.len(), 1);
    assert_eq!(from_m2[0].grantee, Principal::user("M3"));
    assert!(!from_m2[0].with_grant_option);
}

#[test]
fn test_column_grant_option_covers_only_its_columns() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant_wgo(vec![PrivilegeType::Select(cols(&["C1", "C2"]))], "T1", &["M2"]));

    exec(&mut m2, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "M1.T1", &["M3"]));
    assert_eq!(
        exec_err(&mut m2, grant(vec![PrivilegeType::Select(cols(&["C2", "C3"]))], "M1.T1", &["M3"])),
        "42506"
    );
    assert_eq!(exec_err(&mut m2, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["M3"])), "42506");
}

#[test]
fn test_public_grant_option_counts_for_everyone() {
    let (engine, mut m1) = setup_t1();
    let mut m4 = engine.connect("M4");
    exec(&mut m1, grant_wgo(vec![PrivilegeType::Insert], "T1", &["PUBLIC"]));

    exec(&mut m4, grant(vec![PrivilegeType::Insert], "M1.T1", &["M5"]));
}

#[test]
fn test_regrant_with_grant_option_upgrades_record() {
    let (engine, mut m1) = setup_t1();
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    exec(&mut m1, grant_wgo(vec![PrivilegeType::Select(None)], "T1", &["M2"]));

    let records = permissions(&engine);
    assert_eq!(records.len(), 1);
    assert!(records[0].with_grant_option);
}

#[test]
fn test_revoking_grantor_abandons_onward_grants() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    let mut m3 = engine.connect("M3");
    exec(&mut m1, grant_wgo(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    exec(&mut m2, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["M3"]));
    assert_eq!(count(&mut m3, "M1.T1"), 1);

    exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    assert!(permissions(&engine).is_empty());
    assert_eq!(exec_err(&mut m3, select_all("M1.T1")), "42502");
}

#[test]
fn test_grant_cycle_without_owner_support_is_abandoned() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    let mut m3 = engine.connect("M3");
    let mut m4 = engine.connect("M4");
    exec(&mut m1, grant_wgo(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    exec(&mut m2, grant_wgo(vec![PrivilegeType::Select(None)], "M1.T1", &["M3"]));
    exec(&mut m3, grant_wgo(vec![PrivilegeType::Select(None)], "M1.T1", &["M4"]));
    exec(&mut m4, grant_wgo(vec![PrivilegeType::Select(None)], "M1.T1", &["M3"]));
    assert_eq!(permissions(&engine).len(), 4);

    exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    assert!(permissions(&engine).is_empty());
    assert_eq!(exec_err(&mut m3, select_all("M1.T1")), "42502");
    assert_eq!(exec_err(&mut m4, select_all("M1.T1")), "42502");
}

#[test]
fn test_onward_column_grant_narrows_to_remaining_authority() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    let mut m3 = engine.connect("M3");
    exec(&mut m1, grant_wgo(vec![PrivilegeType::Select(cols(&["C1", "C2"]))], "T1", &["M2"]));
    exec(&mut m2, grant(vec![PrivilegeType::Select(cols(&["C1", "C2"]))], "M1.T1", &["M3"]));

    exec(&mut m1, revoke(vec![PrivilegeType::Select(cols(&["C2"]))], "T1", &["M2"]));
    exec(&mut m3, select_columns("M1.T1", &["C1"]));
    assert_eq!(exec_err(&mut m3, select_columns("M1.T1", &["C2"])), "42502");
}

#[test]
fn test_grantee_can_only_revoke_own_grants() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    let mut m4 = engine.connect("M4");
    exec(&mut m1, grant_wgo(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M4"]));
    exec(&mut m2, grant(vec![PrivilegeType::Select(None)], "M1.T1", &["M4"]));

    let result = exec(&mut m2, revoke(vec![PrivilegeType::Select(None)], "M1.T1", &["M4"]));
    assert!(result.warnings.is_empty());
    assert_eq!(count(&mut m4, "M1.T1"), 1);
    assert!(permissions(&engine).iter().all(|r| r.grantor == "M1"));
}

#[test]
fn test_routine_grant_option() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(
        &mut m1,
        Statement::CreateRoutine(sqlauthz_ast::CreateRoutineStmt {
            name: "P1".into(),
            kind: sqlauthz_ast::RoutineKind::Procedure,
            body: Vec::new(),
        }),
    );
    let execute = |grantees: &[&str]| {
        Statement::Grant(sqlauthz_ast::GrantStmt::on_routine(
            ObjectType::Procedure,
            "M1.P1",
            crate::common::users(grantees),
        ))
    };

    exec(&mut m1, execute(&["M2"]));
    assert_eq!(exec_err(&mut m2, execute(&["M3"])), "42506");

    let upgrade = match execute(&["M2"]) {
        Statement::Grant(stmt) => Statement::Grant(stmt.with_grant_option()),
        other => other,
    };
    exec(&mut m1, upgrade);
    exec(&mut m2, execute(&["M3"]));

    let revoke = Statement::Revoke(RevokeStmt::on_routine(
        ObjectType::Procedure,
        "M1.P1",
        crate::common::users(&["M3"]),
    ));
    exec(&mut m2, revoke);
    assert_eq!(permissions(&engine).len(), 1);
}
