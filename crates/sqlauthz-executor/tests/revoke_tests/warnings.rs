//! Tests for revokes that have nothing to remove

use sqlauthz_ast::PrivilegeType;
use sqlauthz_executor::WarningKind;

use crate::common::{cols, exec, grant, permissions, revoke, select_columns, setup_t1};

#[test]
fn test_revoke_absent_grant_warns_once() {
    let (engine, mut m1) = setup_t1();
    exec(&mut m1, grant(vec![PrivilegeType::Insert], "T1", &["M3"]));
    let before = permissions(&engine);

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    assert_eq!(result.warning_states(), vec!["01006"]);
    assert_eq!(result.warnings[0].kind, WarningKind::PrivilegeNotRevoked);
    assert_eq!(permissions(&engine), before);
}

#[test]
fn test_one_warning_per_missing_privilege_and_grantee() {
    let (engine, mut m1) = setup_t1();
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2"]));

    let result = exec(
        &mut m1,
        revoke(vec![PrivilegeType::Select(None), PrivilegeType::Delete], "T1", &["M2", "PUBLIC"]),
    );
    assert_eq!(result.warning_states(), vec!["01006", "01006", "01006"]);
    assert!(permissions(&engine).is_empty());
}

#[test]
fn test_table_level_revoke_leaves_column_records() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    assert_eq!(result.warning_states(), vec!["01006"]);
    assert_eq!(exec(&mut m2, select_columns("M1.T1", &["C1"])).result_set().unwrap().len(), 1);
}

#[test]
fn test_revoke_of_ungranted_column_warns() {
    let (engine, mut m1) = setup_t1();
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    let before = permissions(&engine);

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(cols(&["C2"]))], "T1", &["M2"]));
    assert_eq!(result.warning_states(), vec!["01006"]);
    assert_eq!(permissions(&engine), before);
}

#[test]
fn test_partial_column_revoke_keeps_remaining_columns() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1", "C2"]))], "T1", &["M2"]));

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    assert!(result.warnings.is_empty());
    exec(&mut m2, select_columns("M1.T1", &["C2"]));

    exec(&mut m1, revoke(vec![PrivilegeType::Select(cols(&["C2"]))], "T1", &["M2"]));
    assert!(permissions(&engine).is_empty());
}
