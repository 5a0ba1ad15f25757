//! Tests for table-level and column-level privileges

use sqlauthz_ast::{CompareOp, Filter, PrivilegeType, SqlValue};
use sqlauthz_executor::{Engine, Outcome};

use crate::common::{
    cols, count, create_table, delete, exec, exec_err, grant, insert, permissions, select_all, select_columns,
    setup_t1, update,
};

#[test]
fn test_select_requires_grant() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");

    assert_eq!(exec_err(&mut m2, select_all("M1.T1")), "42502");

    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    assert_eq!(count(&mut m2, "M1.T1"), 1);
}

#[test]
fn test_public_grant_applies_to_every_user() {
    let (engine, mut m1) = setup_t1();
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["PUBLIC"]));

    for user in ["M2", "M3", "SOMEONE"] {
        let mut session = engine.connect(user);
        assert_eq!(count(&mut session, "M1.T1"), 1, "{} should read through PUBLIC", user);
    }
}

#[test]
fn test_column_grant_limits_readable_columns() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1", "C2"]))], "T1", &["M2"]));

    let result = exec(&mut m2, select_columns("M1.T1", &["C2", "C1"]));
    let rows = result.result_set().unwrap();
    assert_eq!(rows.columns, vec!["C2", "C1"]);
    assert_eq!(rows.rows, vec![vec![SqlValue::Integer(10), SqlValue::Integer(1)]]);

    assert_eq!(exec_err(&mut m2, select_all("M1.T1")), "42502");
    assert_eq!(exec_err(&mut m2, select_columns("M1.T1", &["C3"])), "42502");
}

#[test]
fn test_user_and_public_column_grants_combine() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C2", "C3"]))], "T1", &["PUBLIC"]));

    assert_eq!(count(&mut m2, "M1.T1"), 1);

    let mut m3 = engine.connect("M3");
    assert_eq!(exec_err(&mut m3, select_all("M1.T1")), "42502");
}

#[test]
fn test_update_needs_column_privilege_and_select_for_filter() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Update(cols(&["C2"]))], "T1", &["M2"]));

    let updated = exec(&mut m2, update("M1.T1", "C2", 20, None));
    assert_eq!(updated.outcome, Outcome::RowCount(1));
    assert_eq!(exec_err(&mut m2, update("M1.T1", "C3", 300, None)), "42502");

    let filter = Some(Filter::new("C1", CompareOp::Eq, 1));
    assert_eq!(exec_err(&mut m2, update("M1.T1", "C2", 30, filter.clone())), "42502");

    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    exec(&mut m2, update("M1.T1", "C2", 30, filter));
}

#[test]
fn test_insert_and_delete_are_table_level() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");

    assert_eq!(exec_err(&mut m2, insert("M1.T1", &[2, 20, 200])), "42500");
    assert_eq!(exec_err(&mut m2, delete("M1.T1")), "42500");

    exec(&mut m1, grant(vec![PrivilegeType::Insert, PrivilegeType::Delete], "T1", &["M2"]));
    exec(&mut m2, insert("M1.T1", &[2, 20, 200]));
    let deleted = exec(&mut m2, delete("M1.T1"));
    assert_eq!(deleted.outcome, Outcome::RowCount(2));
}

#[test]
fn test_grant_twice_leaves_catalog_unchanged() {
    let (engine, mut m1) = setup_t1();
    let stmt = grant(
        vec![PrivilegeType::Select(cols(&["C1"])), PrivilegeType::Insert],
        "T1",
        &["M2", "PUBLIC"],
    );

    exec(&mut m1, stmt.clone());
    let once = permissions(&engine);
    exec(&mut m1, stmt);
    assert_eq!(permissions(&engine), once);
    assert_eq!(once.len(), 4);
}

#[test]
fn test_column_grants_merge_into_one_record() {
    let (engine, mut m1) = setup_t1();
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C3"]))], "T1", &["M2"]));

    let records = permissions(&engine);
    assert_eq!(records.len(), 1);
    let columns: Vec<usize> = records[0].columns.as_ref().unwrap().positions().collect();
    assert_eq!(columns, vec![0, 2]);
}

#[test]
fn test_all_privileges_grants_every_table_privilege() {
    let (engine, mut m1) = setup_t1();
    exec(&mut m1, grant(vec![PrivilegeType::AllPrivileges], "T1", &["M2"]));

    let rows = exec(&mut m1, select_all("SYS.SYSTABLEPERMS"));
    let rows = rows.result_set().unwrap();
    assert_eq!(rows.len(), 1);
    let flags: Vec<&SqlValue> = rows.rows[0][3..].iter().collect();
    assert!(flags.iter().all(|f| **f == SqlValue::from("y")), "{:?}", flags);

    let mut m2 = engine.connect("M2");
    exec(&mut m2, insert("M1.T1", &[3, 30, 300]));
    assert_eq!(count(&mut m2, "M1.T1"), 2);
}

#[test]
fn test_unqualified_grant_target_uses_current_schema() {
    let engine = Engine::default();
    let mut m1 = engine.connect("M1");
    create_table(&mut m1, "T2", &["A"]);
    m1.set_schema("APP");

    assert_eq!(exec_err(&mut m1, grant(vec![PrivilegeType::Select(None)], "T2", &["M2"])), "42X05");
    assert_eq!(count(&mut m1, "M1.T2"), 0);
}
