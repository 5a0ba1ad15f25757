//! Tests for dependents dropped when the permission record they were
//! compiled against is revoked

use sqlauthz_ast::{
    CreateTriggerStmt, InsertStmt, PrivilegeType, ProceduralStatement, Query, SqlValue, Statement,
    TableRef, TriggerEvent,
};
use sqlauthz_executor::WarningKind;

use crate::common::{
    cols, count, create_plain_table, create_view, exec, exec_err, grant, insert, permissions,
    revoke, select_all, setup_t1,
};

fn view_on_c1() -> Query {
    Query::select(vec![TableRef::columns("M1.T1", &["C1"])])
}

#[test]
fn test_view_bound_to_column_record_not_table_record() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    create_view(&mut m2, "V1", view_on_c1());
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2"]));

    // Table-level record was not used by the view.
    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    assert!(result.warnings.is_empty());
    assert_eq!(count(&mut m2, "V1"), 1);

    // Column-level record is dropped from under the view even with a
    // table-level record back in place.
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    assert_eq!(result.warning_states(), vec!["01501"]);
    assert_eq!(exec_err(&mut m2, select_all("V1")), "42X05");
    assert_eq!(count(&mut m2, "M1.T1"), 1);
}

#[test]
fn test_view_bound_to_table_record_survives_column_revoke() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    create_view(&mut m2, "V1", view_on_c1());
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    assert!(result.warnings.is_empty());
    assert_eq!(count(&mut m2, "V1"), 1);

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    assert_eq!(result.warning_states(), vec!["01501"]);
}

#[test]
fn test_dependent_does_not_fail_over_to_public() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2", "PUBLIC"]));
    create_view(&mut m2, "V1", view_on_c1());

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    assert_eq!(result.warning_states(), vec!["01501"]);

    // The view can be recreated through PUBLIC, and is then bound to it.
    create_view(&mut m2, "V1", view_on_c1());
    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["PUBLIC"]));
    assert_eq!(result.warning_states(), vec!["01501"]);
}

#[test]
fn test_view_with_column_union_drops_with_either_record() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C1"]))], "T1", &["M2"]));
    exec(&mut m1, grant(vec![PrivilegeType::Select(cols(&["C2"]))], "T1", &["PUBLIC"]));
    create_view(&mut m2, "V1", Query::select(vec![TableRef::columns("M1.T1", &["C1", "C2"])]));

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(cols(&["C2"]))], "T1", &["PUBLIC"]));
    assert_eq!(result.warning_states(), vec!["01501"]);
    assert_eq!(exec_err(&mut m2, select_all("V1")), "42X05");
}

#[test]
fn test_views_built_on_dropped_view_are_dropped() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    let mut m3 = engine.connect("M3");
    exec(&mut m1, grant(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    create_view(&mut m2, "V1", view_on_c1());
    create_view(&mut m2, "V2", Query::select(vec![TableRef::all("V1")]));
    exec(&mut m2, grant(vec![PrivilegeType::Select(None)], "V2", &["M3"]));
    assert_eq!(count(&mut m3, "M2.V2"), 1);

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Select(None)], "T1", &["M2"]));
    let mut states = result.warning_states();
    states.sort_unstable();
    assert_eq!(states, vec!["01501", "01501"]);
    assert!(permissions(&engine).is_empty(), "grants on dropped views go with them");
    assert_eq!(exec_err(&mut m3, select_all("M2.V2")), "42X05");
}

#[test]
fn test_trigger_dropped_when_trigger_privilege_revoked() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    create_plain_table(&mut m2, "LOG", &["N"]);
    exec(&mut m1, grant(vec![PrivilegeType::Trigger], "T1", &["M2"]));
    exec(
        &mut m2,
        Statement::CreateTrigger(CreateTriggerStmt {
            name: "TR".into(),
            table: "M1.T1".into(),
            event: TriggerEvent::Insert,
            actions: vec![ProceduralStatement::Insert(InsertStmt::values(
                "LOG",
                vec![vec![SqlValue::from(1)]],
            ))],
        }),
    );

    exec(&mut m1, insert("T1", &[2, 20, 200]));
    assert_eq!(count(&mut m2, "LOG"), 1);

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Trigger], "T1", &["M2"]));
    assert_eq!(result.warning_states(), vec!["01502"]);
    assert_eq!(result.warnings[0].kind, WarningKind::TriggerDropped);

    exec(&mut m1, insert("T1", &[3, 30, 300]));
    assert_eq!(count(&mut m2, "LOG"), 1);
}

#[test]
fn test_revoking_unused_privilege_keeps_dependents() {
    let (engine, mut m1) = setup_t1();
    let mut m2 = engine.connect("M2");
    exec(&mut m1, grant(vec![PrivilegeType::Select(None), PrivilegeType::Insert], "T1", &["M2"]));
    create_view(&mut m2, "V1", view_on_c1());

    let result = exec(&mut m1, revoke(vec![PrivilegeType::Insert], "T1", &["M2"]));
    assert!(result.warnings.is_empty());
    assert_eq!(count(&mut m2, "V1"), 1);
}
