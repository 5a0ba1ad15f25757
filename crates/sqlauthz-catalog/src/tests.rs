use rstest::rstest;
use sqlauthz_ast::{CompareOp, DataType, Query, RoutineKind, SqlValue, TriggerEvent};

use super::*;

fn catalog_with_table() -> (Catalog, ObjectId) {
    let mut catalog = Catalog::new("DBA");
    catalog.create_schema("M1", "M1").unwrap();
    let columns = ["A", "B", "C"]
        .iter()
        .map(|c| ColumnSchema::new(c.to_string(), DataType::Integer, true))
        .collect();
    let table = catalog.create_table("M1", "T1", columns).unwrap();
    (catalog, table)
}

fn view_on(catalog: &mut Catalog, name: &str, table: ObjectId) -> ObjectId {
    let view = catalog.create_view("M1", name, vec!["A".to_string()], Query::default()).unwrap();
    catalog.dependencies_mut().register(Dependent::new(view, DependentKind::View), Provider::Object(table));
    view
}

#[test]
fn test_bootstrap_creates_system_objects() {
    let catalog = Catalog::new("ADMIN");
    assert_eq!(catalog.dba(), "ADMIN");
    assert!(catalog.schema(SYSTEM_SCHEMA).unwrap().system);
    assert_eq!(catalog.schema_owner(DEFAULT_SCHEMA).unwrap(), "ADMIN");
    assert!(catalog.find_table(SYSTEM_SCHEMA, "SYSTABLEPERMS").unwrap().is_system());
    assert!(catalog
        .lookup_routine(SYSTEM_PROCEDURE_SCHEMA, "SYSCS_EXPORT_TABLE", RoutineKind::Procedure)
        .is_some_and(|r| r.system));
}

#[test]
fn test_objects_are_owned_by_schema_owner() {
    let (catalog, table) = catalog_with_table();
    assert_eq!(catalog.owner_of(table), Some("M1"));
}

#[test]
fn test_relation_namespace_is_shared() {
    let (mut catalog, _) = catalog_with_table();
    let err = catalog.create_view("M1", "T1", vec![], Query::default()).unwrap_err();
    assert_eq!(err.sql_state(), "X0Y32");
    catalog.create_synonym("M1", "S1", "M1.OTHER".into()).unwrap();
    let err = catalog.create_table("M1", "S1", vec![]).unwrap_err();
    assert_eq!(err.sql_state(), "X0Y32");
}

#[test]
fn test_functions_and_procedures_have_separate_namespaces() {
    let (mut catalog, _) = catalog_with_table();
    catalog.create_routine("M1", "F", RoutineKind::Function, vec![]).unwrap();
    catalog.create_routine("M1", "F", RoutineKind::Procedure, vec![]).unwrap();
    assert!(catalog.create_routine("M1", "F", RoutineKind::Function, vec![]).is_err());
}

#[rstest]
#[case(SYSTEM_SCHEMA)]
#[case(SYSTEM_FUNCTION_SCHEMA)]
#[case(SYSTEM_PROCEDURE_SCHEMA)]
fn test_ddl_in_system_schema_rejected(#[case] schema: &str) {
    let mut catalog = Catalog::new("DBA");
    let err = catalog.create_table(schema, "X", vec![]).unwrap_err();
    assert_eq!(err.sql_state(), "42X62");
    let err = catalog.create_routine(schema, "F", RoutineKind::Function, vec![]).unwrap_err();
    assert_eq!(err.sql_state(), "42X62");
}

#[test]
fn test_add_column_keeps_column_bitsets() {
    let (mut catalog, table) = catalog_with_table();
    let user = Principal::user("u1");
    let target = ObjectRef::Table(table);
    let record = catalog
        .permissions_mut()
        .grant("M1", &user, PrivilegeKind::Select, target, Some(&ColumnBitset::from_positions([1])), false)
        .record_id();

    catalog.add_column(table, ColumnSchema::new("D".to_string(), DataType::Varchar, true)).unwrap();
    assert_eq!(catalog.table(table).unwrap().column_index("D"), Some(3));
    assert_eq!(
        catalog.permissions().get(record).unwrap().columns,
        Some(ColumnBitset::from_positions([1]))
    );
}

#[test]
fn test_constraints_share_conglomerate() {
    let (mut catalog, table) = catalog_with_table();
    let pk = catalog
        .add_constraint("M1", Some("PK"), table, ConstraintKind::PrimaryKey { columns: vec![0] })
        .unwrap();
    let uq = catalog
        .add_constraint("M1", None, table, ConstraintKind::Unique { columns: vec![0] })
        .unwrap();
    let shared = catalog.constraint(pk).unwrap().conglomerate.unwrap();
    assert_eq!(catalog.constraint(uq).unwrap().conglomerate, Some(shared));
    assert!(catalog.constraint(uq).unwrap().name.starts_with("SQL"));

    catalog.drop_constraint(uq).unwrap();
    assert!(catalog.conglomerate(shared).is_some());
    catalog.drop_constraint(pk).unwrap();
    assert!(catalog.conglomerate(shared).is_none());
}

#[test]
fn test_foreign_key_requires_parent_key() {
    let (mut catalog, parent) = catalog_with_table();
    let child = catalog
        .create_table("M1", "CHILD", vec![ColumnSchema::new("P".to_string(), DataType::Integer, true)])
        .unwrap();
    let fk = ConstraintKind::ForeignKey { columns: vec![0], parent, parent_columns: vec![0] };
    let err = catalog.add_constraint("M1", None, child, fk.clone()).unwrap_err();
    assert_eq!(err.sql_state(), "X0Y44");

    let pk = catalog
        .add_constraint("M1", None, parent, ConstraintKind::PrimaryKey { columns: vec![0] })
        .unwrap();
    catalog.add_constraint("M1", Some("FK"), child, fk).unwrap();

    assert_eq!(catalog.drop_constraint(pk).unwrap_err().sql_state(), "X0Y23");
    assert_eq!(catalog.drop_table(parent).unwrap_err().sql_state(), "X0Y23");
}

#[test]
fn test_drop_table_restrict_and_cleanup() {
    let (mut catalog, table) = catalog_with_table();
    let view = view_on(&mut catalog, "V1", table);
    let err = catalog.drop_table(table).unwrap_err();
    assert!(matches!(err, CatalogError::ObjectInUse { dependent_kind: "VIEW", .. }));

    catalog.drop_view(view).unwrap();
    let trigger = catalog
        .create_trigger("M1", "TR", table, TriggerEvent::Insert, vec![], vec![])
        .unwrap();
    catalog
        .dependencies_mut()
        .register(Dependent::new(trigger, DependentKind::Trigger), Provider::Object(table));
    catalog.add_constraint(
        "M1",
        Some("CK"),
        table,
        ConstraintKind::Check { column: 0, op: CompareOp::Gt, value: SqlValue::Integer(0), routines: vec![] },
    )
    .unwrap();
    catalog.permissions_mut().grant(
        "M1",
        &Principal::Public,
        PrivilegeKind::Select,
        ObjectRef::Table(table),
        None,
        false,
    );

    catalog.drop_table(table).unwrap();
    assert!(catalog.lookup_relation("M1", "T1").is_none());
    assert!(catalog.trigger(trigger).is_none());
    assert!(catalog.lookup_constraint("M1", "CK").is_none());
    assert!(catalog.permissions().is_empty());
    assert!(catalog.dependencies().is_empty());
}

#[test]
fn test_invalidate_record_drops_views_transitively() {
    let (mut catalog, table) = catalog_with_table();
    let record = catalog
        .permissions_mut()
        .grant("M1", &Principal::user("U2"), PrivilegeKind::Select, ObjectRef::Table(table), None, false)
        .record_id();
    catalog.create_schema("U2", "U2").unwrap();
    let v1 = catalog.create_view("U2", "V1", vec!["A".to_string()], Query::default()).unwrap();
    catalog.dependencies_mut().register(Dependent::new(v1, DependentKind::View), Provider::Permission(record));
    let v2 = catalog.create_view("U2", "V2", vec!["A".to_string()], Query::default()).unwrap();
    catalog.dependencies_mut().register(Dependent::new(v2, DependentKind::View), Provider::Object(v1));

    let dropped = catalog.invalidate_record(record);
    let names: Vec<_> = dropped.iter().map(|d| d.qualified_name()).collect();
    assert_eq!(names, vec!["U2.V1", "U2.V2"]);
    assert!(catalog.lookup_relation("U2", "V1").is_none());
    assert!(catalog.view(v2).is_none());
}

#[test]
fn test_drop_schema_requires_empty() {
    let (mut catalog, table) = catalog_with_table();
    assert_eq!(catalog.drop_schema("M1").unwrap_err().sql_state(), "X0Y54");
    catalog.drop_table(table).unwrap();
    catalog.drop_schema("M1").unwrap();
    assert!(catalog.schema("M1").is_none());
}

#[rstest]
#[case::public("PUBLIC", "4251B")]
#[case::none("NONE", "4251B")]
#[case::system_prefix("SYSADMIN", "4293A")]
#[case::dba("DBA", "X0Y68")]
fn test_reserved_role_names(#[case] name: &str, #[case] sql_state: &str) {
    let mut catalog = Catalog::new("DBA");
    assert_eq!(catalog.create_role(name, "DBA").unwrap_err().sql_state(), sql_state);
    assert_eq!(catalog.roles().count(), 0);
}

#[test]
fn test_role_grants_form_acyclic_graph() {
    let mut catalog = Catalog::new("DBA");
    for role in ["A", "B", "C"] {
        catalog.create_role(role, "DBA").unwrap();
    }
    assert_eq!(catalog.create_role("A", "DBA").unwrap_err().sql_state(), "X0Y68");

    // C inherits B, B inherits A
    assert!(catalog.grant_role("A", &Principal::Role("B".into()), "DBA").unwrap());
    assert!(catalog.grant_role("B", &Principal::Role("C".into()), "DBA").unwrap());
    assert!(!catalog.grant_role("A", &Principal::Role("B".into()), "DBA").unwrap());
    assert_eq!(
        catalog.role_closure("C").into_iter().collect::<Vec<_>>(),
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    );

    let err = catalog.grant_role("C", &Principal::Role("A".into()), "DBA").unwrap_err();
    assert_eq!(err.sql_state(), "4251C");
    assert_eq!(catalog.grant_role("A", &Principal::Role("A".into()), "DBA").unwrap_err().sql_state(), "4251C");
    assert_eq!(catalog.grant_role("Z", &Principal::user("U1"), "DBA").unwrap_err().sql_state(), "0P000");
}

#[test]
fn test_role_settable_through_user_or_public_grant() {
    let mut catalog = Catalog::new("DBA");
    catalog.create_role("R1", "DBA").unwrap();
    catalog.create_role("R2", "DBA").unwrap();
    catalog.grant_role("R1", &Principal::user("U1"), "DBA").unwrap();
    catalog.grant_role("R1", &Principal::Role("R2".into()), "DBA").unwrap();

    assert!(catalog.role_settable("R1", "U1"));
    assert!(!catalog.role_settable("R2", "U1"));
    assert!(catalog.role_settable("R2", "DBA"));
    assert!(!catalog.role_settable("MISSING", "DBA"));

    catalog.grant_role("R2", &Principal::Public, "DBA").unwrap();
    assert!(catalog.role_settable("R2", "U1"));
}

#[test]
fn test_revoke_role_drops_dependents_of_inheriting_roles() {
    let (mut catalog, _) = catalog_with_table();
    let a = catalog.create_role("A", "DBA").unwrap();
    let h = catalog.create_role("H", "DBA").unwrap();
    catalog.grant_role("A", &Principal::Role("H".into()), "DBA").unwrap();
    catalog.grant_role("H", &Principal::user("M1"), "DBA").unwrap();
    let v1 = catalog.create_view("M1", "V1", vec!["A".to_string()], Query::default()).unwrap();
    catalog.dependencies_mut().register(Dependent::new(v1, DependentKind::View), Provider::Role(h));
    let v2 = catalog.create_view("M1", "V2", vec!["A".to_string()], Query::default()).unwrap();
    catalog.dependencies_mut().register(Dependent::new(v2, DependentKind::View), Provider::Role(a));
    assert_eq!(catalog.compiled_role(v1), Some("H"));

    assert!(catalog.revoke_role("A", &Principal::user("M1")).unwrap().is_none());

    let dropped = catalog.revoke_role("A", &Principal::Role("H".into())).unwrap().unwrap();
    let mut names: Vec<_> = dropped.iter().map(|d| d.qualified_name()).collect();
    names.sort();
    assert_eq!(names, vec!["M1.V1", "M1.V2"]);
    assert!(catalog.role_settable("H", "M1"));
}

#[test]
fn test_drop_role_removes_records_and_grants() {
    let (mut catalog, table) = catalog_with_table();
    catalog.create_role("R1", "DBA").unwrap();
    catalog.create_role("R2", "DBA").unwrap();
    catalog.grant_role("R1", &Principal::user("U1"), "DBA").unwrap();
    catalog.grant_role("R2", &Principal::Role("R1".into()), "DBA").unwrap();
    let record = catalog
        .permissions_mut()
        .grant("M1", &Principal::Role("R1".into()), PrivilegeKind::Select, ObjectRef::Table(table), None, false)
        .record_id();
    catalog.create_schema("U1", "U1").unwrap();
    let view = catalog.create_view("U1", "V1", vec!["A".to_string()], Query::default()).unwrap();
    catalog.dependencies_mut().register(Dependent::new(view, DependentKind::View), Provider::Permission(record));

    let dropped = catalog.drop_role("R1").unwrap();
    assert_eq!(dropped.iter().map(|d| d.qualified_name()).collect::<Vec<_>>(), vec!["U1.V1"]);
    assert!(catalog.permissions().is_empty());
    assert_eq!(catalog.role_grants().count(), 0);
    assert!(catalog.role("R1").is_none());
    assert_eq!(catalog.drop_role("R1").unwrap_err().sql_state(), "0P000");
}
