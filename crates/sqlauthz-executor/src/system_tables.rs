//! Contents of the `SYS` catalog tables, derived from the catalog on read.

use std::collections::BTreeMap;

use sqlauthz_ast::SqlValue;
use sqlauthz_catalog::{
    Catalog, CatalogObject, ObjectRef, PermissionRecord, Principal, PrivilegeKind, Provider,
};

/// Rows of system table `name`, in the column order it was created with.
pub fn rows(catalog: &Catalog, name: &str) -> Vec<Vec<SqlValue>> {
    let rows = match name {
        "SYSSCHEMAS" => schemas(catalog),
        "SYSTABLES" => tables(catalog),
        "SYSTABLEPERMS" => table_perms(catalog),
        "SYSCOLPERMS" => column_perms(catalog),
        "SYSROUTINEPERMS" => routine_perms(catalog),
        "SYSDEPENDS" => depends(catalog),
        "SYSCONSTRAINTS" => constraints(catalog),
        "SYSROLES" => roles(catalog),
        _ => Vec::new(),
    };
    rows.into_iter().map(|row| row.into_iter().map(SqlValue::Varchar).collect()).collect()
}

fn object_name(catalog: &Catalog, target: ObjectRef) -> String {
    catalog
        .object(target.object_id())
        .map(CatalogObject::qualified_name)
        .unwrap_or_else(|| target.object_id().to_string())
}

fn schemas(catalog: &Catalog) -> Vec<Vec<String>> {
    catalog.schemas().map(|s| vec![s.name.clone(), s.owner.clone()]).collect()
}

fn tables(catalog: &Catalog) -> Vec<Vec<String>> {
    catalog
        .objects()
        .filter_map(|object| {
            let table_type = match object {
                CatalogObject::Table(t) if t.is_system() => "S",
                CatalogObject::Table(_) => "T",
                CatalogObject::View(_) => "V",
                CatalogObject::Synonym(_) => "A",
                _ => return None,
            };
            Some(vec![object.name().to_string(), table_type.to_string(), object.schema().to_string()])
        })
        .collect()
}

/// One row per (grantee, grantor, table); each privilege column is `N`, `y`
/// (granted) or `Y` (granted WITH GRANT OPTION).
fn table_perms(catalog: &Catalog) -> Vec<Vec<String>> {
    let mut grouped: BTreeMap<(Principal, String, ObjectRef), Vec<&PermissionRecord>> = BTreeMap::new();
    for record in catalog.permissions().records() {
        if record.is_table_level() && matches!(record.target, ObjectRef::Table(_)) {
            grouped
                .entry((record.grantee.clone(), record.grantor.clone(), record.target))
                .or_default()
                .push(record);
        }
    }

    grouped
        .into_iter()
        .map(|((grantee, grantor, target), records)| {
            let mut row = vec![grantee.to_string(), grantor, object_name(catalog, target)];
            row.extend(PrivilegeKind::TABLE_KINDS.iter().map(|kind| {
                match records.iter().find(|r| r.kind == *kind) {
                    Some(r) if r.with_grant_option => "Y".to_string(),
                    Some(_) => "y".to_string(),
                    None => "N".to_string(),
                }
            }));
            row
        })
        .collect()
}

fn column_perms(catalog: &Catalog) -> Vec<Vec<String>> {
    catalog
        .permissions()
        .records()
        .filter_map(|record| {
            let columns = record.columns.as_ref()?;
            let code = record.kind.column_code()?;
            let code = if record.with_grant_option { code.to_ascii_uppercase() } else { code };
            Some(vec![
                record.grantee.to_string(),
                record.grantor.clone(),
                object_name(catalog, record.target),
                code.to_string(),
                columns.to_string(),
            ])
        })
        .collect()
}

fn routine_perms(catalog: &Catalog) -> Vec<Vec<String>> {
    catalog
        .permissions()
        .records()
        .filter(|r| matches!(r.target, ObjectRef::Routine { .. }))
        .map(|record| {
            vec![
                record.grantee.to_string(),
                record.grantor.clone(),
                object_name(catalog, record.target),
                if record.with_grant_option { "Y" } else { "N" }.to_string(),
            ]
        })
        .collect()
}

fn depends(catalog: &Catalog) -> Vec<Vec<String>> {
    catalog
        .dependencies()
        .edges()
        .map(|edge| {
            let (provider_id, provider_type) = match edge.provider {
                Provider::Permission(id) => {
                    let kind = match catalog.permissions().get(id) {
                        Some(r) if matches!(r.target, ObjectRef::Routine { .. }) => "ROUTINEPERMS",
                        Some(r) if r.is_table_level() => "TABLEPERMS",
                        Some(_) => "COLPERMS",
                        None => "PERMISSION",
                    };
                    (id.to_string(), kind)
                }
                Provider::Object(id) => {
                    (id.to_string(), catalog.object(id).map(CatalogObject::kind_name).unwrap_or("OBJECT"))
                }
                Provider::Role(id) => (id.to_string(), "ROLE"),
            };
            vec![
                edge.dependent.id.to_string(),
                edge.dependent.kind.name().to_string(),
                provider_id,
                provider_type.to_string(),
            ]
        })
        .collect()
}

/// A definition row per role (`ISDEF` = `Y`, grantee is the creator) followed
/// by one row per role grant.
fn roles(catalog: &Catalog) -> Vec<Vec<String>> {
    let definitions = catalog
        .roles()
        .map(|r| vec![r.name.clone(), r.creator.clone(), catalog.dba().to_string(), "Y".to_string()]);
    let grants = catalog
        .role_grants()
        .map(|g| vec![g.role.clone(), g.grantee.to_string(), g.grantor.clone(), "N".to_string()]);
    definitions.chain(grants).collect()
}

fn constraints(catalog: &Catalog) -> Vec<Vec<String>> {
    catalog
        .objects()
        .filter_map(|object| match object {
            CatalogObject::Constraint(c) => Some(vec![
                c.name.clone(),
                catalog.table(c.table).map(|t| t.name.clone()).unwrap_or_default(),
                c.kind.code().to_string(),
                c.schema.clone(),
            ]),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use sqlauthz_ast::DataType;
    use sqlauthz_catalog::{ColumnBitset, ColumnSchema};

    use super::*;

    fn catalog_with_table() -> (Catalog, ObjectRef) {
        let mut catalog = Catalog::new("DBA");
        catalog.create_schema("U1", "U1").unwrap();
        let columns = vec![
            ColumnSchema::new("C1".to_string(), DataType::Integer, true),
            ColumnSchema::new("C2".to_string(), DataType::Integer, true),
        ];
        let id = catalog.create_table("U1", "T1", columns).unwrap();
        (catalog, ObjectRef::Table(id))
    }

    fn text(rows: Vec<Vec<SqlValue>>) -> Vec<Vec<String>> {
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| match v {
                        SqlValue::Varchar(s) => s,
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_table_perms_flags() {
        let (mut catalog, table) = catalog_with_table();
        let u2 = Principal::user("U2");
        let perms = catalog.permissions_mut();
        perms.grant("U1", &u2, PrivilegeKind::Select, table, None, true);
        perms.grant("U1", &u2, PrivilegeKind::Insert, table, None, false);

        let rows = text(rows(&catalog, "SYSTABLEPERMS"));
        assert_eq!(rows, vec![vec!["U2", "U1", "U1.T1", "Y", "N", "y", "N", "N", "N"]]);
    }

    #[test]
    fn test_column_perms_type_code() {
        let (mut catalog, table) = catalog_with_table();
        let cols = ColumnBitset::from_positions([0, 1]);
        catalog.permissions_mut().grant("U1", &Principal::Public, PrivilegeKind::Select, table, Some(&cols), false);
        catalog.permissions_mut().grant(
            "U1",
            &Principal::user("U2"),
            PrivilegeKind::Update,
            table,
            Some(&ColumnBitset::from_positions([1])),
            true,
        );

        let rows = text(rows(&catalog, "SYSCOLPERMS"));
        assert_eq!(
            rows,
            vec![
                vec!["PUBLIC", "U1", "U1.T1", "s", "{0, 1}"],
                vec!["U2", "U1", "U1.T1", "U", "{1}"],
            ]
        );
    }

    #[test]
    fn test_roles_lists_definitions_then_grants() {
        let (mut catalog, _) = catalog_with_table();
        catalog.create_role("R1", "DBA").unwrap();
        catalog.grant_role("R1", &Principal::Public, "DBA").unwrap();
        assert_eq!(
            text(rows(&catalog, "SYSROLES")),
            vec![vec!["R1", "DBA", "DBA", "Y"], vec!["R1", "PUBLIC", "DBA", "N"]]
        );
    }

    #[test]
    fn test_schemas_lists_owners() {
        let (catalog, _) = catalog_with_table();
        let rows = text(rows(&catalog, "SYSSCHEMAS"));
        assert!(rows.contains(&vec!["U1".to_string(), "U1".to_string()]));
        assert!(rows.contains(&vec!["APP".to_string(), "DBA".to_string()]));
    }
}
