//! Write sets: what a statement or transaction changed.
//!
//! Object, record and role ids are allocated per state, so two transactions
//! started from the same snapshot can hand out the same id to different
//! objects. Keys therefore name what was written instead.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use sqlauthz_catalog::{Catalog, CatalogObject, ColumnBitset, Principal, PrivilegeKind, Provider};

use crate::DatabaseState;

/// One unit of contention between writers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriteKey {
    Schema(String),
    /// A table, view, trigger, routine, constraint or synonym, by qualified
    /// name
    Object(String),
    /// The permission records on an object
    Privileges(String),
    /// The rows of a base table
    Rows(String),
    /// A role and its grants
    Role(String),
}

impl fmt::Display for WriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteKey::Schema(name) => write!(f, "schema {}", name),
            WriteKey::Object(name) => write!(f, "object {}", name),
            WriteKey::Privileges(name) => write!(f, "privileges on {}", name),
            WriteKey::Rows(name) => write!(f, "rows of {}", name),
            WriteKey::Role(name) => write!(f, "role {}", name),
        }
    }
}

/// Every key one state differs from another in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    keys: BTreeSet<WriteKey>,
}

/// A permission record without its id.
type RecordShape<'a> = (&'a Principal, &'a str, PrivilegeKind, Option<&'a ColumnBitset>, bool);

impl WriteSet {
    /// Keys written going from `base` to `working`.
    pub fn between(base: &DatabaseState, working: &DatabaseState) -> Self {
        let mut keys = BTreeSet::new();
        let (before, after) = (&base.catalog, &working.catalog);

        let schemas: BTreeSet<&str> =
            before.schemas().chain(after.schemas()).map(|s| s.name.as_str()).collect();
        for name in schemas {
            if before.schema(name) != after.schema(name) {
                keys.insert(WriteKey::Schema(name.to_string()));
            }
        }

        let objects_before = objects_by_name(before);
        let objects_after = objects_by_name(after);
        keys.extend(changed(&objects_before, &objects_after).map(|(name, _)| WriteKey::Object(name.clone())));

        let records_before = records_by_object(before);
        let records_after = records_by_object(after);
        keys.extend(changed(&records_before, &records_after).map(|name| WriteKey::Privileges(name.clone())));

        let edges_before = edges_by_name(before);
        let edges_after = edges_by_name(after);
        for (dependent, provider) in edges_before.symmetric_difference(&edges_after) {
            keys.insert(WriteKey::Object(dependent.clone()));
            keys.insert(provider.clone());
        }

        let rows_before = rows_by_table(base);
        let rows_after = rows_by_table(working);
        keys.extend(changed(&rows_before, &rows_after).map(|name| WriteKey::Rows(name.clone())));

        let roles: BTreeSet<&str> =
            before.roles().chain(after.roles()).map(|r| r.name.as_str()).collect();
        for name in roles {
            let creator = |c: &Catalog| c.role(name).map(|r| r.creator.clone());
            if creator(before) != creator(after) {
                keys.insert(WriteKey::Role(name.to_string()));
            }
        }
        let grants_before: BTreeSet<_> = before.role_grants().map(|g| (&g.role, &g.grantee)).collect();
        let grants_after: BTreeSet<_> = after.role_grants().map(|g| (&g.role, &g.grantee)).collect();
        for (role, grantee) in grants_before.symmetric_difference(&grants_after) {
            keys.insert(WriteKey::Role(role.to_string()));
            if let Principal::Role(inheritor) = grantee {
                keys.insert(WriteKey::Role(inheritor.clone()));
            }
        }

        WriteSet { keys }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &WriteKey) -> bool {
        self.keys.contains(key)
    }

    /// First key written by both sets.
    pub fn overlap<'a>(&'a self, other: &'a WriteSet) -> Option<&'a WriteKey> {
        self.keys.intersection(&other.keys).next()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Entries present on only one side, or different on each.
fn changed<'m, K: Ord, V: PartialEq>(
    before: &'m BTreeMap<K, V>,
    after: &'m BTreeMap<K, V>,
) -> impl Iterator<Item = &'m K> {
    let removed = before.iter().filter(move |(k, v)| after.get(*k) != Some(*v)).map(|(k, _)| k);
    let added = after.iter().filter(move |(k, _)| !before.contains_key(*k)).map(|(k, _)| k);
    removed.chain(added)
}

fn objects_by_name(catalog: &Catalog) -> BTreeMap<(String, &'static str), &CatalogObject> {
    catalog.objects().map(|o| ((o.qualified_name(), o.kind_name()), o)).collect()
}

fn object_name(catalog: &Catalog, id: sqlauthz_catalog::ObjectId) -> Option<String> {
    catalog.object(id).map(CatalogObject::qualified_name)
}

fn records_by_object(catalog: &Catalog) -> BTreeMap<String, Vec<RecordShape<'_>>> {
    let mut grouped: BTreeMap<String, Vec<RecordShape<'_>>> = BTreeMap::new();
    for record in catalog.permissions().records() {
        let Some(name) = object_name(catalog, record.target.object_id()) else { continue };
        grouped.entry(name).or_default().push((
            &record.grantee,
            record.grantor.as_str(),
            record.kind,
            record.columns.as_ref(),
            record.with_grant_option,
        ));
    }
    grouped
}

/// Dependency edges with both ends named: the dependent's qualified name and
/// the key its provider lives under.
fn edges_by_name(catalog: &Catalog) -> BTreeSet<(String, WriteKey)> {
    catalog
        .dependencies()
        .edges()
        .filter_map(|edge| {
            let dependent = object_name(catalog, edge.dependent.id)?;
            let provider = match edge.provider {
                Provider::Permission(id) => {
                    let record = catalog.permissions().get(id)?;
                    WriteKey::Privileges(object_name(catalog, record.target.object_id())?)
                }
                Provider::Object(id) => WriteKey::Object(object_name(catalog, id)?),
                Provider::Role(id) => {
                    WriteKey::Role(catalog.roles().find(|r| r.id == id)?.name.clone())
                }
            };
            Some((dependent, provider))
        })
        .collect()
}

fn rows_by_table(state: &DatabaseState) -> BTreeMap<String, &[crate::Row]> {
    state
        .table_rows()
        .filter_map(|(id, rows)| Some((object_name(&state.catalog, id)?, rows)))
        .collect()
}
