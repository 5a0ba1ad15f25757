//! Permission records
//!
//! One record tracks one privilege kind granted by one grantor to one grantee on
//! one table or routine, either at table level (`columns == None`) or for a set
//! of columns. Table-level and column-level records are independent rows.

use std::fmt;

use roaring::RoaringBitmap;
use sqlauthz_ast::RoutineKind;

use crate::{ObjectId, PermissionRecordId, Principal};

/// Kinds of privilege a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrivilegeKind {
    Select,
    Insert,
    Update,
    Delete,
    References,
    Trigger,
    Execute,
}

impl PrivilegeKind {
    /// Privileges that apply to tables and views, in catalog column order.
    pub const TABLE_KINDS: [PrivilegeKind; 6] = [
        PrivilegeKind::Select,
        PrivilegeKind::Delete,
        PrivilegeKind::Insert,
        PrivilegeKind::Update,
        PrivilegeKind::References,
        PrivilegeKind::Trigger,
    ];

    /// Whether records of this kind may be restricted to a column set.
    pub fn allows_columns(self) -> bool {
        match self {
            PrivilegeKind::Select | PrivilegeKind::Update | PrivilegeKind::References => true,
            PrivilegeKind::Insert
            | PrivilegeKind::Delete
            | PrivilegeKind::Trigger
            | PrivilegeKind::Execute => false,
        }
    }

    pub fn applies_to_routines(self) -> bool {
        matches!(self, PrivilegeKind::Execute)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrivilegeKind::Select => "SELECT",
            PrivilegeKind::Insert => "INSERT",
            PrivilegeKind::Update => "UPDATE",
            PrivilegeKind::Delete => "DELETE",
            PrivilegeKind::References => "REFERENCES",
            PrivilegeKind::Trigger => "TRIGGER",
            PrivilegeKind::Execute => "EXECUTE",
        }
    }

    /// One-letter code used in `SYSCOLPERMS.TYPE`.
    pub fn column_code(self) -> Option<char> {
        match self {
            PrivilegeKind::Select => Some('s'),
            PrivilegeKind::Update => Some('u'),
            PrivilegeKind::References => Some('r'),
            _ => None,
        }
    }
}

impl fmt::Display for PrivilegeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of column ordinal positions within one table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnBitset(RoaringBitmap);

impl ColumnBitset {
    pub fn new() -> Self {
        ColumnBitset(RoaringBitmap::new())
    }

    pub fn from_positions<I: IntoIterator<Item = usize>>(positions: I) -> Self {
        ColumnBitset(positions.into_iter().map(|p| p as u32).collect())
    }

    pub fn insert(&mut self, position: usize) {
        self.0.insert(position as u32);
    }

    pub fn contains(&self, position: usize) -> bool {
        self.0.contains(position as u32)
    }

    /// Every column of `other` is also in `self`.
    pub fn covers(&self, other: &ColumnBitset) -> bool {
        other.0.is_subset(&self.0)
    }

    pub fn intersects(&self, other: &ColumnBitset) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    pub fn union(&self, other: &ColumnBitset) -> ColumnBitset {
        ColumnBitset(&self.0 | &other.0)
    }

    pub fn intersection(&self, other: &ColumnBitset) -> ColumnBitset {
        ColumnBitset(&self.0 & &other.0)
    }

    pub fn difference(&self, other: &ColumnBitset) -> ColumnBitset {
        ColumnBitset(&self.0 - &other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len() as usize
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|p| p as usize)
    }
}

impl fmt::Display for ColumnBitset {
    /// Rendered as `{0, 2}`, the format of `SYSCOLPERMS.COLUMNS`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positions: Vec<String> = self.positions().map(|p| p.to_string()).collect();
        write!(f, "{{{}}}", positions.join(", "))
    }
}

/// Object a permission record is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectRef {
    /// Base table or view
    Table(ObjectId),
    Routine { id: ObjectId, kind: RoutineKind },
}

impl ObjectRef {
    pub fn object_id(&self) -> ObjectId {
        match self {
            ObjectRef::Table(id) => *id,
            ObjectRef::Routine { id, .. } => *id,
        }
    }
}

/// A persisted grant.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionRecord {
    pub id: PermissionRecordId,
    pub grantee: Principal,
    pub grantor: String,
    pub target: ObjectRef,
    pub kind: PrivilegeKind,
    /// `None` for a table-level (or routine) record
    pub columns: Option<ColumnBitset>,
    /// Whether the grantee may grant this privilege to others
    pub with_grant_option: bool,
}

impl PermissionRecord {
    pub fn is_table_level(&self) -> bool {
        self.columns.is_none()
    }

    /// Whether this record alone satisfies a request for `columns`
    /// (`None` = table-level request).
    pub fn covers(&self, columns: Option<&ColumnBitset>) -> bool {
        match (&self.columns, columns) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(granted), Some(requested)) => granted.covers(requested),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_cover_and_difference() {
        let granted = ColumnBitset::from_positions([0, 1]);
        assert!(granted.covers(&ColumnBitset::from_positions([0])));
        assert!(!granted.covers(&ColumnBitset::from_positions([0, 2])));

        let remaining = granted.difference(&ColumnBitset::from_positions([0]));
        assert_eq!(remaining, ColumnBitset::from_positions([1]));
        assert_eq!(remaining.to_string(), "{1}");
        assert!(granted.difference(&granted).is_empty());
    }

    #[test]
    fn test_table_level_record_covers_any_columns() {
        let record = PermissionRecord {
            id: PermissionRecordId(1),
            grantee: Principal::Public,
            grantor: "DBA".to_string(),
            target: ObjectRef::Table(ObjectId(1)),
            kind: PrivilegeKind::Select,
            columns: None,
            with_grant_option: false,
        };
        assert!(record.covers(None));
        assert!(record.covers(Some(&ColumnBitset::from_positions([7]))));
    }

    #[test]
    fn test_column_record_does_not_cover_table_request() {
        let record = PermissionRecord {
            id: PermissionRecordId(1),
            grantee: Principal::user("u1"),
            grantor: "DBA".to_string(),
            target: ObjectRef::Table(ObjectId(1)),
            kind: PrivilegeKind::Select,
            columns: Some(ColumnBitset::from_positions([0])),
            with_grant_option: false,
        };
        assert!(!record.covers(None));
        assert!(record.covers(Some(&ColumnBitset::from_positions([0]))));
    }
}
