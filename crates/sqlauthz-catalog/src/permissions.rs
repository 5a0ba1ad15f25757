//! Permission catalog
//!
//! Persistent store of privilege records. A record's identity is
//! `(grantee, grantor, target, kind, level)` where level is table-level or
//! column-level. A table-level record carries its grant option as a flag that a
//! later `WITH GRANT OPTION` grant sets in place. Column-level records are kept
//! apart by grant option (`s` and `S` rows of `SYSCOLPERMS`); further grants to
//! an existing one merge by bitset union. Either way the record id is kept, so
//! objects already bound to the record stay bound.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{ColumnBitset, ObjectRef, PermissionRecord, PermissionRecordId, Principal, PrivilegeKind};

/// Result of adding a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// A new record was created
    Inserted(PermissionRecordId),
    /// New columns were merged into an existing column-level record
    Merged(PermissionRecordId),
    /// An existing table-level record gained the grant option
    Upgraded(PermissionRecordId),
    /// An existing record already covers the grant; nothing changed
    AlreadyCovered(PermissionRecordId),
}

impl GrantOutcome {
    pub fn record_id(&self) -> PermissionRecordId {
        match self {
            GrantOutcome::Inserted(id)
            | GrantOutcome::Merged(id)
            | GrantOutcome::Upgraded(id)
            | GrantOutcome::AlreadyCovered(id) => *id,
        }
    }

    pub fn changed(&self) -> bool {
        !matches!(self, GrantOutcome::AlreadyCovered(_))
    }
}

/// Result of removing a grant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevokeOutcome {
    /// Records deleted outright
    pub removed: Vec<PermissionRecord>,
    /// Column-level records that lost some (not all) columns
    pub narrowed: Vec<PermissionRecordId>,
}

impl RevokeOutcome {
    /// Nothing matched: the revoke was a no-op.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.narrowed.is_empty()
    }

    /// Every record whose dependents must be invalidated.
    pub fn affected(&self) -> Vec<PermissionRecordId> {
        let mut ids: Vec<_> = self.removed.iter().map(|r| r.id).collect();
        ids.extend(self.narrowed.iter().copied());
        ids.sort();
        ids
    }

    pub fn merge(&mut self, other: RevokeOutcome) {
        self.removed.extend(other.removed);
        self.narrowed.extend(other.narrowed);
    }
}

/// Store of every privilege record.
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    records: BTreeMap<PermissionRecordId, PermissionRecord>,
    next_id: u64,
}

impl PermissionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grant. Redundant grants are silent no-ops.
    pub fn grant(
        &mut self,
        grantor: &str,
        grantee: &Principal,
        kind: PrivilegeKind,
        target: ObjectRef,
        columns: Option<&ColumnBitset>,
        with_grant_option: bool,
    ) -> GrantOutcome {
        // Any record of the same level from the same grantor that is at least
        // as strong makes this grant redundant.
        if let Some(existing) = self.records.values().find(|r| {
            r.grantee == *grantee
                && r.grantor == grantor
                && r.target == target
                && r.kind == kind
                && r.columns.is_some() == columns.is_some()
                && (r.with_grant_option || !with_grant_option)
                && r.covers(columns)
        }) {
            return GrantOutcome::AlreadyCovered(existing.id);
        }

        match columns {
            None => {
                if let Some(existing) = self.records.values_mut().find(|r| {
                    r.grantee == *grantee
                        && r.grantor == grantor
                        && r.target == target
                        && r.kind == kind
                        && r.columns.is_none()
                }) {
                    existing.with_grant_option = true;
                    debug!(record = %existing.id, grantee = %grantee, "upgraded to grant option");
                    return GrantOutcome::Upgraded(existing.id);
                }
            }
            Some(requested) => {
                if let Some(existing) = self.records.values_mut().find(|r| {
                    r.grantee == *grantee
                        && r.grantor == grantor
                        && r.target == target
                        && r.kind == kind
                        && r.columns.is_some()
                        && r.with_grant_option == with_grant_option
                }) {
                    let merged = existing.columns.as_ref().map(|c| c.union(requested));
                    existing.columns = merged;
                    debug!(record = %existing.id, grantee = %grantee, "merged column grant");
                    return GrantOutcome::Merged(existing.id);
                }
            }
        }

        self.next_id += 1;
        let id = PermissionRecordId(self.next_id);
        let record = PermissionRecord {
            id,
            grantee: grantee.clone(),
            grantor: grantor.to_string(),
            target,
            kind,
            columns: columns.cloned(),
            with_grant_option,
        };
        debug!(record = %id, grantee = %grantee, kind = %kind, "inserted permission record");
        self.records.insert(id, record);
        GrantOutcome::Inserted(id)
    }

    /// Remove a grant.
    ///
    /// `columns == None` removes table-level records only; column-level records
    /// are independent rows and survive. With a column set, exactly those bits
    /// are removed from each matching column-level record, and a record whose
    /// bitset becomes empty is deleted. `grantor` restricts the revoke to
    /// records granted by that user.
    pub fn revoke(
        &mut self,
        grantee: &Principal,
        kind: PrivilegeKind,
        target: ObjectRef,
        columns: Option<&ColumnBitset>,
        grantor: Option<&str>,
    ) -> RevokeOutcome {
        let mut outcome = RevokeOutcome::default();
        let matching: Vec<PermissionRecordId> = self
            .records
            .values()
            .filter(|r| {
                r.grantee == *grantee
                    && r.target == target
                    && r.kind == kind
                    && r.columns.is_some() == columns.is_some()
                    && grantor.map_or(true, |g| r.grantor == g)
            })
            .map(|r| r.id)
            .collect();

        for id in matching {
            match columns {
                None => {
                    if let Some(record) = self.records.remove(&id) {
                        outcome.removed.push(record);
                    }
                }
                Some(requested) => {
                    let remaining = match self.records.get(&id).and_then(|r| r.columns.as_ref())
                    {
                        Some(granted) if granted.intersects(requested) => {
                            granted.difference(requested)
                        }
                        _ => continue,
                    };
                    if remaining.is_empty() {
                        if let Some(record) = self.records.remove(&id) {
                            outcome.removed.push(record);
                        }
                    } else if let Some(record) = self.records.get_mut(&id) {
                        record.columns = Some(remaining);
                        outcome.narrowed.push(id);
                    }
                }
            }
        }
        outcome
    }

    /// Every record held by `principal` for `kind` on `target`, in id order.
    pub fn lookup(
        &self,
        principal: &Principal,
        target: ObjectRef,
        kind: PrivilegeKind,
    ) -> Vec<&PermissionRecord> {
        self.records
            .values()
            .filter(|r| r.grantee == *principal && r.target == target && r.kind == kind)
            .collect()
    }

    /// Records granted by `grantor` for `kind` on `target`.
    pub fn granted_by(
        &self,
        grantor: &str,
        target: ObjectRef,
        kind: PrivilegeKind,
    ) -> Vec<&PermissionRecord> {
        self.records
            .values()
            .filter(|r| r.grantor == grantor && r.target == target && r.kind == kind)
            .collect()
    }

    pub fn get(&self, id: PermissionRecordId) -> Option<&PermissionRecord> {
        self.records.get(&id)
    }

    /// Replace the column set of a column-level record. Returns false for an
    /// unknown id or a table-level record.
    pub fn narrow(&mut self, id: PermissionRecordId, columns: ColumnBitset) -> bool {
        match self.records.get_mut(&id) {
            Some(record) if record.columns.is_some() => {
                record.columns = Some(columns);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: PermissionRecordId) -> Option<PermissionRecord> {
        self.records.remove(&id)
    }

    /// Records attached to `object` (any kind, any grantee).
    pub fn records_for_object(&self, object: crate::ObjectId) -> Vec<&PermissionRecord> {
        self.records.values().filter(|r| r.target.object_id() == object).collect()
    }

    /// Delete every record attached to `object`; used when the object is dropped.
    pub fn remove_for_object(&mut self, object: crate::ObjectId) -> Vec<PermissionRecord> {
        let ids: Vec<_> = self.records_for_object(object).iter().map(|r| r.id).collect();
        ids.into_iter().filter_map(|id| self.records.remove(&id)).collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &PermissionRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
