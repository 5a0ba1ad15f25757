//! Dependency graph
//!
//! Edges run from a dependent (view, constraint, trigger) to a provider: either
//! the exact permission record that satisfied one of its privilege checks at
//! compile time, or another catalog object it was built on. Invalidation is
//! exact-record based: revoking record R reaches only the dependents bound to R,
//! whatever other records the same grantee holds.
//!
//! Both directions are indexed by id so a drop never chases object references.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::{ObjectId, PermissionRecordId, RoleId};

/// What kind of compiled object a dependent is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependentKind {
    View,
    Constraint,
    Trigger,
}

impl DependentKind {
    pub fn name(self) -> &'static str {
        match self {
            DependentKind::View => "VIEW",
            DependentKind::Constraint => "CONSTRAINT",
            DependentKind::Trigger => "TRIGGER",
        }
    }
}

/// A compiled object that can be invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dependent {
    pub id: ObjectId,
    pub kind: DependentKind,
}

impl Dependent {
    pub fn new(id: ObjectId, kind: DependentKind) -> Self {
        Dependent { id, kind }
    }
}

/// Something a dependent requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provider {
    Permission(PermissionRecordId),
    Object(ObjectId),
    /// The current role a dependent was compiled under
    Role(RoleId),
}

/// One edge, as listed by `SYSDEPENDS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub dependent: Dependent,
    pub provider: Provider,
}

#[derive(Debug, Clone)]
struct DependentEntry {
    kind: DependentKind,
    providers: BTreeSet<Provider>,
}

/// Edges between dependents and the records/objects they require.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    by_dependent: BTreeMap<ObjectId, DependentEntry>,
    by_provider: BTreeMap<Provider, BTreeSet<ObjectId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` requires `provider`.
    pub fn register(&mut self, dependent: Dependent, provider: Provider) {
        self.by_dependent
            .entry(dependent.id)
            .or_insert_with(|| DependentEntry { kind: dependent.kind, providers: BTreeSet::new() })
            .providers
            .insert(provider);
        self.by_provider.entry(provider).or_default().insert(dependent.id);
    }

    /// Remove and return every dependent bound to `record`, transitively.
    ///
    /// A returned view takes down everything built on it; the edges of every
    /// returned dependent are removed. The caller drops the objects themselves.
    pub fn invalidate(&mut self, record: PermissionRecordId) -> Vec<Dependent> {
        self.invalidate_provider(Provider::Permission(record))
    }

    /// Remove and return every dependent built on `object`, transitively.
    pub fn invalidate_object(&mut self, object: ObjectId) -> Vec<Dependent> {
        self.invalidate_provider(Provider::Object(object))
    }

    /// Remove and return every dependent compiled under `role`, transitively.
    pub fn invalidate_role(&mut self, role: RoleId) -> Vec<Dependent> {
        self.invalidate_provider(Provider::Role(role))
    }

    fn invalidate_provider(&mut self, provider: Provider) -> Vec<Dependent> {
        let mut invalidated = Vec::new();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([provider]);

        while let Some(provider) = queue.pop_front() {
            let Some(dependents) = self.by_provider.remove(&provider) else { continue };
            for id in dependents {
                if !seen.insert(id) {
                    continue;
                }
                let Some(kind) = self.by_dependent.get(&id).map(|e| e.kind) else { continue };
                self.remove_dependent_edges(id);
                debug!(dependent = %id, ?kind, ?provider, "invalidated dependent");
                invalidated.push(Dependent::new(id, kind));
                queue.push_back(Provider::Object(id));
            }
        }
        invalidated
    }

    /// Remove every edge touching `object`, as dependent or as provider.
    pub fn drop_object(&mut self, object: ObjectId) {
        self.remove_dependent_edges(object);
        if let Some(dependents) = self.by_provider.remove(&Provider::Object(object)) {
            for id in dependents {
                if let Some(entry) = self.by_dependent.get_mut(&id) {
                    entry.providers.remove(&Provider::Object(object));
                }
            }
        }
    }

    /// Remove every edge pointing at `record` without touching the dependents.
    pub fn forget_permission(&mut self, record: PermissionRecordId) {
        let provider = Provider::Permission(record);
        if let Some(dependents) = self.by_provider.remove(&provider) {
            for id in dependents {
                if let Some(entry) = self.by_dependent.get_mut(&id) {
                    entry.providers.remove(&provider);
                }
            }
        }
    }

    fn remove_dependent_edges(&mut self, dependent: ObjectId) {
        let Some(entry) = self.by_dependent.remove(&dependent) else { return };
        for provider in entry.providers {
            if let Some(set) = self.by_provider.get_mut(&provider) {
                set.remove(&dependent);
                if set.is_empty() {
                    self.by_provider.remove(&provider);
                }
            }
        }
    }

    /// Dependents bound directly to `provider`.
    pub fn dependents_of(&self, provider: Provider) -> Vec<Dependent> {
        self.by_provider
            .get(&provider)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_dependent.get(id).map(|e| Dependent::new(*id, e.kind)))
            .collect()
    }

    /// Providers required by `dependent`.
    pub fn providers_of(&self, dependent: ObjectId) -> Vec<Provider> {
        self.by_dependent
            .get(&dependent)
            .map(|e| e.providers.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn edges(&self) -> impl Iterator<Item = DependencyEdge> + '_ {
        self.by_dependent.iter().flat_map(|(id, entry)| {
            entry.providers.iter().map(move |provider| DependencyEdge {
                dependent: Dependent::new(*id, entry.kind),
                provider: *provider,
            })
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_dependent.is_empty()
    }
}
