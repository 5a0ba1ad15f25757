//! Constraint management and conglomerate sharing.
//!
//! Key constraints (primary key, unique, foreign key) are backed by a
//! conglomerate. Constraints with identical columns on the same table share
//! one; it is released when its last user is dropped.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    errors::CatalogError, store::CatalogObject, Conglomerate, ConglomerateId,
    ConstraintDefinition, ConstraintKind, ObjectId,
};

impl super::Catalog {
    /// Store a constraint on `table`. Unnamed constraints get a generated
    /// `SQL<n>` name. The caller registers dependency edges.
    pub fn add_constraint(
        &mut self,
        schema: &str,
        name: Option<&str>,
        table: ObjectId,
        kind: ConstraintKind,
    ) -> Result<ObjectId, CatalogError> {
        self.check_user_schema(schema, "ADD CONSTRAINT")?;
        let table_name = self
            .table(table)
            .map(|t| t.qualified_name())
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))?;

        let id = self.allocate_object_id();
        let name = name.map(str::to_string).unwrap_or_else(|| format!("SQL{:06}", id.0));
        let key = (schema.to_string(), name.clone());
        if self.constraints.contains_key(&key) {
            return Err(CatalogError::ObjectAlreadyExists {
                kind: "CONSTRAINT",
                name,
                schema: schema.to_string(),
            });
        }

        match &kind {
            ConstraintKind::PrimaryKey { .. } if self.primary_key_of(table).is_some() => {
                return Err(CatalogError::DuplicatePrimaryKey(table_name));
            }
            ConstraintKind::ForeignKey { parent, parent_columns, .. } => {
                if !self.has_unique_key(*parent, parent_columns) {
                    let parent = self.table(*parent).map(|t| t.qualified_name()).unwrap_or_default();
                    return Err(CatalogError::InvalidForeignKey { constraint: name, parent });
                }
            }
            _ => {}
        }

        let conglomerate = kind.key_columns().map(|columns| self.attach_conglomerate(table, columns, id));
        let constraint = ConstraintDefinition {
            id,
            schema: schema.to_string(),
            name: name.clone(),
            table,
            kind,
            conglomerate,
        };
        self.constraints.insert(key, id);
        self.objects.insert(id, CatalogObject::Constraint(constraint));
        debug!(constraint = %id, name = %name, table = %table, ?conglomerate, "added constraint");
        Ok(id)
    }

    fn attach_conglomerate(&mut self, table: ObjectId, columns: &[usize], user: ObjectId) -> ConglomerateId {
        if let Some(shared) =
            self.conglomerates.values_mut().find(|c| c.table == table && c.columns == columns)
        {
            shared.users.insert(user);
            return shared.id;
        }
        let id = self.allocate_conglomerate_id();
        self.conglomerates.insert(
            id,
            Conglomerate { id, table, columns: columns.to_vec(), users: BTreeSet::from([user]) },
        );
        id
    }

    /// Detach `user` from its conglomerate, freeing it when nobody is left.
    pub(crate) fn release_conglomerate(&mut self, id: ConglomerateId, user: ObjectId) {
        let emptied = match self.conglomerates.get_mut(&id) {
            Some(conglomerate) => {
                conglomerate.users.remove(&user);
                conglomerate.users.is_empty()
            }
            None => false,
        };
        if emptied {
            self.conglomerates.remove(&id);
            debug!(conglomerate = %id, "deallocated conglomerate");
        }
    }

    pub fn constraint(&self, id: ObjectId) -> Option<&ConstraintDefinition> {
        match self.objects.get(&id) {
            Some(CatalogObject::Constraint(constraint)) => Some(constraint),
            _ => None,
        }
    }

    pub fn lookup_constraint(&self, schema: &str, name: &str) -> Option<&ConstraintDefinition> {
        let id = self.constraints.get(&(schema.to_string(), name.to_string()))?;
        self.constraint(*id)
    }

    /// Constraints declared on `table`.
    pub fn constraints_on(&self, table: ObjectId) -> Vec<&ConstraintDefinition> {
        self.objects
            .values()
            .filter_map(|o| match o {
                CatalogObject::Constraint(c) if c.table == table => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Foreign keys whose parent is `table`.
    pub fn foreign_keys_referencing(&self, table: ObjectId) -> Vec<&ConstraintDefinition> {
        self.objects
            .values()
            .filter_map(|o| match o {
                CatalogObject::Constraint(c)
                    if matches!(c.kind, ConstraintKind::ForeignKey { parent, .. } if parent == table) =>
                {
                    Some(c)
                }
                _ => None,
            })
            .collect()
    }

    pub fn primary_key_of(&self, table: ObjectId) -> Option<&ConstraintDefinition> {
        self.constraints_on(table)
            .into_iter()
            .find(|c| matches!(c.kind, ConstraintKind::PrimaryKey { .. }))
    }

    /// Whether `table` has a primary key or unique constraint on exactly `columns`.
    pub fn has_unique_key(&self, table: ObjectId, columns: &[usize]) -> bool {
        let wanted: BTreeSet<_> = columns.iter().collect();
        self.constraints_on(table).iter().any(|c| match &c.kind {
            ConstraintKind::PrimaryKey { columns } | ConstraintKind::Unique { columns } => {
                columns.iter().collect::<BTreeSet<_>>() == wanted
            }
            _ => false,
        })
    }

    pub fn conglomerate(&self, id: ConglomerateId) -> Option<&Conglomerate> {
        self.conglomerates.get(&id)
    }

    pub fn conglomerates(&self) -> impl Iterator<Item = &Conglomerate> {
        self.conglomerates.values()
    }
}
