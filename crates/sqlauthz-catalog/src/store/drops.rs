//! Dropping objects.
//!
//! Explicit DROP is RESTRICT: it fails while any other object depends on the
//! target. Objects invalidated by a revoke are removed here too, without the
//! RESTRICT check.

use tracing::{debug, info};

use crate::{
    errors::CatalogError, store::CatalogObject, ConstraintKind, Dependent, DependentKind,
    ObjectId, PermissionRecordId, Provider, RoleId,
};

/// A dependent removed by invalidation or by an explicit drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedObject {
    pub id: ObjectId,
    pub kind: DependentKind,
    pub schema: String,
    pub name: String,
}

impl DroppedObject {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl super::Catalog {
    /// Drop every dependent bound to `record`, transitively.
    pub fn invalidate_record(&mut self, record: PermissionRecordId) -> Vec<DroppedObject> {
        let dependents = self.dependencies.invalidate(record);
        self.remove_dependents(dependents)
    }

    /// Drop every dependent built on `object`, transitively.
    pub fn invalidate_object(&mut self, object: ObjectId) -> Vec<DroppedObject> {
        let dependents = self.dependencies.invalidate_object(object);
        self.remove_dependents(dependents)
    }

    /// Drop every dependent compiled under `role`, transitively.
    pub fn invalidate_role(&mut self, role: RoleId) -> Vec<DroppedObject> {
        let dependents = self.dependencies.invalidate_role(role);
        self.remove_dependents(dependents)
    }

    fn remove_dependents(&mut self, dependents: Vec<Dependent>) -> Vec<DroppedObject> {
        let dropped: Vec<_> =
            dependents.into_iter().filter_map(|d| self.remove_dependent(d.id)).collect();
        for object in &dropped {
            info!(kind = object.kind.name(), name = %object.qualified_name(), "dropped invalidated object");
        }
        dropped
    }

    /// Remove a view, constraint or trigger with its edges, name entry,
    /// permission records and conglomerate share.
    fn remove_dependent(&mut self, id: ObjectId) -> Option<DroppedObject> {
        let object = self.objects.remove(&id)?;
        self.dependencies.drop_object(id);
        let key = (object.schema().to_string(), object.name().to_string());
        let kind = match &object {
            CatalogObject::View(_) => {
                self.relations.remove(&key);
                self.remove_permissions_for(id);
                DependentKind::View
            }
            CatalogObject::Constraint(constraint) => {
                self.constraints.remove(&key);
                if let Some(conglomerate) = constraint.conglomerate {
                    self.release_conglomerate(conglomerate, id);
                }
                DependentKind::Constraint
            }
            CatalogObject::Trigger(_) => {
                self.triggers.remove(&key);
                DependentKind::Trigger
            }
            CatalogObject::Table(_) | CatalogObject::Routine(_) | CatalogObject::Synonym(_) => {
                self.objects.insert(id, object);
                return None;
            }
        };
        Some(DroppedObject { id, kind, schema: key.0, name: key.1 })
    }

    fn remove_permissions_for(&mut self, id: ObjectId) {
        for record in self.permissions.remove_for_object(id) {
            self.dependencies.forget_permission(record.id);
        }
    }

    /// Fail with `ObjectInUse` if anything outside `owned` depends on `id`.
    fn check_restrict(&self, id: ObjectId, operation: &str, owned: &[ObjectId]) -> Result<(), CatalogError> {
        let graph_blocker = self
            .dependencies
            .dependents_of(Provider::Object(id))
            .into_iter()
            .map(|d| d.id)
            .find(|d| !owned.contains(d));
        let fk_blocker = self
            .foreign_keys_referencing(id)
            .into_iter()
            .map(|c| c.id)
            .find(|c| !owned.contains(c));

        match graph_blocker.or(fk_blocker).and_then(|b| self.objects.get(&b)) {
            Some(blocker) => Err(CatalogError::ObjectInUse {
                operation: operation.to_string(),
                object: self.objects.get(&id).map(|o| o.qualified_name()).unwrap_or_default(),
                dependent_kind: blocker.kind_name(),
                dependent: blocker.qualified_name(),
            }),
            None => Ok(()),
        }
    }

    /// DROP TABLE (RESTRICT). Triggers and constraints on the table go with it,
    /// as do the permission records on it.
    pub fn drop_table(&mut self, id: ObjectId) -> Result<(), CatalogError> {
        let table = self.table(id).ok_or_else(|| CatalogError::TableNotFound(id.to_string()))?;
        self.check_user_schema(&table.schema.clone(), "DROP TABLE")?;

        let mut owned: Vec<ObjectId> = self.triggers_on(id).iter().map(|t| t.id).collect();
        owned.extend(self.constraints_on(id).iter().map(|c| c.id));
        self.check_restrict(id, "DROP TABLE", &owned)?;

        for object in owned {
            self.remove_dependent(object);
        }
        self.remove_permissions_for(id);
        self.dependencies.drop_object(id);
        if let Some(object) = self.objects.remove(&id) {
            self.relations.remove(&(object.schema().to_string(), object.name().to_string()));
            debug!(table = %id, name = %object.qualified_name(), "dropped table");
        }
        Ok(())
    }

    /// DROP VIEW (RESTRICT).
    pub fn drop_view(&mut self, id: ObjectId) -> Result<(), CatalogError> {
        let view = self.view(id).ok_or_else(|| CatalogError::TableNotFound(id.to_string()))?;
        debug!(view = %id, name = %view.name, "dropping view");
        self.check_restrict(id, "DROP VIEW", &[])?;
        self.remove_dependent(id);
        Ok(())
    }

    /// DROP FUNCTION / DROP PROCEDURE (RESTRICT). EXECUTE records on the
    /// routine are removed.
    pub fn drop_routine(&mut self, id: ObjectId) -> Result<(), CatalogError> {
        let routine = self.routine(id).ok_or_else(|| CatalogError::RoutineNotFound {
            kind: "ROUTINE",
            name: id.to_string(),
        })?;
        let key = (routine.schema.clone(), routine.name.clone(), routine.kind);
        let operation = format!("DROP {}", routine.kind.name());
        self.check_user_schema(&key.0, &operation)?;
        self.check_restrict(id, &operation, &[])?;

        self.remove_permissions_for(id);
        self.dependencies.drop_object(id);
        self.routines.remove(&key);
        self.objects.remove(&id);
        debug!(routine = %id, name = %key.1, "dropped routine");
        Ok(())
    }

    /// DROP TRIGGER.
    pub fn drop_trigger(&mut self, id: ObjectId) -> Result<(), CatalogError> {
        if self.trigger(id).is_none() {
            return Err(CatalogError::ObjectNotFound { kind: "TRIGGER", name: id.to_string() });
        }
        self.remove_dependent(id);
        Ok(())
    }

    /// ALTER TABLE ... DROP CONSTRAINT. A key still referenced by a foreign
    /// key of another constraint cannot be dropped.
    pub fn drop_constraint(&mut self, id: ObjectId) -> Result<(), CatalogError> {
        let constraint = self
            .constraint(id)
            .ok_or_else(|| CatalogError::ObjectNotFound { kind: "CONSTRAINT", name: id.to_string() })?;

        if let ConstraintKind::PrimaryKey { columns } | ConstraintKind::Unique { columns } =
            &constraint.kind
        {
            let mut key: Vec<usize> = columns.clone();
            key.sort_unstable();
            let referencing = self.foreign_keys_referencing(constraint.table).into_iter().find(|fk| {
                matches!(&fk.kind, ConstraintKind::ForeignKey { parent_columns, .. } if {
                    let mut cols = parent_columns.clone();
                    cols.sort_unstable();
                    cols == key
                })
            });
            if let Some(fk) = referencing {
                return Err(CatalogError::ObjectInUse {
                    operation: "DROP CONSTRAINT".to_string(),
                    object: format!("{}.{}", constraint.schema, constraint.name),
                    dependent_kind: "CONSTRAINT",
                    dependent: format!("{}.{}", fk.schema, fk.name),
                });
            }
        }
        self.remove_dependent(id);
        Ok(())
    }

    /// DROP SYNONYM.
    pub fn drop_synonym(&mut self, id: ObjectId) -> Result<(), CatalogError> {
        match self.objects.get(&id) {
            Some(CatalogObject::Synonym(_)) => {}
            _ => return Err(CatalogError::ObjectNotFound { kind: "SYNONYM", name: id.to_string() }),
        }
        if let Some(object) = self.objects.remove(&id) {
            self.relations.remove(&(object.schema().to_string(), object.name().to_string()));
        }
        Ok(())
    }
}
