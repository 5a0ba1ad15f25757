//! Trigger management operations for the catalog.

use sqlauthz_ast::{ProceduralStatement, TriggerEvent};
use tracing::debug;

use crate::{errors::CatalogError, store::CatalogObject, ObjectId, TriggerDefinition};

impl super::Catalog {
    /// Store a compiled trigger on `table`. The caller registers its
    /// dependency edges.
    pub fn create_trigger(
        &mut self,
        schema: &str,
        name: &str,
        table: ObjectId,
        event: TriggerEvent,
        update_columns: Vec<usize>,
        actions: Vec<ProceduralStatement>,
    ) -> Result<ObjectId, CatalogError> {
        self.check_user_schema(schema, "CREATE TRIGGER")?;
        let key = (schema.to_string(), name.to_string());
        if self.triggers.contains_key(&key) {
            return Err(CatalogError::ObjectAlreadyExists {
                kind: "TRIGGER",
                name: name.to_string(),
                schema: schema.to_string(),
            });
        }
        let id = self.allocate_object_id();
        let trigger = TriggerDefinition {
            id,
            schema: schema.to_string(),
            name: name.to_string(),
            table,
            event,
            update_columns,
            actions,
        };
        self.triggers.insert(key, id);
        self.objects.insert(id, CatalogObject::Trigger(trigger));
        debug!(trigger = %id, schema, name, table = %table, "created trigger");
        Ok(id)
    }

    pub fn trigger(&self, id: ObjectId) -> Option<&TriggerDefinition> {
        match self.objects.get(&id) {
            Some(CatalogObject::Trigger(trigger)) => Some(trigger),
            _ => None,
        }
    }

    pub fn lookup_trigger(&self, schema: &str, name: &str) -> Option<&TriggerDefinition> {
        let id = self.triggers.get(&(schema.to_string(), name.to_string()))?;
        self.trigger(*id)
    }

    /// Triggers defined on `table`, in creation order.
    pub fn triggers_on(&self, table: ObjectId) -> Vec<&TriggerDefinition> {
        self.objects
            .values()
            .filter_map(|o| match o {
                CatalogObject::Trigger(t) if t.table == table => Some(t),
                _ => None,
            })
            .collect()
    }
}
