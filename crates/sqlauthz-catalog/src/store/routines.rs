//! Function and procedure management operations for the catalog.

use sqlauthz_ast::{ProceduralStatement, RoutineKind};
use tracing::debug;

use crate::{errors::CatalogError, store::CatalogObject, ObjectId, RoutineDefinition};

impl super::Catalog {
    /// Create a user routine. The body is stored unchecked; it runs with the
    /// invoker's privileges.
    pub fn create_routine(
        &mut self,
        schema: &str,
        name: &str,
        kind: RoutineKind,
        body: Vec<ProceduralStatement>,
    ) -> Result<ObjectId, CatalogError> {
        let operation = format!("CREATE {}", kind.name());
        self.check_user_schema(schema, &operation)?;
        let key = (schema.to_string(), name.to_string(), kind);
        if self.routines.contains_key(&key) {
            return Err(CatalogError::ObjectAlreadyExists {
                kind: kind.name(),
                name: name.to_string(),
                schema: schema.to_string(),
            });
        }
        let id = self.allocate_object_id();
        let routine = RoutineDefinition {
            id,
            schema: schema.to_string(),
            name: name.to_string(),
            kind,
            body,
            system: false,
        };
        self.routines.insert(key, id);
        self.objects.insert(id, CatalogObject::Routine(routine));
        debug!(routine = %id, schema, name, kind = kind.name(), "created routine");
        Ok(id)
    }

    /// Install a system routine (`SYSFUN` built-in or `SYSCS_UTIL` procedure).
    /// Installing the same routine twice is a no-op.
    pub fn insert_system_routine(&mut self, schema: &str, name: &str, kind: RoutineKind) -> ObjectId {
        let key = (schema.to_string(), name.to_string(), kind);
        if let Some(id) = self.routines.get(&key) {
            return *id;
        }
        let id = self.allocate_object_id();
        let routine = RoutineDefinition {
            id,
            schema: schema.to_string(),
            name: name.to_string(),
            kind,
            body: Vec::new(),
            system: true,
        };
        self.routines.insert(key, id);
        self.objects.insert(id, CatalogObject::Routine(routine));
        id
    }

    pub fn lookup_routine(&self, schema: &str, name: &str, kind: RoutineKind) -> Option<&RoutineDefinition> {
        let id = self.routines.get(&(schema.to_string(), name.to_string(), kind))?;
        self.routine(*id)
    }

    /// Look up a routine by name, failing with `RoutineNotFound`.
    pub fn find_routine(
        &self,
        schema: &str,
        name: &str,
        kind: RoutineKind,
    ) -> Result<&RoutineDefinition, CatalogError> {
        self.schema_owner(schema)?;
        self.lookup_routine(schema, name, kind).ok_or_else(|| CatalogError::RoutineNotFound {
            kind: kind.name(),
            name: format!("{}.{}", schema, name),
        })
    }

    pub fn routine(&self, id: ObjectId) -> Option<&RoutineDefinition> {
        match self.objects.get(&id) {
            Some(CatalogObject::Routine(routine)) => Some(routine),
            _ => None,
        }
    }

    pub fn routines(&self) -> impl Iterator<Item = &RoutineDefinition> {
        self.objects.values().filter_map(|o| match o {
            CatalogObject::Routine(r) => Some(r),
            _ => None,
        })
    }
}
