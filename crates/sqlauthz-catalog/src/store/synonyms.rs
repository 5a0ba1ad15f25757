use sqlauthz_ast::ObjectName;

use crate::{errors::CatalogError, store::CatalogObject, ObjectId, SynonymDefinition};

impl super::Catalog {
    /// Create a synonym. The target is not required to exist.
    pub fn create_synonym(
        &mut self,
        schema: &str,
        name: &str,
        target: ObjectName,
    ) -> Result<ObjectId, CatalogError> {
        self.check_user_schema(schema, "CREATE SYNONYM")?;
        self.check_relation_name_free(schema, name, "SYNONYM")?;
        let id = self.allocate_object_id();
        let synonym =
            SynonymDefinition { id, schema: schema.to_string(), name: name.to_string(), target };
        self.relations.insert((schema.to_string(), name.to_string()), id);
        self.objects.insert(id, CatalogObject::Synonym(synonym));
        Ok(id)
    }

    pub fn synonym(&self, id: ObjectId) -> Option<&SynonymDefinition> {
        match self.objects.get(&id) {
            Some(CatalogObject::Synonym(synonym)) => Some(synonym),
            _ => None,
        }
    }
}
