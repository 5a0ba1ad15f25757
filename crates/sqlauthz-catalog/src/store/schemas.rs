//! Schema management operations for the catalog.

use tracing::debug;

use crate::{errors::CatalogError, Schema};

impl super::Catalog {
    /// Create a user schema owned by `owner`.
    pub fn create_schema(&mut self, name: &str, owner: &str) -> Result<(), CatalogError> {
        if self.schemas.contains_key(name) {
            return Err(CatalogError::SchemaAlreadyExists(name.to_string()));
        }
        self.schemas.insert(name.to_string(), Schema::new(name.to_string(), owner.to_string()));
        debug!(schema = name, owner, "created schema");
        Ok(())
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Owner of schema `name`.
    pub fn schema_owner(&self, name: &str) -> Result<&str, CatalogError> {
        self.schemas
            .get(name)
            .map(|s| s.owner.as_str())
            .ok_or_else(|| CatalogError::SchemaNotFound(name.to_string()))
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// Drop an empty user schema.
    pub fn drop_schema(&mut self, name: &str) -> Result<(), CatalogError> {
        self.check_user_schema(name, "DROP SCHEMA")?;
        if self.objects.values().any(|o| o.schema() == name) {
            return Err(CatalogError::SchemaNotEmpty(name.to_string()));
        }
        self.schemas.remove(name);
        debug!(schema = name, "dropped schema");
        Ok(())
    }
}
