//! View management operations for the catalog.

use sqlauthz_ast::Query;
use tracing::debug;

use crate::{errors::CatalogError, store::CatalogObject, ObjectId, ViewDefinition};

impl super::Catalog {
    /// Store a compiled view. The caller registers its dependency edges.
    pub fn create_view(
        &mut self,
        schema: &str,
        name: &str,
        columns: Vec<String>,
        query: Query,
    ) -> Result<ObjectId, CatalogError> {
        self.check_user_schema(schema, "CREATE VIEW")?;
        self.check_relation_name_free(schema, name, "VIEW")?;
        let qualified = format!("{}.{}", schema, name);
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(CatalogError::DuplicateColumn {
                    column_name: column.clone(),
                    table_name: qualified,
                });
            }
        }

        let id = self.allocate_object_id();
        let view = ViewDefinition {
            id,
            schema: schema.to_string(),
            name: name.to_string(),
            columns,
            query,
        };
        self.relations.insert((schema.to_string(), name.to_string()), id);
        self.objects.insert(id, CatalogObject::View(view));
        debug!(view = %id, schema, name, "created view");
        Ok(id)
    }

    pub fn view(&self, id: ObjectId) -> Option<&ViewDefinition> {
        match self.objects.get(&id) {
            Some(CatalogObject::View(view)) => Some(view),
            _ => None,
        }
    }

    pub fn views(&self) -> impl Iterator<Item = &ViewDefinition> {
        self.objects.values().filter_map(|o| match o {
            CatalogObject::View(v) => Some(v),
            _ => None,
        })
    }
}
