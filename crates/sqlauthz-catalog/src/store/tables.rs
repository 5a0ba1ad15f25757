//! Table management operations for the catalog.

use tracing::debug;

use crate::{
    errors::CatalogError,
    store::{CatalogObject, RelationKind},
    ColumnSchema, ObjectId, TableKind, TableSchema, SYSTEM_SCHEMA,
};

impl super::Catalog {
    /// Create a base table in a user schema.
    pub fn create_table(
        &mut self,
        schema: &str,
        name: &str,
        columns: Vec<ColumnSchema>,
    ) -> Result<ObjectId, CatalogError> {
        self.check_user_schema(schema, "CREATE TABLE")?;
        self.check_relation_name_free(schema, name, "TABLE")?;
        check_distinct_columns(&format!("{}.{}", schema, name), &columns)?;

        let id = self.allocate_object_id();
        let table = TableSchema {
            id,
            schema: schema.to_string(),
            name: name.to_string(),
            columns,
            kind: TableKind::Base,
        };
        self.relations.insert((schema.to_string(), name.to_string()), id);
        self.objects.insert(id, CatalogObject::Table(table));
        debug!(table = %id, schema, name, "created table");
        Ok(id)
    }

    pub(crate) fn insert_system_table(&mut self, name: &str, columns: Vec<ColumnSchema>) {
        let id = self.allocate_object_id();
        let table = TableSchema {
            id,
            schema: SYSTEM_SCHEMA.to_string(),
            name: name.to_string(),
            columns,
            kind: TableKind::System,
        };
        self.relations.insert((SYSTEM_SCHEMA.to_string(), name.to_string()), id);
        self.objects.insert(id, CatalogObject::Table(table));
    }

    /// Append a column. Column-level permission bitsets are untouched;
    /// table-level records cover the new column implicitly.
    pub fn add_column(&mut self, table: ObjectId, column: ColumnSchema) -> Result<(), CatalogError> {
        let schema = self.table_mut(table)?;
        if schema.column_index(&column.name).is_some() {
            return Err(CatalogError::DuplicateColumn {
                column_name: column.name,
                table_name: schema.qualified_name(),
            });
        }
        debug!(table = %table, column = %column.name, "added column");
        schema.columns.push(column);
        Ok(())
    }

    pub fn table(&self, id: ObjectId) -> Option<&TableSchema> {
        match self.objects.get(&id) {
            Some(CatalogObject::Table(table)) => Some(table),
            _ => None,
        }
    }

    fn table_mut(&mut self, id: ObjectId) -> Result<&mut TableSchema, CatalogError> {
        match self.objects.get_mut(&id) {
            Some(CatalogObject::Table(table)) => Ok(table),
            _ => Err(CatalogError::TableNotFound(id.to_string())),
        }
    }

    /// What `schema.name` names in the relation namespace.
    pub fn lookup_relation(&self, schema: &str, name: &str) -> Option<(ObjectId, RelationKind)> {
        let id = *self.relations.get(&(schema.to_string(), name.to_string()))?;
        let kind = match self.objects.get(&id)? {
            CatalogObject::Table(_) => RelationKind::Table,
            CatalogObject::View(_) => RelationKind::View,
            CatalogObject::Synonym(_) => RelationKind::Synonym,
            _ => return None,
        };
        Some((id, kind))
    }

    /// Look up a base or system table by name.
    pub fn find_table(&self, schema: &str, name: &str) -> Result<&TableSchema, CatalogError> {
        self.schema_owner(schema)?;
        self.lookup_relation(schema, name)
            .and_then(|(id, _)| self.table(id))
            .ok_or_else(|| CatalogError::TableNotFound(format!("{}.{}", schema, name)))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.objects.values().filter_map(|o| match o {
            CatalogObject::Table(t) => Some(t),
            _ => None,
        })
    }

    pub(crate) fn check_relation_name_free(
        &self,
        schema: &str,
        name: &str,
        kind: &'static str,
    ) -> Result<(), CatalogError> {
        if self.relations.contains_key(&(schema.to_string(), name.to_string())) {
            return Err(CatalogError::ObjectAlreadyExists {
                kind,
                name: name.to_string(),
                schema: schema.to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn check_distinct_columns(
    table_name: &str,
    columns: &[ColumnSchema],
) -> Result<(), CatalogError> {
    for (i, column) in columns.iter().enumerate() {
        if columns[..i].iter().any(|c| c.name == column.name) {
            return Err(CatalogError::DuplicateColumn {
                column_name: column.name.clone(),
                table_name: table_name.to_string(),
            });
        }
    }
    Ok(())
}
