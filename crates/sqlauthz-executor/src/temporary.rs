//! Session-scoped temporary tables (schema `SESSION`).
//!
//! They belong to one session, bypass privilege checks and cannot be the
//! target of GRANT or REVOKE.

use std::collections::BTreeMap;

use sqlauthz_catalog::{errors::CatalogError, ColumnSchema, SESSION_SCHEMA};
use sqlauthz_storage::Row;

#[derive(Debug, Clone, PartialEq)]
pub struct TemporaryTable {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub rows: Vec<Row>,
}

impl TemporaryTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemporaryTables {
    tables: BTreeMap<String, TemporaryTable>,
}

impl TemporaryTables {
    pub fn create(&mut self, name: &str, columns: Vec<ColumnSchema>) -> Result<(), CatalogError> {
        if self.tables.contains_key(name) {
            return Err(CatalogError::ObjectAlreadyExists {
                kind: "TABLE",
                name: name.to_string(),
                schema: SESSION_SCHEMA.to_string(),
            });
        }
        self.tables.insert(
            name.to_string(),
            TemporaryTable { name: name.to_string(), columns, rows: Vec::new() },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TemporaryTable> {
        self.tables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TemporaryTable> {
        self.tables.get_mut(name)
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), CatalogError> {
        self.tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CatalogError::TableNotFound(format!("{}.{}", SESSION_SCHEMA, name)))
    }
}
