use std::collections::BTreeMap;

use sqlauthz_ast::SqlValue;
use sqlauthz_catalog::{Catalog, ObjectId};

use crate::{Row, StorageError};

/// One version of the database: catalog (with permissions and dependencies)
/// and the rows of every base table.
#[derive(Debug, Clone)]
pub struct DatabaseState {
    pub catalog: Catalog,
    tables: BTreeMap<ObjectId, Vec<Row>>,
    version: u64,
}

impl DatabaseState {
    pub fn new(catalog: Catalog) -> Self {
        DatabaseState { catalog, tables: BTreeMap::new(), version: 0 }
    }

    /// Commit counter of the version this state was derived from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Create empty row storage for a new table.
    pub fn create_table_storage(&mut self, table: ObjectId) {
        self.tables.entry(table).or_default();
    }

    pub fn drop_table_storage(&mut self, table: ObjectId) {
        self.tables.remove(&table);
    }

    /// Rows of `table`; empty for tables without storage (system tables).
    pub fn rows(&self, table: ObjectId) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn table_rows(&self) -> impl Iterator<Item = (ObjectId, &[Row])> {
        self.tables.iter().map(|(id, rows)| (*id, rows.as_slice()))
    }

    pub fn rows_mut(&mut self, table: ObjectId) -> Result<&mut Vec<Row>, StorageError> {
        self.tables.get_mut(&table).ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    /// Extend every row of `table` with a NULL for a newly added column.
    pub fn add_column_storage(&mut self, table: ObjectId) {
        if let Some(rows) = self.tables.get_mut(&table) {
            for row in rows {
                row.values.push(SqlValue::Null);
            }
        }
    }
}
