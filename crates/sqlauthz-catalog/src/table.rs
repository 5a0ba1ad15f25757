//! Table schemas

use sqlauthz_ast::DataType;

use crate::{errors::CatalogError, ColumnBitset, ObjectId};

/// Column definition in a table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnSchema {
    pub fn new(name: String, data_type: DataType, nullable: bool) -> Self {
        ColumnSchema { name, data_type, nullable }
    }
}

/// Whether a table holds user data or is a system catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Base,
    System,
}

/// Table schema definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub id: ObjectId,
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub kind: TableKind,
}

impl TableSchema {
    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn is_system(&self) -> bool {
        self.kind == TableKind::System
    }

    /// Resolve column names (already normalized) to positions.
    pub fn column_positions(&self, names: &[String]) -> Result<Vec<usize>, CatalogError> {
        names
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| CatalogError::ColumnNotFound {
                    column_name: name.clone(),
                    table_name: self.qualified_name(),
                })
            })
            .collect()
    }

    /// Resolve column names to a bitset.
    pub fn column_bitset(&self, names: &[String]) -> Result<ColumnBitset, CatalogError> {
        Ok(ColumnBitset::from_positions(self.column_positions(names)?))
    }

    /// Names of the columns in `bitset`, in table order.
    pub fn names_of(&self, bitset: &ColumnBitset) -> Vec<String> {
        bitset.positions().filter_map(|p| self.columns.get(p)).map(|c| c.name.clone()).collect()
    }
}
