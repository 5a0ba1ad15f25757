//! View definitions for SQL views

use sqlauthz_ast::Query;

use crate::ObjectId;

/// View definition stored in the catalog
///
/// A view stores no privileges of its own: the permission records its
/// definer's compile-time checks consumed are recorded as dependency edges.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefinition {
    pub id: ObjectId,
    pub schema: String,
    /// Name of the view
    pub name: String,
    /// Output column names, in order
    pub columns: Vec<String>,
    /// The query that defines the view
    pub query: Query,
}

impl ViewDefinition {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
