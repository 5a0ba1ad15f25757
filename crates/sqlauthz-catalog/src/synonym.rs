//! Synonyms - alternate names for tables and views

use sqlauthz_ast::ObjectName;

use crate::ObjectId;

/// Synonym definition stored in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct SynonymDefinition {
    pub id: ObjectId,
    pub schema: String,
    pub name: String,
    /// Name the synonym stands for; resolved at use, may dangle
    pub target: ObjectName,
}
