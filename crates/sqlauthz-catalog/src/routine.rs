//! Functions and procedures

use sqlauthz_ast::{ProceduralStatement, RoutineKind};

use crate::ObjectId;

/// Routine definition stored in the catalog
///
/// Routines run with the invoking session's privileges; their bodies are not
/// checked when created.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineDefinition {
    pub id: ObjectId,
    pub schema: String,
    pub name: String,
    pub kind: RoutineKind,
    pub body: Vec<ProceduralStatement>,
    /// Supplied by the system (`SYSFUN`, `SYSCS_UTIL`)
    pub system: bool,
}

impl RoutineDefinition {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}
