//! Trigger definitions for SQL triggers

use sqlauthz_ast::{ProceduralStatement, TriggerEvent};

use crate::ObjectId;

/// Trigger definition stored in the catalog
///
/// Triggers run with their definer's privileges: the owner of the schema
/// they live in, never the session whose statement fired them.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDefinition {
    pub id: ObjectId,
    pub schema: String,
    /// Name of the trigger
    pub name: String,
    /// Table the trigger is on
    pub table: ObjectId,
    /// Trigger event (INSERT, UPDATE, DELETE)
    pub event: TriggerEvent,
    /// Column positions for `UPDATE OF`; empty means any column
    pub update_columns: Vec<usize>,
    /// Triggered action
    pub actions: Vec<ProceduralStatement>,
}

impl TriggerDefinition {
    /// Whether an UPDATE touching `columns` fires this trigger.
    pub fn fires_on_update(&self, columns: &[usize]) -> bool {
        matches!(self.event, TriggerEvent::Update(_))
            && (self.update_columns.is_empty()
                || self.update_columns.iter().any(|c| columns.contains(c)))
    }
}
