//! Backing index structures for key constraints

use std::collections::BTreeSet;

use crate::{ConglomerateId, ObjectId};

/// Physical index backing one or more constraints.
///
/// Constraints on the same columns of the same table share one conglomerate;
/// it is deallocated only when `users` becomes empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Conglomerate {
    pub id: ConglomerateId,
    pub table: ObjectId,
    pub columns: Vec<usize>,
    /// Constraints currently backed by this conglomerate
    pub users: BTreeSet<ObjectId>,
}
