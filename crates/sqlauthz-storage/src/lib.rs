//! Storage - shared database state
//!
//! The committed state (catalog plus table rows) is an immutable
//! [`DatabaseState`] value shared behind an `Arc`. Readers take a snapshot and
//! never block writers; writers build a new state on a private copy and swap
//! it in. Session transactions keep their private copy until commit, when it
//! is checked against the [`WriteSet`]s committed since it was taken.

mod database;
mod error;
mod row;
mod state;
mod transactions;
mod write_set;

pub use database::Database;
pub use error::StorageError;
pub use row::Row;
pub use state::DatabaseState;
pub use transactions::{TransactionManager, TransactionState};
pub use write_set::{WriteKey, WriteSet};
