// ============================================================================
// Transaction Management
// ============================================================================

use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{Database, DatabaseState, StorageError};

/// Transaction state
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum TransactionState {
    /// No active transaction
    None,
    /// Transaction is active
    Active {
        /// Transaction ID for debugging
        id: u64,
        /// Committed state the transaction started from
        base: Arc<DatabaseState>,
        /// Private copy of `base` with the transaction's changes
        working: DatabaseState,
        /// Whether any statement changed `working`
        dirty: bool,
    },
}

/// Per-session transaction manager.
///
/// BEGIN takes a private copy of the committed state (repeatable read).
/// COMMIT publishes it unless a concurrent commit wrote something it also
/// wrote; ROLLBACK discards it, restoring catalog, permission and dependency
/// state exactly.
#[derive(Debug, Clone)]
pub struct TransactionManager {
    transaction_state: TransactionState,
    next_transaction_id: u64,
}

impl TransactionManager {
    pub fn new() -> Self {
        TransactionManager { transaction_state: TransactionState::None, next_transaction_id: 1 }
    }

    /// Begin a new transaction on `snapshot`.
    pub fn begin_transaction(&mut self, snapshot: Arc<DatabaseState>) -> Result<u64, StorageError> {
        match self.transaction_state {
            TransactionState::None => {
                let id = self.next_transaction_id;
                self.next_transaction_id += 1;
                let working = DatabaseState::clone(&snapshot);
                debug!(transaction = id, version = working.version(), "began transaction");
                self.transaction_state = TransactionState::Active { id, base: snapshot, working, dirty: false };
                Ok(id)
            }
            TransactionState::Active { .. } => Err(StorageError::TransactionAlreadyActive),
        }
    }

    /// Commit the current transaction. A transaction that changed nothing
    /// always commits. `replay` re-applies the transaction's statements to a
    /// newer state when other commits landed in between; see
    /// [`Database::commit`].
    pub fn commit_transaction<E>(
        &mut self,
        database: &Database,
        replay: impl FnOnce(&mut DatabaseState) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<StorageError> + fmt::Display,
    {
        match std::mem::replace(&mut self.transaction_state, TransactionState::None) {
            TransactionState::None => Err(StorageError::NoActiveTransaction.into()),
            TransactionState::Active { id, dirty: false, .. } => {
                debug!(transaction = id, "committed read-only transaction");
                Ok(())
            }
            TransactionState::Active { id, base, working, dirty: true } => {
                let version = database.commit(&base, working, replay)?;
                debug!(transaction = id, version, "committed transaction");
                Ok(())
            }
        }
    }

    /// Rollback the current transaction
    pub fn rollback_transaction(&mut self) -> Result<(), StorageError> {
        match std::mem::replace(&mut self.transaction_state, TransactionState::None) {
            TransactionState::None => Err(StorageError::NoActiveTransaction),
            TransactionState::Active { id, .. } => {
                debug!(transaction = id, "rolled back transaction");
                Ok(())
            }
        }
    }

    /// Check if we're currently in a transaction
    pub fn in_transaction(&self) -> bool {
        matches!(self.transaction_state, TransactionState::Active { .. })
    }

    /// The transaction's private state.
    pub fn working(&self) -> Option<&DatabaseState> {
        match &self.transaction_state {
            TransactionState::Active { working, .. } => Some(working),
            TransactionState::None => None,
        }
    }

    /// Replace the transaction's private state after a successful statement.
    pub fn install(&mut self, state: DatabaseState) -> Result<(), StorageError> {
        match &mut self.transaction_state {
            TransactionState::Active { working, dirty, .. } => {
                *working = state;
                *dirty = true;
                Ok(())
            }
            TransactionState::None => Err(StorageError::NoActiveTransaction),
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
