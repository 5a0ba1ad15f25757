use thiserror::Error;

/// Errors returned by the storage layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("Transaction already active")]
    TransactionAlreadyActive,
    #[error("No active transaction")]
    NoActiveTransaction,
    #[error(
        "Transaction could not be serialized: it started at version {base_version} but version \
         {committed_version} was committed meanwhile ({conflict})"
    )]
    SerializationFailure { base_version: u64, committed_version: u64, conflict: String },
    #[error("Table '{0}' has no row storage")]
    TableNotFound(String),
}

impl StorageError {
    pub fn sql_state(&self) -> &'static str {
        match self {
            StorageError::TransactionAlreadyActive => "25001",
            StorageError::NoActiveTransaction => "25000",
            StorageError::SerializationFailure { .. } => "40001",
            StorageError::TableNotFound(_) => "42X05",
        }
    }
}
