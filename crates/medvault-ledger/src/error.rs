//! Error types for the ledger module.

use medvault_access::AccessError;
use medvault_core::Identity;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The transaction or query was rejected by the access rules.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Notification serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The database was initialized with a different administrator.
    #[error("administrator mismatch: stored {stored}, requested {requested}")]
    AdministratorMismatch {
        stored: Identity,
        requested: Identity,
    },

    /// Notification query window exceeds what the backend allows.
    #[error("notification range of {requested} heights exceeds maximum of {max}")]
    RangeTooLarge { requested: u64, max: u64 },

    /// A lock was poisoned or a blocking task failed.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// The access-rule error behind this failure, if that is what it was.
    pub fn as_access(&self) -> Option<&AccessError> {
        match self {
            LedgerError::Access(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
