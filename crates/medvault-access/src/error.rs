//! Error types for the access module.

use medvault_core::{Identity, RecordId};
use thiserror::Error;

/// Errors raised by the authorization ledger and the record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The identity is the zero identity or otherwise unusable.
    #[error("invalid identity: {0}")]
    InvalidIdentity(Identity),

    /// Only the administrator may grant or revoke.
    #[error("{0} is not the administrator")]
    NotAdministrator(Identity),

    /// The caller is not authorized for this operation.
    #[error("{0} is not authorized")]
    NotAuthorized(Identity),

    /// Grant target is already authorized.
    #[error("{0} is already authorized")]
    AlreadyAuthorized(Identity),

    /// Revoke target was never granted (or was already revoked).
    #[error("{0} has not been authorized")]
    NotAuthorizedYet(Identity),

    /// A record with this id already exists.
    #[error("record already exists: {0}")]
    DuplicateId(RecordId),

    /// No record with this id exists.
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// A ciphertext field was empty.
    #[error("ciphertext field is empty: {0}")]
    EmptyCiphertext(&'static str),
}

/// Result type for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;
