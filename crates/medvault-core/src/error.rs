//! Error types for medvault core.

use thiserror::Error;

/// Errors raised while constructing core identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The input is not a well-formed fixed-length identity.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
