//! Error types for the Vault.

use medvault_access::AccessError;
use medvault_core::CoreError;
use medvault_crypto::CryptoError;
use medvault_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during Vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Malformed identity or other core input.
    #[error("invalid input: {0}")]
    Core(#[from] CoreError),

    /// Key derivation, encryption or decryption failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The ledger rejected or could not serve the call.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Key derivation could not be scheduled.
    #[error("key derivation task failed: {0}")]
    Derivation(String),
}

impl VaultError {
    /// The access-rule error behind this failure, if that is what it was.
    pub fn as_access(&self) -> Option<&AccessError> {
        match self {
            VaultError::Ledger(e) => e.as_access(),
            _ => None,
        }
    }

    /// The crypto error behind this failure, if that is what it was.
    pub fn as_crypto(&self) -> Option<&CryptoError> {
        match self {
            VaultError::Crypto(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for Vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
