//! Error types for the crypto module.

use thiserror::Error;

/// Errors that can occur during key derivation, encryption or decryption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The identity is not a well-formed fixed-length byte string.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The key derivation parameters are below the allowed floor.
    #[error("weak key derivation parameters: {iterations} iterations (minimum {minimum})")]
    WeakKdfParams { iterations: u32, minimum: u32 },

    /// Tag verification failed.
    ///
    /// Carries no detail: a wrong key, a corrupted nonce or a tampered body
    /// all look the same.
    #[error("authentication failure")]
    AuthenticationFailure,

    /// The envelope could not be split into a hex nonce and a hex body.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The authenticated plaintext is not UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    NonUtf8Plaintext,

    /// The AEAD refused to encrypt.
    #[error("encryption error: {0}")]
    EncryptionError(String),
}

impl From<medvault_core::CoreError> for CryptoError {
    fn from(e: medvault_core::CoreError) -> Self {
        match e {
            medvault_core::CoreError::InvalidIdentity(msg) => CryptoError::InvalidIdentity(msg),
        }
    }
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
