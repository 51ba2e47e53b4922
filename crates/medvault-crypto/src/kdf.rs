//! Deterministic key derivation.
//!
//! `key = PBKDF2-HMAC-SHA256(canonical_hex(identity) || decimal(network), KDF_SALT, iterations)`
//!
//! The salt is a public constant. It binds derivations to this application's
//! namespace and adds no secrecy; the input material is public too. Access to
//! ciphertext is gated by the authorization ledger, not by this key.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use medvault_core::{Identity, NetworkId};

use crate::error::{CryptoError, Result};

/// Size of a derived key in bytes.
pub const KEY_SIZE: usize = 32;

/// Fixed, publicly known derivation salt.
pub const KDF_SALT: &[u8] = b"medvault/record-cipher/v1";

/// Lowest accepted iteration count.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Iteration count used unless configured otherwise.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Parameters for PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawKdfParams")]
pub struct KdfParams {
    iterations: u32,
}

#[derive(Deserialize)]
struct RawKdfParams {
    iterations: u32,
}

impl TryFrom<RawKdfParams> for KdfParams {
    type Error = CryptoError;

    fn try_from(raw: RawKdfParams) -> Result<Self> {
        Self::new(raw.iterations)
    }
}

impl KdfParams {
    /// Create parameters, rejecting iteration counts below [`MIN_ITERATIONS`].
    pub fn new(iterations: u32) -> Result<Self> {
        if iterations < MIN_ITERATIONS {
            return Err(CryptoError::WeakKdfParams {
                iterations,
                minimum: MIN_ITERATIONS,
            });
        }
        Ok(Self { iterations })
    }

    /// The lowest accepted parameters. Fastest derivation, used by tests.
    pub const fn minimum() -> Self {
        Self {
            iterations: MIN_ITERATIONS,
        }
    }

    /// The configured iteration count.
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// A 256-bit key for the record cipher.
///
/// Only ever produced by [`derive_key`] (or [`DerivedKey::from_bytes`] for
/// known-answer tests). Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// The password input for PBKDF2: canonical identity hex followed by the
/// decimal network id.
fn key_material(identity: &Identity, network: NetworkId) -> Vec<u8> {
    format!("{}{}", identity.to_hex(), network).into_bytes()
}

/// Derive the record key for `(identity, network)`.
///
/// Same inputs always produce the same key; no randomness is involved.
pub fn derive_key(identity: &Identity, network: NetworkId, params: &KdfParams) -> DerivedKey {
    let mut material = key_material(identity, network);
    let mut out = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(&material, KDF_SALT, params.iterations, &mut out);
    material.zeroize();

    let key = DerivedKey(out);
    out.zeroize();
    key
}

/// Derive from an unparsed identity string.
///
/// Fails with [`CryptoError::InvalidIdentity`] if `identity` is not a
/// 20-byte hex identifier.
pub fn derive_key_from_str(
    identity: &str,
    network: NetworkId,
    params: &KdfParams,
) -> Result<DerivedKey> {
    let identity = Identity::parse(identity)?;
    Ok(derive_key(&identity, network, params))
}
