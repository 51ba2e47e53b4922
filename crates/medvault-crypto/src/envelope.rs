//! Ciphertext envelope and its wire encoding.
//!
//! Wire form: `lowercase-hex(nonce) ":" lowercase-hex(ciphertext || tag)`.
//! Exactly one separator; anything else is malformed.

use std::fmt;
use std::str::FromStr;

use crate::error::{CryptoError, Result};

/// Nonce size for ChaCha20-Poly1305.
pub const NONCE_SIZE: usize = 12;

/// Field separator in the wire encoding.
pub const SEPARATOR: char = ':';

/// An encrypted record field.
///
/// Produced once per encryption call; the nonce is never reused.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Nonce used for this encryption.
    pub nonce: [u8; NONCE_SIZE],

    /// Ciphertext with the authentication tag appended.
    pub body: Vec<u8>,
}

impl Envelope {
    /// Assemble an envelope from its parts.
    pub fn new(nonce: [u8; NONCE_SIZE], body: Vec<u8>) -> Self {
        Self { nonce, body }
    }

    /// Encode to the wire form.
    pub fn to_wire(&self) -> String {
        let mut out = String::with_capacity(NONCE_SIZE * 2 + 1 + self.body.len() * 2);
        out.push_str(&hex::encode(self.nonce));
        out.push(SEPARATOR);
        out.push_str(&hex::encode(&self.body));
        out
    }

    /// Parse the wire form.
    pub fn from_wire(s: &str) -> Result<Self> {
        let separators = s.matches(SEPARATOR).count();
        if separators != 1 {
            return Err(CryptoError::MalformedEnvelope(format!(
                "expected exactly one '{}', found {}",
                SEPARATOR, separators
            )));
        }

        // Checked above: exactly one separator.
        let (nonce_hex, body_hex) = s.split_once(SEPARATOR).unwrap_or((s, ""));

        let nonce_bytes = decode_lower_hex(nonce_hex, "nonce")?;
        let nonce: [u8; NONCE_SIZE] = nonce_bytes.as_slice().try_into().map_err(|_| {
            CryptoError::MalformedEnvelope(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE,
                nonce_bytes.len()
            ))
        })?;

        let body = decode_lower_hex(body_hex, "body")?;

        Ok(Self { nonce, body })
    }

    /// Wire-encoded length in bytes.
    pub fn wire_len(&self) -> usize {
        NONCE_SIZE * 2 + 1 + self.body.len() * 2
    }
}

/// Decode hex, rejecting uppercase digits so that each byte has exactly one
/// encoding.
fn decode_lower_hex(s: &str, field: &str) -> Result<Vec<u8>> {
    if s.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(CryptoError::MalformedEnvelope(format!(
            "{} is not lowercase hex",
            field
        )));
    }
    hex::decode(s).map_err(|e| CryptoError::MalformedEnvelope(format!("{}: {}", field, e)))
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("nonce", &hex::encode(self.nonce))
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl FromStr for Envelope {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_wire(s)
    }
}
