//! Authenticated encryption of record text.
//!
//! ChaCha20-Poly1305 with a 256-bit [`DerivedKey`], a fresh random 12-byte
//! nonce per call, no associated data and a 16-byte appended tag.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;

use crate::envelope::{Envelope, NONCE_SIZE};
use crate::error::{CryptoError, Result};
use crate::kdf::DerivedKey;

/// Size of the Poly1305 authentication tag.
pub const TAG_SIZE: usize = 16;

fn cipher_for(key: &DerivedKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
}

/// Draw a nonce from the thread-local CSPRNG.
fn fresh_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Encrypt UTF-8 text under `key`.
pub fn encrypt(plaintext: &str, key: &DerivedKey) -> Result<Envelope> {
    let nonce = fresh_nonce();
    let body = cipher_for(key)
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| CryptoError::EncryptionError(e.to_string()))?;

    Ok(Envelope::new(nonce, body))
}

/// Decrypt an envelope under `key`.
///
/// Any tag mismatch is reported as [`CryptoError::AuthenticationFailure`];
/// no partial plaintext is ever returned.
pub fn decrypt(envelope: &Envelope, key: &DerivedKey) -> Result<String> {
    let plaintext = cipher_for(key)
        .decrypt(Nonce::from_slice(&envelope.nonce), envelope.body.as_slice())
        .map_err(|_| CryptoError::AuthenticationFailure)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::NonUtf8Plaintext)
}

/// Encrypt and encode to the wire form in one step.
pub fn seal(plaintext: &str, key: &DerivedKey) -> Result<String> {
    Ok(encrypt(plaintext, key)?.to_wire())
}

/// Parse the wire form and decrypt in one step.
pub fn open(wire: &str, key: &DerivedKey) -> Result<String> {
    decrypt(&Envelope::from_wire(wire)?, key)
}
