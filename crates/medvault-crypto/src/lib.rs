//! # medvault Crypto
//!
//! Deterministic key derivation and authenticated encryption of record text.
//!
//! ## Overview
//!
//! A party holding an [`Identity`](medvault_core::Identity) on a given
//! [`NetworkId`](medvault_core::NetworkId) derives one 256-bit key with
//! PBKDF2-HMAC-SHA256 and uses it with ChaCha20-Poly1305 to seal free-text
//! fields before they are handed to the record store.
//!
//! ## Key Concepts
//!
//! - **DerivedKey**: Recomputed on demand, never persisted, zeroized on drop
//! - **Envelope**: `hex(nonce) ":" hex(ciphertext || tag)`
//! - **Fresh nonces**: Every encryption draws 12 bytes from a CSPRNG
//!
//! Everything here is a pure function over its inputs. There is no session
//! state, so derivation and encryption can run on any thread without
//! coordination.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use medvault_core::{Identity, NetworkId};
//! use medvault_crypto::{decrypt, derive_key, encrypt, KdfParams};
//!
//! let identity = Identity::parse("0x1111111111111111111111111111111111111111").unwrap();
//! let key = derive_key(&identity, NetworkId::new(1), &KdfParams::default());
//!
//! let envelope = encrypt("coil replaced", &key).unwrap();
//! let wire = envelope.to_wire();
//! assert_eq!(decrypt(&wire.parse().unwrap(), &key).unwrap(), "coil replaced");
//! ```

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod kdf;

pub use cipher::{decrypt, encrypt, open, seal, TAG_SIZE};
pub use envelope::{Envelope, NONCE_SIZE, SEPARATOR};
pub use error::{CryptoError, Result};
pub use kdf::{
    derive_key, derive_key_from_str, DerivedKey, KdfParams, DEFAULT_ITERATIONS, KDF_SALT, KEY_SIZE,
    MIN_ITERATIONS,
};
