//! # medvault Testkit
//!
//! Testing utilities for medvault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known derivation and cipher outputs for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Named identities and a shared in-memory ledger
//!
//! ## Golden Vectors
//!
//! ```rust
//! use medvault_testkit::vectors::{kdf_vectors, verify_kdf_vector};
//!
//! for vector in kdf_vectors().iter().filter(|v| v.iterations == 100_000) {
//!     verify_kdf_vector(vector).unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use medvault_testkit::generators::{nonzero_identity, network_id};
//!
//! proptest! {
//!     #[test]
//!     fn keys_are_deterministic(id in nonzero_identity(), net in network_id()) {
//!         let params = medvault_crypto::KdfParams::minimum();
//!         let a = medvault_crypto::derive_key(&id, net, &params);
//!         let b = medvault_crypto::derive_key(&id, net, &params);
//!         prop_assert_eq!(a.as_bytes(), b.as_bytes());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sealed, visible_fields, TestFixture, ADMIN, NETWORK, OUTSIDER, TECHNICIAN};
pub use generators::RecordParams;
pub use vectors::{
    cipher_vectors, export_json, kdf_vectors, verify_all_vectors, CipherVector, KdfVector,
};
