//! # medvault Core
//!
//! Pure identifier types shared by every medvault crate.
//!
//! This crate contains no I/O, no cryptography and no storage. It defines the
//! strongly typed inputs that key derivation and the authorization ledger are
//! keyed on.
//!
//! ## Key Types
//!
//! - [`Identity`] - 20-byte account identifier, canonicalized to lowercase hex
//! - [`NetworkId`] - Execution context an identity is scoped to
//! - [`RecordId`] - Caller-chosen record identifier

pub mod error;
pub mod identity;
pub mod types;

pub use error::{CoreError, Result};
pub use identity::{Identity, NetworkId, IDENTITY_LEN};
pub use types::{now_millis, RecordId};
