//! # medvault
//!
//! Encrypted, access-controlled maintenance records for medical devices.
//!
//! ## Overview
//!
//! medvault combines two security layers:
//!
//! - **Key derivation and encryption**: A party holding an identity on a
//!   network derives one 256-bit key and seals free-text fields with it
//!   locally. Plaintext and keys never leave the client.
//! - **Authorization-gated storage**: A ledger holds public record fields
//!   and opaque ciphertext. Only identities the administrator has authorized
//!   may write records or fetch ciphertext.
//!
//! ## Key Concepts
//!
//! - **Administrator**: Fixed at ledger creation, always authorized, never
//!   revocable
//! - **Public fields**: Name, category, status and schedule, readable by
//!   anyone
//! - **Sealed fields**: Service notes and fault history, as ciphertext
//! - **Notifications**: One per successful write, queryable by height
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use medvault::{DeviceSecrets, Vault, VaultConfig};
//! use medvault::access::{DeviceStatus, VisibleFields};
//! use medvault::core::{Identity, RecordId};
//! use medvault::ledger::SqliteLedger;
//!
//! async fn example() -> medvault::Result<()> {
//!     let admin = Identity::parse("0x1111111111111111111111111111111111111111")?;
//!     let ledger = Arc::new(SqliteLedger::open("vault.db", admin, Default::default())?);
//!     let vault = Vault::new(admin, ledger, VaultConfig::default());
//!
//!     vault
//!         .register(
//!             "dev-001",
//!             VisibleFields::new("MRI-X200", "imaging", DeviceStatus::Nominal),
//!             &DeviceSecrets::new("Replaced gradient coil", "No faults"),
//!         )
//!         .await?;
//!
//!     let secrets = vault.read(&RecordId::from("dev-001")).await?;
//!     assert_eq!(secrets.service_notes, "Replaced gradient coil");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `medvault::core` - Identities and record ids
//! - `medvault::crypto` - Key derivation and the record cipher
//! - `medvault::access` - Authorization ledger and record store
//! - `medvault::ledger` - Ledger trait, in-memory and SQLite backends

pub mod config;
pub mod discovery;
pub mod error;
pub mod vault;

// Re-export component crates
pub use medvault_access as access;
pub use medvault_core as core;
pub use medvault_crypto as crypto;
pub use medvault_ledger as ledger;

// Re-export main types for convenience
pub use config::{DiscoveryConfig, VaultConfig, DEFAULT_DISCOVERY_WINDOW};
pub use discovery::{discover_record_ids, DiscoveryReport};
pub use error::{Result, VaultError};
pub use vault::{DeviceSecrets, Vault};

// Re-export commonly used types
pub use medvault_core::{Identity, NetworkId, RecordId};
pub use medvault_ledger::{Ledger, LedgerExt, MemoryLedger, SqliteLedger};
