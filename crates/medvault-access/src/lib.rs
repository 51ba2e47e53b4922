//! # medvault Access
//!
//! The authorization ledger and the access-gated record store.
//!
//! ## Overview
//!
//! Two state machines, both pure and in-memory:
//!
//! - [`AuthorizationLedger`]: one boolean per identity plus a fixed
//!   administrator who is always authorized without a table entry
//! - [`RecordStore`]: records keyed by caller-chosen ids; public fields are
//!   readable by anyone, ciphertext only by authorized identities
//!
//! Every successful mutation returns exactly one [`Notification`]. A failed
//! mutation returns an error and leaves state untouched: all checks run
//! before anything is written.
//!
//! The store never parses ciphertext. It holds opaque bytes and only checks
//! that they are non-empty.
//!
//! ## Usage
//!
//! ```rust
//! use medvault_access::{AuthorizationLedger, Ciphertext, DeviceStatus, RecordStore,
//!     SealedFields, VisibleFields};
//! use medvault_core::{Identity, RecordId};
//!
//! let admin = Identity::from_bytes([0x01; 20]);
//! let mut authz = AuthorizationLedger::initialize(admin).unwrap();
//! let mut store = RecordStore::new();
//!
//! let fields = VisibleFields::new("MRI-X200", "imaging", DeviceStatus::Nominal);
//! let sealed = SealedFields::new(
//!     Ciphertext::from("00:aa".as_bytes().to_vec()),
//!     Ciphertext::from("00:bb".as_bytes().to_vec()),
//! );
//! store
//!     .register(&authz, &admin, RecordId::new("dev-001"), fields, sealed, 0)
//!     .unwrap();
//!
//! assert!(store.get_public_info(&RecordId::new("dev-001")).is_ok());
//! ```

pub mod authz;
pub mod error;
pub mod notification;
pub mod record;
pub mod registry;

pub use authz::{AuthorizationLedger, Authorizer};
pub use error::{AccessError, Result};
pub use notification::{Notification, NotificationKind};
pub use record::{Ciphertext, DeviceStatus, PublicInfo, Record, SealedFields, VisibleFields};
pub use registry::RecordStore;
