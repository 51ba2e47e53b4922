//! # medvault Ledger
//!
//! The ledger collaborator: durable, serialized storage for the
//! authorization ledger and the record store.
//!
//! ## Overview
//!
//! The rest of medvault talks to storage only through the [`Ledger`] trait:
//! submit a transaction, read a value, query past notifications. Two
//! implementations are provided:
//!
//! - [`MemoryLedger`] - In-memory, for tests and embedding
//! - [`SqliteLedger`] - SQLite-backed, survives restarts
//!
//! ## Key Types
//!
//! - [`Transaction`] / [`Operation`] - A mutating call and who made it
//! - [`Confirmation`] - Height, server time and the emitted notification
//! - [`Query`] / [`QueryResponse`] - Read-only calls
//! - [`LedgerState`] - The combined state machine both backends execute
//!
//! ## Usage
//!
//! ```rust,no_run
//! use medvault_core::Identity;
//! use medvault_ledger::{Ledger, LedgerExt, MemoryLedger, Operation, Transaction};
//!
//! async fn example() {
//!     let admin = Identity::from_bytes([0x01; 20]);
//!     let tech = Identity::from_bytes([0x02; 20]);
//!     let ledger = MemoryLedger::new(admin).unwrap();
//!
//!     let confirmation = ledger
//!         .submit_transaction(Transaction::new(admin, Operation::Grant { target: tech }))
//!         .await
//!         .unwrap();
//!     assert_eq!(confirmation.height, 1);
//!     assert!(ledger.is_authorized(&tech).await.unwrap());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Serialized writes**: Every transaction is atomic and totally ordered
//! - **Check-then-act**: A transaction is fully validated before any write
//! - **Prefix reads**: Reads observe the state after some completed write
//! - **No height on failure**: Rejected transactions leave no trace

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod state;
pub mod traits;

pub use error::{LedgerError, Result};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use state::LedgerState;
pub use traits::{
    Confirmation, Ledger, LedgerConfig, LedgerExt, NotificationRecord, Operation, Query,
    QueryResponse, Transaction,
};
