//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: three named identities, a
//! shared in-memory ledger, and fast KDF parameters.

use std::sync::Arc;

use medvault_access::{Ciphertext, DeviceStatus, SealedFields, VisibleFields};
use medvault_core::{Identity, NetworkId};
use medvault_crypto::{derive_key, DerivedKey, KdfParams};
use medvault_ledger::{MemoryLedger, Result as LedgerResult};

/// Administrator identity used across fixtures.
pub const ADMIN: Identity = Identity::from_bytes([0x11; 20]);

/// A technician the administrator may authorize.
pub const TECHNICIAN: Identity = Identity::from_bytes([
    0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67,
    0x89, 0xab, 0xcd, 0xef, 0x01,
]);

/// An identity nobody ever authorizes.
pub const OUTSIDER: Identity = Identity::from_bytes([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
]);

/// Network used by fixtures.
pub const NETWORK: NetworkId = NetworkId::new(1);

/// A shared ledger plus three identities.
pub struct TestFixture {
    pub admin: Identity,
    pub technician: Identity,
    pub outsider: Identity,
    pub ledger: Arc<MemoryLedger>,
}

impl TestFixture {
    /// Create a fixture with an empty ledger administered by [`ADMIN`].
    pub fn new() -> LedgerResult<Self> {
        Ok(Self {
            admin: ADMIN,
            technician: TECHNICIAN,
            outsider: OUTSIDER,
            ledger: Arc::new(MemoryLedger::new(ADMIN)?),
        })
    }

    /// The fastest accepted KDF parameters.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams::minimum()
    }

    /// Derive `identity`'s key on [`NETWORK`] with fast parameters.
    pub fn key_for(&self, identity: &Identity) -> DerivedKey {
        derive_key(identity, NETWORK, &self.kdf_params())
    }
}

/// Visible fields for an imaging device.
pub fn visible_fields(name: &str) -> VisibleFields {
    VisibleFields::new(name, "imaging", DeviceStatus::Nominal)
        .with_schedule(1_736_870_400_000, 1_752_508_800_000)
}

/// Sealed fields wrapping two literal strings.
pub fn sealed(service_notes: &str, fault_history: &str) -> SealedFields {
    SealedFields::new(
        Ciphertext::from(service_notes.to_string()),
        Ciphertext::from(fault_history.to_string()),
    )
}
