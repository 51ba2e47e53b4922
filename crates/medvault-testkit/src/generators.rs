//! Proptest generators for property-based testing.

use proptest::prelude::*;

use medvault_access::{Ciphertext, DeviceStatus, SealedFields, VisibleFields};
use medvault_core::{Identity, NetworkId, RecordId};

/// Generate a random identity, possibly zero.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 20]>().prop_map(Identity::from_bytes)
}

/// Generate a random non-zero identity.
pub fn nonzero_identity() -> impl Strategy<Value = Identity> {
    identity().prop_filter("zero identity", |id| !id.is_zero())
}

/// Generate a network id.
pub fn network_id() -> impl Strategy<Value = NetworkId> {
    any::<u64>().prop_map(NetworkId::new)
}

/// Generate a record id.
pub fn record_id() -> impl Strategy<Value = RecordId> {
    "[a-z]{2,6}-[0-9]{1,4}".prop_map(RecordId::from)
}

/// Generate a DeviceStatus.
pub fn device_status() -> impl Strategy<Value = DeviceStatus> {
    prop_oneof![
        Just(DeviceStatus::Nominal),
        Just(DeviceStatus::UnderMaintenance),
        Just(DeviceStatus::Critical),
    ]
}

/// Generate arbitrary UTF-8 text, including empty and multi-byte strings.
pub fn plaintext(max_chars: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 0..=max_chars).prop_map(|chars| chars.into_iter().collect())
}

/// Generate public record fields.
pub fn visible_fields() -> impl Strategy<Value = VisibleFields> {
    (
        "[A-Za-z0-9 -]{1,24}",
        "[a-z]{3,12}",
        device_status(),
        0i64..=1_700_000_000_000i64,
        0i64..=1_800_000_000_000i64,
    )
        .prop_map(|(name, category, status, last, next)| {
            VisibleFields::new(name, category, status).with_schedule(last, next)
        })
}

/// Generate a non-empty opaque ciphertext field.
pub fn ciphertext() -> impl Strategy<Value = Ciphertext> {
    prop::collection::vec(any::<u8>(), 1..=128).prop_map(Ciphertext::from)
}

/// Generate a valid pair of sealed fields.
pub fn sealed_fields() -> impl Strategy<Value = SealedFields> {
    (ciphertext(), ciphertext()).prop_map(|(a, b)| SealedFields::new(a, b))
}

/// Parameters for generating a record registration.
#[derive(Debug, Clone)]
pub struct RecordParams {
    pub id: RecordId,
    pub fields: VisibleFields,
    pub sealed: SealedFields,
}

impl Arbitrary for RecordParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (record_id(), visible_fields(), sealed_fields())
            .prop_map(|(id, fields, sealed)| RecordParams { id, fields, sealed })
            .boxed()
    }
}
