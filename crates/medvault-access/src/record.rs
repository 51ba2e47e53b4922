//! The record entity.
//!
//! A record has two halves: visible fields that anyone may read, and two
//! ciphertext fields that only authorized identities may fetch. The store
//! treats the ciphertext as opaque bytes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use medvault_core::{Identity, RecordId};

/// Operational status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeviceStatus {
    /// Operating normally.
    Nominal = 0,
    /// Taken out of service for maintenance.
    UnderMaintenance = 1,
    /// Requires immediate attention.
    Critical = 2,
}

impl DeviceStatus {
    /// Convert to the stored discriminant.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert from the stored discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Nominal),
            1 => Some(Self::UnderMaintenance),
            2 => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Publicly readable record fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleFields {
    /// Display name (e.g. model number).
    pub name: String,

    /// Free-form category (e.g. "imaging").
    pub category: String,

    /// Current status.
    pub status: DeviceStatus,

    /// When the device was last serviced (Unix ms).
    pub last_maintenance: i64,

    /// When the next service is due (Unix ms).
    pub next_maintenance: i64,
}

impl VisibleFields {
    /// Create fields with both timestamps unset (zero).
    pub fn new(name: impl Into<String>, category: impl Into<String>, status: DeviceStatus) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            status,
            last_maintenance: 0,
            next_maintenance: 0,
        }
    }

    /// Set the maintenance timestamps.
    pub fn with_schedule(mut self, last_maintenance: i64, next_maintenance: i64) -> Self {
        self.last_maintenance = last_maintenance;
        self.next_maintenance = next_maintenance;
        self
    }
}

/// Opaque ciphertext bytes.
///
/// Only emptiness is ever inspected; the store does not know or care what
/// encoding the caller used.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ciphertext(Bytes);

impl Ciphertext {
    /// Wrap raw bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the field is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for Ciphertext {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<String> for Ciphertext {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl AsRef<[u8]> for Ciphertext {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The two access-controlled fields of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedFields {
    /// Free-text service notes.
    pub service_notes: Ciphertext,

    /// Free-text fault history.
    pub fault_history: Ciphertext,
}

impl SealedFields {
    pub fn new(service_notes: Ciphertext, fault_history: Ciphertext) -> Self {
        Self {
            service_notes,
            fault_history,
        }
    }

    /// Name of the first empty field, if any.
    pub fn first_empty(&self) -> Option<&'static str> {
        if self.service_notes.is_empty() {
            Some("service_notes")
        } else if self.fault_history.is_empty() {
            Some("fault_history")
        } else {
            None
        }
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Caller-chosen id. Immutable.
    pub id: RecordId,

    /// Public fields.
    pub fields: VisibleFields,

    /// Ciphertext fields.
    pub sealed: SealedFields,

    /// Existence flag. Records are never deleted, so this is always set on
    /// a stored record.
    pub exists: bool,

    /// Who registered the record.
    pub registered_by: Identity,

    /// When it was registered (server time, Unix ms).
    pub registered_at: i64,

    /// Who last wrote the record.
    pub updated_by: Identity,

    /// When it was last written (server time, Unix ms).
    pub updated_at: i64,
}

impl Record {
    /// The unrestricted view of this record.
    pub fn public_info(&self) -> PublicInfo {
        PublicInfo {
            id: self.id.clone(),
            fields: self.fields.clone(),
            exists: self.exists,
            registered_at: self.registered_at,
            updated_at: self.updated_at,
        }
    }
}

/// What anyone may read about a record. Never carries ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInfo {
    pub id: RecordId,
    pub fields: VisibleFields,
    pub exists: bool,
    pub registered_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_discriminants() {
        for status in [
            DeviceStatus::Nominal,
            DeviceStatus::UnderMaintenance,
            DeviceStatus::Critical,
        ] {
            assert_eq!(DeviceStatus::from_u8(status.to_u8()), Some(status));
        }
        assert_eq!(DeviceStatus::from_u8(3), None);
    }

    #[test]
    fn test_first_empty() {
        let full = Ciphertext::from(b"x".to_vec());
        let empty = Ciphertext::default();

        assert_eq!(SealedFields::new(full.clone(), full.clone()).first_empty(), None);
        assert_eq!(
            SealedFields::new(empty.clone(), full.clone()).first_empty(),
            Some("service_notes")
        );
        assert_eq!(
            SealedFields::new(full, empty).first_empty(),
            Some("fault_history")
        );
    }
}
