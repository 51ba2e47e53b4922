//! Notifications emitted by successful mutations.
//!
//! These are the audit trail consumed by UIs and indexers. Each successful
//! grant, revoke, register or update emits exactly one; failures emit none.

use serde::{Deserialize, Serialize};

use medvault_core::{Identity, RecordId};

/// Discriminator for notification queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NotificationKind {
    RecordRegistered = 1,
    RecordUpdated = 2,
    AuthorizationGranted = 3,
    AuthorizationRevoked = 4,
}

impl NotificationKind {
    /// Convert to the stored discriminant.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert from the stored discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::RecordRegistered),
            2 => Some(Self::RecordUpdated),
            3 => Some(Self::AuthorizationGranted),
            4 => Some(Self::AuthorizationRevoked),
            _ => None,
        }
    }
}

/// A state-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// A new record was registered.
    RecordRegistered {
        id: RecordId,
        name: String,
        actor: Identity,
    },

    /// An existing record was overwritten.
    RecordUpdated {
        id: RecordId,
        actor: Identity,
        /// Server-observed time of the update (Unix ms).
        timestamp: i64,
    },

    /// The administrator authorized `target`.
    AuthorizationGranted { target: Identity, actor: Identity },

    /// The administrator revoked `target`.
    AuthorizationRevoked { target: Identity, actor: Identity },
}

impl Notification {
    /// The kind of this notification.
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::RecordRegistered { .. } => NotificationKind::RecordRegistered,
            Notification::RecordUpdated { .. } => NotificationKind::RecordUpdated,
            Notification::AuthorizationGranted { .. } => NotificationKind::AuthorizationGranted,
            Notification::AuthorizationRevoked { .. } => NotificationKind::AuthorizationRevoked,
        }
    }

    /// The identity that caused this notification.
    pub fn actor(&self) -> &Identity {
        match self {
            Notification::RecordRegistered { actor, .. }
            | Notification::RecordUpdated { actor, .. }
            | Notification::AuthorizationGranted { actor, .. }
            | Notification::AuthorizationRevoked { actor, .. } => actor,
        }
    }

    /// The record this notification concerns, if any.
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            Notification::RecordRegistered { id, .. } | Notification::RecordUpdated { id, .. } => {
                Some(id)
            }
            _ => None,
        }
    }
}
