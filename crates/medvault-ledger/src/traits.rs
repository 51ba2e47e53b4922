//! Ledger trait: the abstract collaborator behind every durable write.
//!
//! Implementations provide durability, per-transaction atomicity and a
//! total order over writes. The core never locks anything itself.

use async_trait::async_trait;

use medvault_access::{Notification, NotificationKind, PublicInfo, SealedFields, VisibleFields};
use medvault_core::{Identity, RecordId};

use crate::error::{LedgerError, Result};

/// A mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Authorize `target`. Administrator only.
    Grant { target: Identity },

    /// Revoke `target`. Administrator only.
    Revoke { target: Identity },

    /// Create a new record.
    Register {
        id: RecordId,
        fields: VisibleFields,
        sealed: SealedFields,
    },

    /// Replace an existing record's fields.
    Update {
        id: RecordId,
        fields: VisibleFields,
        sealed: SealedFields,
    },
}

impl Operation {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Grant { .. } => "grant",
            Operation::Revoke { .. } => "revoke",
            Operation::Register { .. } => "register",
            Operation::Update { .. } => "update",
        }
    }
}

/// An operation together with the identity submitting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// The authenticated caller.
    pub caller: Identity,
    /// What to do.
    pub operation: Operation,
}

impl Transaction {
    pub fn new(caller: Identity, operation: Operation) -> Self {
        Self { caller, operation }
    }
}

/// Proof that a transaction was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Position in the total order of writes (first write is 1).
    pub height: u64,
    /// Server-observed time of application (Unix ms).
    pub timestamp: i64,
    /// The notification the transaction emitted.
    pub notification: Notification,
}

/// A notification as recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    /// Height of the transaction that emitted it.
    pub height: u64,
    /// Server-observed time (Unix ms).
    pub timestamp: i64,
    pub notification: Notification,
}

/// A read-only call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// The administrator identity.
    Administrator,
    /// Whether an identity is authorized.
    IsAuthorized(Identity),
    /// Public fields of a record.
    PublicInfo(RecordId),
    /// Ciphertext fields of a record, as seen by `caller`.
    Ciphertext { caller: Identity, id: RecordId },
    /// Height of the latest confirmed transaction (0 if none).
    Height,
}

/// Answer to a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    Administrator(Identity),
    Authorized(bool),
    PublicInfo(PublicInfo),
    Ciphertext(SealedFields),
    Height(u64),
}

/// Backend limits.
#[derive(Debug, Clone, Default)]
pub struct LedgerConfig {
    /// Widest `query_notifications` window accepted, in heights.
    ///
    /// `None` means unbounded. Hosted ledgers commonly cap log queries, so
    /// callers must be prepared for `RangeTooLarge`.
    pub max_notification_range: Option<u64>,
}

impl LedgerConfig {
    /// Reject `[from, to]` if it is wider than the configured maximum.
    pub fn check_range(&self, from: u64, to: u64) -> Result<()> {
        if let Some(max) = self.max_notification_range {
            let requested = to.saturating_sub(from).saturating_add(1);
            if to >= from && requested > max {
                return Err(LedgerError::RangeTooLarge { requested, max });
            }
        }
        Ok(())
    }
}

/// The ledger collaborator.
///
/// # Design Notes
///
/// - **Atomic writes**: `submit_transaction` either fully applies or fails
///   with no state change and no height consumed.
/// - **Total order**: Confirmed transactions get strictly increasing heights.
/// - **Prefix reads**: `read_state` never observes a partial write.
/// - **Inclusive ranges**: `query_notifications(kind, from, to)` returns
///   notifications with `from <= height <= to`, ordered by height.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Apply a transaction.
    async fn submit_transaction(&self, tx: Transaction) -> Result<Confirmation>;

    /// Answer a read-only query.
    async fn read_state(&self, query: Query) -> Result<QueryResponse>;

    /// Fetch past notifications of one kind in `[from, to]`.
    async fn query_notifications(
        &self,
        kind: NotificationKind,
        from: u64,
        to: u64,
    ) -> Result<Vec<NotificationRecord>>;
}

fn unexpected(query: &str, response: QueryResponse) -> LedgerError {
    LedgerError::InvalidData(format!("unexpected response to {}: {:?}", query, response))
}

/// Typed wrappers over [`Ledger::read_state`].
#[async_trait]
pub trait LedgerExt: Ledger {
    /// Whether `identity` is authorized.
    async fn is_authorized(&self, identity: &Identity) -> Result<bool> {
        match self.read_state(Query::IsAuthorized(*identity)).await? {
            QueryResponse::Authorized(flag) => Ok(flag),
            other => Err(unexpected("is_authorized", other)),
        }
    }

    /// The administrator identity.
    async fn administrator(&self) -> Result<Identity> {
        match self.read_state(Query::Administrator).await? {
            QueryResponse::Administrator(admin) => Ok(admin),
            other => Err(unexpected("administrator", other)),
        }
    }

    /// Public fields of a record.
    async fn public_info(&self, id: &RecordId) -> Result<PublicInfo> {
        match self.read_state(Query::PublicInfo(id.clone())).await? {
            QueryResponse::PublicInfo(info) => Ok(info),
            other => Err(unexpected("public_info", other)),
        }
    }

    /// Ciphertext fields of a record, as seen by `caller`.
    async fn ciphertext(&self, caller: &Identity, id: &RecordId) -> Result<SealedFields> {
        let query = Query::Ciphertext {
            caller: *caller,
            id: id.clone(),
        };
        match self.read_state(query).await? {
            QueryResponse::Ciphertext(sealed) => Ok(sealed),
            other => Err(unexpected("ciphertext", other)),
        }
    }

    /// Height of the latest confirmed transaction.
    async fn height(&self) -> Result<u64> {
        match self.read_state(Query::Height).await? {
            QueryResponse::Height(h) => Ok(h),
            other => Err(unexpected("height", other)),
        }
    }
}

impl<L: Ledger + ?Sized> LedgerExt for L {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_unbounded() {
        let config = LedgerConfig::default();
        assert!(config.check_range(0, u64::MAX).is_ok());
    }

    #[test]
    fn test_range_bounded() {
        let config = LedgerConfig {
            max_notification_range: Some(100),
        };
        assert!(config.check_range(1, 100).is_ok());
        assert!(matches!(
            config.check_range(1, 101),
            Err(LedgerError::RangeTooLarge {
                requested: 101,
                max: 100
            })
        ));
        // Empty ranges are always fine.
        assert!(config.check_range(50, 10).is_ok());
    }

    #[test]
    fn test_operation_names() {
        let op = Operation::Grant {
            target: Identity::from_bytes([1; 20]),
        };
        assert_eq!(op.name(), "grant");
    }
}
