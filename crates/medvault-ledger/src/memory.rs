//! In-memory implementation of the Ledger trait.
//!
//! Same semantics as SQLite, no persistence. Used in tests and when the
//! vault is embedded in a process that owns its own durability.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::{debug, warn};

use medvault_access::NotificationKind;
use medvault_core::{now_millis, Identity};

use crate::error::{LedgerError, Result};
use crate::state::LedgerState;
use crate::traits::{
    Confirmation, Ledger, LedgerConfig, NotificationRecord, Query, QueryResponse, Transaction,
};

/// In-memory ledger.
///
/// All data is lost when the ledger is dropped. Thread-safe via RwLock; the
/// write lock serializes transactions.
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
    config: LedgerConfig,
}

struct MemoryLedgerInner {
    state: LedgerState,

    /// Every emitted notification, in height order.
    log: Vec<NotificationRecord>,

    /// Height of the latest confirmed transaction.
    height: u64,
}

impl MemoryLedger {
    /// Create an empty ledger administered by `admin`.
    pub fn new(admin: Identity) -> Result<Self> {
        Self::with_config(admin, LedgerConfig::default())
    }

    /// Create an empty ledger with explicit limits.
    pub fn with_config(admin: Identity, config: LedgerConfig) -> Result<Self> {
        Ok(Self {
            inner: RwLock::new(MemoryLedgerInner {
                state: LedgerState::new(admin)?,
                log: Vec::new(),
                height: 0,
            }),
            config,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryLedgerInner>> {
        self.inner
            .read()
            .map_err(|e| LedgerError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryLedgerInner>> {
        self.inner
            .write()
            .map_err(|e| LedgerError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn submit_transaction(&self, tx: Transaction) -> Result<Confirmation> {
        let mut inner = self.write()?;
        let now = now_millis();

        let notification = match inner.state.execute(&tx, now) {
            Ok(notification) => notification,
            Err(e) => {
                warn!(op = tx.operation.name(), caller = %tx.caller, error = %e, "transaction rejected");
                return Err(e);
            }
        };

        inner.height += 1;
        let height = inner.height;
        inner.log.push(NotificationRecord {
            height,
            timestamp: now,
            notification: notification.clone(),
        });

        debug!(op = tx.operation.name(), caller = %tx.caller, height, "transaction confirmed");

        Ok(Confirmation {
            height,
            timestamp: now,
            notification,
        })
    }

    async fn read_state(&self, query: Query) -> Result<QueryResponse> {
        let inner = self.read()?;
        inner.state.query(&query, inner.height)
    }

    async fn query_notifications(
        &self,
        kind: NotificationKind,
        from: u64,
        to: u64,
    ) -> Result<Vec<NotificationRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        self.config.check_range(from, to)?;

        let inner = self.read()?;
        Ok(inner
            .log
            .iter()
            .filter(|r| r.height >= from && r.height <= to)
            .filter(|r| r.notification.kind() == kind)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{LedgerExt, Operation};
    use medvault_access::{
        AccessError, Ciphertext, DeviceStatus, Notification, SealedFields, VisibleFields,
    };
    use medvault_core::RecordId;

    fn id(byte: u8) -> Identity {
        Identity::from_bytes([byte; 20])
    }

    fn sealed() -> SealedFields {
        SealedFields::new(
            Ciphertext::from(b"00:11".to_vec()),
            Ciphertext::from(b"22:33".to_vec()),
        )
    }

    fn register(caller: Identity, rid: &str) -> Transaction {
        Transaction::new(
            caller,
            Operation::Register {
                id: RecordId::from(rid),
                fields: VisibleFields::new("CT-3", "imaging", DeviceStatus::Nominal),
                sealed: sealed(),
            },
        )
    }

    #[tokio::test]
    async fn test_zero_admin_rejected() {
        let err = MemoryLedger::new(Identity::ZERO).err().unwrap();
        assert_eq!(
            err.as_access(),
            Some(&AccessError::InvalidIdentity(Identity::ZERO))
        );
    }

    #[tokio::test]
    async fn test_heights_increase() {
        let ledger = MemoryLedger::new(id(1)).unwrap();
        assert_eq!(ledger.height().await.unwrap(), 0);

        let c1 = ledger
            .submit_transaction(Transaction::new(id(1), Operation::Grant { target: id(2) }))
            .await
            .unwrap();
        let c2 = ledger.submit_transaction(register(id(2), "a")).await.unwrap();

        assert_eq!(c1.height, 1);
        assert_eq!(c2.height, 2);
        assert_eq!(ledger.height().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failure_consumes_no_height() {
        let ledger = MemoryLedger::new(id(1)).unwrap();

        let err = ledger.submit_transaction(register(id(7), "a")).await.unwrap_err();
        assert_eq!(err.as_access(), Some(&AccessError::NotAuthorized(id(7))));
        assert_eq!(ledger.height().await.unwrap(), 0);

        let c = ledger.submit_transaction(register(id(1), "a")).await.unwrap();
        assert_eq!(c.height, 1);
    }

    #[tokio::test]
    async fn test_query_notifications_by_kind_and_range() {
        let ledger = MemoryLedger::new(id(1)).unwrap();
        ledger.submit_transaction(register(id(1), "a")).await.unwrap();
        ledger
            .submit_transaction(Transaction::new(id(1), Operation::Grant { target: id(2) }))
            .await
            .unwrap();
        ledger.submit_transaction(register(id(2), "b")).await.unwrap();

        let registered = ledger
            .query_notifications(NotificationKind::RecordRegistered, 1, 3)
            .await
            .unwrap();
        assert_eq!(registered.len(), 2);
        assert_eq!(registered[0].height, 1);
        assert_eq!(registered[1].height, 3);

        // Inclusive bounds.
        let only_last = ledger
            .query_notifications(NotificationKind::RecordRegistered, 3, 3)
            .await
            .unwrap();
        assert_eq!(only_last.len(), 1);
        assert!(matches!(
            &only_last[0].notification,
            Notification::RecordRegistered { id, .. } if id.as_str() == "b"
        ));

        // Inverted range is empty, not an error.
        assert!(ledger
            .query_notifications(NotificationKind::RecordRegistered, 3, 1)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_range_limit() {
        let config = LedgerConfig {
            max_notification_range: Some(10),
        };
        let ledger = MemoryLedger::with_config(id(1), config).unwrap();

        let err = ledger
            .query_notifications(NotificationKind::RecordRegistered, 0, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::RangeTooLarge { requested: 11, max: 10 }));
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration() {
        let ledger = std::sync::Arc::new(MemoryLedger::new(id(1)).unwrap());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.submit_transaction(register(id(1), "same")).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(ledger.height().await.unwrap(), 1);
    }
}
