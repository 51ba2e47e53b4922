//! The combined state machine executed by every ledger backend.
//!
//! Backends differ only in how they persist and serialize; the rules for
//! what a transaction does live here, once.

use medvault_access::{AuthorizationLedger, Notification, RecordStore};
use medvault_core::Identity;

use crate::error::Result;
use crate::traits::{Operation, Query, QueryResponse, Transaction};

/// Authorization ledger plus record store.
#[derive(Debug, Clone)]
pub struct LedgerState {
    authz: AuthorizationLedger,
    records: RecordStore,
}

impl LedgerState {
    /// Fresh state administered by `admin`.
    pub fn new(admin: Identity) -> Result<Self> {
        Ok(Self {
            authz: AuthorizationLedger::initialize(admin)?,
            records: RecordStore::new(),
        })
    }

    /// State rebuilt from persisted parts.
    pub fn from_parts(authz: AuthorizationLedger, records: RecordStore) -> Self {
        Self { authz, records }
    }

    pub fn authz(&self) -> &AuthorizationLedger {
        &self.authz
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Validate a transaction against the current state without applying it.
    pub fn check(&self, tx: &Transaction) -> Result<()> {
        let caller = &tx.caller;
        match &tx.operation {
            Operation::Grant { target } => self.authz.check_grant(caller, target)?,
            Operation::Revoke { target } => self.authz.check_revoke(caller, target)?,
            Operation::Register { id, sealed, .. } => {
                self.records.check_register(&self.authz, caller, id, sealed)?
            }
            Operation::Update { id, sealed, .. } => {
                self.records.check_update(&self.authz, caller, id, sealed)?
            }
        }
        Ok(())
    }

    /// Validate a transaction and return the notification it would emit,
    /// without applying it.
    pub fn plan(&self, tx: &Transaction, now: i64) -> Result<Notification> {
        self.check(tx)?;
        let actor = tx.caller;
        let notification = match &tx.operation {
            Operation::Grant { target } => Notification::AuthorizationGranted {
                target: *target,
                actor,
            },
            Operation::Revoke { target } => Notification::AuthorizationRevoked {
                target: *target,
                actor,
            },
            Operation::Register { id, fields, .. } => Notification::RecordRegistered {
                id: id.clone(),
                name: fields.name.clone(),
                actor,
            },
            Operation::Update { id, .. } => Notification::RecordUpdated {
                id: id.clone(),
                actor,
                timestamp: now,
            },
        };
        Ok(notification)
    }

    /// Apply a transaction. On error the state is unchanged.
    pub fn execute(&mut self, tx: &Transaction, now: i64) -> Result<Notification> {
        let caller = &tx.caller;
        let notification = match &tx.operation {
            Operation::Grant { target } => self.authz.grant(caller, target)?,
            Operation::Revoke { target } => self.authz.revoke(caller, target)?,
            Operation::Register { id, fields, sealed } => self.records.register(
                &self.authz,
                caller,
                id.clone(),
                fields.clone(),
                sealed.clone(),
                now,
            )?,
            Operation::Update { id, fields, sealed } => self.records.update(
                &self.authz,
                caller,
                id,
                fields.clone(),
                sealed.clone(),
                now,
            )?,
        };
        Ok(notification)
    }

    /// Answer a read-only query. `height` is supplied by the backend.
    pub fn query(&self, query: &Query, height: u64) -> Result<QueryResponse> {
        let response = match query {
            Query::Administrator => QueryResponse::Administrator(*self.authz.administrator()),
            Query::IsAuthorized(identity) => {
                QueryResponse::Authorized(self.authz.is_authorized(identity))
            }
            Query::PublicInfo(id) => QueryResponse::PublicInfo(self.records.get_public_info(id)?),
            Query::Ciphertext { caller, id } => {
                QueryResponse::Ciphertext(self.records.get_ciphertext(&self.authz, caller, id)?)
            }
            Query::Height => QueryResponse::Height(height),
        };
        Ok(response)
    }
}
