//! The access-gated record store.
//!
//! Read paths are split:
//! - [`RecordStore::get_public_info`] is unrestricted
//! - [`RecordStore::get_ciphertext`] requires an authorized caller
//!
//! Ciphertext is never reachable through the unrestricted path.

use std::collections::BTreeMap;

use medvault_core::{Identity, RecordId};

use crate::authz::Authorizer;
use crate::error::{AccessError, Result};
use crate::notification::Notification;
use crate::record::{PublicInfo, Record, SealedFields, VisibleFields};

/// Records indexed by id.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: BTreeMap<RecordId, Record>,
}

fn check_sealed(sealed: &SealedFields) -> Result<()> {
    match sealed.first_empty() {
        Some(field) => Err(AccessError::EmptyCiphertext(field)),
        None => Ok(()),
    }
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted records.
    pub fn restore(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a record with `id` exists.
    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    /// All record ids, in order.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.records.keys()
    }

    /// Validate a registration without applying it.
    pub fn check_register(
        &self,
        authz: &impl Authorizer,
        caller: &Identity,
        id: &RecordId,
        sealed: &SealedFields,
    ) -> Result<()> {
        if !authz.is_authorized(caller) {
            return Err(AccessError::NotAuthorized(*caller));
        }
        if self.contains(id) {
            return Err(AccessError::DuplicateId(id.clone()));
        }
        check_sealed(sealed)
    }

    /// Create a new record.
    ///
    /// `now` is the server-observed time stamped onto the record.
    pub fn register(
        &mut self,
        authz: &impl Authorizer,
        caller: &Identity,
        id: RecordId,
        fields: VisibleFields,
        sealed: SealedFields,
        now: i64,
    ) -> Result<Notification> {
        self.check_register(authz, caller, &id, &sealed)?;

        let notification = Notification::RecordRegistered {
            id: id.clone(),
            name: fields.name.clone(),
            actor: *caller,
        };

        let record = Record {
            id: id.clone(),
            fields,
            sealed,
            exists: true,
            registered_by: *caller,
            registered_at: now,
            updated_by: *caller,
            updated_at: now,
        };
        self.records.insert(id, record);

        Ok(notification)
    }

    /// Validate an update without applying it.
    pub fn check_update(
        &self,
        authz: &impl Authorizer,
        caller: &Identity,
        id: &RecordId,
        sealed: &SealedFields,
    ) -> Result<()> {
        if !authz.is_authorized(caller) {
            return Err(AccessError::NotAuthorized(*caller));
        }
        if !self.contains(id) {
            return Err(AccessError::RecordNotFound(id.clone()));
        }
        check_sealed(sealed)
    }

    /// Overwrite an existing record's visible and ciphertext fields.
    ///
    /// This is a full replace, not a merge.
    pub fn update(
        &mut self,
        authz: &impl Authorizer,
        caller: &Identity,
        id: &RecordId,
        fields: VisibleFields,
        sealed: SealedFields,
        now: i64,
    ) -> Result<Notification> {
        self.check_update(authz, caller, id, &sealed)?;

        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| AccessError::RecordNotFound(id.clone()))?;
        record.fields = fields;
        record.sealed = sealed;
        record.updated_by = *caller;
        record.updated_at = now;

        Ok(Notification::RecordUpdated {
            id: id.clone(),
            actor: *caller,
            timestamp: now,
        })
    }

    /// Public fields of a record. Anyone may call this.
    pub fn get_public_info(&self, id: &RecordId) -> Result<PublicInfo> {
        self.records
            .get(id)
            .map(Record::public_info)
            .ok_or_else(|| AccessError::RecordNotFound(id.clone()))
    }

    /// Ciphertext fields of a record. Requires an authorized caller.
    pub fn get_ciphertext(
        &self,
        authz: &impl Authorizer,
        caller: &Identity,
        id: &RecordId,
    ) -> Result<SealedFields> {
        if !authz.is_authorized(caller) {
            return Err(AccessError::NotAuthorized(*caller));
        }
        self.records
            .get(id)
            .map(|r| r.sealed.clone())
            .ok_or_else(|| AccessError::RecordNotFound(id.clone()))
    }

    /// Full record, including ciphertext. Used by persistence layers only.
    pub fn record(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }
}
