//! The authorization ledger.
//!
//! One boolean per identity plus a fixed administrator. The administrator is
//! authorized by identity equality, not by a table entry, so there is no
//! entry that could ever revoke it.

use std::collections::HashMap;

use medvault_core::Identity;

use crate::error::{AccessError, Result};
use crate::notification::Notification;

/// Anything that can answer "may this identity act?".
///
/// The record store is gated through this trait rather than a concrete
/// ledger type.
pub trait Authorizer {
    /// Whether `identity` is currently authorized.
    fn is_authorized(&self, identity: &Identity) -> bool;
}

/// Authorization state.
#[derive(Debug, Clone)]
pub struct AuthorizationLedger {
    /// Fixed for the ledger's lifetime.
    administrator: Identity,

    /// Explicit grants. Entries are flipped, never removed.
    entries: HashMap<Identity, bool>,
}

impl AuthorizationLedger {
    /// Create a ledger administered by `admin`.
    pub fn initialize(admin: Identity) -> Result<Self> {
        if admin.is_zero() {
            return Err(AccessError::InvalidIdentity(admin));
        }
        Ok(Self {
            administrator: admin,
            entries: HashMap::new(),
        })
    }

    /// Rebuild a ledger from persisted entries.
    pub fn restore(
        admin: Identity,
        entries: impl IntoIterator<Item = (Identity, bool)>,
    ) -> Result<Self> {
        let mut ledger = Self::initialize(admin)?;
        ledger.entries.extend(entries);
        Ok(ledger)
    }

    /// The administrator identity.
    pub fn administrator(&self) -> &Identity {
        &self.administrator
    }

    /// The explicit entry for `identity`, if one was ever written.
    pub fn entry(&self, identity: &Identity) -> Option<bool> {
        self.entries.get(identity).copied()
    }

    /// All explicit entries.
    pub fn entries(&self) -> impl Iterator<Item = (&Identity, &bool)> {
        self.entries.iter()
    }

    /// Whether `identity` is the administrator or holds a live grant.
    pub fn is_authorized(&self, identity: &Identity) -> bool {
        *identity == self.administrator || self.entry(identity).unwrap_or(false)
    }

    /// Validate a grant without applying it.
    pub fn check_grant(&self, caller: &Identity, target: &Identity) -> Result<()> {
        if *caller != self.administrator {
            return Err(AccessError::NotAdministrator(*caller));
        }
        if target.is_zero() {
            return Err(AccessError::InvalidIdentity(*target));
        }
        if self.is_authorized(target) {
            return Err(AccessError::AlreadyAuthorized(*target));
        }
        Ok(())
    }

    /// Authorize `target`. Only the administrator may call this.
    pub fn grant(&mut self, caller: &Identity, target: &Identity) -> Result<Notification> {
        self.check_grant(caller, target)?;
        self.entries.insert(*target, true);

        Ok(Notification::AuthorizationGranted {
            target: *target,
            actor: *caller,
        })
    }

    /// Validate a revoke without applying it.
    pub fn check_revoke(&self, caller: &Identity, target: &Identity) -> Result<()> {
        if *caller != self.administrator {
            return Err(AccessError::NotAdministrator(*caller));
        }
        if !self.entry(target).unwrap_or(false) {
            return Err(AccessError::NotAuthorizedYet(*target));
        }
        Ok(())
    }

    /// Revoke a previous grant. Only the administrator may call this.
    pub fn revoke(&mut self, caller: &Identity, target: &Identity) -> Result<Notification> {
        self.check_revoke(caller, target)?;
        self.entries.insert(*target, false);

        Ok(Notification::AuthorizationRevoked {
            target: *target,
            actor: *caller,
        })
    }
}

impl Authorizer for AuthorizationLedger {
    fn is_authorized(&self, identity: &Identity) -> bool {
        AuthorizationLedger::is_authorized(self, identity)
    }
}
