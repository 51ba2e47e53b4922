//! The Vault: client-side API over a ledger.
//!
//! A vault acts as one identity. It derives that identity's record key,
//! encrypts free text locally and hands the ledger only opaque ciphertext.
//! The ledger decides who may act; the vault decides nothing.

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use medvault_access::{Ciphertext, PublicInfo, SealedFields, VisibleFields};
use medvault_core::{Identity, RecordId};
use medvault_crypto::{derive_key, open, seal, CryptoError, DerivedKey};
use medvault_ledger::{Confirmation, Ledger, LedgerExt, Operation, Transaction};

use crate::config::VaultConfig;
use crate::discovery::{self, DiscoveryReport};
use crate::error::{Result, VaultError};

/// Decrypted contents of a record's two sealed fields.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DeviceSecrets {
    /// Free-text service notes.
    pub service_notes: String,
    /// Free-text fault history.
    pub fault_history: String,
}

impl DeviceSecrets {
    pub fn new(service_notes: impl Into<String>, fault_history: impl Into<String>) -> Self {
        Self {
            service_notes: service_notes.into(),
            fault_history: fault_history.into(),
        }
    }
}

impl fmt::Debug for DeviceSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceSecrets(..)")
    }
}

/// A client acting as one identity against a shared ledger.
///
/// Provides:
/// - Authorization management (administrator only)
/// - Registering and updating records with locally encrypted notes
/// - Public and sealed reads
/// - Best-effort discovery of existing record ids
pub struct Vault<L: Ledger> {
    /// Who this vault acts as.
    identity: Identity,
    /// The shared ledger.
    ledger: Arc<L>,
    /// Configuration.
    config: VaultConfig,
    /// Record key, derived on first use.
    key: OnceCell<DerivedKey>,
}

impl<L: Ledger> Vault<L> {
    /// Create a vault acting as `identity`.
    pub fn new(identity: Identity, ledger: Arc<L>, config: VaultConfig) -> Self {
        Self {
            identity,
            ledger,
            config,
            key: OnceCell::new(),
        }
    }

    /// The identity this vault acts as.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The record key, deriving it on a blocking thread the first time.
    pub async fn key(&self) -> Result<&DerivedKey> {
        self.key
            .get_or_try_init(|| async {
                let identity = self.identity;
                let network = self.config.network_id;
                let params = self.config.kdf;

                let key = tokio::task::spawn_blocking(move || {
                    derive_key(&identity, network, &params)
                })
                .await
                .map_err(|e| VaultError::Derivation(e.to_string()))?;

                info!(
                    identity = %identity,
                    network = %network,
                    iterations = params.iterations(),
                    "derived record key"
                );
                Ok::<_, VaultError>(key)
            })
            .await
    }

    async fn submit(&self, operation: Operation) -> Result<Confirmation> {
        let op = operation.name();
        let confirmation = self
            .ledger
            .submit_transaction(Transaction::new(self.identity, operation))
            .await?;
        debug!(op, height = confirmation.height, "vault transaction confirmed");
        Ok(confirmation)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Authorize `target`. Fails unless this vault is the administrator.
    pub async fn grant(&self, target: Identity) -> Result<Confirmation> {
        self.submit(Operation::Grant { target }).await
    }

    /// Revoke `target`. Fails unless this vault is the administrator.
    pub async fn revoke(&self, target: Identity) -> Result<Confirmation> {
        self.submit(Operation::Revoke { target }).await
    }

    /// Whether `identity` is currently authorized. Needs no credential.
    pub async fn is_authorized(&self, identity: &Identity) -> Result<bool> {
        Ok(self.ledger.is_authorized(identity).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypt `secrets` with this vault's key and register a new record.
    pub async fn register(
        &self,
        id: impl Into<RecordId>,
        fields: VisibleFields,
        secrets: &DeviceSecrets,
    ) -> Result<Confirmation> {
        let sealed = self.seal_secrets(secrets).await?;
        self.register_sealed(id, fields, sealed).await
    }

    /// Register a new record with already encrypted fields.
    pub async fn register_sealed(
        &self,
        id: impl Into<RecordId>,
        fields: VisibleFields,
        sealed: SealedFields,
    ) -> Result<Confirmation> {
        self.submit(Operation::Register {
            id: id.into(),
            fields,
            sealed,
        })
        .await
    }

    /// Encrypt `secrets` with this vault's key and overwrite a record.
    pub async fn update(
        &self,
        id: impl Into<RecordId>,
        fields: VisibleFields,
        secrets: &DeviceSecrets,
    ) -> Result<Confirmation> {
        let sealed = self.seal_secrets(secrets).await?;
        self.update_sealed(id, fields, sealed).await
    }

    /// Overwrite a record with already encrypted fields.
    pub async fn update_sealed(
        &self,
        id: impl Into<RecordId>,
        fields: VisibleFields,
        sealed: SealedFields,
    ) -> Result<Confirmation> {
        self.submit(Operation::Update {
            id: id.into(),
            fields,
            sealed,
        })
        .await
    }

    /// Public fields of a record. Needs no credential.
    pub async fn public_info(&self, id: &RecordId) -> Result<PublicInfo> {
        Ok(self.ledger.public_info(id).await?)
    }

    /// Raw ciphertext of a record, as this vault's identity.
    pub async fn read_sealed(&self, id: &RecordId) -> Result<SealedFields> {
        Ok(self.ledger.ciphertext(&self.identity, id).await?)
    }

    /// Fetch and decrypt a record's sealed fields.
    ///
    /// Succeeds only if this identity is authorized and the fields were
    /// encrypted under this vault's key.
    pub async fn read(&self, id: &RecordId) -> Result<DeviceSecrets> {
        let sealed = self.read_sealed(id).await?;
        Ok(DeviceSecrets {
            service_notes: self.open(&sealed.service_notes).await?,
            fault_history: self.open(&sealed.fault_history).await?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Local crypto
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypt one field into its wire form.
    pub async fn seal(&self, plaintext: &str) -> Result<Ciphertext> {
        let key = self.key().await?;
        Ok(Ciphertext::from(seal(plaintext, key)?))
    }

    /// Decrypt one field from its wire form.
    pub async fn open(&self, ciphertext: &Ciphertext) -> Result<String> {
        let wire = std::str::from_utf8(ciphertext.as_bytes()).map_err(|_| {
            CryptoError::MalformedEnvelope("ciphertext is not UTF-8 text".to_string())
        })?;
        let key = self.key().await?;
        Ok(open(wire, key)?)
    }

    async fn seal_secrets(&self, secrets: &DeviceSecrets) -> Result<SealedFields> {
        Ok(SealedFields::new(
            self.seal(&secrets.service_notes).await?,
            self.seal(&secrets.fault_history).await?,
        ))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Discovery
    // ─────────────────────────────────────────────────────────────────────────

    /// Record ids found by scanning recent registrations, merged with
    /// `manual`. Never fails; see [`discovery`](crate::discovery).
    pub async fn discover_record_ids(
        &self,
        manual: impl IntoIterator<Item = RecordId>,
    ) -> DiscoveryReport {
        discovery::discover_record_ids(&*self.ledger, &self.config.discovery, manual).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medvault_access::{AccessError, DeviceStatus};
    use medvault_core::NetworkId;
    use medvault_crypto::KdfParams;
    use medvault_ledger::MemoryLedger;

    fn id(byte: u8) -> Identity {
        Identity::from_bytes([byte; 20])
    }

    fn config() -> VaultConfig {
        VaultConfig {
            kdf: KdfParams::minimum(),
            ..VaultConfig::default()
        }
    }

    fn fields() -> VisibleFields {
        VisibleFields::new("Infusion Pump P4", "infusion", DeviceStatus::Nominal)
    }

    #[tokio::test]
    async fn test_key_is_cached() {
        let ledger = Arc::new(MemoryLedger::new(id(1)).unwrap());
        let vault = Vault::new(id(1), ledger, config());

        let a = vault.key().await.unwrap().as_bytes().to_vec();
        let b = vault.key().await.unwrap().as_bytes().to_vec();
        assert_eq!(a, b);
        assert_eq!(
            a,
            derive_key(&id(1), NetworkId::new(1), &KdfParams::minimum())
                .as_bytes()
                .to_vec()
        );
    }

    #[tokio::test]
    async fn test_register_and_read() {
        let ledger = Arc::new(MemoryLedger::new(id(1)).unwrap());
        let vault = Vault::new(id(1), ledger, config());
        let secrets = DeviceSecrets::new("occlusion alarm tested", "none");

        vault.register("pump-1", fields(), &secrets).await.unwrap();

        let read = vault.read(&RecordId::from("pump-1")).await.unwrap();
        assert_eq!(read, secrets);

        // The ledger holds wire-format ciphertext, never the plaintext.
        let sealed = vault.read_sealed(&RecordId::from("pump-1")).await.unwrap();
        let wire = std::str::from_utf8(sealed.service_notes.as_bytes()).unwrap();
        assert!(wire.contains(':'));
        assert!(!wire.contains("occlusion"));
    }

    #[tokio::test]
    async fn test_unauthorized_register() {
        let ledger = Arc::new(MemoryLedger::new(id(1)).unwrap());
        let outsider = Vault::new(id(2), ledger, config());

        let err = outsider
            .register("pump-1", fields(), &DeviceSecrets::new("a", "b"))
            .await
            .unwrap_err();
        assert_eq!(err.as_access(), Some(&AccessError::NotAuthorized(id(2))));
    }

    #[tokio::test]
    async fn test_open_rejects_non_utf8() {
        let ledger = Arc::new(MemoryLedger::new(id(1)).unwrap());
        let vault = Vault::new(id(1), ledger, config());

        let err = vault
            .open(&Ciphertext::from(vec![0xff, 0xfe]))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_crypto(),
            Some(CryptoError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_secrets_debug_is_redacted() {
        let secrets = DeviceSecrets::new("classified", "classified");
        assert_eq!(format!("{:?}", secrets), "DeviceSecrets(..)");
    }
}
