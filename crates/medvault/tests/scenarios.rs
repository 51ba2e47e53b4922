//! End-to-end scenarios over both ledger backends.

use std::sync::Arc;

use anyhow::Result;
use medvault::access::{AccessError, DeviceStatus, NotificationKind, VisibleFields};
use medvault::crypto::{CryptoError, KdfParams};
use medvault::ledger::{Ledger, LedgerConfig, LedgerExt, MemoryLedger, SqliteLedger};
use medvault::{DeviceSecrets, RecordId, Vault, VaultConfig};
use medvault_testkit::{sealed, visible_fields, TestFixture, ADMIN, NETWORK, OUTSIDER, TECHNICIAN};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn config() -> VaultConfig {
    VaultConfig {
        network_id: NETWORK,
        kdf: KdfParams::minimum(),
        ..VaultConfig::default()
    }
}

/// Administrator registers a device; the public view is open, the sealed
/// view is not.
async fn register_and_gate<L: Ledger>(ledger: Arc<L>) -> Result<()> {
    let admin = Vault::new(ADMIN, ledger.clone(), config());
    let outsider = Vault::new(OUTSIDER, ledger.clone(), config());
    let id = RecordId::from("dev-001");

    let e1 = admin.seal("Replaced gradient coil").await?;
    let e2 = admin.seal("2024-03: quench event, no damage").await?;
    let confirmation = admin
        .register_sealed(id.clone(), visible_fields("MRI-X200"), sealed_from(&e1, &e2))
        .await?;
    assert_eq!(confirmation.height, 1);

    let info = outsider.public_info(&id).await?;
    assert_eq!(info.fields, visible_fields("MRI-X200"));
    assert!(info.exists);

    let err = outsider.read_sealed(&id).await.unwrap_err();
    assert_eq!(err.as_access(), Some(&AccessError::NotAuthorized(OUTSIDER)));

    let fetched = admin.read_sealed(&id).await?;
    assert_eq!(fetched.service_notes, e1);
    assert_eq!(fetched.fault_history, e2);

    let secrets = admin.read(&id).await?;
    assert_eq!(secrets.service_notes, "Replaced gradient coil");
    Ok(())
}

/// Technician is granted access, overwrites the record and reads back what
/// they wrote.
async fn technician_update<L: Ledger>(ledger: Arc<L>) -> Result<()> {
    let admin = Vault::new(ADMIN, ledger.clone(), config());
    let tech = Vault::new(TECHNICIAN, ledger.clone(), config());
    let id = RecordId::from("dev-001");

    admin
        .register(
            id.clone(),
            visible_fields("MRI-X200"),
            &DeviceSecrets::new("initial install", "none"),
        )
        .await?;

    // Not yet authorized.
    let err = tech
        .update(id.clone(), visible_fields("MRI-X200"), &DeviceSecrets::new("x", "y"))
        .await
        .unwrap_err();
    assert_eq!(err.as_access(), Some(&AccessError::NotAuthorized(TECHNICIAN)));

    admin.grant(TECHNICIAN).await?;
    assert!(tech.is_authorized(&TECHNICIAN).await?);

    let secrets = DeviceSecrets::new("Helium top-up; cold head serviced", "Compressor fault cleared");
    let e3 = tech.seal(&secrets.service_notes).await?;
    let e4 = tech.seal(&secrets.fault_history).await?;
    let fields = VisibleFields::new("MRI-X200", "imaging", DeviceStatus::UnderMaintenance);
    tech.update_sealed(id.clone(), fields.clone(), sealed_from(&e3, &e4))
        .await?;

    let fetched = tech.read_sealed(&id).await?;
    assert_eq!(fetched.service_notes, e3);
    assert_eq!(fetched.fault_history, e4);
    assert_eq!(tech.read(&id).await?, secrets);

    // Full replace of the public fields.
    let info = tech.public_info(&id).await?;
    assert_eq!(info.fields, fields);
    assert!(info.updated_at >= info.registered_at);

    // Each credential has its own key: the administrator may fetch the
    // ciphertext but cannot open what the technician sealed.
    let err = admin.read(&id).await.unwrap_err();
    assert_eq!(err.as_crypto(), Some(&CryptoError::AuthenticationFailure));

    // After revocation the technician is locked out again.
    admin.revoke(TECHNICIAN).await?;
    let err = tech.read_sealed(&id).await.unwrap_err();
    assert_eq!(err.as_access(), Some(&AccessError::NotAuthorized(TECHNICIAN)));
    Ok(())
}

fn sealed_from(
    a: &medvault::access::Ciphertext,
    b: &medvault::access::Ciphertext,
) -> medvault::access::SealedFields {
    medvault::access::SealedFields::new(a.clone(), b.clone())
}

#[tokio::test]
async fn test_register_and_gate_memory() -> Result<()> {
    init_tracing();
    register_and_gate(Arc::new(MemoryLedger::new(ADMIN)?)).await
}

#[tokio::test]
async fn test_register_and_gate_sqlite() -> Result<()> {
    init_tracing();
    register_and_gate(Arc::new(SqliteLedger::open_memory(ADMIN)?)).await
}

#[tokio::test]
async fn test_technician_update_memory() -> Result<()> {
    init_tracing();
    technician_update(Arc::new(MemoryLedger::new(ADMIN)?)).await
}

#[tokio::test]
async fn test_technician_update_sqlite() -> Result<()> {
    init_tracing();
    technician_update(Arc::new(SqliteLedger::open_memory(ADMIN)?)).await
}

#[tokio::test]
async fn test_non_admin_cannot_grant() -> Result<()> {
    let fixture = TestFixture::new()?;
    let admin = Vault::new(fixture.admin, fixture.ledger.clone(), config());
    let tech = Vault::new(fixture.technician, fixture.ledger.clone(), config());

    admin.grant(fixture.technician).await?;
    let err = tech.grant(fixture.outsider).await.unwrap_err();
    assert_eq!(
        err.as_access(),
        Some(&AccessError::NotAdministrator(fixture.technician))
    );
    assert!(!fixture.ledger.is_authorized(&fixture.outsider).await?);

    // The administrator cannot be revoked.
    let err = admin.revoke(fixture.admin).await.unwrap_err();
    assert_eq!(
        err.as_access(),
        Some(&AccessError::NotAuthorizedYet(fixture.admin))
    );
    assert!(admin.is_authorized(&fixture.admin).await?);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_register_keeps_original() -> Result<()> {
    let fixture = TestFixture::new()?;
    let admin = Vault::new(fixture.admin, fixture.ledger.clone(), config());
    let id = RecordId::from("dev-001");

    admin
        .register_sealed(id.clone(), visible_fields("MRI-X200"), sealed("aa:01", "bb:02"))
        .await?;
    let err = admin
        .register_sealed(
            id.clone(),
            VisibleFields::new("Other", "other", DeviceStatus::Critical),
            sealed("cc:03", "dd:04"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.as_access(), Some(&AccessError::DuplicateId(id.clone())));

    assert_eq!(admin.public_info(&id).await?.fields, visible_fields("MRI-X200"));
    assert_eq!(admin.read_sealed(&id).await?, sealed("aa:01", "bb:02"));
    Ok(())
}

#[tokio::test]
async fn test_empty_ciphertext_rejected() -> Result<()> {
    let fixture = TestFixture::new()?;
    let admin = Vault::new(fixture.admin, fixture.ledger.clone(), config());

    let err = admin
        .register_sealed("dev-002", visible_fields("MRI-X200"), sealed("aa:01", ""))
        .await
        .unwrap_err();
    assert_eq!(
        err.as_access(),
        Some(&AccessError::EmptyCiphertext("fault_history"))
    );
    assert_eq!(fixture.ledger.height().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_notifications_emitted_once() -> Result<()> {
    let fixture = TestFixture::new()?;
    let admin = Vault::new(fixture.admin, fixture.ledger.clone(), config());

    admin.grant(fixture.technician).await?;
    assert!(admin.grant(fixture.technician).await.is_err());
    admin.revoke(fixture.technician).await?;
    admin
        .register_sealed("dev-001", visible_fields("MRI-X200"), sealed("a", "b"))
        .await?;

    let ledger = &fixture.ledger;
    let granted = ledger
        .query_notifications(NotificationKind::AuthorizationGranted, 1, u64::MAX)
        .await?;
    let revoked = ledger
        .query_notifications(NotificationKind::AuthorizationRevoked, 1, u64::MAX)
        .await?;
    let registered = ledger
        .query_notifications(NotificationKind::RecordRegistered, 1, u64::MAX)
        .await?;

    assert_eq!(granted.len(), 1);
    assert_eq!(revoked.len(), 1);
    assert_eq!(registered.len(), 1);
    assert_eq!(
        [granted[0].height, revoked[0].height, registered[0].height],
        [1, 2, 3]
    );
    assert_eq!(registered[0].notification.actor(), &fixture.admin);
    Ok(())
}

#[tokio::test]
async fn test_discovery_merges_manual_ids() -> Result<()> {
    let fixture = TestFixture::new()?;
    let admin = Vault::new(fixture.admin, fixture.ledger.clone(), config());

    for n in 0..3 {
        admin
            .register_sealed(format!("dev-{}", n), visible_fields("MRI-X200"), sealed("a", "b"))
            .await?;
    }

    let report = admin
        .discover_record_ids([RecordId::from("legacy-7"), RecordId::from("dev-0")])
        .await;
    assert!(report.complete);
    assert_eq!((report.scanned_from, report.scanned_to), (1, 3));
    assert_eq!(
        report.ids,
        vec![
            RecordId::from("dev-0"),
            RecordId::from("dev-1"),
            RecordId::from("dev-2"),
            RecordId::from("legacy-7"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_discovery_window_is_best_effort() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut narrow = config();
    narrow.discovery.window = 2;
    let admin = Vault::new(fixture.admin, fixture.ledger.clone(), narrow);

    for n in 0..4 {
        admin
            .register_sealed(format!("dev-{}", n), visible_fields("MRI-X200"), sealed("a", "b"))
            .await?;
    }

    let report = admin.discover_record_ids([RecordId::from("dev-0")]).await;
    assert!(!report.complete);
    assert_eq!((report.scanned_from, report.scanned_to), (3, 4));
    assert_eq!(
        report.ids,
        vec![
            RecordId::from("dev-0"),
            RecordId::from("dev-2"),
            RecordId::from("dev-3"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_discovery_degrades_on_range_limit() -> Result<()> {
    init_tracing();
    let limited = LedgerConfig {
        max_notification_range: Some(1),
    };
    let ledger = Arc::new(MemoryLedger::with_config(ADMIN, limited)?);
    let admin = Vault::new(ADMIN, ledger, config());

    for n in 0..3 {
        admin
            .register_sealed(format!("dev-{}", n), visible_fields("MRI-X200"), sealed("a", "b"))
            .await?;
    }

    let report = admin.discover_record_ids([RecordId::from("dev-1")]).await;
    assert!(!report.complete);
    assert_eq!(report.ids, vec![RecordId::from("dev-1")]);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_reopen_keeps_records_readable() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("vault.db");
    let secrets = DeviceSecrets::new("Replaced gradient coil", "No faults");

    {
        let ledger = Arc::new(SqliteLedger::open(&path, ADMIN, LedgerConfig::default())?);
        let admin = Vault::new(ADMIN, ledger, config());
        admin.register("dev-001", visible_fields("MRI-X200"), &secrets).await?;
        admin.grant(TECHNICIAN).await?;
    }

    let ledger = Arc::new(SqliteLedger::open(&path, ADMIN, LedgerConfig::default())?);
    let admin = Vault::new(ADMIN, ledger.clone(), config());
    assert_eq!(admin.read(&RecordId::from("dev-001")).await?, secrets);
    assert!(ledger.is_authorized(&TECHNICIAN).await?);
    Ok(())
}
