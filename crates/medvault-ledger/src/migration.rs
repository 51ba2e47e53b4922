//! Database schema migrations for SQLite.
//!
//! Simple versioned migrations. Each version is applied once, inside the
//! same transaction that records it in `schema_migrations`.

use rusqlite::Connection;

use medvault_core::now_millis;

use crate::error::{LedgerError, Result};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(LedgerError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(LedgerError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Singleton values: administrator, height
        CREATE TABLE ledger_meta (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL
        );

        -- Explicit grants; the administrator never appears here
        CREATE TABLE authorizations (
            identity BLOB PRIMARY KEY,        -- 20 bytes
            authorized INTEGER NOT NULL,      -- 0 or 1
            updated_at INTEGER NOT NULL
        );

        -- Records are never deleted
        CREATE TABLE records (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            status INTEGER NOT NULL,          -- DeviceStatus as u8
            last_maintenance INTEGER NOT NULL,
            next_maintenance INTEGER NOT NULL,
            service_notes BLOB NOT NULL,      -- opaque ciphertext
            fault_history BLOB NOT NULL,      -- opaque ciphertext
            registered_by BLOB NOT NULL,
            registered_at INTEGER NOT NULL,
            updated_by BLOB NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- One row per confirmed transaction
        CREATE TABLE notifications (
            height INTEGER PRIMARY KEY,
            kind INTEGER NOT NULL,            -- NotificationKind as u8
            timestamp INTEGER NOT NULL,       -- server time (Unix ms)
            payload BLOB NOT NULL             -- CBOR-encoded notification
        );

        CREATE INDEX idx_notifications_kind_height ON notifications(kind, height);
        "#,
    )?;

    Ok(())
}
