//! SQLite implementation of the Ledger trait.
//!
//! The primary durable backend. Uses rusqlite with bundled SQLite, wrapped
//! in async via tokio::spawn_blocking.
//!
//! The full state is cached in memory and loaded once at open. Reads are
//! answered from the cache under its own `RwLock` and never touch the
//! connection. A write holds the connection mutex for its whole sequence:
//! plan against the cache, persist inside one SQLite transaction, and only
//! after commit apply to the cache. A failed commit leaves the cache as it
//! was. A cache that cannot follow a committed write is marked diverged and
//! the ledger refuses further calls until reopened.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, error, info, warn};

use medvault_access::{
    AuthorizationLedger, Ciphertext, DeviceStatus, Notification, NotificationKind, Record,
    RecordStore, SealedFields, VisibleFields,
};
use medvault_core::{now_millis, Identity, RecordId};

use crate::error::{LedgerError, Result};
use crate::migration;
use crate::state::LedgerState;
use crate::traits::{
    Confirmation, Ledger, LedgerConfig, NotificationRecord, Operation, Query, QueryResponse,
    Transaction,
};

const ADMINISTRATOR_KEY: &str = "administrator";

/// SQLite-backed ledger.
///
/// Thread-safe. The connection sits behind a Mutex that serializes writes;
/// the state cache sits behind a separate RwLock so reads proceed while a
/// write is doing I/O.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
    cache: Arc<RwLock<LedgerCache>>,
    config: LedgerConfig,
}

struct LedgerCache {
    state: LedgerState,
    height: u64,

    /// Set when a committed write could not be applied to the cache.
    diverged: bool,
}

impl SqliteLedger {
    /// Open (or create) a ledger database at `path`.
    ///
    /// A new database is initialized with `admin`. An existing one must have
    /// been created with the same administrator.
    pub fn open(path: impl AsRef<Path>, admin: Identity, config: LedgerConfig) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let ledger = Self::from_connection(conn, admin, config)?;
        info!(path = %path.display(), administrator = %admin, "opened sqlite ledger");
        Ok(ledger)
    }

    /// Open an in-memory SQLite database. Useful for testing.
    pub fn open_memory(admin: Identity) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, admin, LedgerConfig::default())
    }

    fn from_connection(mut conn: Connection, admin: Identity, config: LedgerConfig) -> Result<Self> {
        migrate_and_init(&mut conn, admin)?;
        let state = load_state(&conn, admin)?;
        let height = load_height(&conn)?;

        debug!(
            height,
            records = state.records().len(),
            "loaded ledger state"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            cache: Arc::new(RwLock::new(LedgerCache {
                state,
                height,
                diverged: false,
            })),
            config,
        })
    }

    /// Run `f` on a blocking thread with access to the connection and cache.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Mutex<Connection>, &RwLock<LedgerCache>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        let cache = self.cache.clone();
        tokio::task::spawn_blocking(move || f(&conn, &cache))
            .await
            .map_err(|e| LedgerError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

fn lock_conn(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| LedgerError::Unavailable(format!("mutex poisoned: {}", e)))
}

fn diverged() -> LedgerError {
    LedgerError::Unavailable("state cache diverged from database; reopen the ledger".to_string())
}

fn read_cache(cache: &RwLock<LedgerCache>) -> Result<RwLockReadGuard<'_, LedgerCache>> {
    let guard = cache
        .read()
        .map_err(|e| LedgerError::Unavailable(format!("lock poisoned: {}", e)))?;
    if guard.diverged {
        return Err(diverged());
    }
    Ok(guard)
}

fn write_cache(cache: &RwLock<LedgerCache>) -> Result<RwLockWriteGuard<'_, LedgerCache>> {
    let guard = cache
        .write()
        .map_err(|e| LedgerError::Unavailable(format!("lock poisoned: {}", e)))?;
    if guard.diverged {
        return Err(diverged());
    }
    Ok(guard)
}

fn migrate_and_init(conn: &mut Connection, admin: Identity) -> Result<()> {
    migration::migrate(conn)?;

    let stored: Option<Vec<u8>> = conn
        .query_row(
            "SELECT value FROM ledger_meta WHERE key = ?1",
            params![ADMINISTRATOR_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(bytes) => {
            let stored = identity_from_column("ledger_meta.value", &bytes)?;
            if stored != admin {
                return Err(LedgerError::AdministratorMismatch {
                    stored,
                    requested: admin,
                });
            }
        }
        None => {
            // Validates the administrator before anything is written.
            LedgerState::new(admin)?;
            conn.execute(
                "INSERT INTO ledger_meta (key, value) VALUES (?1, ?2)",
                params![ADMINISTRATOR_KEY, admin.as_bytes().as_slice()],
            )?;
        }
    }

    Ok(())
}

fn identity_from_column(column: &str, bytes: &[u8]) -> Result<Identity> {
    Identity::from_slice(bytes)
        .map_err(|e| LedgerError::InvalidData(format!("{}: {}", column, e)))
}

fn load_height(conn: &Connection) -> Result<u64> {
    let height: i64 = conn.query_row(
        "SELECT COALESCE(MAX(height), 0) FROM notifications",
        [],
        |row| row.get(0),
    )?;
    Ok(height as u64)
}

fn load_state(conn: &Connection, admin: Identity) -> Result<LedgerState> {
    let mut stmt = conn.prepare("SELECT identity, authorized FROM authorizations")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)? != 0))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut entries = Vec::with_capacity(rows.len());
    for (bytes, authorized) in rows {
        entries.push((identity_from_column("authorizations.identity", &bytes)?, authorized));
    }
    let authz = AuthorizationLedger::restore(admin, entries)?;

    let mut stmt = conn.prepare(
        "SELECT id, name, category, status, last_maintenance, next_maintenance,
                service_notes, fault_history, registered_by, registered_at,
                updated_by, updated_at
         FROM records",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RecordRow {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                status: row.get(3)?,
                last_maintenance: row.get(4)?,
                next_maintenance: row.get(5)?,
                service_notes: row.get(6)?,
                fault_history: row.get(7)?,
                registered_by: row.get(8)?,
                registered_at: row.get(9)?,
                updated_by: row.get(10)?,
                updated_at: row.get(11)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let records = rows
        .into_iter()
        .map(RecordRow::into_record)
        .collect::<Result<Vec<_>>>()?;

    Ok(LedgerState::from_parts(authz, RecordStore::restore(records)))
}

/// A `records` row before validation.
struct RecordRow {
    id: String,
    name: String,
    category: String,
    status: u8,
    last_maintenance: i64,
    next_maintenance: i64,
    service_notes: Vec<u8>,
    fault_history: Vec<u8>,
    registered_by: Vec<u8>,
    registered_at: i64,
    updated_by: Vec<u8>,
    updated_at: i64,
}

impl RecordRow {
    fn into_record(self) -> Result<Record> {
        let status = DeviceStatus::from_u8(self.status).ok_or_else(|| {
            LedgerError::InvalidData(format!("records.status: unknown value {}", self.status))
        })?;

        Ok(Record {
            id: RecordId::new(self.id),
            fields: VisibleFields {
                name: self.name,
                category: self.category,
                status,
                last_maintenance: self.last_maintenance,
                next_maintenance: self.next_maintenance,
            },
            sealed: SealedFields::new(
                Ciphertext::from(self.service_notes),
                Ciphertext::from(self.fault_history),
            ),
            exists: true,
            registered_by: identity_from_column("records.registered_by", &self.registered_by)?,
            registered_at: self.registered_at,
            updated_by: identity_from_column("records.updated_by", &self.updated_by)?,
            updated_at: self.updated_at,
        })
    }
}

/// Write the rows an operation touches.
fn write_operation(db: &rusqlite::Transaction<'_>, tx: &Transaction, now: i64) -> Result<()> {
    let caller = tx.caller.as_bytes().as_slice();

    match &tx.operation {
        Operation::Grant { target } | Operation::Revoke { target } => {
            let authorized = matches!(tx.operation, Operation::Grant { .. });
            db.execute(
                "INSERT INTO authorizations (identity, authorized, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(identity) DO UPDATE SET
                    authorized = excluded.authorized,
                    updated_at = excluded.updated_at",
                params![target.as_bytes().as_slice(), authorized as i64, now],
            )?;
        }
        Operation::Register { id, fields, sealed } => {
            db.execute(
                "INSERT INTO records (
                    id, name, category, status, last_maintenance, next_maintenance,
                    service_notes, fault_history, registered_by, registered_at,
                    updated_by, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?9, ?10)",
                params![
                    id.as_str(),
                    &fields.name,
                    &fields.category,
                    fields.status.to_u8() as i64,
                    fields.last_maintenance,
                    fields.next_maintenance,
                    sealed.service_notes.as_bytes(),
                    sealed.fault_history.as_bytes(),
                    caller,
                    now,
                ],
            )?;
        }
        Operation::Update { id, fields, sealed } => {
            let changed = db.execute(
                "UPDATE records SET
                    name = ?2, category = ?3, status = ?4,
                    last_maintenance = ?5, next_maintenance = ?6,
                    service_notes = ?7, fault_history = ?8,
                    updated_by = ?9, updated_at = ?10
                 WHERE id = ?1",
                params![
                    id.as_str(),
                    &fields.name,
                    &fields.category,
                    fields.status.to_u8() as i64,
                    fields.last_maintenance,
                    fields.next_maintenance,
                    sealed.service_notes.as_bytes(),
                    sealed.fault_history.as_bytes(),
                    caller,
                    now,
                ],
            )?;
            if changed != 1 {
                return Err(LedgerError::InvalidData(format!(
                    "records: expected one row for {}, updated {}",
                    id, changed
                )));
            }
        }
    }

    Ok(())
}

fn encode_notification(notification: &Notification) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(notification, &mut buf)
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_notification(bytes: &[u8]) -> Result<Notification> {
    ciborium::from_reader(bytes).map_err(|e| LedgerError::Serialization(e.to_string()))
}

/// Persist a planned transaction and its notification in one SQLite
/// transaction. On error nothing is written.
fn persist(
    conn: &mut Connection,
    tx: &Transaction,
    notification: &Notification,
    height: u64,
    now: i64,
) -> Result<()> {
    let db = conn.transaction()?;
    write_operation(&db, tx, now)?;
    db.execute(
        "INSERT INTO notifications (height, kind, timestamp, payload) VALUES (?1, ?2, ?3, ?4)",
        params![
            height as i64,
            notification.kind().to_u8() as i64,
            now,
            encode_notification(notification)?,
        ],
    )?;
    db.commit()?;
    Ok(())
}

/// Apply a committed transaction to the cache.
///
/// The database already holds the write, so a failure here means the cache
/// no longer matches it. The ledger is then marked diverged.
fn apply_committed(
    cache: &RwLock<LedgerCache>,
    tx: &Transaction,
    height: u64,
    now: i64,
) -> Result<()> {
    let mut cache = write_cache(cache)?;
    match cache.state.execute(tx, now) {
        Ok(_) => {
            cache.height = height;
            Ok(())
        }
        Err(e) => {
            cache.diverged = true;
            error!(height, error = %e, "committed transaction could not be applied to the cache");
            Err(diverged())
        }
    }
}

fn submit_blocking(
    conn: &Mutex<Connection>,
    cache: &RwLock<LedgerCache>,
    tx: &Transaction,
) -> Result<Confirmation> {
    // Held until the cache is updated: this is what serializes writes.
    let mut conn = lock_conn(conn)?;

    let now = now_millis();
    let (notification, height) = {
        let cache = read_cache(cache)?;
        (cache.state.plan(tx, now)?, cache.height + 1)
    };

    persist(&mut conn, tx, &notification, height, now)?;
    apply_committed(cache, tx, height, now)?;

    Ok(Confirmation {
        height,
        timestamp: now,
        notification,
    })
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn submit_transaction(&self, tx: Transaction) -> Result<Confirmation> {
        let op = tx.operation.name();
        let caller = tx.caller;

        let result = self
            .blocking(move |conn, cache| submit_blocking(conn, cache, &tx))
            .await;
        match &result {
            Ok(c) => debug!(op, caller = %caller, height = c.height, "transaction confirmed"),
            Err(e) => warn!(op, caller = %caller, error = %e, "transaction rejected"),
        }
        result
    }

    async fn read_state(&self, query: Query) -> Result<QueryResponse> {
        let cache = read_cache(&self.cache)?;
        cache.state.query(&query, cache.height)
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

        let from = from.min(i64::MAX as u64) as i64;
        let to = to.min(i64::MAX as u64) as i64;

        self.blocking(move |conn, _| {
            let conn = lock_conn(conn)?;
            let mut stmt = conn.prepare(
                "SELECT height, timestamp, payload FROM notifications
                 WHERE kind = ?1 AND height >= ?2 AND height <= ?3
                 ORDER BY height",
            )?;

            let rows = stmt
                .query_map(params![kind.to_u8() as i64, from, to], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(height, timestamp, payload)| {
                    Ok(NotificationRecord {
                        height: height as u64,
                        timestamp,
                        notification: decode_notification(&payload)?,
                    })
                })
                .collect()
        })
        .await
    }
}
