//! SQLite-backed key-value store.
//!
//! The whole application state is one opaque value under one key, so the
//! main table is a single `kv` table. Every write bumps the row's
//! `revision`, which lets a writer detect that someone else saved since it
//! loaded.
//!
//! Several `focusquest` processes can share one file. While a foreground
//! timer follower runs it holds a row in `lease`; other processes then
//! append their commands to `inbox` instead of writing the snapshot, and
//! the follower applies them.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use super::KvStore;
use crate::error::StorageError;

/// How long a writer waits on another process's transaction.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of [`Database::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The snapshot was written.
    Saved,
    /// A follower holds the lease; the commands were queued for it.
    Forwarded,
    /// The stored revision moved since the caller loaded it. Nothing was
    /// written.
    Conflict,
}

/// SQLite database holding the `kv`, `lease` and `inbox` tables.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the schema created.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database. Contents vanish with the value.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StorageError::write("kv", e))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key      TEXT PRIMARY KEY,
                value    TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 1
            );
            CREATE TABLE IF NOT EXISTS lease (
                key       TEXT PRIMARY KEY,
                owner     TEXT NOT NULL,
                heartbeat INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS inbox (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                key     TEXT NOT NULL,
                command TEXT NOT NULL
            );",
        )
        .map_err(|e| StorageError::write("kv", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&conn)
    }

    /// Run `f` inside `BEGIN IMMEDIATE`, so no other process can write
    /// between its reads and its writes.
    fn immediate<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StorageError> {
        self.with_conn(|conn| {
            conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")
                .map_err(|e| StorageError::write(key, e))?;
            let result = f(conn).and_then(|value| conn.execute_batch("COMMIT;").map(|()| value));
            if result.is_err() {
                conn.execute_batch("ROLLBACK;").ok();
            }
            result.map_err(|e| StorageError::write(key, e))
        })
    }

    /// Value and revision stored under `key`.
    pub fn get_versioned(&self, key: &str) -> Result<Option<(String, i64)>, StorageError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value, revision FROM kv WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .map_err(|e| StorageError::read(key, e))
        })
    }

    /// Write `value` if the row is still at `expected_revision` (0 for a
    /// missing row) and no follower holds the lease on `key`.
    ///
    /// When a follower holds the lease, `commands` are queued in its inbox
    /// instead and the snapshot is left alone.
    pub fn commit(
        &self,
        key: &str,
        value: &str,
        expected_revision: i64,
        commands: &[String],
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Commit, StorageError> {
        self.immediate(key, |conn| {
            if leased_by_other(conn, key, None, now, ttl)? {
                for command in commands {
                    conn.execute(
                        "INSERT INTO inbox (key, command) VALUES (?1, ?2)",
                        params![key, command],
                    )?;
                }
                return Ok(Commit::Forwarded);
            }
            let current = conn
                .query_row(
                    "SELECT revision FROM kv WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .unwrap_or(0);
            if current != expected_revision {
                return Ok(Commit::Conflict);
            }
            upsert(conn, key, value)?;
            Ok(Commit::Saved)
        })
    }

    /// Take or refresh the lease on `key` for `owner`.
    ///
    /// Returns `false` while another owner's heartbeat is younger than `ttl`.
    pub fn acquire_lease(
        &self,
        key: &str,
        owner: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StorageError> {
        self.immediate(key, |conn| {
            if leased_by_other(conn, key, Some(owner), now, ttl)? {
                return Ok(false);
            }
            conn.execute(
                "INSERT OR REPLACE INTO lease (key, owner, heartbeat) VALUES (?1, ?2, ?3)",
                params![key, owner, now.timestamp_millis()],
            )?;
            Ok(true)
        })
    }

    /// Remove and return every queued command for `key`, oldest first.
    pub fn take_inbox(&self, key: &str) -> Result<Vec<String>, StorageError> {
        self.immediate(key, |conn| drain_inbox(conn, key))
    }

    /// Write the follower's final `value` and drop its lease, unless
    /// commands arrived in the meantime.
    ///
    /// Returns those commands with the lease still held; an empty result
    /// means the lease is gone. An owner that already lost the lease
    /// writes nothing.
    pub fn release_lease(
        &self,
        key: &str,
        owner: &str,
        value: &str,
    ) -> Result<Vec<String>, StorageError> {
        self.immediate(key, |conn| {
            let holder = conn
                .query_row(
                    "SELECT owner FROM lease WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            if holder.as_deref() != Some(owner) {
                return Ok(Vec::new());
            }
            let pending = drain_inbox(conn, key)?;
            if !pending.is_empty() {
                return Ok(pending);
            }
            upsert(conn, key, value)?;
            conn.execute(
                "DELETE FROM lease WHERE key = ?1 AND owner = ?2",
                params![key, owner],
            )?;
            Ok(Vec::new())
        })
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO kv (key, value, revision) VALUES (?1, ?2, 1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, revision = kv.revision + 1",
        params![key, value],
    )
}

/// Whether a lease on `key` belongs to someone other than `owner` and is
/// still fresh.
fn leased_by_other(
    conn: &Connection,
    key: &str,
    owner: Option<&str>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> rusqlite::Result<bool> {
    let lease = conn
        .query_row(
            "SELECT owner, heartbeat FROM lease WHERE key = ?1",
            params![key],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;
    let Some((holder, heartbeat)) = lease else {
        return Ok(false);
    };
    if owner == Some(holder.as_str()) {
        return Ok(false);
    }
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    Ok(now.timestamp_millis().saturating_sub(heartbeat) < ttl_ms)
}

fn drain_inbox(conn: &Connection, key: &str) -> rusqlite::Result<Vec<String>> {
    let commands = {
        let mut stmt = conn.prepare("SELECT command FROM inbox WHERE key = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
        let commands = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        commands
    };
    if !commands.is_empty() {
        conn.execute("DELETE FROM inbox WHERE key = ?1", params![key])?;
    }
    Ok(commands)
}

impl KvStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get_versioned(key)?.map(|(value, _)| value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| upsert(conn, key, value).map_err(|e| StorageError::write(key, e)))?;
        Ok(())
    }
}
