//! Snapshot access for processes sharing one database file.
//!
//! A short-lived process loads a [`Versioned`] snapshot, applies its
//! commands locally and calls [`SharedStore::commit`]. A long-lived timer
//! follower takes a [`Lease`] instead; while it holds one, every other
//! process's commands are queued for it rather than written over its state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::database::{Commit, Database};
use super::SnapshotStore;
use crate::command::Command;
use crate::error::StorageError;
use crate::state::AppState;

/// A follower that has not renewed its lease for this long is presumed dead.
pub const LEASE_TTL: Duration = Duration::from_secs(5);

/// A loaded state plus the revision it was read at.
#[derive(Debug, Clone)]
pub struct Versioned {
    pub state: AppState,
    pub revision: i64,
}

#[derive(Clone)]
pub struct SharedStore {
    db: Arc<Database>,
    key: String,
}

impl SharedStore {
    pub fn new(db: Arc<Database>, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Plain snapshot gateway over the same row, for the store worker.
    pub fn snapshots(&self) -> SnapshotStore {
        SnapshotStore::new(self.db.clone(), self.key.clone())
    }

    /// The saved state with its revision.
    ///
    /// Unreadable or malformed snapshots load as the default state, at the
    /// stored revision so the next commit replaces them.
    pub fn load(&self) -> Versioned {
        match self.db.get_versioned(&self.key) {
            Ok(Some((raw, revision))) => {
                let state = serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!(key = %self.key, error = %e, "saved state is malformed, starting fresh");
                    AppState::default()
                });
                Versioned { state, revision }
            }
            Ok(None) => {
                debug!(key = %self.key, "no saved state");
                Versioned {
                    state: AppState::default(),
                    revision: 0,
                }
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read saved state");
                Versioned {
                    state: AppState::default(),
                    revision: 0,
                }
            }
        }
    }

    /// Save `state`, which was built by applying `commands` to the snapshot
    /// at `revision`.
    ///
    /// # Errors
    /// Returns an error if encoding or the database write fails.
    pub fn commit(
        &self,
        state: &AppState,
        revision: i64,
        commands: &[Command],
        now: DateTime<Utc>,
    ) -> Result<Commit, StorageError> {
        let raw = serde_json::to_string(state)?;
        let queued = commands
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        self.db
            .commit(&self.key, &raw, revision, &queued, now, LEASE_TTL)
    }

    /// Become the only writer of the snapshot, or `None` while another
    /// live follower is.
    ///
    /// # Errors
    /// Returns an error if the database cannot be written.
    pub fn acquire(&self, owner: &str, now: DateTime<Utc>) -> Result<Option<Lease>, StorageError> {
        if !self.db.acquire_lease(&self.key, owner, now, LEASE_TTL)? {
            return Ok(None);
        }
        Ok(Some(Lease {
            db: self.db.clone(),
            key: self.key.clone(),
            owner: owner.to_string(),
        }))
    }
}

/// Exclusive write access held by a foreground follower.
///
/// Dropping a lease without [`Lease::release`] leaves it to expire after
/// [`LEASE_TTL`].
pub struct Lease {
    db: Arc<Database>,
    key: String,
    owner: String,
}

impl Lease {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Refresh the heartbeat. `false` means another follower has taken over.
    pub fn renew(&self, now: DateTime<Utc>) -> Result<bool, StorageError> {
        self.db.acquire_lease(&self.key, &self.owner, now, LEASE_TTL)
    }

    /// Commands other processes queued since the last call, oldest first.
    pub fn take_inbox(&self) -> Result<Vec<Command>, StorageError> {
        Ok(decode_commands(self.db.take_inbox(&self.key)?))
    }

    /// Write `state` and give up the lease.
    ///
    /// When commands arrived at the last moment they are returned instead
    /// and the lease is kept; apply them and call again.
    pub fn release(&self, state: &AppState) -> Result<Vec<Command>, StorageError> {
        let raw = serde_json::to_string(state)?;
        Ok(decode_commands(
            self.db.release_lease(&self.key, &self.owner, &raw)?,
        ))
    }
}

fn decode_commands(raw: Vec<String>) -> Vec<Command> {
    raw.into_iter()
        .filter_map(|text| match serde_json::from_str(&text) {
            Ok(command) => Some(command),
            Err(e) => {
                warn!(error = %e, "dropping undecodable queued command");
                None
            }
        })
        .collect()
}
