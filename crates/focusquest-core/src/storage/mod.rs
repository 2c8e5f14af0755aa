//! Persistence gateway.
//!
//! The application state is stored as one JSON snapshot in an opaque
//! key-value store. [`SnapshotStore`] is the gateway the rest of the crate
//! talks to; [`KvStore`] is the seam for backends. [`SharedStore`] adds
//! the revision checks and follower lease that let several processes share
//! one SQLite file.

mod config;
pub mod database;
mod shared;

pub use config::Config;
pub use database::{Commit, Database};
pub use shared::{Lease, SharedStore, Versioned, LEASE_TTL};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::{ConfigError, StorageError};
use crate::state::AppState;

/// Returns `~/.config/focusquest[-dev]/` based on FOCUSQUEST_ENV.
///
/// Set FOCUSQUEST_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSQUEST_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusquest-dev")
    } else {
        base_dir.join("focusquest")
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

/// Minimal string key-value backend.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-local store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub const DEFAULT_STATE_KEY: &str = "focusquest-state";

/// Loads and saves whole-aggregate snapshots.
#[derive(Clone)]
pub struct SnapshotStore {
    backend: Arc<dyn KvStore>,
    key: String,
}

impl SnapshotStore {
    pub fn new(backend: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), DEFAULT_STATE_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The saved state, or `None` when nothing usable is stored.
    ///
    /// Read failures and malformed snapshots are logged and reported as
    /// "no saved state"; they never reach the caller.
    pub fn load(&self) -> Option<AppState> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no saved state");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read saved state");
                return None;
            }
        };
        match serde_json::from_str::<AppState>(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(key = %self.key, error = %e, "saved state is malformed, starting fresh");
                None
            }
        }
    }

    /// The saved state, or a fresh default aggregate.
    pub fn load_or_default(&self) -> AppState {
        self.load().unwrap_or_default()
    }

    /// Write `state` as the current snapshot.
    ///
    /// # Errors
    /// Returns an error if encoding or the backend write fails. The caller's
    /// in-memory state is unaffected either way.
    pub fn save(&self, state: &AppState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)?;
        self.backend.set(&self.key, &raw)
    }
}
