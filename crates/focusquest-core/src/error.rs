//! Core error types for focusquest-core.
//!
//! This module defines the error hierarchy using thiserror. Command
//! processing itself never fails; errors come from the edges (storage,
//! configuration, collaborator-side validation, the runtime channel).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusquest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Passcode errors
    #[error("Passcode error: {0}")]
    Passcode(#[from] PasscodeError),

    /// The store worker has shut down and no longer accepts commands
    #[error("Store worker is no longer running")]
    StoreClosed,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence gateway errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Read failed
    #[error("Failed to read key '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Write failed
    #[error("Failed to write key '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Snapshot could not be encoded or decoded
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home/config directory could not be created
    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Payload validation errors, raised by collaborators before a command is built.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty
    #[error("'{field}' must not be empty")]
    Empty { field: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Referenced entity does not exist
    #[error("No {kind} with id '{id}'")]
    NotFound { kind: String, id: String },
}

/// Access-gate errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PasscodeError {
    #[error("Incorrect passcode")]
    Mismatch,

    #[error("Current passcode is incorrect")]
    CurrentIncorrect,

    #[error("New passcode must be exactly 6 digits")]
    InvalidFormat,

    #[error("New passcode and confirmation do not match")]
    ConfirmationMismatch,
}

impl StorageError {
    fn is_locked(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
                )
        )
    }

    pub(crate) fn read(key: &str, err: rusqlite::Error) -> Self {
        if Self::is_locked(&err) {
            return StorageError::Locked;
        }
        StorageError::ReadFailed {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(key: &str, err: rusqlite::Error) -> Self {
        if Self::is_locked(&err) {
            return StorageError::Locked;
        }
        StorageError::WriteFailed {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
