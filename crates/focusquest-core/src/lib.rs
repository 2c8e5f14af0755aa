//! # FocusQuest Core Library
//!
//! This library provides the core logic for FocusQuest, a personal
//! productivity tracker: tasks and projects, a Pomodoro-style focus timer,
//! free-text idea capture, and a points/levels/achievements layer on top.
//! The `focusquest` CLI is a thin surface over this crate.
//!
//! ## Architecture
//!
//! - **Command processor**: every change to the [`AppState`] aggregate is a
//!   [`Command`] applied by [`processor::apply`]. Application is synchronous,
//!   total and deterministic for a given [`Clock`].
//! - **Timer**: a caller-driven countdown. Something outside the machine
//!   (the [`runtime`] ticker, or a test) issues one `Tick` per second.
//! - **Progress**: pure point, level, streak and achievement functions.
//! - **Storage**: the aggregate is saved as one JSON snapshot in a
//!   key-value store (SQLite by default) plus a TOML process config.
//!
//! ## Key Components
//!
//! - [`AppState`]: the aggregate root
//! - [`Command`] / [`Event`]: what goes in and what comes out of `apply`
//! - [`ActiveTimer`]: timer state machine
//! - [`Store`]: single-writer async worker with ticker and persistence
//! - [`SnapshotStore`] / [`Database`] / [`Config`]: persistence

pub mod auth;
pub mod brain_dump;
pub mod clock;
pub mod command;
pub mod error;
pub mod events;
pub mod processor;
pub mod progress;
pub mod project;
pub mod runtime;
pub mod settings;
pub mod state;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use auth::{change_passcode, AccessGate};
pub use brain_dump::{BrainDumpEntry, BrainDumpPatch};
pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use command::Command;
pub use error::{ConfigError, CoreError, PasscodeError, StorageError, ValidationError};
pub use events::Event;
pub use processor::{apply, apply_with, Applied};
pub use progress::{Achievement, LevelProgress, UserProgress};
pub use project::{Project, ProjectPatch};
pub use runtime::{Store, StoreHandle};
pub use settings::{Settings, SettingsPatch, Theme};
pub use state::AppState;
pub use stats::{summarize, Stats};
pub use storage::{
    Commit, Config, Database, KvStore, Lease, MemoryStore, SharedStore, SnapshotStore, Versioned,
};
pub use task::{Priority, Subtask, Task, TaskPatch, TaskStatus};
pub use timer::{ActiveTimer, Expiry, SessionType, TimerSession, TimerState};
