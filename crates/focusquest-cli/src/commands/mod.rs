//! Subcommand implementations.
//!
//! Every subcommand loads the saved state, applies one or more commands
//! through the core processor, saves, and prints JSON on stdout. Saves
//! never overwrite a newer snapshot: they replay on top of it, or go to the
//! timer follower's inbox while one is running.

pub mod auth;
pub mod config;
pub mod dump;
pub mod progress;
pub mod project;
pub mod settings;
pub mod stats;
pub mod task;
pub mod timer;

use std::error::Error;
use std::sync::Arc;

use chrono::Utc;
use focusquest_core::progress::next_streak;
use focusquest_core::{
    apply_with, AppState, Command, Commit, Config, Database, Event, SessionType, SharedStore,
    SystemClock, ValidationError, Versioned,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

pub type CliResult = Result<(), Box<dyn Error>>;

/// Commit attempts before giving up on a snapshot that keeps moving.
const COMMIT_ATTEMPTS: usize = 5;

/// Loaded state plus the store it came from.
///
/// Commands applied through a session are remembered until [`Session::save`]
/// so they can be replayed on a newer snapshot or handed to a running timer
/// follower.
pub struct Session {
    pub config: Config,
    shared: SharedStore,
    state: AppState,
    revision: i64,
    applied: Vec<Command>,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;
        let db = Database::open(&config.database_path()?)?;
        let shared = SharedStore::new(Arc::new(db), config.storage.state_key.clone());
        let Versioned { state, revision } = shared.load();
        Ok(Self {
            config,
            shared,
            state,
            revision,
            applied: Vec::new(),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn shared(&self) -> &SharedStore {
        &self.shared
    }

    /// Apply `command`, then bump the streak if it produced activity.
    pub fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = self.apply_one(command);
        if let Some(update) = streak_update(&self.state, &events) {
            events.extend(self.apply_one(update));
        }
        events
    }

    fn apply_one(&mut self, command: Command) -> Vec<Event> {
        self.applied.push(command.clone());
        let state = std::mem::take(&mut self.state);
        let applied = apply_with(state, command, &SystemClock);
        self.state = applied.state;
        applied.events
    }

    /// Write the session's changes.
    ///
    /// If another process saved first, the pending commands are replayed on
    /// its snapshot. While a timer follower runs they are queued for it.
    pub fn save(&mut self) -> CliResult {
        for _ in 0..COMMIT_ATTEMPTS {
            let outcome =
                self.shared
                    .commit(&self.state, self.revision, &self.applied, Utc::now())?;
            match outcome {
                Commit::Saved => {
                    self.revision += 1;
                    self.applied.clear();
                    return Ok(());
                }
                Commit::Forwarded => {
                    info!(
                        commands = self.applied.len(),
                        "timer follower is running, changes handed to it"
                    );
                    self.applied.clear();
                    return Ok(());
                }
                Commit::Conflict => {
                    debug!("snapshot changed since load, replaying");
                    self.replay();
                }
            }
        }
        Err("saved state keeps changing underneath; try again".into())
    }

    fn replay(&mut self) {
        let Versioned { state, revision } = self.shared.load();
        self.state = state;
        self.revision = revision;
        for command in std::mem::take(&mut self.applied) {
            self.apply_one(command);
        }
    }
}

/// The streak command to issue after `events`, if they contain a completed
/// task or focus session and the streak has not been counted today.
pub fn streak_update(state: &AppState, events: &[Event]) -> Option<Command> {
    let active = events.iter().any(|e| match e {
        Event::TaskCompleted { .. } => true,
        Event::SessionCompleted { session } => session.session_type == SessionType::Focus,
        _ => false,
    });
    if !active {
        return None;
    }
    let today = Utc::now().date_naive();
    let progress = &state.progress;
    if progress.last_active_date() == Some(today) {
        return None;
    }
    Some(Command::UpdateStreak {
        streak_days: next_streak(progress.streak_days(), progress.last_active_date(), today),
        last_active_date: Some(today),
    })
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trimmed `value`, or an error naming `field` when nothing is left.
pub fn require_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

pub fn require_minutes(field: &str, minutes: u32) -> Result<u32, ValidationError> {
    if minutes == 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must be at least 1 minute".into(),
        });
    }
    Ok(minutes)
}

pub fn not_found(kind: &str, id: &str) -> ValidationError {
    ValidationError::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

pub fn split_tags(raw: Option<String>) -> Vec<String> {
    raw.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print each event as one compact JSON line.
pub fn print_events(events: &[Event]) -> CliResult {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusquest_core::{Task, TaskPatch, TaskStatus};

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(require_text("title", "  Ship  ").unwrap(), "Ship");
        assert_eq!(
            require_text("title", "   "),
            Err(ValidationError::Empty {
                field: "title".into()
            })
        );
        assert!(require_minutes("minutes", 0).is_err());
    }

    #[test]
    fn tags_are_split_and_trimmed() {
        assert_eq!(
            split_tags(Some("home, errands,,".into())),
            vec!["home".to_string(), "errands".to_string()]
        );
        assert!(split_tags(None).is_empty());
    }

    #[test]
    fn streak_counts_once_per_day() {
        let now = Utc::now();
        let state = AppState::default();
        let state = apply_with(
            state,
            Command::AddTask {
                task: Task::new("t1", "a", now),
            },
            &SystemClock,
        )
        .state;
        let applied = apply_with(
            state,
            Command::UpdateTask {
                id: "t1".into(),
                patch: TaskPatch::status(TaskStatus::Completed),
            },
            &SystemClock,
        );

        let update = streak_update(&applied.state, &applied.events).unwrap();
        let state = apply_with(applied.state, update, &SystemClock).state;
        assert_eq!(state.progress.streak_days(), 1);
        assert!(streak_update(&state, &applied.events).is_none());
    }
}
