//! Countdown state machine for the active timer.
//!
//! The machine does not own a clock or a thread - the caller drives it by
//! invoking `tick()` once per second while it is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --tick(0)--> Expired --resolve--> Idle
//!                   |  ^
//!              stop |  | start
//!                   v  |
//!                   Idle
//! ```
//!
//! `Expired` is transient: the tick that reaches zero resolves it in the
//! same call. Each `start` opens a new run (`generation`); an expiry is
//! resolved at most once per run.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = ActiveTimer::default();
//! timer.start(SessionType::Focus, 25, None);
//! // Once per second:
//! if let Some(expiry) = timer.tick() {
//!     // log a session for expiry.session_type
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::session::SessionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    /// Countdown reached zero but the run has not been resolved yet.
    Expired,
}

/// Produced exactly once when a run counts down to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    pub generation: u64,
    pub session_type: SessionType,
    pub task_id: Option<String>,
}

/// The single process-wide countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTimer {
    is_active: bool,
    /// Remaining time in seconds.
    time_left: u32,
    #[serde(rename = "type")]
    session_type: SessionType,
    #[serde(default)]
    task_id: Option<String>,
    /// Run counter, bumped by every `start`.
    #[serde(default)]
    generation: u64,
    /// Generation whose expiry has already been emitted.
    #[serde(default)]
    resolved_generation: Option<u64>,
}

impl Default for ActiveTimer {
    fn default() -> Self {
        Self {
            is_active: false,
            time_left: 0,
            session_type: SessionType::Focus,
            task_id: None,
            generation: 0,
            resolved_generation: None,
        }
    }
}

impl ActiveTimer {
    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        match (self.is_active, self.time_left) {
            (false, _) => TimerState::Idle,
            (true, 0) => TimerState::Expired,
            (true, _) => TimerState::Running,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_running(&self) -> bool {
        self.state() == TimerState::Running
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `mm:ss` rendering of the remaining time.
    pub fn format_time_left(&self) -> String {
        format!("{:02}:{:02}", self.time_left / 60, self.time_left % 60)
    }

    /// 0.0 .. 100.0 progress against a run of `total_minutes`.
    pub fn progress_pct(&self, total_minutes: u32) -> f64 {
        let total = total_minutes.saturating_mul(60);
        if total == 0 {
            return 0.0;
        }
        let elapsed = total.saturating_sub(self.time_left);
        (elapsed as f64 / total as f64 * 100.0).min(100.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a new run, discarding whatever was in progress.
    ///
    /// Returns the generation of the new run.
    pub fn start(
        &mut self,
        session_type: SessionType,
        duration_minutes: u32,
        task_id: Option<String>,
    ) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.is_active = true;
        self.time_left = duration_minutes.saturating_mul(60);
        self.session_type = session_type;
        self.task_id = task_id;
        self.resolved_generation = None;
        self.generation
    }

    /// Pause the countdown, keeping the remaining time.
    ///
    /// Returns `false` when there was nothing running.
    pub fn stop(&mut self) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        true
    }

    /// Advance by one second. Returns the expiry when this tick ends the run.
    pub fn tick(&mut self) -> Option<Expiry> {
        if !self.is_active {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            return self.resolve();
        }
        None
    }

    /// Resolve a pending expiry, if any.
    ///
    /// Idempotent: once a run's expiry has been emitted, further calls
    /// return `None` until the next `start`.
    pub fn resolve(&mut self) -> Option<Expiry> {
        if self.state() != TimerState::Expired {
            return None;
        }
        self.is_active = false;
        if self.resolved_generation == Some(self.generation) {
            return None;
        }
        self.resolved_generation = Some(self.generation);
        Some(Expiry {
            generation: self.generation,
            session_type: self.session_type,
            task_id: self.task_id.clone(),
        })
    }
}
