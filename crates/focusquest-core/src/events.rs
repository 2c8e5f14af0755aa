use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionType, TimerSession};

/// Every notable state change produced by the processor.
/// The CLI prints them; the runtime logs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        session_type: SessionType,
        duration_secs: u32,
        task_id: Option<String>,
        generation: u64,
        at: DateTime<Utc>,
    },
    /// Countdown paused by the user. No session is logged.
    TimerStopped {
        time_left: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session: TimerSession,
    },
    TaskCompleted {
        task_id: String,
        points: u64,
        at: DateTime<Utc>,
    },
    PointsAwarded {
        points: u64,
        total_points: u64,
        at: DateTime<Utc>,
    },
    LevelUp {
        from: u32,
        to: u32,
        at: DateTime<Utc>,
    },
    AchievementUnlocked {
        achievement_id: String,
        title: String,
        at: DateTime<Utc>,
    },
    StateLoaded {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine-readable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerStopped { .. } => "timer_stopped",
            Event::SessionCompleted { .. } => "session_completed",
            Event::TaskCompleted { .. } => "task_completed",
            Event::PointsAwarded { .. } => "points_awarded",
            Event::LevelUp { .. } => "level_up",
            Event::AchievementUnlocked { .. } => "achievement_unlocked",
            Event::StateLoaded { .. } => "state_loaded",
        }
    }
}
