//! The closed set of mutations collaborators may request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::brain_dump::{BrainDumpEntry, BrainDumpPatch};
use crate::project::{Project, ProjectPatch};
use crate::settings::SettingsPatch;
use crate::state::AppState;
use crate::task::{Subtask, Task, TaskPatch};
use crate::timer::{SessionType, TimerSession};

/// A named, payload-carrying request to change the aggregate.
///
/// Payloads are assumed well-formed; collaborators validate before building
/// a command. Commands arriving as JSON with an unrecognized `type` decode
/// to [`Command::Unknown`], which the processor ignores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // ── Tasks ────────────────────────────────────────────────────────
    AddTask {
        task: Task,
    },
    UpdateTask {
        id: String,
        patch: TaskPatch,
    },
    DeleteTask {
        id: String,
    },
    AddSubtask {
        task_id: String,
        subtask: Subtask,
    },
    ToggleSubtask {
        task_id: String,
        subtask_id: String,
    },
    DeleteSubtask {
        task_id: String,
        subtask_id: String,
    },

    // ── Projects ─────────────────────────────────────────────────────
    AddProject {
        project: Project,
    },
    UpdateProject {
        id: String,
        patch: ProjectPatch,
    },
    /// Removes the project and detaches (does not delete) its tasks.
    DeleteProject {
        id: String,
    },

    // ── Brain dump ───────────────────────────────────────────────────
    AddBrainDump {
        entry: BrainDumpEntry,
    },
    UpdateBrainDump {
        id: String,
        patch: BrainDumpPatch,
    },
    DeleteBrainDump {
        id: String,
    },

    // ── Settings ─────────────────────────────────────────────────────
    UpdateSettings {
        patch: SettingsPatch,
    },

    // ── Timer ────────────────────────────────────────────────────────
    StartTimer {
        session_type: SessionType,
        duration_minutes: u32,
        #[serde(default)]
        task_id: Option<String>,
    },
    StopTimer,
    /// Advance the countdown by one second.
    Tick,
    /// Resolve a countdown that already sits at zero.
    CompleteTimer,
    /// Append a session produced outside the timer.
    RecordSession {
        session: TimerSession,
    },

    // ── Progress ─────────────────────────────────────────────────────
    UpdateStreak {
        streak_days: u32,
        #[serde(default)]
        last_active_date: Option<NaiveDate>,
    },

    /// Replace the whole aggregate. No side effects run.
    Load {
        state: Box<AppState>,
    },

    #[serde(other)]
    Unknown,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddTask { .. } => "add_task",
            Command::UpdateTask { .. } => "update_task",
            Command::DeleteTask { .. } => "delete_task",
            Command::AddSubtask { .. } => "add_subtask",
            Command::ToggleSubtask { .. } => "toggle_subtask",
            Command::DeleteSubtask { .. } => "delete_subtask",
            Command::AddProject { .. } => "add_project",
            Command::UpdateProject { .. } => "update_project",
            Command::DeleteProject { .. } => "delete_project",
            Command::AddBrainDump { .. } => "add_brain_dump",
            Command::UpdateBrainDump { .. } => "update_brain_dump",
            Command::DeleteBrainDump { .. } => "delete_brain_dump",
            Command::UpdateSettings { .. } => "update_settings",
            Command::StartTimer { .. } => "start_timer",
            Command::StopTimer => "stop_timer",
            Command::Tick => "tick",
            Command::CompleteTimer => "complete_timer",
            Command::RecordSession { .. } => "record_session",
            Command::UpdateStreak { .. } => "update_streak",
            Command::Load { .. } => "load",
            Command::Unknown => "unknown",
        }
    }

    /// Whether this command can move the timer between running and idle.
    pub fn touches_timer(&self) -> bool {
        matches!(
            self,
            Command::StartTimer { .. }
                | Command::StopTimer
                | Command::Tick
                | Command::CompleteTimer
                | Command::Load { .. }
        )
    }
}
