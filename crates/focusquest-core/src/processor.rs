//! Command processor: the single writer of [`AppState`].
//!
//! `apply` is total and synchronous. Every command yields a new state; a
//! command that refers to a missing entity, or that the processor does not
//! recognize, returns the state unchanged. Progress side effects (points,
//! level, counters, achievements) are triggered from exactly two places:
//! a task entering `Completed`, and a session being appended to the log.

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace};

use crate::clock::{Clock, SystemClock};
use crate::command::Command;
use crate::events::Event;
use crate::progress::{points_for_focus_session, points_for_task};
use crate::state::AppState;
use crate::task::Task;
use crate::timer::{Expiry, TimerSession};

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub state: AppState,
    pub events: Vec<Event>,
}

/// Apply `command` using the system clock.
pub fn apply(state: AppState, command: Command) -> AppState {
    apply_with(state, command, &SystemClock).state
}

/// Apply `command`, reading the current time from `clock`.
pub fn apply_with(state: AppState, command: Command, clock: &dyn Clock) -> Applied {
    let mut ctx = Context {
        state,
        events: Vec::new(),
        now: clock.now(),
    };
    debug!(command = command.name(), "applying command");
    ctx.dispatch(command);
    Applied {
        state: ctx.state,
        events: ctx.events,
    }
}

struct Context {
    state: AppState,
    events: Vec<Event>,
    now: DateTime<Utc>,
}

impl Context {
    fn dispatch(&mut self, command: Command) {
        match command {
            Command::AddTask { task } => self.add_task(task),
            Command::UpdateTask { id, patch } => {
                let Some(task) = self.state.task_mut(&id) else {
                    trace!(task_id = %id, "update for unknown task ignored");
                    return;
                };
                let before = task.clone();
                patch.apply_to(task);
                self.settle_completion(&before);
            }
            Command::DeleteTask { id } => {
                self.state.tasks.retain(|t| t.id != id);
                self.state.refresh_project_counts();
            }
            Command::AddSubtask { task_id, subtask } => {
                if let Some(task) = self.state.task_mut(&task_id) {
                    task.subtasks.push(subtask);
                }
            }
            Command::ToggleSubtask {
                task_id,
                subtask_id,
            } => {
                if let Some(subtask) = self
                    .state
                    .task_mut(&task_id)
                    .and_then(|t| t.subtasks.iter_mut().find(|s| s.id == subtask_id))
                {
                    subtask.completed = !subtask.completed;
                }
            }
            Command::DeleteSubtask {
                task_id,
                subtask_id,
            } => {
                if let Some(task) = self.state.task_mut(&task_id) {
                    task.subtasks.retain(|s| s.id != subtask_id);
                }
            }

            Command::AddProject { project } => {
                self.state.projects.push(project);
                self.state.refresh_project_counts();
            }
            Command::UpdateProject { id, patch } => {
                if let Some(project) = self.state.projects.iter_mut().find(|p| p.id == id) {
                    patch.apply_to(project);
                }
            }
            Command::DeleteProject { id } => {
                self.state.projects.retain(|p| p.id != id);
                for task in self
                    .state
                    .tasks
                    .iter_mut()
                    .filter(|t| t.project_id.as_deref() == Some(id.as_str()))
                {
                    task.project_id = None;
                }
            }

            Command::AddBrainDump { entry } => self.state.brain_dump.push(entry),
            Command::UpdateBrainDump { id, patch } => {
                if let Some(entry) = self.state.brain_dump.iter_mut().find(|e| e.id == id) {
                    patch.apply_to(entry);
                }
            }
            Command::DeleteBrainDump { id } => self.state.brain_dump.retain(|e| e.id != id),

            Command::UpdateSettings { patch } => patch.apply_to(&mut self.state.settings),

            Command::StartTimer {
                session_type,
                duration_minutes,
                task_id,
            } => {
                let generation =
                    self.state
                        .timer
                        .start(session_type, duration_minutes, task_id.clone());
                self.events.push(Event::TimerStarted {
                    session_type,
                    duration_secs: self.state.timer.time_left(),
                    task_id,
                    generation,
                    at: self.now,
                });
                // A zero-length run is over as soon as it starts.
                if let Some(expiry) = self.state.timer.resolve() {
                    self.complete_run(expiry);
                }
            }
            Command::StopTimer => {
                if self.state.timer.stop() {
                    self.events.push(Event::TimerStopped {
                        time_left: self.state.timer.time_left(),
                        at: self.now,
                    });
                }
            }
            Command::Tick => {
                if let Some(expiry) = self.state.timer.tick() {
                    self.complete_run(expiry);
                }
            }
            Command::CompleteTimer => {
                if let Some(expiry) = self.state.timer.resolve() {
                    self.complete_run(expiry);
                }
            }
            Command::RecordSession { session } => self.record_session(session),

            Command::UpdateStreak {
                streak_days,
                last_active_date,
            } => {
                self.state.progress.set_streak(streak_days, last_active_date);
                self.unlock_achievements();
            }

            Command::Load { state } => {
                self.state = *state;
                self.events.push(Event::StateLoaded { at: self.now });
            }

            Command::Unknown => trace!("unknown command ignored"),
        }
    }

    // ── Tasks ────────────────────────────────────────────────────────

    fn add_task(&mut self, mut task: Task) {
        if task.is_completed() {
            task.completed_at.get_or_insert(self.now);
        } else {
            task.completed_at = None;
        }
        self.state.tasks.push(task);
        self.state.refresh_project_counts();
    }

    /// Enforce the completion-timestamp invariant on the task that was just
    /// patched, and run the completion award on a transition into
    /// `Completed`. Points are computed from `before`.
    fn settle_completion(&mut self, before: &Task) {
        let now = self.now;
        let Some(task) = self.state.task_mut(&before.id) else {
            return;
        };

        let entering = task.is_completed() && !before.is_completed();
        if entering {
            task.completed_at = Some(now);
        } else if !task.is_completed() {
            task.completed_at = None;
        }

        let finished_projects = self.state.refresh_project_counts();
        if !entering {
            return;
        }

        let points = points_for_task(before);
        info!(task_id = %before.id, points, "task completed");
        self.events.push(Event::TaskCompleted {
            task_id: before.id.clone(),
            points,
            at: now,
        });
        self.state.progress.record_task_completed();
        self.state.progress.set_projects_completed(finished_projects);
        self.award(points);
        self.unlock_achievements();
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Turn a resolved expiry into a logged session. The logged duration is
    /// the configured length for the type, not the elapsed time.
    fn complete_run(&mut self, expiry: Expiry) {
        let session = TimerSession {
            id: format!("{}-{}", self.now.timestamp_millis(), expiry.generation),
            task_id: expiry.task_id,
            session_type: expiry.session_type,
            duration: self.state.settings.duration_for(expiry.session_type),
            completed_at: self.now,
            was_completed: true,
        };
        self.record_session(session);
    }

    fn record_session(&mut self, session: TimerSession) {
        info!(
            session_type = %session.session_type,
            duration = session.duration,
            was_completed = session.was_completed,
            "session logged"
        );
        let focus_credit = session.is_completed_focus();
        self.state.timer_sessions.push(session.clone());
        self.events.push(Event::SessionCompleted { session });

        if focus_credit {
            self.state.progress.record_focus_session();
            self.award(points_for_focus_session());
            self.unlock_achievements();
        }
    }

    // ── Progress ─────────────────────────────────────────────────────

    fn award(&mut self, points: u64) {
        let from = self.state.progress.award(points);
        let to = self.state.progress.level();
        self.events.push(Event::PointsAwarded {
            points,
            total_points: self.state.progress.total_points(),
            at: self.now,
        });
        if to > from {
            info!(from, to, "level up");
            self.events.push(Event::LevelUp {
                from,
                to,
                at: self.now,
            });
        }
    }

    fn unlock_achievements(&mut self) {
        for id in self.state.progress.evaluate_achievements(self.now) {
            let title = self
                .state
                .progress
                .achievement(&id)
                .map(|a| a.title.clone())
                .unwrap_or_default();
            info!(achievement = %id, "achievement unlocked");
            self.events.push(Event::AchievementUnlocked {
                achievement_id: id,
                title,
                at: self.now,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::project::Project;
    use crate::task::{Priority, Subtask, TaskPatch, TaskStatus};
    use crate::timer::{SessionType, TimerState};
    use chrono::TimeZone;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap())
    }

    fn run(state: AppState, command: Command) -> Applied {
        apply_with(state, command, &clock())
    }

    fn with_task(task: Task) -> AppState {
        run(AppState::default(), Command::AddTask { task }).state
    }

    fn complete(state: AppState, id: &str) -> Applied {
        run(
            state,
            Command::UpdateTask {
                id: id.into(),
                patch: TaskPatch::status(TaskStatus::Completed),
            },
        )
    }

    #[test]
    fn completing_task_awards_points_once() {
        let now = clock().0;
        let task = Task::new("t1", "Ship", now)
            .with_priority(Priority::High)
            .with_subtasks(vec![Subtask::new("s1", "a", now)]);
        let state = with_task(task);

        let first = complete(state, "t1");
        assert_eq!(first.state.progress.total_points(), 11);
        assert_eq!(first.state.progress.tasks_completed(), 1);
        assert_eq!(first.state.task("t1").unwrap().completed_at, Some(now));

        let second = complete(first.state, "t1");
        assert_eq!(second.state.progress.total_points(), 11);
        assert_eq!(second.state.progress.tasks_completed(), 1);
        assert!(second.events.is_empty());
    }

    #[test]
    fn reopening_clears_completion_timestamp() {
        let state = with_task(Task::new("t1", "Ship", clock().0));
        let state = complete(state, "t1").state;
        let reopened = run(
            state,
            Command::UpdateTask {
                id: "t1".into(),
                patch: TaskPatch::status(TaskStatus::InProgress),
            },
        )
        .state;
        let task = reopened.task("t1").unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.completed_at, None);
        assert_eq!(reopened.progress.total_points(), 7);
    }

    #[test]
    fn points_use_task_as_it_was_before_update() {
        let state = with_task(Task::new("t1", "Ship", clock().0).with_priority(Priority::Low));
        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            priority: Some(Priority::High),
            ..TaskPatch::default()
        };
        let out = run(state, Command::UpdateTask { id: "t1".into(), patch });
        assert_eq!(out.state.progress.total_points(), 5);
    }

    #[test]
    fn first_completion_unlocks_first_task_achievement() {
        let state = with_task(Task::new("t1", "Ship", clock().0));
        let out = complete(state, "t1");
        let earned = out.state.progress.achievement("first-task").unwrap();
        assert_eq!(earned.earned_at, Some(clock().0));
        assert!(out.events.iter().any(|e| matches!(
            e,
            Event::AchievementUnlocked { achievement_id, .. } if achievement_id == "first-task"
        )));
    }

    #[test]
    fn finishing_a_project_counts_toward_project_achievement() {
        let now = clock().0;
        let mut state = run(
            AppState::default(),
            Command::AddProject {
                project: Project::new("p1", "Move", now),
            },
        )
        .state;
        state = run(
            state,
            Command::AddTask {
                task: Task::new("t1", "Pack", now).with_project("p1"),
            },
        )
        .state;
        assert_eq!(state.project("p1").unwrap().total_tasks, 1);

        let out = complete(state, "t1");
        assert_eq!(out.state.project("p1").unwrap().completed_tasks, 1);
        assert_eq!(out.state.progress.projects_completed(), 1);
        assert!(out
            .state
            .progress
            .achievement("project-finisher")
            .unwrap()
            .is_earned());
    }

    #[test]
    fn focus_run_logs_configured_duration() {
        let mut state = run(
            AppState::default(),
            Command::UpdateSettings {
                patch: crate::settings::SettingsPatch {
                    focus_minutes: Some(30),
                    ..Default::default()
                },
            },
        )
        .state;
        state = run(
            state,
            Command::StartTimer {
                session_type: SessionType::Focus,
                duration_minutes: 1,
                task_id: Some("t9".into()),
            },
        )
        .state;
        for _ in 0..60 {
            state = run(state, Command::Tick).state;
        }
        assert_eq!(state.timer_sessions.len(), 1);
        let session = &state.timer_sessions[0];
        assert_eq!(session.duration, 30);
        assert_eq!(session.task_id.as_deref(), Some("t9"));
        assert_eq!(state.progress.total_points(), 10);
        assert_eq!(state.progress.focus_sessions_completed(), 1);
        assert_eq!(state.timer.state(), TimerState::Idle);
    }

    #[test]
    fn break_sessions_log_without_points() {
        let mut state = run(
            AppState::default(),
            Command::StartTimer {
                session_type: SessionType::ShortBreak,
                duration_minutes: 1,
                task_id: None,
            },
        )
        .state;
        for _ in 0..60 {
            state = run(state, Command::Tick).state;
        }
        assert_eq!(state.timer_sessions.len(), 1);
        assert_eq!(state.timer_sessions[0].duration, 5);
        assert_eq!(state.progress.total_points(), 0);
    }

    #[test]
    fn zero_length_start_logs_session_immediately() {
        let applied = run(
            AppState::default(),
            Command::StartTimer {
                session_type: SessionType::Focus,
                duration_minutes: 0,
                task_id: None,
            },
        );
        assert_eq!(applied.state.timer.state(), TimerState::Idle);
        assert_eq!(applied.state.timer_sessions.len(), 1);
        assert!(applied
            .events
            .iter()
            .any(|e| matches!(e, Event::SessionCompleted { .. })));

        let state = run(applied.state, Command::StopTimer).state;
        assert_eq!(state.timer_sessions.len(), 1);
    }

    #[test]
    fn complete_timer_resolves_restored_expiry_once() {
        let json = r#"{"timer":{"is_active":true,"time_left":0,"type":"focus","generation":2}}"#;
        let restored: AppState = serde_json::from_str(json).unwrap();
        let state = run(AppState::default(), Command::Load { state: Box::new(restored) }).state;
        assert_eq!(state.timer.state(), TimerState::Expired);

        let state = run(state, Command::CompleteTimer).state;
        assert_eq!(state.timer_sessions.len(), 1);
        let state = run(state, Command::CompleteTimer).state;
        let state = run(state, Command::Tick).state;
        assert_eq!(state.timer_sessions.len(), 1);
    }

    #[test]
    fn load_bypasses_side_effects() {
        let now = clock().0;
        let mut loaded = AppState::default();
        let mut task = Task::new("t1", "done elsewhere", now);
        task.status = TaskStatus::Completed;
        task.completed_at = Some(now);
        loaded.tasks.push(task);

        let out = run(AppState::default(), Command::Load { state: Box::new(loaded.clone()) });
        assert_eq!(out.state, loaded);
        assert_eq!(out.state.progress.total_points(), 0);
    }

    #[test]
    fn unknown_and_missing_targets_are_noops() {
        let state = with_task(Task::new("t1", "Ship", clock().0));
        assert_eq!(run(state.clone(), Command::Unknown).state, state);
        let out = run(
            state.clone(),
            Command::UpdateTask {
                id: "nope".into(),
                patch: TaskPatch::status(TaskStatus::Completed),
            },
        );
        assert_eq!(out.state, state);
        assert!(out.events.is_empty());
    }

    #[test]
    fn streak_update_unlocks_streak_achievement() {
        let out = run(
            AppState::default(),
            Command::UpdateStreak {
                streak_days: 7,
                last_active_date: Some(clock().0.date_naive()),
            },
        );
        assert_eq!(out.state.progress.streak_days(), 7);
        assert!(out
            .state
            .progress
            .achievement("streak-champion")
            .unwrap()
            .is_earned());
    }

    #[test]
    fn subtask_toggle_and_delete() {
        let now = clock().0;
        let state = with_task(Task::new("t1", "Ship", now));
        let state = run(
            state,
            Command::AddSubtask {
                task_id: "t1".into(),
                subtask: Subtask::new("s1", "tests", now),
            },
        )
        .state;
        let state = run(
            state,
            Command::ToggleSubtask {
                task_id: "t1".into(),
                subtask_id: "s1".into(),
            },
        )
        .state;
        assert!(state.task("t1").unwrap().subtasks[0].completed);
        let state = run(
            state,
            Command::DeleteSubtask {
                task_id: "t1".into(),
                subtask_id: "s1".into(),
            },
        )
        .state;
        assert!(state.task("t1").unwrap().subtasks.is_empty());
    }

    #[test]
    fn level_up_event_when_crossing_hundred() {
        let mut state = AppState::default();
        state.progress.award(95);
        let out = run(
            state,
            Command::RecordSession {
                session: TimerSession {
                    id: "manual".into(),
                    task_id: None,
                    session_type: SessionType::Focus,
                    duration: 25,
                    completed_at: clock().0,
                    was_completed: true,
                },
            },
        );
        assert_eq!(out.state.progress.level(), 2);
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, Event::LevelUp { from: 1, to: 2, .. })));
    }
}
