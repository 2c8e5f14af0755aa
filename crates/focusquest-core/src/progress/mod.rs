//! Gamified progress: points, levels, counters and achievements.
//!
//! The arithmetic lives in [`engine`] and [`achievements`] as pure
//! functions. [`UserProgress`] is the record that carries the results. Its
//! level is not stored at all: it is read off the point total every time,
//! so a snapshot carrying a stale `level` field cannot change it.

pub mod achievements;
pub mod engine;
pub mod streak;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use achievements::{
    default_achievements, evaluate_achievements, Achievement, MetricKind, Metrics, Requirement,
};
pub use engine::{
    level_for_points, level_progress, points_for_focus_session, points_for_task, LevelProgress,
    FOCUS_SESSION_POINTS,
};
pub use streak::next_streak;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    total_points: u64,
    #[serde(default)]
    streak_days: u32,
    #[serde(default)]
    last_active_date: Option<NaiveDate>,
    #[serde(default)]
    tasks_completed: u32,
    #[serde(default)]
    focus_sessions_completed: u32,
    #[serde(default)]
    projects_completed: u32,
    #[serde(default = "default_achievements")]
    achievements: Vec<Achievement>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            total_points: 0,
            streak_days: 0,
            last_active_date: None,
            tasks_completed: 0,
            focus_sessions_completed: 0,
            projects_completed: 0,
            achievements: default_achievements(),
        }
    }
}

impl UserProgress {
    // ── Queries ──────────────────────────────────────────────────────

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn level(&self) -> u32 {
        level_for_points(self.total_points)
    }

    pub fn streak_days(&self) -> u32 {
        self.streak_days
    }

    pub fn last_active_date(&self) -> Option<NaiveDate> {
        self.last_active_date
    }

    pub fn tasks_completed(&self) -> u32 {
        self.tasks_completed
    }

    pub fn focus_sessions_completed(&self) -> u32 {
        self.focus_sessions_completed
    }

    pub fn projects_completed(&self) -> u32 {
        self.projects_completed
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn earned_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.is_earned()).count()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            tasks_completed: self.tasks_completed,
            focus_sessions: self.focus_sessions_completed,
            streak_days: self.streak_days,
            projects_completed: self.projects_completed,
        }
    }

    pub fn level_progress(&self) -> LevelProgress {
        level_progress(self.total_points)
    }

    // ── Mutations (processor only) ───────────────────────────────────

    /// Add points. Returns the level before the award.
    pub(crate) fn award(&mut self, points: u64) -> u32 {
        let before = self.level();
        self.total_points = self.total_points.saturating_add(points);
        before
    }

    pub(crate) fn record_task_completed(&mut self) {
        self.tasks_completed = self.tasks_completed.saturating_add(1);
    }

    pub(crate) fn record_focus_session(&mut self) {
        self.focus_sessions_completed = self.focus_sessions_completed.saturating_add(1);
    }

    pub(crate) fn set_projects_completed(&mut self, count: u32) {
        self.projects_completed = count;
    }

    pub(crate) fn set_streak(&mut self, streak_days: u32, last_active_date: Option<NaiveDate>) {
        self.streak_days = streak_days;
        self.last_active_date = last_active_date;
    }

    /// Run the unlock pass against the current counters.
    pub(crate) fn evaluate_achievements(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let metrics = self.metrics();
        evaluate_achievements(&metrics, &mut self.achievements, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn award_rederives_level() {
        let mut progress = UserProgress::default();
        assert_eq!(progress.level(), 1);
        let before = progress.award(95);
        assert_eq!(before, 1);
        assert_eq!(progress.level(), 1);
        progress.award(10);
        assert_eq!(progress.total_points(), 105);
        assert_eq!(progress.level(), 2);
    }

    #[test]
    fn metrics_mirror_counters() {
        let mut progress = UserProgress::default();
        progress.record_task_completed();
        progress.record_focus_session();
        progress.record_focus_session();
        progress.set_streak(4, None);
        let m = progress.metrics();
        assert_eq!(m.tasks_completed, 1);
        assert_eq!(m.focus_sessions, 2);
        assert_eq!(m.streak_days, 4);
    }

    #[test]
    fn legacy_snapshot_without_catalog_gets_defaults() {
        let json = r#"{"total_points": 240, "level": 3}"#;
        let progress: UserProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.level(), 3);
        assert_eq!(progress.achievements().len(), 5);
    }

    #[test]
    fn stale_stored_level_is_ignored() {
        let json = r#"{"progress":{"total_points":250,"level":1}}"#;
        let state: crate::state::AppState = serde_json::from_str(json).unwrap();
        assert_eq!(state.progress.total_points(), 250);
        assert_eq!(state.progress.level(), 3);

        let json = r#"{"total_points": 40, "level": 9}"#;
        let progress: UserProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.level(), 1);
    }
}
