//! Achievement catalog and unlock evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The progress counter an achievement is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    TasksCompleted,
    FocusSessions,
    StreakDays,
    ProjectCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub target: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    #[serde(default)]
    pub earned_at: Option<DateTime<Utc>>,
    pub requirement: Requirement,
}

impl Achievement {
    fn catalog_entry(
        id: &str,
        title: &str,
        description: &str,
        icon: &str,
        kind: MetricKind,
        target: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
            earned_at: None,
            requirement: Requirement { kind, target },
        }
    }

    pub fn is_earned(&self) -> bool {
        self.earned_at.is_some()
    }
}

/// Read-only view of the counters requirements are checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub tasks_completed: u32,
    pub focus_sessions: u32,
    pub streak_days: u32,
    pub projects_completed: u32,
}

impl Metrics {
    pub fn get(&self, kind: MetricKind) -> u32 {
        match kind {
            MetricKind::TasksCompleted => self.tasks_completed,
            MetricKind::FocusSessions => self.focus_sessions,
            MetricKind::StreakDays => self.streak_days,
            MetricKind::ProjectCompleted => self.projects_completed,
        }
    }
}

/// The fixed catalog every new profile starts with.
pub fn default_achievements() -> Vec<Achievement> {
    vec![
        Achievement::catalog_entry(
            "first-task",
            "Getting Started",
            "Complete your first task",
            "Trophy",
            MetricKind::TasksCompleted,
            1,
        ),
        Achievement::catalog_entry(
            "task-master-10",
            "Task Master",
            "Complete 10 tasks",
            "Star",
            MetricKind::TasksCompleted,
            10,
        ),
        Achievement::catalog_entry(
            "focus-warrior-5",
            "Focus Warrior",
            "Complete 5 focus sessions",
            "Target",
            MetricKind::FocusSessions,
            5,
        ),
        Achievement::catalog_entry(
            "streak-champion",
            "Streak Champion",
            "Maintain a 7-day streak",
            "Flame",
            MetricKind::StreakDays,
            7,
        ),
        Achievement::catalog_entry(
            "project-finisher",
            "Project Finisher",
            "Complete your first project",
            "CheckCircle",
            MetricKind::ProjectCompleted,
            1,
        ),
    ]
}

/// Stamp `now` on every un-earned achievement whose metric has reached
/// its target. Earned achievements are skipped entirely.
///
/// Returns the ids unlocked by this call, in catalog order.
pub fn evaluate_achievements(
    metrics: &Metrics,
    achievements: &mut [Achievement],
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut unlocked = Vec::new();
    for achievement in achievements.iter_mut().filter(|a| !a.is_earned()) {
        if metrics.get(achievement.requirement.kind) >= achievement.requirement.target {
            achievement.earned_at = Some(now);
            unlocked.push(achievement.id.clone());
        }
    }
    unlocked
}
