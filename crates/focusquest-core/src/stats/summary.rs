use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::motivation::motivational_message;
use crate::progress::LevelProgress;
use crate::state::AppState;
use crate::timer::TimerSession;

/// Task and focus totals for one calendar window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub tasks_completed: usize,
    pub focus_sessions: usize,
    pub focus_minutes: u64,
}

impl PeriodStats {
    /// Focus time in hours, rounded to one decimal.
    pub fn focus_hours(&self) -> f64 {
        round_tenth(self.focus_minutes as f64 / 60.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub today: PeriodStats,
    /// The seven days ending now.
    pub last_7_days: PeriodStats,
    /// Since the most recent Sunday.
    pub this_week: PeriodStats,
    pub this_month: PeriodStats,
    pub total_focus_minutes: u64,
    pub total_focus_hours: f64,
    pub pending_tasks: usize,
    pub unprocessed_brain_dump: usize,
    pub achievements_earned: usize,
    pub achievements_locked: usize,
    pub streak_days: u32,
    pub level: LevelProgress,
    pub message: String,
}

/// Midnight UTC of the Sunday on or before `day`.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

pub fn start_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Summarize `state` as seen at `now`.
pub fn summarize(state: &AppState, now: DateTime<Utc>) -> Stats {
    let today = now.date_naive();
    let week_start = start_of_week(today);
    let month_start = start_of_month(today);
    let seven_days_ago = now - Duration::days(7);

    let on_or_after = |day: NaiveDate| move |at: DateTime<Utc>| at.date_naive() >= day;

    let total_focus_minutes = focus_sessions(&state.timer_sessions)
        .map(|s| u64::from(s.duration))
        .sum();
    let achievements_earned = state.progress.earned_count();

    Stats {
        today: period(state, |at| at.date_naive() == today),
        last_7_days: period(state, |at| at >= seven_days_ago),
        this_week: period(state, on_or_after(week_start)),
        this_month: period(state, on_or_after(month_start)),
        total_focus_minutes,
        total_focus_hours: round_tenth(total_focus_minutes as f64 / 60.0),
        pending_tasks: state.pending_tasks().count(),
        unprocessed_brain_dump: state.unprocessed_brain_dump().count(),
        achievements_earned,
        achievements_locked: state.progress.achievements().len() - achievements_earned,
        streak_days: state.progress.streak_days(),
        level: state.progress.level_progress(),
        message: motivational_message(&state.progress).to_string(),
    }
}

fn period(state: &AppState, within: impl Fn(DateTime<Utc>) -> bool) -> PeriodStats {
    let tasks_completed = state
        .tasks
        .iter()
        .filter_map(|t| t.completed_at)
        .filter(|at| within(*at))
        .count();
    let (focus_sessions, focus_minutes) = focus_sessions(&state.timer_sessions)
        .filter(|s| within(s.completed_at))
        .fold((0, 0), |(n, mins), s| (n + 1, mins + u64::from(s.duration)));
    PeriodStats {
        tasks_completed,
        focus_sessions,
        focus_minutes,
    }
}

fn focus_sessions(sessions: &[TimerSession]) -> impl Iterator<Item = &TimerSession> {
    sessions.iter().filter(|s| s.is_completed_focus())
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain_dump::BrainDumpEntry;
    use crate::task::{Task, TaskStatus};
    use crate::timer::SessionType;
    use chrono::TimeZone;

    // Wednesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 15, 18, 0, 0).unwrap()
    }

    fn session(at: DateTime<Utc>, session_type: SessionType, duration: u32) -> TimerSession {
        TimerSession {
            id: at.timestamp_millis().to_string(),
            task_id: None,
            session_type,
            duration,
            completed_at: at,
            was_completed: true,
        }
    }

    fn done_task(id: &str, at: DateTime<Utc>) -> Task {
        let mut task = Task::new(id, id, at - Duration::days(1));
        task.status = TaskStatus::Completed;
        task.completed_at = Some(at);
        task
    }

    #[test]
    fn week_starts_on_sunday() {
        let wed = NaiveDate::from_ymd_opt(2026, 4, 15).unwrap();
        assert_eq!(start_of_week(wed), NaiveDate::from_ymd_opt(2026, 4, 12).unwrap());
        let sun = NaiveDate::from_ymd_opt(2026, 4, 12).unwrap();
        assert_eq!(start_of_week(sun), sun);
        assert_eq!(start_of_month(wed), NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    }

    #[test]
    fn windows_count_tasks_and_focus_time() {
        let now = now();
        let mut state = AppState::default();
        state.tasks = vec![
            done_task("today", now - Duration::hours(2)),
            done_task("monday", now - Duration::days(2)),
            done_task("april-2", now - Duration::days(13)),
            done_task("march", now - Duration::days(40)),
            Task::new("open", "open", now),
        ];
        state.timer_sessions = vec![
            session(now - Duration::hours(1), SessionType::Focus, 25),
            session(now - Duration::hours(1), SessionType::ShortBreak, 5),
            session(now - Duration::days(5), SessionType::Focus, 50),
            session(now - Duration::days(20), SessionType::Focus, 30),
        ];

        let stats = summarize(&state, now);
        assert_eq!(stats.today.tasks_completed, 1);
        assert_eq!(stats.today.focus_sessions, 1);
        assert_eq!(stats.this_week.tasks_completed, 2);
        assert_eq!(stats.this_week.focus_minutes, 25);
        assert_eq!(stats.last_7_days.focus_sessions, 2);
        assert_eq!(stats.last_7_days.focus_minutes, 75);
        assert_eq!(stats.this_month.tasks_completed, 3);
        assert_eq!(stats.this_month.focus_minutes, 75);
        assert_eq!(stats.total_focus_minutes, 105);
        assert_eq!(stats.total_focus_hours, 1.8);
        assert_eq!(stats.pending_tasks, 1);
    }

    #[test]
    fn backlog_and_achievement_counts() {
        let now = now();
        let mut state = AppState::default();
        let mut processed = BrainDumpEntry::capture("b2", "done #idea", now);
        processed.processed = true;
        state.brain_dump = vec![BrainDumpEntry::capture("b1", "call mom", now), processed];

        let stats = summarize(&state, now);
        assert_eq!(stats.unprocessed_brain_dump, 1);
        assert_eq!(stats.achievements_earned, 0);
        assert_eq!(stats.achievements_locked, 5);
        assert_eq!(stats.level.level, 1);
        assert_eq!(stats.message, super::super::MOTIVATIONAL_MESSAGES[0]);
    }
}
