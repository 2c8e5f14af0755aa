use clap::Subcommand;
use focusquest_core::progress::streak::is_streak_alive;
use focusquest_core::Achievement;
use serde::Serialize;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Points, level and counters
    Show,
    /// Achievement catalog with earned dates
    Achievements {
        /// Only earned achievements
        #[arg(long)]
        earned: bool,
    },
}

#[derive(Serialize)]
struct ProgressView {
    total_points: u64,
    level: u32,
    points_into_level: u64,
    points_to_next_level: u64,
    level_pct: f64,
    streak_days: u32,
    streak_alive: bool,
    tasks_completed: u32,
    focus_sessions_completed: u32,
    projects_completed: u32,
    achievements_earned: usize,
}

pub fn run(action: ProgressAction) -> CliResult {
    let session = Session::open()?;
    let progress = &session.state().progress;

    match action {
        ProgressAction::Show => {
            let level = progress.level_progress();
            let today = chrono::Utc::now().date_naive();
            print_json(&ProgressView {
                total_points: progress.total_points(),
                level: progress.level(),
                points_into_level: level.points_into_level,
                points_to_next_level: level.points_to_next_level,
                level_pct: level.pct,
                streak_days: progress.streak_days(),
                streak_alive: is_streak_alive(progress.last_active_date(), today),
                tasks_completed: progress.tasks_completed(),
                focus_sessions_completed: progress.focus_sessions_completed(),
                projects_completed: progress.projects_completed(),
                achievements_earned: progress.earned_count(),
            })?;
        }
        ProgressAction::Achievements { earned } => {
            let list: Vec<&Achievement> = progress
                .achievements()
                .iter()
                .filter(|a| !earned || a.is_earned())
                .collect();
            print_json(&list)?;
        }
    }
    Ok(())
}
