use chrono::Utc;
use clap::Subcommand;
use focusquest_core::summarize;

use super::{print_json, CliResult, Session};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Dashboard summary (today, week, month, totals)
    Summary,
    /// Logged timer sessions, newest first
    Sessions {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Only focus sessions
        #[arg(long)]
        focus_only: bool,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let session = Session::open()?;

    match action {
        StatsAction::Summary => {
            let stats = summarize(session.state(), Utc::now());
            print_json(&stats)?;
        }
        StatsAction::Sessions { limit, focus_only } => {
            let sessions: Vec<_> = session
                .state()
                .timer_sessions
                .iter()
                .rev()
                .filter(|s| !focus_only || s.is_completed_focus())
                .take(limit)
                .collect();
            print_json(&sessions)?;
        }
    }
    Ok(())
}
