//! Statistics for FocusQuest
//!
//! Read-only summaries over the aggregate: completion counts per calendar
//! window, focus time, backlog sizes and achievement totals. Nothing here
//! mutates state.

mod motivation;
mod summary;

pub use motivation::{motivational_message, MOTIVATIONAL_MESSAGES};
pub use summary::{summarize, start_of_month, start_of_week, PeriodStats, Stats};
