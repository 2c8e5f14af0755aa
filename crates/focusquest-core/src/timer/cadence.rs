//! Which break follows a focus session.
//!
//! This is caller policy; the timer engine runs whatever it is started with.

use chrono::NaiveDate;

use super::session::{SessionType, TimerSession};

/// Every Nth completed focus session of a day earns a long break.
pub const FOCUS_SESSIONS_PER_LONG_BREAK: usize = 4;

/// Completed focus sessions whose completion falls on `day` (UTC).
pub fn focus_sessions_on(sessions: &[TimerSession], day: NaiveDate) -> usize {
    sessions
        .iter()
        .filter(|s| s.is_completed_focus() && s.completed_at.date_naive() == day)
        .count()
}

/// Break type to suggest after the latest focus session on `day`.
pub fn next_break(sessions: &[TimerSession], day: NaiveDate) -> SessionType {
    let done = focus_sessions_on(sessions, day);
    if done > 0 && done % FOCUS_SESSIONS_PER_LONG_BREAK == 0 {
        SessionType::LongBreak
    } else {
        SessionType::ShortBreak
    }
}
