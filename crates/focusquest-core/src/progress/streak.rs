//! Daily activity streak arithmetic.
//!
//! The streak counter is owned outside the processor: collaborators compute
//! the next value here and submit it with `Command::UpdateStreak`.

use chrono::NaiveDate;

/// Streak value after activity on `today`.
///
/// - same day as the last activity: unchanged (at least 1)
/// - the day after: extended by one
/// - anything else (first activity, gap, clock moved backwards): restarts at 1
pub fn next_streak(current: u32, last_active: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(last) = last_active else {
        return 1;
    };
    if last == today {
        return current.max(1);
    }
    if last.succ_opt() == Some(today) {
        return current.saturating_add(1);
    }
    1
}

/// Whether a streak ending on `last_active` is still alive on `today`
/// (activity today or yesterday).
pub fn is_streak_alive(last_active: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_active {
        Some(last) => last == today || last.succ_opt() == Some(today),
        None => false,
    }
}
