//! Point and level arithmetic. Pure functions, no state.

use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task};

pub const BASE_TASK_POINTS: u64 = 5;
pub const HIGH_PRIORITY_BONUS: u64 = 5;
pub const MEDIUM_PRIORITY_BONUS: u64 = 2;
pub const POINTS_PER_SUBTASK: u64 = 1;
/// Awarded for each focus session that runs to natural expiry.
pub const FOCUS_SESSION_POINTS: u64 = 10;
pub const POINTS_PER_LEVEL: u64 = 100;

/// Points for completing `task`: base + priority bonus + one per subtask,
/// whether or not the subtask is checked off.
pub fn points_for_task(task: &Task) -> u64 {
    let bonus = match task.priority {
        Priority::High => HIGH_PRIORITY_BONUS,
        Priority::Medium => MEDIUM_PRIORITY_BONUS,
        Priority::Low => 0,
    };
    BASE_TASK_POINTS + bonus + POINTS_PER_SUBTASK * task.subtasks.len() as u64
}

pub fn points_for_focus_session() -> u64 {
    FOCUS_SESSION_POINTS
}

/// Level 1 starts at 0 points; every 100 points is one more level.
pub fn level_for_points(total_points: u64) -> u32 {
    let level = total_points / POINTS_PER_LEVEL + 1;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// Where a point total sits inside its level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub points_into_level: u64,
    pub points_to_next_level: u64,
    /// 0.0 .. 100.0
    pub pct: f64,
}

pub fn level_progress(total_points: u64) -> LevelProgress {
    let into = total_points % POINTS_PER_LEVEL;
    LevelProgress {
        level: level_for_points(total_points),
        points_into_level: into,
        points_to_next_level: POINTS_PER_LEVEL - into,
        pct: into as f64 / POINTS_PER_LEVEL as f64 * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Subtask;
    use chrono::Utc;
    use proptest::prelude::*;

    fn task(priority: Priority, subtasks: usize) -> Task {
        let now = Utc::now();
        Task::new("t", "task", now)
            .with_priority(priority)
            .with_subtasks(
                (0..subtasks)
                    .map(|i| Subtask::new(format!("s{i}"), "step", now))
                    .collect(),
            )
    }

    #[test]
    fn task_points_by_priority_and_subtasks() {
        assert_eq!(points_for_task(&task(Priority::High, 3)), 13);
        assert_eq!(points_for_task(&task(Priority::Medium, 0)), 7);
        assert_eq!(points_for_task(&task(Priority::Low, 0)), 5);
    }

    #[test]
    fn subtask_completion_does_not_change_points() {
        let mut t = task(Priority::Low, 2);
        let before = points_for_task(&t);
        t.subtasks[0].completed = true;
        assert_eq!(points_for_task(&t), before);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(250), 3);
    }

    #[test]
    fn level_progress_splits_points() {
        let p = level_progress(130);
        assert_eq!(p.level, 2);
        assert_eq!(p.points_into_level, 30);
        assert_eq!(p.points_to_next_level, 70);
        assert_eq!(p.pct, 30.0);
    }

    proptest! {
        #[test]
        fn level_is_monotone(a in 0u64..10_000_000, b in 0u64..10_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_points(lo) <= level_for_points(hi));
        }

        #[test]
        fn level_at_hundreds(k in 0u64..1_000_000) {
            prop_assert_eq!(level_for_points(100 * k) as u64, k + 1);
        }
    }
}
