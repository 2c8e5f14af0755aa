use crate::progress::UserProgress;

pub const MOTIVATIONAL_MESSAGES: [&str; 8] = [
    "Every task completed is a step towards your goals. Keep going!",
    "Your consistency is building amazing habits. You're doing fantastic!",
    "Progress isn't always linear, but you're moving in the right direction.",
    "Each focus session strengthens your concentration muscle. Well done!",
    "Your dedication to growth is inspiring. Continue this amazing journey!",
    "Small steps lead to big achievements. You're proving it every day!",
    "Your productivity skills are improving with each completed task.",
    "The effort you're putting in today will benefit your future self.",
];

/// Message rotated by point total, so it changes as points come in.
pub fn motivational_message(progress: &UserProgress) -> &'static str {
    let idx = progress.total_points() % MOTIVATIONAL_MESSAGES.len() as u64;
    MOTIVATIONAL_MESSAGES[idx as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_rotates_with_points() {
        let mut progress = UserProgress::default();
        assert_eq!(motivational_message(&progress), MOTIVATIONAL_MESSAGES[0]);
        progress.award(11);
        assert_eq!(motivational_message(&progress), MOTIVATIONAL_MESSAGES[3]);
    }
}
