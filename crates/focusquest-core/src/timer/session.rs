use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    Focus,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_break(&self) -> bool {
        !matches!(self, SessionType::Focus)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Focus => "Focus Time",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }
}

impl Default for SessionType {
    fn default() -> Self {
        SessionType::Focus
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::Focus => write!(f, "focus"),
            SessionType::ShortBreak => write!(f, "short-break"),
            SessionType::LongBreak => write!(f, "long-break"),
        }
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "focus" => Ok(SessionType::Focus),
            "short-break" | "short_break" | "short" => Ok(SessionType::ShortBreak),
            "long-break" | "long_break" | "long" => Ok(SessionType::LongBreak),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}

/// One finished countdown. Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSession {
    pub id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Duration in minutes.
    pub duration: u32,
    pub completed_at: DateTime<Utc>,
    pub was_completed: bool,
}

impl TimerSession {
    /// Whether this session earns focus credit.
    pub fn is_completed_focus(&self) -> bool {
        self.session_type == SessionType::Focus && self.was_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&SessionType::ShortBreak).unwrap(),
            "\"short-break\""
        );
        assert_eq!("long".parse::<SessionType>().unwrap(), SessionType::LongBreak);
    }

    #[test]
    fn only_completed_focus_counts() {
        let mut session = TimerSession {
            id: "s1".into(),
            task_id: None,
            session_type: SessionType::Focus,
            duration: 25,
            completed_at: Utc::now(),
            was_completed: true,
        };
        assert!(session.is_completed_focus());
        session.was_completed = false;
        assert!(!session.is_completed_focus());
        session.was_completed = true;
        session.session_type = SessionType::ShortBreak;
        assert!(!session.is_completed_focus());
    }
}
