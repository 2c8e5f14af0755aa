//! User-facing settings stored inside the aggregate.
//!
//! These are domain settings (timer lengths, theme, passcode) and travel
//! with the state snapshot. Process-level configuration lives in
//! [`crate::storage::Config`].

use serde::{Deserialize, Serialize};

use crate::timer::SessionType;

pub const DEFAULT_PASSCODE: &str = "123456";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_passcode")]
    pub passcode: String,
}

fn default_focus_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_true() -> bool {
    true
}
fn default_passcode() -> String {
    DEFAULT_PASSCODE.into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            theme: Theme::default(),
            notifications_enabled: true,
            sound_enabled: true,
            passcode: default_passcode(),
        }
    }
}

impl Settings {
    /// Configured length in minutes for a session type.
    pub fn duration_for(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Focus => self.focus_minutes,
            SessionType::ShortBreak => self.short_break_minutes,
            SessionType::LongBreak => self.long_break_minutes,
        }
    }
}

/// Partial settings update; unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passcode: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = self.focus_minutes {
            settings.focus_minutes = v;
        }
        if let Some(v) = self.short_break_minutes {
            settings.short_break_minutes = v;
        }
        if let Some(v) = self.long_break_minutes {
            settings.long_break_minutes = v;
        }
        if let Some(v) = self.theme {
            settings.theme = v;
        }
        if let Some(v) = self.notifications_enabled {
            settings.notifications_enabled = v;
        }
        if let Some(v) = self.sound_enabled {
            settings.sound_enabled = v;
        }
        if let Some(v) = &self.passcode {
            settings.passcode = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let s = Settings::default();
        assert_eq!(s.duration_for(SessionType::Focus), 25);
        assert_eq!(s.duration_for(SessionType::ShortBreak), 5);
        assert_eq!(s.duration_for(SessionType::LongBreak), 15);
        assert_eq!(s.passcode, "123456");
        assert_eq!(s.theme, Theme::Light);
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut s = Settings::default();
        SettingsPatch {
            focus_minutes: Some(50),
            theme: Some(Theme::Dark),
            ..SettingsPatch::default()
        }
        .apply_to(&mut s);
        assert_eq!(s.focus_minutes, 50);
        assert_eq!(s.theme, Theme::Dark);
        assert_eq!(s.short_break_minutes, 5);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: Settings = serde_json::from_str(r#"{"focus_minutes": 30}"#).unwrap();
        assert_eq!(s.focus_minutes, 30);
        assert_eq!(s.long_break_minutes, 15);
        assert!(s.sound_enabled);
    }
}
