use clap::Subcommand;
use focusquest_core::{Command, SettingsPatch, Theme};
use serde_json::json;

use super::{print_json, require_minutes, CliResult, Session};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings (passcode hidden)
    Show,
    /// Change one or more settings
    Set {
        /// Focus length in minutes
        #[arg(long)]
        focus: Option<u32>,
        /// Short break length in minutes
        #[arg(long)]
        short_break: Option<u32>,
        /// Long break length in minutes
        #[arg(long)]
        long_break: Option<u32>,
        /// light or dark
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        sound: Option<bool>,
    },
}

pub fn run(action: SettingsAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        SettingsAction::Show => {}
        SettingsAction::Set {
            focus,
            short_break,
            long_break,
            theme,
            notifications,
            sound,
        } => {
            let patch = SettingsPatch {
                focus_minutes: focus.map(|m| require_minutes("focus", m)).transpose()?,
                short_break_minutes: short_break
                    .map(|m| require_minutes("short_break", m))
                    .transpose()?,
                long_break_minutes: long_break
                    .map(|m| require_minutes("long_break", m))
                    .transpose()?,
                theme,
                notifications_enabled: notifications,
                sound_enabled: sound,
                passcode: None,
            };
            if patch.is_empty() {
                return Err("nothing to change".into());
            }
            session.apply(Command::UpdateSettings { patch });
            session.save()?;
        }
    }

    let settings = &session.state().settings;
    print_json(&json!({
        "focus_minutes": settings.focus_minutes,
        "short_break_minutes": settings.short_break_minutes,
        "long_break_minutes": settings.long_break_minutes,
        "theme": settings.theme,
        "notifications_enabled": settings.notifications_enabled,
        "sound_enabled": settings.sound_enabled,
    }))
}
