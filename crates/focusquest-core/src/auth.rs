//! Passcode gate.
//!
//! The authenticated flag lives only as long as the [`AccessGate`] value
//! and is never written to the snapshot. Attempts are unlimited.

use tracing::{debug, warn};

use crate::error::PasscodeError;
use crate::settings::{Settings, SettingsPatch};

pub const PASSCODE_LEN: usize = 6;

#[derive(Debug, Default)]
pub struct AccessGate {
    authenticated: bool,
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Compare `code` against the stored passcode and open the gate on a match.
    pub fn unlock(&mut self, settings: &Settings, code: &str) -> Result<(), PasscodeError> {
        if code != settings.passcode {
            warn!("passcode rejected");
            return Err(PasscodeError::Mismatch);
        }
        debug!("gate unlocked");
        self.authenticated = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.authenticated = false;
    }
}

pub fn is_valid_passcode(code: &str) -> bool {
    code.len() == PASSCODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Validate a passcode change and return the settings patch that applies it.
///
/// Checks run in order: current passcode, format of the new one, then the
/// confirmation.
pub fn change_passcode(
    settings: &Settings,
    current: &str,
    new: &str,
    confirm: &str,
) -> Result<SettingsPatch, PasscodeError> {
    if current != settings.passcode {
        return Err(PasscodeError::CurrentIncorrect);
    }
    if !is_valid_passcode(new) {
        return Err(PasscodeError::InvalidFormat);
    }
    if new != confirm {
        return Err(PasscodeError::ConfirmationMismatch);
    }
    Ok(SettingsPatch {
        passcode: Some(new.to_string()),
        ..SettingsPatch::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_PASSCODE;

    #[test]
    fn gate_opens_only_on_match() {
        let settings = Settings::default();
        let mut gate = AccessGate::new();
        assert_eq!(gate.unlock(&settings, "000000"), Err(PasscodeError::Mismatch));
        assert!(!gate.is_authenticated());
        gate.unlock(&settings, DEFAULT_PASSCODE).unwrap();
        assert!(gate.is_authenticated());
        gate.lock();
        assert!(!gate.is_authenticated());
    }

    #[test]
    fn repeated_failures_never_lock_out() {
        let settings = Settings::default();
        let mut gate = AccessGate::new();
        for _ in 0..20 {
            assert!(gate.unlock(&settings, "999999").is_err());
        }
        assert!(gate.unlock(&settings, DEFAULT_PASSCODE).is_ok());
    }

    #[test]
    fn change_validates_in_order() {
        let s = Settings::default();
        assert_eq!(
            change_passcode(&s, "111111", "12ab56", "x"),
            Err(PasscodeError::CurrentIncorrect)
        );
        assert_eq!(
            change_passcode(&s, DEFAULT_PASSCODE, "12345", "12345"),
            Err(PasscodeError::InvalidFormat)
        );
        assert_eq!(
            change_passcode(&s, DEFAULT_PASSCODE, "12ab56", "12ab56"),
            Err(PasscodeError::InvalidFormat)
        );
        assert_eq!(
            change_passcode(&s, DEFAULT_PASSCODE, "654321", "654320"),
            Err(PasscodeError::ConfirmationMismatch)
        );

        let patch = change_passcode(&s, DEFAULT_PASSCODE, "654321", "654321").unwrap();
        let mut updated = s.clone();
        patch.apply_to(&mut updated);
        assert_eq!(updated.passcode, "654321");
        assert_eq!(updated.focus_minutes, s.focus_minutes);
    }

    #[test]
    fn non_ascii_digits_rejected() {
        assert!(!is_valid_passcode("１２３４５６"));
        assert!(is_valid_passcode("000000"));
    }
}
