//! Passcode commands for CLI.
//!
//! The gate is per-process: a successful `check` only reports a match.

use clap::Subcommand;
use focusquest_core::{change_passcode, AccessGate, Command};

use super::{CliResult, Session};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Verify a passcode
    Check {
        /// 6-digit passcode
        code: String,
    },
    /// Change the passcode
    Change {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

pub fn run(action: AuthAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        AuthAction::Check { code } => {
            let mut gate = AccessGate::new();
            gate.unlock(&session.state().settings, &code)?;
            println!("ok");
        }
        AuthAction::Change {
            current,
            new,
            confirm,
        } => {
            let patch = change_passcode(&session.state().settings, &current, &new, &confirm)?;
            session.apply(Command::UpdateSettings { patch });
            session.save()?;
            println!("passcode updated");
        }
    }
    Ok(())
}
