//! Brain-dump capture commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use focusquest_core::brain_dump::extract_hashtags;
use focusquest_core::{BrainDumpEntry, BrainDumpPatch, Command};

use super::{new_id, not_found, print_json, require_text, CliResult, Session};

#[derive(Subcommand)]
pub enum DumpAction {
    /// Capture a thought; #hashtags become tags
    Add {
        /// Free text
        content: String,
    },
    /// List entries, newest first
    List {
        /// Only entries with this tag
        #[arg(long)]
        tag: Option<String>,
        /// Case-insensitive text search
        #[arg(long)]
        search: Option<String>,
        /// Hide processed entries
        #[arg(long)]
        unprocessed: bool,
    },
    /// Replace the text of an entry
    Edit {
        /// Entry ID
        id: String,
        /// New text
        content: String,
    },
    /// Mark an entry processed
    Process {
        /// Entry ID
        id: String,
    },
    /// Delete an entry
    Delete {
        /// Entry ID
        id: String,
    },
    /// List every tag in use
    Tags,
}

pub fn run(action: DumpAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        DumpAction::Add { content } => {
            let content = require_text("content", &content)?;
            let entry = BrainDumpEntry::capture(new_id(), &content, Utc::now());
            let id = entry.id.clone();
            session.apply(Command::AddBrainDump { entry });
            session.save()?;
            print_json(&session.state().brain_dump_entry(&id))?;
        }
        DumpAction::List {
            tag,
            search,
            unprocessed,
        } => {
            let tag = tag.map(|t| t.trim_start_matches('#').to_lowercase());
            let mut entries: Vec<_> = session
                .state()
                .brain_dump
                .iter()
                .filter(|e| !unprocessed || !e.processed)
                .filter(|e| tag.as_ref().map_or(true, |t| e.tags.contains(t)))
                .filter(|e| search.as_deref().map_or(true, |s| e.matches(s)))
                .collect();
            entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            print_json(&entries)?;
        }
        DumpAction::Edit { id, content } => {
            session
                .state()
                .brain_dump_entry(&id)
                .ok_or_else(|| not_found("entry", &id))?;
            let content = require_text("content", &content)?;
            let patch = BrainDumpPatch {
                tags: Some(extract_hashtags(&content)),
                content: Some(content),
                processed: None,
            };
            session.apply(Command::UpdateBrainDump {
                id: id.clone(),
                patch,
            });
            session.save()?;
            print_json(&session.state().brain_dump_entry(&id))?;
        }
        DumpAction::Process { id } => {
            session
                .state()
                .brain_dump_entry(&id)
                .ok_or_else(|| not_found("entry", &id))?;
            session.apply(Command::UpdateBrainDump {
                id: id.clone(),
                patch: BrainDumpPatch::processed(),
            });
            session.save()?;
            print_json(&session.state().brain_dump_entry(&id))?;
        }
        DumpAction::Delete { id } => {
            session
                .state()
                .brain_dump_entry(&id)
                .ok_or_else(|| not_found("entry", &id))?;
            session.apply(Command::DeleteBrainDump { id: id.clone() });
            session.save()?;
            println!("Entry deleted: {id}");
        }
        DumpAction::Tags => {
            print_json(&session.state().brain_dump_tags())?;
        }
    }
    Ok(())
}
