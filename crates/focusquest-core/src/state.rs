//! The aggregate root.

use serde::{Deserialize, Serialize};

use crate::brain_dump::BrainDumpEntry;
use crate::progress::UserProgress;
use crate::project::Project;
use crate::settings::Settings;
use crate::task::Task;
use crate::timer::{ActiveTimer, TimerSession};

/// Everything the application knows, owned in one place.
///
/// Only [`crate::processor`] produces new versions of it; everything else
/// reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub timer_sessions: Vec<TimerSession>,
    #[serde(default)]
    pub progress: UserProgress,
    #[serde(default)]
    pub brain_dump: Vec<BrainDumpEntry>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub timer: ActiveTimer,
}

impl AppState {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn brain_dump_entry(&self, id: &str) -> Option<&BrainDumpEntry> {
        self.brain_dump.iter().find(|e| e.id == id)
    }

    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.is_completed())
    }

    pub fn tasks_in_project<'a>(&'a self, project_id: &'a str) -> impl Iterator<Item = &'a Task> {
        self.tasks
            .iter()
            .filter(move |t| t.project_id.as_deref() == Some(project_id))
    }

    pub fn unprocessed_brain_dump(&self) -> impl Iterator<Item = &BrainDumpEntry> {
        self.brain_dump.iter().filter(|e| !e.processed)
    }

    /// Every distinct brain-dump tag, sorted.
    pub fn brain_dump_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .brain_dump
            .iter()
            .flat_map(|e| e.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    pub(crate) fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Recount every project's task totals and return how many are finished.
    pub(crate) fn refresh_project_counts(&mut self) -> u32 {
        let tasks = &self.tasks;
        let mut finished = 0;
        for project in &mut self.projects {
            project.refresh_counts(tasks);
            if project.is_finished() {
                finished += 1;
            }
        }
        finished
    }
}
