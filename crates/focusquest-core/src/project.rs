//! Projects group tasks and carry denormalized completion counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{nullable, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_tasks: u32,
    #[serde(default)]
    pub total_tasks: u32,
}

fn default_color() -> String {
    "#3b82f6".into()
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            color: default_color(),
            created_at,
            completed_tasks: 0,
            total_tasks: 0,
        }
    }

    /// A project counts as finished once it has tasks and all of them are done.
    pub fn is_finished(&self) -> bool {
        self.total_tasks > 0 && self.completed_tasks == self.total_tasks
    }

    /// Recount `completed_tasks` / `total_tasks` from the tasks that reference
    /// this project.
    pub fn refresh_counts(&mut self, tasks: &[Task]) {
        let mut total = 0;
        let mut completed = 0;
        for task in tasks
            .iter()
            .filter(|t| t.project_id.as_deref() == Some(self.id.as_str()))
        {
            total += 1;
            if task.is_completed() {
                completed += 1;
            }
        }
        self.total_tasks = total;
        self.completed_tasks = completed;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ProjectPatch {
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;

    #[test]
    fn refresh_counts_only_sees_own_tasks() {
        let now = Utc::now();
        let mut done = Task::new("t1", "a", now).with_project("p1");
        done.status = TaskStatus::Completed;
        done.completed_at = Some(now);
        let tasks = vec![
            done,
            Task::new("t2", "b", now).with_project("p1"),
            Task::new("t3", "c", now).with_project("p2"),
            Task::new("t4", "d", now),
        ];

        let mut project = Project::new("p1", "Home", now);
        project.refresh_counts(&tasks);
        assert_eq!(project.total_tasks, 2);
        assert_eq!(project.completed_tasks, 1);
        assert!(!project.is_finished());
    }

    #[test]
    fn empty_project_is_not_finished() {
        let project = Project::new("p1", "Empty", Utc::now());
        assert!(!project.is_finished());
    }
}
