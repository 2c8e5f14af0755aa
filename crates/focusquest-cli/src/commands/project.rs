//! Project management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use focusquest_core::{Command, Project, ProjectPatch};
use serde::Serialize;

use super::{new_id, not_found, print_json, require_text, CliResult, Session};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project name
        name: String,
        /// Project description
        #[arg(long)]
        description: Option<String>,
        /// Display color (e.g. "#10b981")
        #[arg(long)]
        color: Option<String>,
    },
    /// List projects
    List,
    /// Get project details with its tasks
    Get {
        /// Project ID
        id: String,
    },
    /// Update a project
    Update {
        /// Project ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a project; its tasks are kept without a project
    Delete {
        /// Project ID
        id: String,
    },
}

#[derive(Serialize)]
struct ProjectDetail<'a> {
    #[serde(flatten)]
    project: &'a Project,
    progress_pct: f64,
    tasks: Vec<&'a focusquest_core::Task>,
}

pub fn run(action: ProjectAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        ProjectAction::Create {
            name,
            description,
            color,
        } => {
            let mut project = Project::new(new_id(), require_text("name", &name)?, Utc::now());
            project.description = description;
            if let Some(color) = color {
                project.color = color;
            }
            let id = project.id.clone();
            session.apply(Command::AddProject { project });
            session.save()?;
            eprintln!("Project created: {id}");
            print_json(&session.state().project(&id))?;
        }
        ProjectAction::List => {
            print_json(&session.state().projects)?;
        }
        ProjectAction::Get { id } => {
            let state = session.state();
            let project = state.project(&id).ok_or_else(|| not_found("project", &id))?;
            let progress_pct = if project.total_tasks == 0 {
                0.0
            } else {
                f64::from(project.completed_tasks) / f64::from(project.total_tasks) * 100.0
            };
            print_json(&ProjectDetail {
                project,
                progress_pct,
                tasks: state.tasks_in_project(&id).collect(),
            })?;
        }
        ProjectAction::Update {
            id,
            name,
            description,
            color,
        } => {
            session.state().project(&id).ok_or_else(|| not_found("project", &id))?;
            let patch = ProjectPatch {
                name: name.map(|n| require_text("name", &n)).transpose()?,
                description: description.map(Some),
                color,
            };
            session.apply(Command::UpdateProject {
                id: id.clone(),
                patch,
            });
            session.save()?;
            print_json(&session.state().project(&id))?;
        }
        ProjectAction::Delete { id } => {
            session.state().project(&id).ok_or_else(|| not_found("project", &id))?;
            session.apply(Command::DeleteProject { id: id.clone() });
            session.save()?;
            println!("Project deleted: {id}");
        }
    }
    Ok(())
}
