//! Task management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use focusquest_core::{Command, Priority, Subtask, Task, TaskPatch, TaskStatus};

use super::{
    new_id, not_found, print_events, print_json, require_text, split_tags, CliResult, Session,
};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Priority: high, medium or low
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Project ID to associate with
        #[arg(long)]
        project_id: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Estimated minutes
        #[arg(long)]
        estimate: Option<u32>,
    },
    /// List tasks
    List {
        /// Filter by project ID
        #[arg(long)]
        project_id: Option<String>,
        /// Filter by status (pending, in-progress, completed)
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        /// New priority
        #[arg(long)]
        priority: Option<Priority>,
        /// New status
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Move to project
        #[arg(long)]
        project_id: Option<String>,
        /// Detach from its project
        #[arg(long, conflicts_with = "project_id")]
        no_project: bool,
        /// Comma-separated tags (replaces existing)
        #[arg(long)]
        tags: Option<String>,
        /// Estimated minutes
        #[arg(long)]
        estimate: Option<u32>,
        /// Actual minutes spent
        #[arg(long)]
        actual: Option<u32>,
    },
    /// Mark a task completed
    Complete {
        /// Task ID
        id: String,
    },
    /// Mark a task in progress
    Start {
        /// Task ID
        id: String,
    },
    /// Move a task back to pending
    Reopen {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Subtask management
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Add a subtask
    Add {
        /// Parent task ID
        task_id: String,
        /// Subtask title
        title: String,
    },
    /// Flip a subtask between done and not done
    Toggle {
        task_id: String,
        subtask_id: String,
    },
    /// Remove a subtask
    Delete {
        task_id: String,
        subtask_id: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut session = Session::open()?;

    match action {
        TaskAction::Create {
            title,
            description,
            priority,
            project_id,
            tags,
            estimate,
        } => {
            let title = require_text("title", &title)?;
            if let Some(pid) = &project_id {
                session.state().project(pid).ok_or_else(|| not_found("project", pid))?;
            }
            let mut task = Task::new(new_id(), title, Utc::now()).with_priority(priority);
            task.description = description;
            task.project_id = project_id;
            task.tags = split_tags(tags);
            task.estimated_minutes = estimate;

            let id = task.id.clone();
            session.apply(Command::AddTask { task });
            session.save()?;
            eprintln!("Task created: {id}");
            print_json(&session.state().task(&id))?;
        }
        TaskAction::List {
            project_id,
            status,
            tag,
        } => {
            let filtered: Vec<_> = session
                .state()
                .tasks
                .iter()
                .filter(|task| {
                    project_id
                        .as_deref()
                        .map_or(true, |pid| task.project_id.as_deref() == Some(pid))
                })
                .filter(|task| status.map_or(true, |s| task.status == s))
                .filter(|task| tag.as_ref().map_or(true, |t| task.tags.contains(t)))
                .collect();
            print_json(&filtered)?;
        }
        TaskAction::Get { id } => {
            let task = session.state().task(&id).ok_or_else(|| not_found("task", &id))?;
            print_json(task)?;
        }
        TaskAction::Update {
            id,
            title,
            description,
            clear_description,
            priority,
            status,
            project_id,
            no_project,
            tags,
            estimate,
            actual,
        } => {
            session.state().task(&id).ok_or_else(|| not_found("task", &id))?;
            let title = title.map(|t| require_text("title", &t)).transpose()?;
            if let Some(pid) = &project_id {
                session.state().project(pid).ok_or_else(|| not_found("project", pid))?;
            }
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                priority,
                status,
                project_id: if no_project {
                    Some(None)
                } else {
                    project_id.map(Some)
                },
                tags: tags.map(|t| split_tags(Some(t))),
                estimated_minutes: estimate.map(Some),
                actual_minutes: actual.map(Some),
                ..TaskPatch::default()
            };
            update(&mut session, id, patch)?;
        }
        TaskAction::Complete { id } => {
            update(&mut session, id, TaskPatch::status(TaskStatus::Completed))?;
        }
        TaskAction::Start { id } => {
            update(&mut session, id, TaskPatch::status(TaskStatus::InProgress))?;
        }
        TaskAction::Reopen { id } => {
            update(&mut session, id, TaskPatch::status(TaskStatus::Pending))?;
        }
        TaskAction::Delete { id } => {
            session.state().task(&id).ok_or_else(|| not_found("task", &id))?;
            session.apply(Command::DeleteTask { id: id.clone() });
            session.save()?;
            println!("Task deleted: {id}");
        }
        TaskAction::Subtask { action } => run_subtask(&mut session, action)?,
    }
    Ok(())
}

fn update(session: &mut Session, id: String, patch: TaskPatch) -> CliResult {
    session.state().task(&id).ok_or_else(|| not_found("task", &id))?;
    let events = session.apply(Command::UpdateTask {
        id: id.clone(),
        patch,
    });
    session.save()?;
    print_json(&session.state().task(&id))?;
    print_events(&events)
}

fn run_subtask(session: &mut Session, action: SubtaskAction) -> CliResult {
    let task_id = match &action {
        SubtaskAction::Add { task_id, .. }
        | SubtaskAction::Toggle { task_id, .. }
        | SubtaskAction::Delete { task_id, .. } => task_id.clone(),
    };
    let task = session
        .state()
        .task(&task_id)
        .ok_or_else(|| not_found("task", &task_id))?;

    let command = match action {
        SubtaskAction::Add { task_id, title } => Command::AddSubtask {
            task_id,
            subtask: Subtask::new(new_id(), require_text("title", &title)?, Utc::now()),
        },
        SubtaskAction::Toggle {
            task_id,
            subtask_id,
        } => {
            if !task.subtasks.iter().any(|s| s.id == subtask_id) {
                return Err(not_found("subtask", &subtask_id).into());
            }
            Command::ToggleSubtask {
                task_id,
                subtask_id,
            }
        }
        SubtaskAction::Delete {
            task_id,
            subtask_id,
        } => Command::DeleteSubtask {
            task_id,
            subtask_id,
        },
    };

    session.apply(command);
    session.save()?;
    print_json(&session.state().task(&task_id))
}
