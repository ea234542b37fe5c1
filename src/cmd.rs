//! Command implementations for the CLI interface.
//!
//! Every subcommand loads only the part of the board it needs through a
//! [`TaskBoard`], runs one verb and prints the outcome. The same optimistic verbs a graphical client would call
//! back each command, so a refused change is rolled back here exactly as it
//! would be on screen.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::board::{group_by_status, tasks_for_project};
use crate::cli::Cli;
use crate::controller::TaskBoard;
use crate::db::{format_due_relative, parse_due_input, print_table, split_and_normalise_tags};
use crate::fields::*;
use crate::gateway::PersistenceGateway;
use crate::project::{NewProject, ProjectPatch};
use crate::task::{NewTask, ProjectId, Task, TaskId, TaskPatch};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Project ID.
        #[arg(long)]
        project: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "in Nw", or a weekday.
        #[arg(long)]
        due: Option<String>,
        /// Priority: low | medium | high | urgent.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Column: todo | in-progress | review | done.
        #[arg(long, value_enum, default_value_t = Status::Todo)]
        status: Status,
        /// Estimated effort in hours.
        #[arg(long)]
        hours: Option<f64>,
    },

    /// Show the board, column by column.
    Board {
        /// Only tasks in this project.
        #[arg(long)]
        project: Option<String>,
    },

    /// List tasks in board order with optional filters.
    List {
        /// Filter by column.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Filter by project ID.
        #[arg(long)]
        project: Option<String>,
        /// Filter by tag. May be repeated. Accepts comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// View a single task.
    View {
        /// Task ID
        id: String,
    },

    /// Update fields on a task.
    Update {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// Move the task into this project.
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        hours: Option<f64>,
        /// Add tags. May be repeated and comma-separated.
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        /// Remove tags. May be repeated and comma-separated.
        #[arg(long = "rm-tag")]
        rm_tags: Vec<String>,
        /// Clear description.
        #[arg(long)]
        clear_desc: bool,
        /// Clear project.
        #[arg(long)]
        clear_project: bool,
        /// Clear due date.
        #[arg(long)]
        clear_due: bool,
    },

    /// Move a task to a column, optionally at a given index (default: bottom).
    Move {
        /// Task ID
        id: String,
        /// Destination column.
        #[arg(value_enum)]
        status: Status,
        /// Zero-based index within the destination column.
        position: Option<i64>,
    },

    /// Delete a task.
    Delete {
        /// Task ID
        id: String,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        name: String,
        /// Hex color, e.g. "#10b981".
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// List active projects with task counts.
    List,
    /// Rename or restyle a project.
    Update {
        /// Project ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Archive a project. Its tasks are kept.
    Archive {
        /// Project ID
        id: String,
    },
}

/// Run one parsed command against `board`.
pub async fn run<G: PersistenceGateway>(board: &TaskBoard<G>, command: Commands) -> Result<()> {
    match command {
        Commands::Add { title, desc, project, tags, due, priority, status, hours } => {
            cmd_add(board, title, desc, project, tags, due, priority, status, hours).await
        }
        Commands::Board { project } => cmd_board(board, project).await,
        Commands::List { status, project, tags } => cmd_list(board, status, project, tags).await,
        Commands::View { id } => cmd_view(board, id).await,
        Commands::Update {
            id,
            title,
            desc,
            project,
            due,
            priority,
            hours,
            add_tags,
            rm_tags,
            clear_desc,
            clear_project,
            clear_due,
        } => {
            let edits = TaskEdits {
                title,
                desc,
                project,
                due,
                priority,
                hours,
                add_tags,
                rm_tags,
                clear_desc,
                clear_project,
                clear_due,
            };
            cmd_update(board, id, edits).await
        }
        Commands::Move { id, status, position } => cmd_move(board, id, status, position).await,
        Commands::Delete { id } => cmd_delete(board, id).await,
        Commands::Project { action } => cmd_project(board, action).await,
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Add a new task to the board.
#[allow(clippy::too_many_arguments)]
pub async fn cmd_add<G: PersistenceGateway>(
    board: &TaskBoard<G>,
    title: String,
    desc: Option<String>,
    project: Option<String>,
    tags: Vec<String>,
    due: Option<String>,
    priority: Priority,
    status: Status,
    hours: Option<f64>,
) -> Result<()> {
    let due_date = due.as_deref().map(parse_due).transpose()?;
    let input = NewTask {
        title,
        description: desc.filter(|d| !d.trim().is_empty()),
        status,
        priority,
        project_id: project.map(|p| ProjectId::new(p.trim())),
        due_date,
        estimated_hours: hours,
        tags: split_and_normalise_tags(&tags),
    };
    let task = board.add_task(input).await.context("Failed to add task")?;
    println!("Added task {} to {} at position {}", task.id, task.status.title(), task.position);
    Ok(())
}

/// Print every column of the board.
pub async fn cmd_board<G: PersistenceGateway>(
    board: &TaskBoard<G>,
    project: Option<String>,
) -> Result<()> {
    board.load_projects().await?;
    board.select_project(project.map(ProjectId::from)).await?;

    let state = board.store().snapshot();
    let today = Local::now().date_naive();
    let columns = group_by_status(tasks_for_project(&state.tasks, state.selected_project_id.as_ref()));

    if let Some(selected) = &state.selected_project_id {
        let name = state
            .projects
            .iter()
            .find(|p| &p.id == selected)
            .map(|p| p.name.as_str())
            .unwrap_or("(unknown project)");
        println!("Project: {name} [{selected}]\n");
    }
    for (status, column) in columns.iter() {
        println!("== {} ({}) ==", status.title(), column.len());
        for t in column {
            let due = match t.due_date {
                Some(_) => format!(", due {}", format_due_relative(t.due_date, today)),
                None => String::new(),
            };
            let tags = if t.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", t.tags.join(","))
            };
            println!("  {:>2}. {:<5} {} ({}{}){}", t.position, t.id.as_str(), t.title, t.priority, due, tags);
        }
        println!();
    }
    Ok(())
}

/// List tasks with optional filtering, in board order.
pub async fn cmd_list<G: PersistenceGateway>(
    board: &TaskBoard<G>,
    status: Option<Status>,
    project: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    board.select_project(project.map(ProjectId::from)).await?;
    let tags = split_and_normalise_tags(&tags);

    let state = board.store().snapshot();
    let columns = group_by_status(tasks_for_project(&state.tasks, state.selected_project_id.as_ref()));
    let rows: Vec<&Task> = columns
        .iter()
        .filter(|(s, _)| status.map_or(true, |wanted| wanted == *s))
        .flat_map(|(_, column)| column.iter().copied())
        .filter(|t| tags.iter().all(|tag| t.tags.contains(tag)))
        .collect();

    if rows.is_empty() {
        println!("No tasks.");
    } else {
        print_table(&rows);
    }
    Ok(())
}

/// Show every field of one task.
pub async fn cmd_view<G: PersistenceGateway>(board: &TaskBoard<G>, id: String) -> Result<()> {
    board.load_tasks().await?;
    let task = find_task(board, &id)?;
    let today = Local::now().date_naive();

    println!("ID:          {}", task.id);
    println!("Title:       {}", task.title);
    println!("Status:      {} (position {})", task.status.title(), task.position);
    println!("Priority:    {}", task.priority);
    println!("Project:     {}", task.project_id.as_ref().map_or("-".to_string(), |p| p.to_string()));
    println!("Due:         {}", format_due_relative(task.due_date, today));
    if let Some(hours) = task.estimated_hours {
        println!("Estimate:    {hours}h");
    }
    if !task.tags.is_empty() {
        println!("Tags:        {}", task.tags.join(", "));
    }
    println!("Owner:       {}", task.user_id);
    println!("Created:     {}", task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!("Updated:     {}", task.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    if let Some(desc) = &task.description {
        println!("\n{desc}");
    }
    Ok(())
}

/// Requested edits for `kb update`, before they are turned into a [`TaskPatch`].
#[derive(Debug, Default)]
pub struct TaskEdits {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub project: Option<String>,
    pub due: Option<String>,
    pub priority: Option<Priority>,
    pub hours: Option<f64>,
    pub add_tags: Vec<String>,
    pub rm_tags: Vec<String>,
    pub clear_desc: bool,
    pub clear_project: bool,
    pub clear_due: bool,
}

impl TaskEdits {
    /// Build the patch for `current`. Tag edits are resolved against its tags.
    pub fn into_patch(self, current: &Task) -> Result<TaskPatch> {
        let mut patch = TaskPatch {
            title: self.title,
            priority: self.priority,
            ..Default::default()
        };

        if self.clear_desc {
            patch.description = Some(None);
        } else if let Some(desc) = self.desc {
            patch.description = Some(Some(desc));
        }

        if self.clear_project {
            patch.project_id = Some(None);
        } else if let Some(project) = self.project {
            patch.project_id = Some(Some(ProjectId::new(project.trim())));
        }

        if self.clear_due {
            patch.due_date = Some(None);
        } else if let Some(due) = self.due {
            patch.due_date = Some(Some(parse_due(&due)?));
        }

        if let Some(hours) = self.hours {
            patch.estimated_hours = Some(Some(hours));
        }

        if !self.add_tags.is_empty() || !self.rm_tags.is_empty() {
            let add = split_and_normalise_tags(&self.add_tags);
            let remove = split_and_normalise_tags(&self.rm_tags);
            let mut tags: Vec<String> = current
                .tags
                .iter()
                .chain(add.iter())
                .filter(|t| !remove.contains(t))
                .cloned()
                .collect();
            tags.sort();
            tags.dedup();
            patch.tags = Some(tags);
        }

        Ok(patch)
    }
}

/// Apply edits to a task.
pub async fn cmd_update<G: PersistenceGateway>(
    board: &TaskBoard<G>,
    id: String,
    edits: TaskEdits,
) -> Result<()> {
    board.load_tasks().await?;
    let current = find_task(board, &id)?;
    let patch = edits.into_patch(&current)?;
    if patch.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }
    board
        .update_task(&current.id, patch)
        .await
        .with_context(|| format!("Failed to update task {id}"))?;
    println!("Updated task {id}");
    Ok(())
}

/// Move a task to another column or index.
pub async fn cmd_move<G: PersistenceGateway>(
    board: &TaskBoard<G>,
    id: String,
    status: Status,
    position: Option<i64>,
) -> Result<()> {
    board.load_tasks().await?;
    let task_id = find_task(board, &id)?.id;
    board
        .move_task(&task_id, status, position.unwrap_or(i64::MAX))
        .await
        .with_context(|| format!("Failed to move task {id}"))?;

    let moved = board
        .store()
        .task(&task_id)
        .ok_or_else(|| anyhow!("Task {id} disappeared after move"))?;
    println!("Moved task {id} to {} at position {}", moved.status.title(), moved.position);
    Ok(())
}

/// Delete a task.
pub async fn cmd_delete<G: PersistenceGateway>(board: &TaskBoard<G>, id: String) -> Result<()> {
    board.load_tasks().await?;
    let task_id = find_task(board, &id)?.id;
    board
        .delete_task(&task_id)
        .await
        .with_context(|| format!("Failed to delete task {id}"))?;
    println!("Deleted task {id}");
    Ok(())
}

/// Project subcommands.
pub async fn cmd_project<G: PersistenceGateway>(
    board: &TaskBoard<G>,
    action: ProjectAction,
) -> Result<()> {
    match action {
        ProjectAction::Add { name, color, icon } => {
            let project = board
                .create_project(NewProject { name, color, icon })
                .await
                .context("Failed to create project")?;
            println!("Added project {} ({})", project.id, project.name);
        }
        ProjectAction::List => {
            board.refresh().await?;
            let state = board.store().snapshot();
            if state.projects.is_empty() {
                println!("No projects.");
                return Ok(());
            }
            let mut counts: BTreeMap<&ProjectId, usize> = BTreeMap::new();
            for t in &state.tasks {
                if let Some(p) = &t.project_id {
                    *counts.entry(p).or_default() += 1;
                }
            }
            println!("{:<6} {:<9} {:<6} {}", "ID", "Color", "Tasks", "Name");
            for p in &state.projects {
                let icon = p.icon.as_deref().map(|i| format!("{i} ")).unwrap_or_default();
                println!(
                    "{:<6} {:<9} {:<6} {}{}",
                    p.id.as_str(),
                    p.color,
                    counts.get(&p.id).copied().unwrap_or(0),
                    icon,
                    p.name
                );
            }
        }
        ProjectAction::Update { id, name, color, icon } => {
            let patch = ProjectPatch { name, color, icon: icon.map(Some) };
            let project = board
                .update_project(&ProjectId::new(id.clone()), patch)
                .await
                .with_context(|| format!("Failed to update project {id}"))?;
            println!("Updated project {} ({})", project.id, project.name);
        }
        ProjectAction::Archive { id } => {
            board
                .archive_project(&ProjectId::new(id.clone()))
                .await
                .with_context(|| format!("Failed to archive project {id}"))?;
            println!("Archived project {id}");
        }
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "kb", &mut std::io::stdout());
}

fn find_task<G: PersistenceGateway>(board: &TaskBoard<G>, id: &str) -> Result<Task> {
    board
        .store()
        .task(&TaskId::from(id))
        .ok_or_else(|| anyhow!("Task with ID {id} not found"))
}

fn parse_due(s: &str) -> Result<chrono::NaiveDate> {
    match parse_due_input(s) {
        Some(d) => Ok(d),
        None => bail!("Could not understand due date '{s}'"),
    }
}
