//! JSON file storage and utility functions for the board.
//!
//! This module provides the `Database` struct persisted to disk, the
//! `JsonFileGateway` that serves it as a [`PersistenceGateway`], and the
//! parsing and formatting helpers the CLI uses around it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::GatewayError;
use crate::fields::*;
use crate::gateway::{GatewayResult, PersistenceGateway};
use crate::ordering;
use crate::project::{default_color, normalise_project_name, NewProject, Project, ProjectPatch};
use crate::task::{NewTask, ProjectId, Task, TaskId, TaskPatch, UserId};

/// On-disk board: every task and project, archived ones included.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub last_task_id: u64,
    #[serde(default)]
    pub last_project_id: u64,
}

impl Database {
    /// Load database from a JSON file. A missing file is an empty database.
    pub async fn load(path: &Path) -> Result<Self, GatewayError> {
        match tokio::fs::read_to_string(path).await {
            Ok(buf) => Ok(serde_json::from_str(&buf)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Database::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub async fn save(&self, path: &Path) -> Result<(), GatewayError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&tmp, data.as_bytes()).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Reserve the next task id.
    pub fn next_task_id(&mut self) -> TaskId {
        self.last_task_id += 1;
        TaskId::new(format!("t{}", self.last_task_id))
    }

    /// Reserve the next project id.
    pub fn next_project_id(&mut self) -> ProjectId {
        self.last_project_id += 1;
        ProjectId::new(format!("p{}", self.last_project_id))
    }

    /// Get a task by ID.
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: &TaskId) -> Result<&mut Task, GatewayError> {
        self.tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| GatewayError::not_found("task", id.as_str()))
    }

    fn project_mut(&mut self, id: &ProjectId) -> Result<&mut Project, GatewayError> {
        self.projects
            .iter_mut()
            .find(|p| &p.id == id && !p.is_archived)
            .ok_or_else(|| GatewayError::not_found("project", id.as_str()))
    }

    fn check_project(&self, id: Option<&ProjectId>) -> Result<(), GatewayError> {
        match id {
            Some(id) if !self.projects.iter().any(|p| &p.id == id && !p.is_archived) => {
                Err(GatewayError::not_found("project", id.as_str()))
            }
            _ => Ok(()),
        }
    }
}

/// A [`PersistenceGateway`] backed by one JSON file.
///
/// Each call loads the file, applies the change and writes it back. Calls are
/// serialized so concurrent writers never interleave a load and a save.
#[derive(Debug)]
pub struct JsonFileGateway {
    path: PathBuf,
    user_id: UserId,
    lock: Mutex<()>,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>, user_id: UserId) -> Self {
        JsonFileGateway {
            path: path.into(),
            user_id,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<R>(&self, f: impl FnOnce(&Database) -> R) -> GatewayResult<R> {
        let _guard = self.lock.lock().await;
        let db = Database::load(&self.path).await?;
        Ok(f(&db))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut Database) -> GatewayResult<R>,
    ) -> GatewayResult<R> {
        let _guard = self.lock.lock().await;
        let mut db = Database::load(&self.path).await?;
        let out = f(&mut db)?;
        db.save(&self.path).await?;
        Ok(out)
    }
}

#[async_trait]
impl PersistenceGateway for JsonFileGateway {
    async fn create_task(&self, input: NewTask) -> GatewayResult<Task> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(GatewayError::validation("title", "must not be empty"));
        }
        let user_id = self.user_id.clone();
        self.write(move |db| {
            db.check_project(input.project_id.as_ref())?;
            let now = Utc::now();
            let task = Task {
                id: db.next_task_id(),
                title,
                description: input.description,
                status: input.status,
                priority: input.priority,
                position: ordering::next_position(&db.tasks, input.status),
                project_id: input.project_id,
                due_date: input.due_date,
                estimated_hours: input.estimated_hours,
                tags: input.tags,
                created_at: now,
                updated_at: now,
                user_id,
            };
            debug!(task_id = %task.id, position = task.position, "stored new task");
            db.tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<()> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(GatewayError::validation("title", "must not be empty"));
        }
        self.write(|db| {
            if let Some(Some(project_id)) = &patch.project_id {
                db.check_project(Some(project_id))?;
            }
            let task = db.get_mut(id)?;
            patch.apply(task, Utc::now());
            Ok(())
        })
        .await
    }

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()> {
        self.write(|db| {
            let index = db
                .tasks
                .iter()
                .position(|t| &t.id == id)
                .ok_or_else(|| GatewayError::not_found("task", id.as_str()))?;
            let removed = db.tasks.remove(index);
            ordering::close_gap(&mut db.tasks, removed.status, removed.position);
            Ok(())
        })
        .await
    }

    async fn move_task(&self, id: &TaskId, status: Status, position: i64) -> GatewayResult<()> {
        self.write(|db| {
            db.tasks = ordering::move_task(&db.tasks, id, status, position, Utc::now())
                .ok_or_else(|| GatewayError::not_found("task", id.as_str()))?;
            Ok(())
        })
        .await
    }

    async fn fetch_tasks(&self, project_id: Option<&ProjectId>) -> GatewayResult<Vec<Task>> {
        self.read(|db| {
            let mut tasks: Vec<Task> = db
                .tasks
                .iter()
                .filter(|t| project_id.is_none() || t.project_id.as_ref() == project_id)
                .cloned()
                .collect();
            ordering::sort_by_position(&mut tasks);
            tasks
        })
        .await
    }

    async fn fetch_projects(&self) -> GatewayResult<Vec<Project>> {
        self.read(|db| db.projects.iter().filter(|p| !p.is_archived).cloned().collect())
            .await
    }

    async fn create_project(&self, input: NewProject) -> GatewayResult<Project> {
        let name = normalise_project_name(&input.name);
        if name.is_empty() {
            return Err(GatewayError::validation("name", "must not be empty"));
        }
        let user_id = self.user_id.clone();
        self.write(move |db| {
            if db
                .projects
                .iter()
                .any(|p| !p.is_archived && p.name.eq_ignore_ascii_case(&name))
            {
                return Err(GatewayError::Conflict(format!("project '{name}' already exists")));
            }
            let now = Utc::now();
            let color = input
                .color
                .unwrap_or_else(|| default_color(db.last_project_id));
            let project = Project {
                id: db.next_project_id(),
                name,
                color,
                icon: input.icon,
                is_archived: false,
                user_id,
                created_at: now,
                updated_at: now,
            };
            db.projects.push(project.clone());
            Ok(project)
        })
        .await
    }

    async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> GatewayResult<Project> {
        if patch
            .name
            .as_deref()
            .is_some_and(|n| normalise_project_name(n).is_empty())
        {
            return Err(GatewayError::validation("name", "must not be empty"));
        }
        self.write(|db| {
            let project = db.project_mut(id)?;
            patch.apply(project, Utc::now());
            Ok(project.clone())
        })
        .await
    }

    async fn archive_project(&self, id: &ProjectId) -> GatewayResult<()> {
        self.write(|db| {
            let project = db.project_mut(id)?;
            project.is_archived = true;
            project.updated_at = Utc::now();
            Ok(())
        })
        .await
    }
}

/// Normalize a tag string by trimming, lowercasing, and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalize each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = inputs
        .iter()
        .flat_map(|raw| raw.split(','))
        .map(normalise_tag)
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Parse a due date: "today", "tomorrow", "in Nd", "in Nw", a weekday name,
/// "next <weekday>" or "YYYY-MM-DD".
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    parse_due_relative_to(s, Local::now().date_naive())
}

fn parse_due_relative_to(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some(days) = rest.strip_suffix('d').and_then(|n| n.trim().parse::<i64>().ok()) {
            return today.checked_add_signed(Duration::try_days(days)?);
        }
        if let Some(weeks) = rest.strip_suffix('w').and_then(|n| n.trim().parse::<i64>().ok()) {
            return today.checked_add_signed(Duration::try_weeks(weeks)?);
        }
    }

    let (next_week, day) = match s.strip_prefix("next ") {
        Some(day) => (true, day),
        None => (false, s.as_str()),
    };
    const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];
    if day.len() >= 3 {
        if let Some(target) = WEEKDAYS.iter().position(|w| day.starts_with(w)) {
            let current = today.weekday().num_days_from_monday() as i64;
            let mut ahead = (target as i64 + 7 - current) % 7;
            if next_week {
                ahead += 7;
            }
            return today.checked_add_signed(Duration::try_days(ahead)?);
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<6} {:<12} {:<5} {:<4} {:<10} {:<8} {}",
        "ID", "Status", "Pos", "Pri", "Due", "Project", "Title [tags]"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        let project = t
            .project_id
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<6} {:<12} {:<5} {:<4} {:<10} {:<8} {}{}",
            t.id.as_str(),
            t.status.to_string(),
            t.position,
            t.priority.to_string(),
            format_due_relative(t.due_date, today),
            truncate(&project, 8),
            t.title,
            tags
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
