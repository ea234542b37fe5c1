//! Projects group tasks on the board.
//!
//! Tasks refer to a project by id only. Archiving a project hides it from the
//! active list but leaves its tasks untouched; once filtered out they simply
//! read as unassigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{ProjectId, UserId};

/// Colors handed out to projects created without one, in rotation.
pub const PALETTE: [&str; 6] = ["#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#64748b"];

/// A named grouping of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub is_archived: bool,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        NewProject {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A partial update to a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Option<String>>,
}

impl ProjectPatch {
    /// Write every set field onto `project` and stamp `updated_at`.
    pub fn apply(&self, project: &mut Project, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            project.name = normalise_project_name(name);
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
        if let Some(icon) = &self.icon {
            project.icon = icon.clone();
        }
        project.updated_at = now;
    }
}

/// Trim a display name and collapse runs of inner whitespace.
pub fn normalise_project_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pick the default color for the `n`th project created.
pub fn default_color(n: u64) -> String {
    PALETTE[(n as usize) % PALETTE.len()].to_string()
}
