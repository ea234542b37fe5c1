//! Lifecycle of a single optimistic mutation.
//!
//! Every verb on the board runs the same three steps: apply the change to
//! local state, wait for the backend, then either keep the change or roll it
//! back. [`Mutation`] tracks where a verb is in that sequence and refuses
//! transitions that skip or repeat a step.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::{BoardError, Result};

static NEXT_MUTATION_ID: AtomicU64 = AtomicU64::new(1);

/// Which verb a mutation is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationKind {
    CreateTask,
    UpdateTask,
    DeleteTask,
    MoveTask,
    CreateProject,
    UpdateProject,
    ArchiveProject,
}

impl MutationKind {
    /// Verb phrase used in user-facing error messages.
    pub fn describe(self) -> &'static str {
        match self {
            MutationKind::CreateTask => "create task",
            MutationKind::UpdateTask => "update task",
            MutationKind::DeleteTask => "delete task",
            MutationKind::MoveTask => "move task",
            MutationKind::CreateProject => "create project",
            MutationKind::UpdateProject => "update project",
            MutationKind::ArchiveProject => "archive project",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Step a mutation has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationPhase {
    ApplyingLocally,
    AwaitingBackend,
    Committed,
    RolledBack,
}

impl MutationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, MutationPhase::Committed | MutationPhase::RolledBack)
    }

    fn can_advance_to(self, next: MutationPhase) -> bool {
        use MutationPhase::*;
        matches!(
            (self, next),
            (ApplyingLocally, AwaitingBackend)
                | (AwaitingBackend, Committed)
                | (AwaitingBackend, RolledBack)
        )
    }
}

/// One verb invocation on its way through the optimistic lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mutation {
    pub id: u64,
    pub kind: MutationKind,
    /// Id of the task or project being changed, empty for creates.
    pub target: String,
    pub phase: MutationPhase,
}

impl Mutation {
    pub fn begin(kind: MutationKind, target: impl Into<String>) -> Self {
        Mutation {
            id: NEXT_MUTATION_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            target: target.into(),
            phase: MutationPhase::ApplyingLocally,
        }
    }

    pub fn advance(&mut self, next: MutationPhase) -> Result<()> {
        if !self.phase.can_advance_to(next) {
            return Err(BoardError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!(mutation = self.id, kind = %self.kind, from = ?self.phase, to = ?next, "mutation transition");
        self.phase = next;
        Ok(())
    }
}
