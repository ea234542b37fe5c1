//! The persistence boundary of the board.
//!
//! The engine never performs I/O itself. Every durable write and every
//! authoritative read goes through a [`PersistenceGateway`], which a REST
//! client, an RPC stub or the JSON file backend in [`crate::db`] implements.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::fields::Status;
use crate::project::{NewProject, Project, ProjectPatch};
use crate::task::{NewTask, ProjectId, Task, TaskId, TaskPatch};

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Backend that stores tasks and projects and answers with authoritative data.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Create a task and return the stored record, with id and position assigned.
    async fn create_task(&self, input: NewTask) -> GatewayResult<Task>;

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<()>;

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()>;

    /// Place a task at `position` within `status`, shifting its neighbours.
    async fn move_task(&self, id: &TaskId, status: Status, position: i64) -> GatewayResult<()>;

    /// The authoritative task list, optionally scoped to one project.
    async fn fetch_tasks(&self, project_id: Option<&ProjectId>) -> GatewayResult<Vec<Task>>;

    /// Active (unarchived) projects.
    async fn fetch_projects(&self) -> GatewayResult<Vec<Project>>;

    async fn create_project(&self, input: NewProject) -> GatewayResult<Project>;

    async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> GatewayResult<Project>;

    /// Remove a project from the active list. Its tasks are left in place.
    async fn archive_project(&self, id: &ProjectId) -> GatewayResult<()>;
}

/// Bounds every call on the wrapped gateway with a deadline.
///
/// A call that misses the deadline fails with [`GatewayError::Timeout`]; the
/// engine then rolls back exactly as for any other gateway failure.
#[derive(Debug, Clone)]
pub struct Timeout<G> {
    inner: G,
    limit: Duration,
}

impl<G> Timeout<G> {
    pub fn new(inner: G, limit: Duration) -> Self {
        Timeout { inner, limit }
    }

    pub fn into_inner(self) -> G {
        self.inner
    }

    async fn guard<T>(
        &self,
        call: impl std::future::Future<Output = GatewayResult<T>>,
    ) -> GatewayResult<T> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                elapsed_ms: self.limit.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl<G: PersistenceGateway> PersistenceGateway for Timeout<G> {
    async fn create_task(&self, input: NewTask) -> GatewayResult<Task> {
        self.guard(self.inner.create_task(input)).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<()> {
        self.guard(self.inner.update_task(id, patch)).await
    }

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()> {
        self.guard(self.inner.delete_task(id)).await
    }

    async fn move_task(&self, id: &TaskId, status: Status, position: i64) -> GatewayResult<()> {
        self.guard(self.inner.move_task(id, status, position)).await
    }

    async fn fetch_tasks(&self, project_id: Option<&ProjectId>) -> GatewayResult<Vec<Task>> {
        self.guard(self.inner.fetch_tasks(project_id)).await
    }

    async fn fetch_projects(&self) -> GatewayResult<Vec<Project>> {
        self.guard(self.inner.fetch_projects()).await
    }

    async fn create_project(&self, input: NewProject) -> GatewayResult<Project> {
        self.guard(self.inner.create_project(input)).await
    }

    async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> GatewayResult<Project> {
        self.guard(self.inner.update_project(id, patch)).await
    }

    async fn archive_project(&self, id: &ProjectId) -> GatewayResult<()> {
        self.guard(self.inner.archive_project(id)).await
    }
}
