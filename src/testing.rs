//! Fixtures and a scriptable gateway double for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::{watch, Semaphore};

use crate::error::GatewayError;
use crate::fields::{Priority, Status};
use crate::gateway::{GatewayResult, PersistenceGateway};
use crate::ordering::{next_position, sort_by_position};
use crate::project::{NewProject, Project, ProjectPatch};
use crate::task::{NewTask, ProjectId, Task, TaskId, TaskPatch};

pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub(crate) fn task(id: &str, status: Status, position: i64) -> Task {
    Task {
        id: id.into(),
        title: format!("Task {id}"),
        description: None,
        status,
        priority: Priority::Medium,
        position,
        project_id: None,
        due_date: None,
        estimated_hours: None,
        tags: Vec::new(),
        created_at: epoch(),
        updated_at: epoch(),
        user_id: "u1".into(),
    }
}

/// `t1@todo:0, t2@todo:1, t3@in-progress:0, t4@done:0`, sorted by position.
pub(crate) fn seed_tasks() -> Vec<Task> {
    let mut tasks = vec![
        task("t1", Status::Todo, 0),
        task("t2", Status::Todo, 1),
        task("t3", Status::InProgress, 0),
        task("t4", Status::Done, 0),
    ];
    sort_by_position(&mut tasks);
    tasks
}

pub(crate) fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.into(),
        name: name.into(),
        color: "#3b82f6".into(),
        icon: None,
        is_archived: false,
        user_id: "u1".into(),
        created_at: epoch(),
        updated_at: epoch(),
    }
}

/// Gateway method names, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Verb {
    CreateTask,
    UpdateTask,
    DeleteTask,
    MoveTask,
    FetchTasks,
    FetchProjects,
    CreateProject,
    UpdateProject,
    ArchiveProject,
}

/// A recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateTask(String),
    UpdateTask(TaskId, TaskPatch),
    DeleteTask(TaskId),
    MoveTask(TaskId, Status, i64),
    FetchTasks(Option<ProjectId>),
    FetchProjects,
    CreateProject(String),
    UpdateProject(ProjectId),
    ArchiveProject(ProjectId),
}

impl Call {
    fn verb(&self) -> Verb {
        match self {
            Call::CreateTask(_) => Verb::CreateTask,
            Call::UpdateTask(..) => Verb::UpdateTask,
            Call::DeleteTask(_) => Verb::DeleteTask,
            Call::MoveTask(..) => Verb::MoveTask,
            Call::FetchTasks(_) => Verb::FetchTasks,
            Call::FetchProjects => Verb::FetchProjects,
            Call::CreateProject(_) => Verb::CreateProject,
            Call::UpdateProject(_) => Verb::UpdateProject,
            Call::ArchiveProject(_) => Verb::ArchiveProject,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    created: u64,
    failures: HashMap<Verb, GatewayError>,
    calls: Vec<Call>,
    hold: bool,
}

/// Scriptable [`PersistenceGateway`].
///
/// Returns the configured task and project lists from fetches, answers every
/// write with success unless a failure is scripted for that verb, and records
/// each call. With [`MockGateway::hold_calls`] every call parks until the test
/// releases it, which exposes the state a verb leaves behind before the
/// backend answers.
///
/// Clones share state, so a test can keep one handle and give another to the
/// board.
#[derive(Debug, Clone)]
pub(crate) struct MockGateway {
    state: Arc<Mutex<MockState>>,
    entered: Arc<watch::Sender<usize>>,
    release: Arc<Semaphore>,
}

impl MockGateway {
    pub(crate) fn new() -> Self {
        let (entered, _) = watch::channel(0);
        MockGateway {
            state: Arc::default(),
            entered: Arc::new(entered),
            release: Arc::new(Semaphore::new(0)),
        }
    }

    /// Authoritative task list returned from `fetch_tasks`.
    pub(crate) fn with_tasks(self, tasks: Vec<Task>) -> Self {
        self.state.lock().tasks = tasks;
        self
    }

    pub(crate) fn with_projects(self, projects: Vec<Project>) -> Self {
        self.state.lock().projects = projects;
        self
    }

    /// Make every call to `verb` fail with `error`.
    pub(crate) fn with_failure(self, verb: Verb, error: GatewayError) -> Self {
        self.state.lock().failures.insert(verb, error);
        self
    }

    /// Park every subsequent call until [`MockGateway::release_one`].
    pub(crate) fn hold_calls(&self) {
        self.state.lock().hold = true;
    }

    /// Wait until `n` calls in total have reached the gateway.
    pub(crate) async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.entered.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Let one parked call continue.
    pub(crate) fn release_one(&self) {
        self.release.add_permits(1);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn count(&self, verb: Verb) -> usize {
        self.state.lock().calls.iter().filter(|c| c.verb() == verb).count()
    }

    async fn enter(&self, call: Call) -> GatewayResult<()> {
        let verb = call.verb();
        let hold = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.hold
        };
        self.entered.send_modify(|count| *count += 1);
        if hold {
            if let Ok(permit) = self.release.acquire().await {
                permit.forget();
            }
        }
        match self.state.lock().failures.get(&verb) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceGateway for MockGateway {
    async fn create_task(&self, input: NewTask) -> GatewayResult<Task> {
        self.enter(Call::CreateTask(input.title.clone())).await?;
        let mut state = self.state.lock();
        state.created += 1;
        let n = state.tasks.len() as u64 + state.created;
        let mut created = task(&format!("t{n}"), input.status, next_position(&state.tasks, input.status));
        created.title = input.title;
        created.project_id = input.project_id;
        created.priority = input.priority;
        created.tags = input.tags;
        Ok(created)
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<()> {
        self.enter(Call::UpdateTask(id.clone(), patch.clone())).await
    }

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()> {
        self.enter(Call::DeleteTask(id.clone())).await
    }

    async fn move_task(&self, id: &TaskId, status: Status, position: i64) -> GatewayResult<()> {
        self.enter(Call::MoveTask(id.clone(), status, position)).await
    }

    async fn fetch_tasks(&self, project_id: Option<&ProjectId>) -> GatewayResult<Vec<Task>> {
        self.enter(Call::FetchTasks(project_id.cloned())).await?;
        let state = self.state.lock();
        Ok(state
            .tasks
            .iter()
            .filter(|t| project_id.is_none() || t.project_id.as_ref() == project_id)
            .cloned()
            .collect())
    }

    async fn fetch_projects(&self) -> GatewayResult<Vec<Project>> {
        self.enter(Call::FetchProjects).await?;
        Ok(self.state.lock().projects.clone())
    }

    async fn create_project(&self, input: NewProject) -> GatewayResult<Project> {
        self.enter(Call::CreateProject(input.name.clone())).await?;
        let mut state = self.state.lock();
        let created = project(&format!("p{}", state.projects.len() + 1), &input.name);
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> GatewayResult<Project> {
        self.enter(Call::UpdateProject(id.clone())).await?;
        let mut state = self.state.lock();
        let found = state
            .projects
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| GatewayError::not_found("project", id.as_str()))?;
        patch.apply(found, epoch());
        Ok(found.clone())
    }

    async fn archive_project(&self, id: &ProjectId) -> GatewayResult<()> {
        self.enter(Call::ArchiveProject(id.clone())).await
    }
}
