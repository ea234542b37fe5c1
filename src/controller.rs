//! Optimistic mutations against a board.
//!
//! Every verb follows the same contract. The change is applied to the
//! [`Store`] synchronously, before the first await, so call order is apply
//! order and no caller ever sees a half-applied change. Then the gateway is
//! asked to persist it. On success the local change stands. On failure it is
//! rolled back, the error is mirrored into `BoardState::error`, and the
//! gateway error is returned to the caller.
//!
//! Two rollback strategies are used:
//!
//! - Removals (task delete, project archive) restore the snapshot taken just
//!   before the change.
//! - Edits and moves refetch the authoritative task list and replace local
//!   state with it, since other in-flight changes or server-side position
//!   fixes may have landed in between. The last refetch to land wins.
//!
//! Acknowledgements are not serialized; a later mutation may commit before an
//! earlier one.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{BoardError, Result};
use crate::fields::Status;
use crate::gateway::PersistenceGateway;
use crate::mutation::{Mutation, MutationKind, MutationPhase};
use crate::ordering;
use crate::project::{NewProject, Project, ProjectPatch};
use crate::store::{BoardState, Store};
use crate::task::{NewTask, ProjectId, Task, TaskId, TaskPatch};

/// A board: observable local state plus the gateway that persists it.
#[derive(Debug)]
pub struct TaskBoard<G> {
    gateway: G,
    store: Store,
}

impl<G: PersistenceGateway> TaskBoard<G> {
    /// Board with an empty store.
    pub fn new(gateway: G) -> Self {
        Self::with_store(gateway, Store::new())
    }

    pub fn with_store(gateway: G, store: Store) -> Self {
        TaskBoard { gateway, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Load the task list for the current project selection.
    pub async fn load_tasks(&self) -> Result<()> {
        let scope = self.scope();
        self.store.update(|s| s.is_loading = true);
        match self.gateway.fetch_tasks(scope.as_ref()).await {
            Ok(mut tasks) => {
                ordering::sort_by_position(&mut tasks);
                debug!(count = tasks.len(), project = ?scope, "tasks loaded");
                self.store.update(|s| {
                    s.tasks = tasks;
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                let err = BoardError::from(e);
                warn!(error = %err, "failed to load tasks");
                self.store.update(|s| {
                    s.is_loading = false;
                    s.error = Some(format!("Failed to load tasks: {err}"));
                });
                Err(err)
            }
        }
    }

    /// Load the active project list.
    pub async fn load_projects(&self) -> Result<()> {
        match self.gateway.fetch_projects().await {
            Ok(projects) => {
                self.store.set_projects(projects);
                Ok(())
            }
            Err(e) => {
                let err = BoardError::from(e);
                warn!(error = %err, "failed to load projects");
                self.store
                    .update(|s| s.error = Some(format!("Failed to load projects: {err}")));
                Err(err)
            }
        }
    }

    /// Load projects, then tasks.
    pub async fn refresh(&self) -> Result<()> {
        self.load_projects().await?;
        self.load_tasks().await
    }

    /// Change the project selection and reload tasks for it.
    pub async fn select_project(&self, project_id: Option<ProjectId>) -> Result<()> {
        self.store.select_project(project_id);
        self.load_tasks().await
    }

    /// Create a task. The board only shows it once the backend has returned it.
    pub async fn add_task(&self, mut input: NewTask) -> Result<Task> {
        input.title = input.title.trim().to_string();
        if input.title.is_empty() {
            let err = BoardError::invalid_value("title", "must not be empty");
            self.record(MutationKind::CreateTask, &err);
            return Err(err);
        }

        let mut mutation = Mutation::begin(MutationKind::CreateTask, "");
        self.dispatch(&mut mutation, |s| s.is_loading = true)?;

        match self.gateway.create_task(input).await {
            Ok(task) => {
                info!(task_id = %task.id, status = %task.status, position = task.position, "task created");
                let created = task.clone();
                self.commit(mutation, move |s| {
                    s.tasks.retain(|t| t.id != created.id);
                    s.tasks.push(created);
                    ordering::sort_by_position(&mut s.tasks);
                    s.is_loading = false;
                })?;
                Ok(task)
            }
            Err(e) => {
                let err = BoardError::from(e);
                self.roll_back(mutation, &err, |s| s.is_loading = false)?;
                Err(err)
            }
        }
    }

    /// Edit a task in place, reconciling against the backend on failure.
    pub async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<()> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            let err = BoardError::invalid_value("title", "must not be empty");
            self.record(MutationKind::UpdateTask, &err);
            return Err(err);
        }

        let mut mutation = Mutation::begin(MutationKind::UpdateTask, id.as_str());
        let now = Utc::now();
        self.dispatch(&mut mutation, |s| {
            match s.tasks.iter_mut().find(|t| &t.id == id) {
                Some(task) => patch.apply(task, now),
                None => debug!(task_id = %id, "update for task not held locally"),
            }
        })?;

        match self.gateway.update_task(id, &patch).await {
            Ok(()) => {
                info!(task_id = %id, "task updated");
                self.commit(mutation, |_| {})
            }
            Err(e) => self.roll_back_by_refetch(mutation, e.into()).await,
        }
    }

    /// Remove a task, restoring the previous list if the backend refuses.
    pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let mut mutation = Mutation::begin(MutationKind::DeleteTask, id.as_str());
        let mut snapshot = Vec::new();
        self.dispatch(&mut mutation, |s| {
            snapshot = s.tasks.clone();
            if let Some(index) = s.tasks.iter().position(|t| &t.id == id) {
                let removed = s.tasks.remove(index);
                ordering::close_gap(&mut s.tasks, removed.status, removed.position);
            }
        })?;

        match self.gateway.delete_task(id).await {
            Ok(()) => {
                info!(task_id = %id, "task deleted");
                self.commit(mutation, |_| {})
            }
            Err(e) => {
                let err = BoardError::from(e);
                self.roll_back(mutation, &err, move |s| s.tasks = snapshot)?;
                Err(err)
            }
        }
    }

    /// Move a task to `position` within `status`.
    ///
    /// This is the single entry point for drag-and-drop drops. Moving a task the
    /// board does not hold changes nothing locally; the backend still decides.
    pub async fn move_task(&self, id: &TaskId, status: Status, position: i64) -> Result<()> {
        let mut mutation = Mutation::begin(MutationKind::MoveTask, id.as_str());
        let now = Utc::now();
        self.dispatch(&mut mutation, |s| {
            match ordering::move_task(&s.tasks, id, status, position, now) {
                Some(moved) => s.tasks = moved,
                None => debug!(task_id = %id, "move for task not held locally"),
            }
        })?;

        match self.gateway.move_task(id, status, position).await {
            Ok(()) => {
                info!(task_id = %id, status = %status, position, "task moved");
                self.commit(mutation, |_| {})
            }
            Err(e) => self.roll_back_by_refetch(mutation, e.into()).await,
        }
    }

    /// Create a project and add it to the active list once the backend returns it.
    pub async fn create_project(&self, mut input: NewProject) -> Result<Project> {
        input.name = crate::project::normalise_project_name(&input.name);
        if input.name.is_empty() {
            let err = BoardError::invalid_value("name", "must not be empty");
            self.record(MutationKind::CreateProject, &err);
            return Err(err);
        }

        let mut mutation = Mutation::begin(MutationKind::CreateProject, "");
        self.dispatch(&mut mutation, |s| s.is_loading = true)?;

        match self.gateway.create_project(input).await {
            Ok(project) => {
                info!(project_id = %project.id, "project created");
                let created = project.clone();
                self.commit(mutation, move |s| {
                    s.projects.push(created);
                    s.is_loading = false;
                })?;
                Ok(project)
            }
            Err(e) => {
                let err = BoardError::from(e);
                self.roll_back(mutation, &err, |s| s.is_loading = false)?;
                Err(err)
            }
        }
    }

    /// Edit a project, replacing the local copy with what the backend returns.
    pub async fn update_project(&self, id: &ProjectId, patch: ProjectPatch) -> Result<Project> {
        let mut mutation = Mutation::begin(MutationKind::UpdateProject, id.as_str());
        self.dispatch(&mut mutation, |_| {})?;

        match self.gateway.update_project(id, &patch).await {
            Ok(project) => {
                info!(project_id = %id, "project updated");
                let updated = project.clone();
                self.commit(mutation, move |s| {
                    if let Some(p) = s.projects.iter_mut().find(|p| p.id == updated.id) {
                        *p = updated;
                    }
                })?;
                Ok(project)
            }
            Err(e) => {
                let err = BoardError::from(e);
                self.roll_back(mutation, &err, |_| {})?;
                Err(err)
            }
        }
    }

    /// Drop a project from the active list. Its tasks are untouched.
    ///
    /// If the archived project was selected, the selection is cleared and the
    /// unscoped task list is loaded.
    pub async fn archive_project(&self, id: &ProjectId) -> Result<()> {
        let mut mutation = Mutation::begin(MutationKind::ArchiveProject, id.as_str());
        let mut snapshot = (Vec::new(), None);
        let mut was_selected = false;
        self.dispatch(&mut mutation, |s| {
            snapshot = (s.projects.clone(), s.selected_project_id.clone());
            s.projects.retain(|p| &p.id != id);
            if s.selected_project_id.as_ref() == Some(id) {
                s.selected_project_id = None;
                was_selected = true;
            }
        })?;

        match self.gateway.archive_project(id).await {
            Ok(()) => {
                info!(project_id = %id, "project archived");
                self.commit(mutation, |_| {})?;
                if was_selected {
                    self.load_tasks().await?;
                }
                Ok(())
            }
            Err(e) => {
                let err = BoardError::from(e);
                let (projects, selected) = snapshot;
                self.roll_back(mutation, &err, move |s| {
                    s.projects = projects;
                    s.selected_project_id = selected;
                })?;
                Err(err)
            }
        }
    }

    fn scope(&self) -> Option<ProjectId> {
        self.store.read(|s| s.selected_project_id.clone())
    }

    fn record(&self, kind: MutationKind, err: &BoardError) {
        let message = failure_message(kind, err);
        self.store.update(|s| s.error = Some(message));
    }

    /// Apply the local change and register the mutation as awaiting the backend.
    fn dispatch(&self, mutation: &mut Mutation, apply: impl FnOnce(&mut BoardState)) -> Result<()> {
        let mut awaiting = mutation.clone();
        awaiting.advance(MutationPhase::AwaitingBackend)?;
        debug!(mutation = awaiting.id, kind = %awaiting.kind, target = %awaiting.target, "applied locally");
        let pending = awaiting.clone();
        self.store.update(|s| {
            apply(s);
            s.pending.push(pending);
        });
        *mutation = awaiting;
        Ok(())
    }

    fn commit(&self, mut mutation: Mutation, apply: impl FnOnce(&mut BoardState)) -> Result<()> {
        mutation.advance(MutationPhase::Committed)?;
        self.store.update(|s| {
            apply(s);
            s.pending.retain(|m| m.id != mutation.id);
        });
        Ok(())
    }

    fn roll_back(
        &self,
        mut mutation: Mutation,
        err: &BoardError,
        restore: impl FnOnce(&mut BoardState),
    ) -> Result<()> {
        mutation.advance(MutationPhase::RolledBack)?;
        warn!(mutation = mutation.id, kind = %mutation.kind, target = %mutation.target, error = %err, "rolled back");
        let message = failure_message(mutation.kind, err);
        self.store.update(|s| {
            restore(s);
            s.pending.retain(|m| m.id != mutation.id);
            s.error = Some(message);
        });
        Ok(())
    }

    /// Replace local tasks with a fresh authoritative list, then fail with `err`.
    ///
    /// If the refetch fails too, local state is left as it is and `err` is still
    /// the error returned.
    async fn roll_back_by_refetch(&self, mutation: Mutation, err: BoardError) -> Result<()> {
        let scope = self.scope();
        match self.gateway.fetch_tasks(scope.as_ref()).await {
            Ok(mut tasks) => {
                ordering::sort_by_position(&mut tasks);
                self.roll_back(mutation, &err, move |s| s.tasks = tasks)?;
            }
            Err(refetch) => {
                warn!(error = %refetch, "refetch after failed mutation also failed");
                self.roll_back(mutation, &err, |_| {})?;
            }
        }
        Err(err)
    }
}

fn failure_message(kind: MutationKind, err: &BoardError) -> String {
    format!("Failed to {kind}: {err}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::GatewayError;
    use crate::ordering::column_positions_are_unique;
    use crate::testing::{project, seed_tasks, task, Call, MockGateway, Verb};

    fn seeded(gateway: MockGateway) -> TaskBoard<MockGateway> {
        let store = Store::with_seed(BoardState {
            tasks: seed_tasks(),
            ..Default::default()
        });
        TaskBoard::with_store(gateway, store)
    }

    fn placement(board: &TaskBoard<MockGateway>, id: &str) -> Option<(Status, i64)> {
        board.store().task(&id.into()).map(|t| (t.status, t.position))
    }

    fn transport(msg: &str) -> GatewayError {
        GatewayError::Transport(msg.to_string())
    }

    #[tokio::test]
    async fn test_move_across_columns() {
        let board = seeded(MockGateway::new());
        board.move_task(&"t1".into(), Status::InProgress, 1).await.unwrap();

        assert_eq!(placement(&board, "t2"), Some((Status::Todo, 0)));
        assert_eq!(placement(&board, "t1"), Some((Status::InProgress, 1)));
        assert_eq!(placement(&board, "t3"), Some((Status::InProgress, 0)));
        assert_eq!(placement(&board, "t4"), Some((Status::Done, 0)));
        assert_eq!(
            board.gateway().calls(),
            vec![Call::MoveTask("t1".into(), Status::InProgress, 1)]
        );
        assert!(board.store().snapshot().pending.is_empty());
    }

    #[tokio::test]
    async fn test_add_task_appends_server_record() {
        let board = seeded(MockGateway::new().with_tasks(seed_tasks()));
        let created = board.add_task(NewTask::new("x")).await.unwrap();

        assert_eq!(created.id.as_str(), "t5");
        let tasks = board.store().tasks();
        assert_eq!(tasks.len(), 5);
        assert!(tasks.iter().any(|t| t.id.as_str() == "t5" && t.title == "x"));
        assert!(!board.store().is_loading());
        assert!(column_positions_are_unique(&tasks));
    }

    #[tokio::test]
    async fn test_add_task_failure_records_error_and_returns_it() {
        let gateway = MockGateway::new().with_failure(Verb::CreateTask, transport("offline"));
        let board = seeded(gateway);

        let err = board.add_task(NewTask::new("x")).await.unwrap_err();
        assert_eq!(err, BoardError::Gateway(transport("offline")));
        assert_eq!(board.store().tasks().len(), 4);
        assert!(!board.store().is_loading());
        assert_eq!(
            board.store().error().as_deref(),
            Some("Failed to create task: transport error: offline")
        );
    }

    #[tokio::test]
    async fn test_add_task_rejects_blank_title_without_calling_gateway() {
        let board = seeded(MockGateway::new());
        let err = board.add_task(NewTask::new("   ")).await.unwrap_err();

        assert!(matches!(err, BoardError::InvalidValue { ref field, .. } if field == "title"));
        assert!(board.gateway().calls().is_empty());
        assert!(board.store().error().is_some());
    }

    #[tokio::test]
    async fn test_delete_failure_restores_snapshot() {
        let board = seeded(MockGateway::new().with_failure(Verb::DeleteTask, transport("500")));
        let before = board.store().tasks();

        let err = board.delete_task(&"t2".into()).await.unwrap_err();
        assert_eq!(err, BoardError::Gateway(transport("500")));
        assert_eq!(board.store().tasks(), before);
        assert_eq!(placement(&board, "t2"), Some((Status::Todo, 1)));
        assert!(board.store().error().is_some());
        assert_eq!(board.gateway().count(Verb::FetchTasks), 0);
    }

    #[tokio::test]
    async fn test_delete_success_removes_task() {
        let board = seeded(MockGateway::new());
        board.delete_task(&"t2".into()).await.unwrap();

        assert_eq!(placement(&board, "t2"), None);
        assert_eq!(board.store().tasks().len(), 3);
        assert_eq!(board.store().error(), None);
    }

    #[tokio::test]
    async fn test_delete_closes_gap_so_later_moves_append() {
        let board = seeded(MockGateway::new());
        board.delete_task(&"t1".into()).await.unwrap();
        assert_eq!(placement(&board, "t2"), Some((Status::Todo, 0)));

        board.move_task(&"t3".into(), Status::Todo, 99).await.unwrap();
        assert_eq!(placement(&board, "t2"), Some((Status::Todo, 0)));
        assert_eq!(placement(&board, "t3"), Some((Status::Todo, 1)));
        assert!(column_positions_are_unique(&board.store().tasks()));
    }

    #[tokio::test]
    async fn test_delete_failure_restores_gap_free_snapshot() {
        let board = seeded(MockGateway::new().with_failure(Verb::DeleteTask, transport("500")));
        let before = board.store().tasks();

        assert!(board.delete_task(&"t1".into()).await.is_err());
        assert_eq!(board.store().tasks(), before);
        assert_eq!(placement(&board, "t2"), Some((Status::Todo, 1)));
    }

    #[tokio::test]
    async fn test_update_applies_before_gateway_answers() {
        let gateway = MockGateway::new();
        gateway.hold_calls();
        let board = Arc::new(seeded(gateway.clone()));

        let running = {
            let board = Arc::clone(&board);
            tokio::spawn(async move {
                let patch = TaskPatch {
                    title: Some("y".into()),
                    ..Default::default()
                };
                board.update_task(&"t3".into(), patch).await
            })
        };

        gateway.wait_for_calls(1).await;
        let t3 = board.store().task(&"t3".into()).unwrap();
        assert_eq!(t3.title, "y");
        assert_eq!(board.store().snapshot().pending.len(), 1);
        assert_eq!(board.store().snapshot().pending[0].phase, MutationPhase::AwaitingBackend);

        gateway.release_one();
        running.await.unwrap().unwrap();
        assert!(board.store().snapshot().pending.is_empty());
    }

    #[tokio::test]
    async fn test_update_failure_refetches_authoritative_list() {
        let truth = vec![task("t3", Status::InProgress, 0), task("t9", Status::Review, 0)];
        let gateway = MockGateway::new()
            .with_tasks(truth.clone())
            .with_failure(Verb::UpdateTask, transport("conflict"));
        let board = seeded(gateway);

        let patch = TaskPatch {
            title: Some("y".into()),
            ..Default::default()
        };
        let err = board.update_task(&"t3".into(), patch).await.unwrap_err();

        assert_eq!(err, BoardError::Gateway(transport("conflict")));
        assert_eq!(board.gateway().count(Verb::FetchTasks), 1);
        let mut expected = truth;
        ordering::sort_by_position(&mut expected);
        assert_eq!(board.store().tasks(), expected);
        assert_eq!(board.store().task(&"t3".into()).unwrap().title, "Task t3");
        assert_eq!(
            board.store().error().as_deref(),
            Some("Failed to update task: transport error: conflict")
        );
    }

    #[tokio::test]
    async fn test_move_failure_refetches_scoped_to_selection() {
        let mut owned = task("t1", Status::Todo, 0);
        owned.project_id = Some("p1".into());
        let gateway = MockGateway::new()
            .with_tasks(vec![owned.clone(), task("t2", Status::Todo, 1)])
            .with_failure(Verb::MoveTask, transport("down"));
        let board = seeded(gateway);
        board.store().select_project(Some("p1".into()));

        board.move_task(&"t1".into(), Status::Done, 0).await.unwrap_err();

        assert!(board
            .gateway()
            .calls()
            .contains(&Call::FetchTasks(Some("p1".into()))));
        assert_eq!(board.store().tasks(), vec![owned]);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_local_state_and_returns_original_error() {
        let gateway = MockGateway::new()
            .with_failure(Verb::MoveTask, transport("move failed"))
            .with_failure(Verb::FetchTasks, transport("fetch failed"));
        let board = seeded(gateway);

        let err = board.move_task(&"t1".into(), Status::Done, 0).await.unwrap_err();
        assert_eq!(err, BoardError::Gateway(transport("move failed")));
        assert_eq!(placement(&board, "t1"), Some((Status::Done, 0)));
        assert!(board.store().snapshot().pending.is_empty());
    }

    #[tokio::test]
    async fn test_move_of_unknown_task_is_local_noop() {
        let board = seeded(MockGateway::new());
        let before = board.store().tasks();

        board.move_task(&"ghost".into(), Status::Done, 0).await.unwrap();
        assert_eq!(board.store().tasks(), before);
        assert_eq!(board.gateway().count(Verb::MoveTask), 1);
    }

    #[tokio::test]
    async fn test_move_in_place_keeps_placements() {
        let board = seeded(MockGateway::new());
        let key = |tasks: Vec<Task>| {
            let mut v: Vec<_> = tasks.into_iter().map(|t| (t.id, t.status, t.position)).collect();
            v.sort();
            v
        };
        let before = key(board.store().tasks());

        board.move_task(&"t2".into(), Status::Todo, 1).await.unwrap();
        assert_eq!(key(board.store().tasks()), before);
    }

    #[tokio::test]
    async fn test_local_applies_follow_call_order() {
        let gateway = MockGateway::new();
        gateway.hold_calls();
        let board = Arc::new(seeded(gateway.clone()));

        let first = {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.move_task(&"t1".into(), Status::Review, 0).await })
        };
        gateway.wait_for_calls(1).await;
        let second = {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.move_task(&"t2".into(), Status::Review, 0).await })
        };
        gateway.wait_for_calls(2).await;

        // Both applied locally, neither acknowledged yet.
        assert_eq!(placement(&board, "t2"), Some((Status::Review, 0)));
        assert_eq!(placement(&board, "t1"), Some((Status::Review, 1)));
        assert_eq!(board.store().snapshot().pending.len(), 2);
        assert!(column_positions_are_unique(&board.store().tasks()));

        gateway.release_one();
        gateway.release_one();
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert!(board.store().snapshot().pending.is_empty());
    }

    #[tokio::test]
    async fn test_refetch_rollback_supersedes_interleaved_state() {
        let truth = seed_tasks();
        let gateway = MockGateway::new()
            .with_tasks(truth.clone())
            .with_failure(Verb::MoveTask, transport("nope"));
        gateway.hold_calls();
        let board = Arc::new(seeded(gateway.clone()));

        let failing = {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.move_task(&"t1".into(), Status::Done, 0).await })
        };
        gateway.wait_for_calls(1).await;
        let deleting = {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.delete_task(&"t4".into()).await })
        };
        gateway.wait_for_calls(2).await;
        assert_eq!(placement(&board, "t4"), None);

        // Let the move fail; its refetch is the third call.
        gateway.release_one();
        gateway.wait_for_calls(3).await;
        // The delete is queued ahead of the refetch.
        gateway.release_one();
        gateway.release_one();
        failing.await.unwrap().unwrap_err();
        deleting.await.unwrap().unwrap();

        // The refetched list wins, even over the delete that committed meanwhile.
        assert_eq!(board.store().tasks(), truth);
        assert!(board.store().snapshot().pending.is_empty());
    }

    #[tokio::test]
    async fn test_load_tasks_sorts_and_clears_loading() {
        let gateway = MockGateway::new().with_tasks(vec![
            task("b", Status::Todo, 1),
            task("a", Status::Todo, 0),
        ]);
        let board = TaskBoard::new(gateway);
        board.load_tasks().await.unwrap();

        let ids: Vec<String> = board.store().tasks().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(!board.store().is_loading());
    }

    #[tokio::test]
    async fn test_load_tasks_failure_records_error() {
        let gateway = MockGateway::new().with_failure(Verb::FetchTasks, transport("dns"));
        let board = TaskBoard::new(gateway);

        board.load_tasks().await.unwrap_err();
        assert!(!board.store().is_loading());
        assert_eq!(
            board.store().error().as_deref(),
            Some("Failed to load tasks: transport error: dns")
        );
        board.store().clear_error();
        assert_eq!(board.store().error(), None);
    }

    #[tokio::test]
    async fn test_select_project_filters_view_and_scopes_fetch() {
        let mut tasks = seed_tasks();
        for t in tasks.iter_mut().filter(|t| t.id.as_str() != "t1") {
            t.project_id = Some("p1".into());
        }
        let board = TaskBoard::new(MockGateway::new().with_tasks(tasks));
        board.select_project(Some("p1".into())).await.unwrap();

        assert!(board.gateway().calls().contains(&Call::FetchTasks(Some("p1".into()))));
        let board_view = board.store().board();
        assert_eq!(board_view.len(), 3);
        assert!(board_view.columns.iter().flatten().all(|t| t.project_id == Some(ProjectId::from("p1"))));
    }

    #[tokio::test]
    async fn test_create_and_update_project() {
        let board = TaskBoard::new(MockGateway::new());
        let created = board.create_project(NewProject::new("  Launch  ")).await.unwrap();
        assert_eq!(created.name, "Launch");
        assert_eq!(board.store().snapshot().projects.len(), 1);

        let patch = ProjectPatch {
            name: Some("Relaunch".into()),
            ..Default::default()
        };
        let updated = board.update_project(&created.id, patch).await.unwrap();
        assert_eq!(updated.name, "Relaunch");
        assert_eq!(board.store().snapshot().projects[0].name, "Relaunch");
    }

    #[tokio::test]
    async fn test_archive_selected_project_clears_selection_and_reloads() {
        let gateway = MockGateway::new()
            .with_projects(vec![project("p1", "Alpha"), project("p2", "Beta")])
            .with_tasks(seed_tasks());
        let board = TaskBoard::new(gateway);
        board.load_projects().await.unwrap();
        board.store().select_project(Some("p1".into()));

        board.archive_project(&"p1".into()).await.unwrap();

        let state = board.store().snapshot();
        assert_eq!(state.selected_project_id, None);
        assert_eq!(state.projects.len(), 1);
        assert_eq!(state.tasks.len(), 4);
        assert!(board.gateway().calls().contains(&Call::FetchTasks(None)));
    }

    #[tokio::test]
    async fn test_archive_failure_restores_projects_and_selection() {
        let gateway = MockGateway::new()
            .with_projects(vec![project("p1", "Alpha")])
            .with_failure(Verb::ArchiveProject, transport("locked"));
        let board = TaskBoard::new(gateway);
        board.load_projects().await.unwrap();
        board.store().select_project(Some("p1".into()));

        board.archive_project(&"p1".into()).await.unwrap_err();

        let state = board.store().snapshot();
        assert_eq!(state.projects, vec![project("p1", "Alpha")]);
        assert_eq!(state.selected_project_id, Some(ProjectId::from("p1")));
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to archive project: transport error: locked")
        );
    }
}
