//! The observed state of one board.
//!
//! A [`Store`] owns a single [`BoardState`] and publishes every change on a
//! `tokio::sync::watch` channel, so renderers can hold a receiver and redraw
//! when it fires. Each store is an ordinary value: tests and callers create as
//! many independent boards as they like.

use tokio::sync::watch;

use crate::board::Board;
use crate::mutation::Mutation;
use crate::ordering::sort_by_position;
use crate::project::Project;
use crate::task::{ProjectId, Task};

/// Everything a board view reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardState {
    /// Flat task list, sorted by position.
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub selected_project_id: Option<ProjectId>,
    pub is_loading: bool,
    /// Last failure, worded for display.
    pub error: Option<String>,
    /// Mutations applied locally and still waiting on the backend.
    pub pending: Vec<Mutation>,
}

/// Shared, observable holder of a [`BoardState`].
#[derive(Debug)]
pub struct Store {
    tx: watch::Sender<BoardState>,
    seed: BoardState,
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Store::with_seed(BoardState::default())
    }

    /// Create a store starting from `seed`. [`Store::reset`] returns to it.
    pub fn with_seed(mut seed: BoardState) -> Self {
        sort_by_position(&mut seed.tasks);
        let (tx, _) = watch::channel(seed.clone());
        Store { tx, seed }
    }

    /// Receiver notified after every change.
    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.tx.subscribe()
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> BoardState {
        self.tx.borrow().clone()
    }

    /// Run `f` against the current state without cloning it.
    ///
    /// `f` must not write to the store.
    pub fn read<R>(&self, f: impl FnOnce(&BoardState) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.read(|s| s.tasks.clone())
    }

    pub fn task(&self, id: &crate::task::TaskId) -> Option<Task> {
        self.read(|s| s.tasks.iter().find(|t| &t.id == id).cloned())
    }

    pub fn error(&self) -> Option<String> {
        self.read(|s| s.error.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.read(|s| s.is_loading)
    }

    /// Columns for the current project selection.
    pub fn board(&self) -> Board {
        self.read(|s| Board::derive(&s.tasks, s.selected_project_id.as_ref()))
    }

    /// Replace the task list. Input order does not matter; it is re-sorted by position.
    pub fn set_tasks(&self, mut tasks: Vec<Task>) {
        sort_by_position(&mut tasks);
        self.update(|s| s.tasks = tasks);
    }

    pub fn set_projects(&self, projects: Vec<Project>) {
        self.update(|s| s.projects = projects);
    }

    pub fn select_project(&self, project_id: Option<ProjectId>) {
        self.update(|s| s.selected_project_id = project_id);
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error = None);
    }

    /// Return to the state the store was created with.
    pub fn reset(&self) {
        let seed = self.seed.clone();
        self.tx.send_replace(seed);
    }

    /// Apply a synchronous change and notify subscribers.
    pub(crate) fn update(&self, f: impl FnOnce(&mut BoardState)) {
        self.tx.send_modify(f);
    }
}
