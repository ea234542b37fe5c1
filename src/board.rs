//! Read-side views of the board.
//!
//! Nothing here is stored. Columns are recomputed from the flat task list on
//! every read, so they can never drift from the state they were derived from.

use crate::fields::Status;
use crate::task::{ProjectId, Task};

/// Tasks visible under the current project selection.
///
/// With no selection every task is visible.
pub fn tasks_for_project<'a>(tasks: &'a [Task], selected: Option<&ProjectId>) -> Vec<&'a Task> {
    match selected {
        None => tasks.iter().collect(),
        Some(id) => tasks
            .iter()
            .filter(|t| t.project_id.as_ref() == Some(id))
            .collect(),
    }
}

/// Tasks split into the four status columns.
#[derive(Debug, Default)]
pub struct Columns<'a> {
    columns: [Vec<&'a Task>; 4],
}

impl<'a> Columns<'a> {
    pub fn column(&self, status: Status) -> &[&'a Task] {
        &self.columns[status.index()]
    }

    /// Columns in board order.
    pub fn iter(&self) -> impl Iterator<Item = (Status, &[&'a Task])> + '_ {
        Status::ALL
            .into_iter()
            .map(move |status| (status, self.column(status)))
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition tasks by status, each column ordered by ascending position.
pub fn group_by_status<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Columns<'a> {
    let mut grouped = Columns::default();
    for task in tasks {
        grouped.columns[task.status.index()].push(task);
    }
    for column in grouped.columns.iter_mut() {
        column.sort_by_key(|t| t.position);
    }
    grouped
}

/// Owned snapshot of the board as a renderer sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub columns: [Vec<Task>; 4],
}

impl Board {
    /// Filter `tasks` by the selected project and group them into columns.
    pub fn derive(tasks: &[Task], selected: Option<&ProjectId>) -> Self {
        let grouped = group_by_status(tasks_for_project(tasks, selected));
        let mut board = Board::default();
        for (status, column) in grouped.iter() {
            board.columns[status.index()] = column.iter().map(|&t| t.clone()).collect();
        }
        board
    }

    pub fn column(&self, status: Status) -> &[Task] {
        &self.columns[status.index()]
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
