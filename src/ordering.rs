//! Column ordering for board tasks.
//!
//! These are pure functions over a flat task list. A task's `position` is its
//! rank inside its status column; the list as a whole is kept sorted by
//! position, which keeps every column in display order without storing the
//! columns themselves.

use chrono::{DateTime, Utc};

use crate::fields::Status;
use crate::task::{Task, TaskId};

/// Stable sort of the whole list by position.
pub fn sort_by_position(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.position);
}

/// Number of tasks currently in `status`.
pub fn column_len(tasks: &[Task], status: Status) -> usize {
    tasks.iter().filter(|t| t.status == status).count()
}

/// Position at which a new task is appended to `status`.
pub fn next_position(tasks: &[Task], status: Status) -> i64 {
    tasks
        .iter()
        .filter(|t| t.status == status)
        .map(|t| t.position + 1)
        .max()
        .unwrap_or(0)
}

/// Shift every task in `status` after `position` down by one, closing the slot
/// a removed task left behind.
pub fn close_gap(tasks: &mut [Task], status: Status, position: i64) {
    for t in tasks.iter_mut() {
        if t.status == status && t.position > position {
            t.position -= 1;
        }
    }
}

/// Move a task to `position` in `destination`, returning the reordered list.
///
/// Returns `None` when no task has `id`. Positions past the end of the
/// destination column append, even when the column has gaps; negative
/// positions insert at the top. Moves
/// within one column go through the same remove/insert steps as moves across
/// columns.
pub fn move_task(
    tasks: &[Task],
    id: &TaskId,
    destination: Status,
    position: i64,
    now: DateTime<Utc>,
) -> Option<Vec<Task>> {
    let index = tasks.iter().position(|t| &t.id == id)?;

    let mut remaining = tasks.to_vec();
    let mut moved = remaining.remove(index);
    close_gap(&mut remaining, moved.status, moved.position);

    let slot = position.clamp(0, next_position(&remaining, destination));
    for t in remaining.iter_mut() {
        if t.status == destination && t.position >= slot {
            t.position += 1;
        }
    }

    moved.status = destination;
    moved.position = slot;
    moved.updated_at = now;
    remaining.push(moved);

    sort_by_position(&mut remaining);
    Some(remaining)
}

/// True when no two tasks in the same column share a position.
pub fn column_positions_are_unique(tasks: &[Task]) -> bool {
    Status::ALL.iter().all(|&status| {
        let mut positions: Vec<i64> = tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.position)
            .collect();
        let len = positions.len();
        positions.sort_unstable();
        positions.dedup();
        positions.len() == len
    })
}
