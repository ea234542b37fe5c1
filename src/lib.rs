//! # kanban - optimistic Kanban board engine
//!
//! Holds a board's tasks in memory, ordered within four status columns
//! (To Do, In Progress, Review, Done), and applies every change locally before
//! the backend has confirmed it. When the backend refuses a change the board
//! rolls back: removals restore the snapshot taken before them, edits and moves
//! reload the authoritative list.
//!
//! ## Pieces
//!
//! - [`ordering`]: pure column ordering. Moving a task closes the gap it leaves
//!   and opens a slot where it lands, so positions stay unique per column.
//! - [`controller::TaskBoard`]: the mutation verbs (`add_task`, `update_task`,
//!   `delete_task`, `move_task`, plus project verbs).
//! - [`store::Store`]: the observed state. Subscribe to redraw on change.
//! - [`board`]: read-side derivations (project filter, column grouping).
//! - [`gateway::PersistenceGateway`]: the backend boundary, implemented for a
//!   local JSON file by [`db::JsonFileGateway`].
//!
//! ## Quick start
//!
//! ```no_run
//! use kanban::{NewTask, Status, TaskBoard, db::JsonFileGateway};
//!
//! # async fn demo() -> kanban::Result<()> {
//! let board = TaskBoard::new(JsonFileGateway::new("tasks.json", "me".into()));
//! board.load_tasks().await?;
//! let task = board.add_task(NewTask::new("Write release notes")).await?;
//! board.move_task(&task.id, Status::InProgress, 0).await?;
//! for (status, column) in board.store().board().columns.iter().enumerate() {
//!     println!("{}: {} tasks", Status::ALL[status].title(), column.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod mutation;
pub mod ordering;
pub mod project;
pub mod store;
pub mod task;

#[cfg(test)]
mod testing;

pub use board::{group_by_status, tasks_for_project, Board, Columns};
pub use controller::TaskBoard;
pub use error::{BoardError, GatewayError, Result};
pub use fields::{Priority, Status};
pub use gateway::{PersistenceGateway, Timeout};
pub use mutation::{Mutation, MutationKind, MutationPhase};
pub use project::{NewProject, Project, ProjectPatch};
pub use store::{BoardState, Store};
pub use task::{NewTask, ProjectId, Task, TaskId, TaskPatch, UserId};
