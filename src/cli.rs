use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Kanban board CLI.
/// Storage defaults to ~/.kb/tasks.json or a path passed via --db.
#[derive(Parser, Debug)]
#[command(name = "kb", version, about = "Kanban board with ordered status columns")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true, env = "KB_DB")]
    pub db: Option<PathBuf>,

    /// Owner recorded on new tasks and projects (defaults to $USER).
    #[arg(long, global = true, env = "KB_USER")]
    pub user: Option<String>,

    /// Fail backend calls that take longer than this many milliseconds.
    #[arg(long, global = true, env = "KB_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Log filter directive, e.g. "kanban=debug".
    #[arg(long, global = true, env = "KB_LOG")]
    pub log: Option<String>,

    /// Debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
