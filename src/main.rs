//! # kb - Kanban board CLI
//!
//! Four ordered columns (To Do, In Progress, Review, Done) stored in a local
//! JSON file. Every change is applied to the in-memory board first and rolled
//! back if the file backend refuses it.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task
//! kb add "Write release notes" --priority high --tag docs
//!
//! # Show the board
//! kb board
//!
//! # Move task t1 to the top of In Progress
//! kb move t1 in-progress 0
//!
//! # Group work into a project
//! kb project add "Website"
//! kb update t1 --project p1
//! ```
//!
//! Data is stored in `~/.kb/tasks.json` unless `--db` or `KB_DB` says otherwise.

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use kanban::cli::Cli;
use kanban::cmd::{self, Commands};
use kanban::config::Config;
use kanban::db::JsonFileGateway;
use kanban::{PersistenceGateway, TaskBoard, Timeout};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        cmd::cmd_completions(shell);
        return Ok(());
    }

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", config.data_dir.display()))?;
    debug!(db = %config.db_path.display(), user = %config.user_id, "opening board");

    let gateway = JsonFileGateway::new(&config.db_path, config.user_id.clone());
    match config.request_timeout {
        Some(limit) => serve(Timeout::new(gateway, limit), cli.command).await,
        None => serve(gateway, cli.command).await,
    }
}

async fn serve<G: PersistenceGateway>(gateway: G, command: Commands) -> anyhow::Result<()> {
    let board = TaskBoard::new(gateway);
    cmd::run(&board, command).await
}
