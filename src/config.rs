//! Runtime configuration for the `kb` binary.
//!
//! Values come from command-line flags, which fall back to `KB_*` environment
//! variables through clap, and then to defaults under `$HOME/.kb`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::task::UserId;

/// Log filter used when neither `--log` nor `--verbose` is given.
pub const DEFAULT_LOG_FILTER: &str = "kanban=info,warn";
/// Log filter used with `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "kanban=debug,info";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the board database.
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    /// Owner stamped on tasks and projects this client creates.
    pub user_id: UserId,
    /// Deadline for each backend call; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    pub log_filter: String,
}

impl Config {
    /// Resolve configuration from parsed arguments and the process environment.
    pub fn from_cli(cli: &Cli) -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        let user = std::env::var("USER").ok();
        Config::resolve(cli, home.as_deref(), user)
    }

    /// Resolve configuration with an explicit home directory and login name.
    pub fn resolve(cli: &Cli, home: Option<&Path>, login: Option<String>) -> Self {
        let (data_dir, db_path) = match &cli.db {
            Some(db) => {
                let dir = db
                    .parent()
                    .filter(|d| !d.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."))
                    .to_path_buf();
                (dir, db.clone())
            }
            None => {
                let dir = home.unwrap_or_else(|| Path::new(".")).join(".kb");
                let db = dir.join("tasks.json");
                (dir, db)
            }
        };

        let user_id = cli
            .user
            .clone()
            .or(login)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| "local".to_string());

        let log_filter = match (&cli.log, cli.verbose) {
            (Some(filter), _) => filter.clone(),
            (None, true) => VERBOSE_LOG_FILTER.to_string(),
            (None, false) => DEFAULT_LOG_FILTER.to_string(),
        };

        Config {
            data_dir,
            db_path,
            user_id: UserId::new(user_id),
            request_timeout: cli.timeout_ms.filter(|&ms| ms > 0).map(Duration::from_millis),
            log_filter,
        }
    }
}
