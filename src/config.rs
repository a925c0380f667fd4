use std::path::PathBuf;

use crate::env::{self, PathEnv};

/// Search path used when `PATH` is not set.
pub const DEFAULT_PATH: &str = "/bin:/sbin:/usr/bin:/usr/sbin";
pub const DEFAULT_PROMPT: &str = "% ";
pub const DEFAULT_LOG_FILTER: &str = "warn";
const HISTORY_FILE_NAME: &str = ".mush_history";

#[derive(Debug, Clone)]
pub struct Config {
    pub path_env: PathEnv,
    pub home_dir: Option<PathBuf>,
    pub prompt: String,
    pub history_file: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        let home_dir = env::home_dir();
        let history_file = std::env::var_os("MUSH_HISTFILE")
            .map(PathBuf::from)
            .or_else(|| home_dir.as_ref().map(|home| home.join(HISTORY_FILE_NAME)));

        Self {
            path_env: PathEnv::from_env(),
            home_dir,
            prompt: std::env::var("MUSH_PROMPT").unwrap_or_else(|_| DEFAULT_PROMPT.to_string()),
            history_file,
            log_filter: std::env::var("MUSH_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}
