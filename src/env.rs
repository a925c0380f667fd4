use std::{ops::Deref, path::PathBuf};

use directories::BaseDirs;
use nix::unistd::Pid;

use crate::{
    config::{Config, DEFAULT_PATH, DEFAULT_PROMPT},
    error::ErrorState,
    job::{Job, JobTable},
    signal,
};

#[derive(Debug, Clone)]
pub struct PathEnv {
    pub paths: Vec<PathBuf>,
}

impl PathEnv {
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Reads `PATH`, falling back to the standard system directories.
    pub fn from_env() -> Self {
        match std::env::var_os("PATH") {
            Some(paths) => Self::from_paths(std::env::split_paths(&paths).collect()),
            None => Self::from_paths(std::env::split_paths(DEFAULT_PATH).collect()),
        }
    }
}

impl Default for PathEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for PathEnv {
    type Target = Vec<PathBuf>;

    fn deref(&self) -> &Self::Target {
        &self.paths
    }
}

/// Home directory of the current user, as `cd` without arguments uses it.
pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// State of one interpreter session, passed to the executor and builtins.
#[derive(Debug)]
pub struct Session {
    pub path_env: PathEnv,
    pub home_dir: Option<PathBuf>,
    pub prompt: String,
    pub errors: ErrorState,
    pub jobs: JobTable,
    /// Exit status of the last foreground command that was waited for
    pub last_status: Option<i32>,
}

impl Session {
    pub fn new(path_env: PathEnv) -> Self {
        Self {
            path_env,
            home_dir: home_dir(),
            prompt: DEFAULT_PROMPT.to_string(),
            errors: ErrorState::new(),
            jobs: JobTable::new(),
            last_status: None,
        }
    }

    pub fn build(config: &Config) -> Self {
        Self {
            path_env: config.path_env.clone(),
            home_dir: config.home_dir.clone(),
            prompt: config.prompt.clone(),
            errors: ErrorState::new(),
            jobs: JobTable::new(),
            last_status: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Collects background jobs that finished since the last SIGCHLD, with
    /// their job numbers.
    pub fn reap_if_notified(&mut self) -> Vec<(usize, Job)> {
        if signal::take_notification() {
            self.jobs.reap()
        } else {
            Vec::new()
        }
    }

    pub fn find_job(&self, pid: Pid) -> Option<(usize, &Job)> {
        self.jobs.find_by_pid(pid)
    }
}
