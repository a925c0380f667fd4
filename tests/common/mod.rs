use std::{
    fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use mush::{
    env::{PathEnv, Session},
    get_input_and_run,
    result::CommandResult,
};
use tempfile::TempDir;

/// Held by tests that depend on or change the working directory.
static CWD_LOCK: Mutex<()> = Mutex::new(());

#[allow(dead_code)]
pub fn lock_cwd() -> MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn session() -> Session {
    Session::new(PathEnv::from_env())
}

#[allow(dead_code)]
pub fn scratch_dir(prefix: &str) -> TempDir {
    tempfile::Builder::new().prefix(prefix).tempdir().unwrap()
}

#[allow(dead_code)]
pub fn read_file(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Runs `line` with `{}` replaced by `dir`.
#[allow(dead_code)]
pub fn run_in(session: &mut Session, dir: &Path, line: &str) -> CommandResult {
    get_input_and_run(&line.replace("{}", &dir.display().to_string()), session)
}
