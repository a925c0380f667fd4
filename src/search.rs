use std::path::{Path, PathBuf};

use is_executable::IsExecutable;

use crate::env::PathEnv;

/// Finds the executable a command name refers to.
///
/// Names containing a `/` are taken as paths and returned unchanged; other
/// names are looked up in each `PATH` directory in order.
pub fn resolve_command(name: &str, path_env: &PathEnv) -> Option<PathBuf> {
    if name.contains('/') {
        return Some(PathBuf::from(name));
    }
    if name.is_empty() {
        return None;
    }

    path_env
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_runnable(candidate))
}

fn is_runnable(path: &Path) -> bool {
    path.is_file() && path.is_executable()
}
