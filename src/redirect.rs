use std::{
    fs::{File, OpenOptions},
    io,
    os::{
        fd::{AsRawFd, OwnedFd, RawFd},
        unix::fs::OpenOptionsExt,
    },
    path::Path,
};

use crate::command::Command;

pub(crate) const STDIN_FD: RawFd = 0;
pub(crate) const STDOUT_FD: RawFd = 1;
pub(crate) const STDERR_FD: RawFd = 2;

/// Makes `target` refer to what `fd` refers to, then closes `fd`.
pub(crate) fn replace_fd(fd: impl Into<OwnedFd>, target: RawFd) -> io::Result<()> {
    let fd: OwnedFd = fd.into();
    if fd.as_raw_fd() == target {
        // already in place, keep it open
        std::mem::forget(fd);
        return Ok(());
    }
    // SAFETY: both descriptors are valid; `fd` closes its own on drop.
    if unsafe { libc::dup2(fd.as_raw_fd(), target) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn open_output(path: &Path, append: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).mode(0o644);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path)
}

/// Points stdin and stdout of the calling process at the command's
/// redirection targets.
///
/// Only called in a forked child, after pipe wiring, so an explicit
/// redirection replaces the pipe end on the same descriptor.
pub fn apply(command: &Command) -> io::Result<()> {
    if let Some(from) = command.redirect_from() {
        replace_fd(File::open(from)?, STDIN_FD)?;
    }
    if let Some(to) = command.redirect_to() {
        replace_fd(open_output(to, command.append())?, STDOUT_FD)?;
    }
    Ok(())
}
