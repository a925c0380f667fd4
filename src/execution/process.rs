use std::{
    ffi::CString,
    io::{self, Write},
    os::{
        fd::{OwnedFd, RawFd},
        unix::ffi::OsStrExt,
    },
    path::Path,
};

use nix::{
    errno::Errno,
    sys::wait::{WaitStatus, waitpid},
    unistd::{ForkResult, Pid, execv, fork},
};

use crate::{
    builtin::{self, BuiltinStreams},
    command::Command,
    env::Session,
    error::ShellError,
    expand, redirect,
    result::CommandResult,
    search, signal,
};

/// Exit status of a child whose program could not be executed.
pub const EXEC_FAILURE_STATUS: i32 = 127;
/// Exit status of a child whose redirection could not be set up.
pub const REDIRECT_FAILURE_STATUS: i32 = 1;

/// Descriptors a child is connected to before it runs.
#[derive(Debug, Default)]
pub struct Wiring {
    /// Read end of the previous command's pipe
    pub stdin: Option<OwnedFd>,
    /// Write end of this command's pipe
    pub stdout: Option<OwnedFd>,
    /// Read end of this command's pipe, kept open by the parent only
    pub unused: Option<RawFd>,
}

/// Unbuffered writer on a raw descriptor, usable after fork without taking
/// the standard stream locks.
struct FdWriter(RawFd);

impl Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for `buf.len()` bytes.
        let n = unsafe { libc::write(self.0, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn child_error(message: &str) {
    let _ = FdWriter(redirect::STDERR_FD).write_all(message.as_bytes());
}

fn child_exit(status: i32) -> ! {
    // SAFETY: terminates the child without running the parent's exit handlers.
    unsafe { libc::_exit(status) }
}

/// Replaces the process image. Returns only if that failed.
fn exec(path: &Path, argv: Vec<String>) {
    let Ok(path) = CString::new(path.as_os_str().as_bytes()) else {
        return;
    };
    let Ok(args) = argv
        .into_iter()
        .map(CString::new)
        .collect::<Result<Vec<_>, _>>()
    else {
        return;
    };
    let _ = execv(&path, &args);
}

fn run_child(command: &Command, wiring: Wiring, session: &mut Session) -> ! {
    if let Err(e) = signal::reset_for_child() {
        child_error(&format!("mush: could not reset signals: {}\n", e));
    }
    if let Some(fd) = wiring.unused {
        // SAFETY: the parent owns this descriptor; the child has its own copy.
        unsafe { libc::close(fd) };
    }
    let wired = wiring
        .stdout
        .map_or(Ok(()), |fd| redirect::replace_fd(fd, redirect::STDOUT_FD))
        .and_then(|_| {
            wiring
                .stdin
                .map_or(Ok(()), |fd| redirect::replace_fd(fd, redirect::STDIN_FD))
        });
    if let Err(e) = wired.and_then(|_| redirect::apply(command)) {
        child_error(&format!("mush: {}: {}\n", command.path(), e));
        child_exit(REDIRECT_FAILURE_STATUS);
    }

    if let Some(func) = builtin::lookup(command.path()) {
        let mut out = FdWriter(redirect::STDOUT_FD);
        let mut err = FdWriter(redirect::STDERR_FD);
        let mut streams = BuiltinStreams {
            out: &mut out,
            err: &mut err,
        };
        let _: CommandResult = func(command.args(), session, &mut streams);
        child_exit(0);
    }

    let argv = expand::expand_arguments(command.argv().to_vec());
    if let Some(path) = search::resolve_command(command.path(), &session.path_env) {
        exec(&path, argv);
    }
    child_error(&format!("mush: could not execute: {}\n", command.path()));
    child_exit(EXEC_FAILURE_STATUS)
}

/// Forks a child that runs `command` connected according to `wiring`.
///
/// The parent's copies of the wired descriptors are closed on return.
pub fn spawn(command: &Command, wiring: Wiring, session: &mut Session) -> Result<Pid, ShellError> {
    // SAFETY: the child only rewires descriptors, expands arguments and then
    // execs or exits.
    match unsafe { fork() }.map_err(ShellError::Fork)? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => run_child(command, wiring, session),
    }
}

/// Blocks until `pid` terminates and returns its exit status. A child killed
/// by a signal reports 128 plus the signal number.
pub fn wait(pid: Pid) -> Result<i32, ShellError> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(source) => {
                return Err(ShellError::Wait {
                    pid: pid.as_raw(),
                    source,
                });
            }
        }
    }
}
