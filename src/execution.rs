pub mod process;

use std::os::fd::{AsRawFd, OwnedFd};

use nix::{
    fcntl::{FcntlArg, FdFlag, fcntl},
    unistd::{Pid, pipe},
};
use tracing::{debug, warn};

use crate::{
    builtin,
    command::{Command, ConnectionType},
    env::Session,
    error::ShellError,
    queue::Queue,
    result::CommandResult,
};

use self::process::Wiring;

/// Creates a pipe whose ends are not inherited across exec. The child's
/// duplicates on stdin and stdout are unaffected.
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    let (read_end, write_end) = pipe()?;
    for fd in [&read_end, &write_end] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((read_end, write_end))
}

fn report(session: &mut Session, error: ShellError) {
    eprintln!("mush: {}", error);
    warn!(error = %error, "command failed");
    session.errors.record(&error);
}

fn wait_foreground(pid: Pid, command: &Command, session: &mut Session) {
    debug!(pid = pid.as_raw(), command = %command, "waiting");
    match process::wait(pid) {
        Ok(status) => {
            debug!(pid = pid.as_raw(), status, "exited");
            session.last_status = Some(status);
        }
        Err(e) => report(session, e),
    }
}

/// Spawned commands whose output feeds a command not yet finished.
#[derive(Default)]
struct Pipeline {
    producers: Vec<(Pid, Command)>,
}

impl Pipeline {
    fn push(&mut self, pid: Pid, command: Command) {
        self.producers.push((pid, command));
    }

    fn wait(&mut self, session: &mut Session) {
        for (pid, command) in self.producers.drain(..) {
            debug!(pid = pid.as_raw(), command = %command, "waiting for producer");
            if let Err(e) = process::wait(pid) {
                report(session, e);
            }
        }
    }

    fn send_to_background(&mut self, session: &mut Session) {
        for (pid, command) in self.producers.drain(..) {
            if let Err(e) = session.jobs.add(command, pid) {
                report(session, e);
            }
        }
    }
}

/// Runs every command of a parsed line in order.
///
/// Builtins run in the interpreter unless their output is redirected or
/// piped. Everything else is forked; the interpreter waits for it unless it
/// was put in the background.
pub fn execute_queue(mut queue: Queue<Command>, session: &mut Session) -> CommandResult {
    // read end of the previous command's pipe
    let mut upstream: Option<OwnedFd> = None;
    let mut pipeline = Pipeline::default();

    while let Some(command) = queue.remove() {
        let connection = command.connection();

        if let Some(func) = builtin::lookup(command.path())
            && command.redirect_to().is_none()
            && connection != ConnectionType::Pipe
        {
            drop(upstream.take());
            let ret = builtin::run_in_process(func, command.args(), session);
            pipeline.wait(session);
            if ret == CommandResult::Exit {
                return CommandResult::Exit;
            }
            continue;
        }

        let (read_end, write_end) = if connection == ConnectionType::Pipe {
            match cloexec_pipe() {
                Ok((read_end, write_end)) => (Some(read_end), Some(write_end)),
                Err(e) => {
                    report(session, ShellError::Pipe(e));
                    drop(upstream.take());
                    pipeline.wait(session);
                    return CommandResult::Normal;
                }
            }
        } else {
            (None, None)
        };

        let wiring = Wiring {
            stdin: upstream.take(),
            stdout: write_end,
            unused: read_end.as_ref().map(AsRawFd::as_raw_fd),
        };
        let pid = match process::spawn(&command, wiring, session) {
            Ok(pid) => pid,
            Err(e) => {
                report(session, e);
                pipeline.wait(session);
                return CommandResult::Normal;
            }
        };
        debug!(pid = pid.as_raw(), command = %command, "spawned");
        upstream = read_end;

        match connection {
            ConnectionType::Pipe => pipeline.push(pid, command),
            ConnectionType::Background => {
                pipeline.send_to_background(session);
                if let Err(e) = session.jobs.add(command, pid) {
                    report(session, e);
                }
            }
            ConnectionType::None | ConnectionType::Sequential => {
                wait_foreground(pid, &command, session);
                pipeline.wait(session);
            }
        }
    }

    // the parser never ends a line on a pipe; close and collect anyway
    drop(upstream);
    pipeline.wait(session);
    CommandResult::Normal
}
