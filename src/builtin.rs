use std::{
    collections::HashMap,
    io::{self, Write},
    path::PathBuf,
};

use crate::{env::Session, result::CommandResult};

/// Output streams of a builtin. In the interpreter they are the process
/// streams; in a forked child they write straight to the descriptors.
pub struct BuiltinStreams<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

/// A builtin receives the arguments that follow its name.
pub type BuiltinExecFunc = fn(&[String], &mut Session, &mut BuiltinStreams) -> CommandResult;

// single thread, so we use thread_local
thread_local! {
    /// list of built-in commands
    pub static BUILTIN_COMMANDS: HashMap<&'static str, BuiltinExecFunc> = {
        let mut map = HashMap::<&'static str, BuiltinExecFunc>::new();
        map.insert("prompt", prompt_command);
        map.insert("exit",   exit_command);
        map.insert("pwd",    pwd_command);
        map.insert("cd",     cd_command);
        map
    };
}

macro_rules! builtin_output {
    ($streams:expr, $($arg:tt)*) => {
        let _ = write!($streams.out, $($arg)*);
    };
}

macro_rules! builtin_error {
    ($streams:expr, $($arg:tt)*) => {
        let _ = write!($streams.err, $($arg)*);
    };
}

pub fn lookup(name: &str) -> Option<BuiltinExecFunc> {
    BUILTIN_COMMANDS.with(|map| map.get(name).copied())
}

pub fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

/// Runs a builtin against the interpreter's own stdout and stderr.
pub fn run_in_process(func: BuiltinExecFunc, args: &[String], session: &mut Session) -> CommandResult {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut streams = BuiltinStreams {
        out: &mut stdout,
        err: &mut stderr,
    };
    let ret = func(args, session, &mut streams);
    let _ = streams.out.flush();
    ret
}

/// prompt command implementation: the words, joined by single spaces,
/// become the new prompt
pub fn prompt_command(args: &[String], session: &mut Session, _: &mut BuiltinStreams) -> CommandResult {
    session.prompt = args.join(" ");
    CommandResult::Normal
}

pub fn exit_command(_: &[String], _: &mut Session, _: &mut BuiltinStreams) -> CommandResult {
    CommandResult::Exit
}

pub fn pwd_command(_: &[String], _: &mut Session, streams: &mut BuiltinStreams) -> CommandResult {
    match std::env::current_dir() {
        Ok(path) => {
            builtin_output!(streams, "{}\n", path.display());
        }
        Err(e) => {
            builtin_error!(streams, "pwd: {}\n", e);
        }
    }
    CommandResult::Normal
}

pub fn cd_command(args: &[String], session: &mut Session, streams: &mut BuiltinStreams) -> CommandResult {
    let target = match args.first().map(String::as_str) {
        None | Some("~") => match &session.home_dir {
            Some(home) => home.clone(),
            // like zsh, do nothing without a home directory
            None => return CommandResult::Normal,
        },
        Some(p) => PathBuf::from(p),
    };

    if let Err(e) = std::env::set_current_dir(&target) {
        builtin_error!(streams, "cd: {}: {}\n", target.display(), e);
    }
    CommandResult::Normal
}
