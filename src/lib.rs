pub mod builtin;
pub mod command;
pub mod completion;
pub mod config;
pub mod env;
pub mod error;
pub mod execution;
pub mod expand;
pub mod job;
pub mod parse;
pub mod queue;
pub mod redirect;
pub mod result;
pub mod search;
pub mod signal;

use crate::{env::Session, error::ShellError, result::CommandResult};

/// Parses one input line and runs it.
///
/// Failures are reported on stderr and left in `session.errors`; only the
/// `exit` builtin makes this return [`CommandResult::Exit`].
pub fn get_input_and_run(input: &str, session: &mut Session) -> CommandResult {
    session.errors.clear();
    match parse::parse_line(input) {
        Ok(queue) => execution::execute_queue(queue, session),
        Err(e) => {
            let error = ShellError::from(e);
            eprintln!("mush: {}", error);
            session.errors.record(&error);
            CommandResult::Normal
        }
    }
}
