use std::io::{self, Write};

use anyhow::Context;
use mush::{completion::ShellCompleter, config::Config, env::Session, result::CommandResult};
use rustyline::{Editor, error::ReadlineError, history::FileHistory};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn report_finished_jobs(session: &mut Session) {
    for (number, job) in session.reap_if_notified() {
        eprintln!("[{}] Done\t{}", number, job.command);
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);
    mush::signal::install().context("failed to install signal handlers")?;

    let mut session = Session::build(&config);
    let mut rl: Editor<ShellCompleter, FileHistory> = Editor::with_config(rustyline::Config::default())?;
    rl.set_helper(Some(ShellCompleter::new(session.path_env.clone())));
    if let Some(history_file) = &config.history_file
        && let Err(e) = rl.load_history(history_file)
    {
        debug!(error = %e, "no history loaded");
    }

    loop {
        report_finished_jobs(&mut session);
        let readline = rl.readline(session.prompt());
        let ret = match readline {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                let ret = mush::get_input_and_run(&line, &mut session);
                io::stdout().flush()?;
                if session.errors.is_error() {
                    debug!(
                        kind = ?session.errors.kind(),
                        description = session.errors.description().unwrap_or_default(),
                        "line failed"
                    );
                }
                ret
            }
            // like bash and zsh, Ctrl-C just gives a fresh prompt
            Err(ReadlineError::Interrupted) => CommandResult::Normal,
            // Ctrl-D leaves without printing anything, as zsh does
            Err(ReadlineError::Eof) => CommandResult::Exit,
            Err(e) => {
                return Err(anyhow::anyhow!(e));
            }
        };

        if ret == CommandResult::Exit {
            break;
        }
    }

    if let Some(history_file) = &config.history_file
        && let Err(e) = rl.save_history(history_file)
    {
        warn!(error = %e, "could not save history");
    }
    Ok(())
}
