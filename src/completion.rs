use std::fs::{self, DirEntry, ReadDir};

use is_executable::IsExecutable;
use rustyline::{
    Helper, Highlighter, Hinter, Validator,
    completion::{Completer, Pair},
};

use crate::{builtin::BUILTIN_COMMANDS, command::ConnectionType, env::PathEnv};

/// Completes command names: builtins and executables found in `PATH`.
#[derive(Debug, Clone, Helper, Validator, Highlighter, Hinter)]
pub struct ShellCompleter {
    builtins: Vec<&'static str>,
    path_env: PathEnv,
}

/// Returns the word under the cursor when it sits in command position,
/// along with its start offset.
fn command_word(line: &str, pos: usize) -> Option<(usize, &str)> {
    let before = &line[..pos];
    let start = before
        .rfind(ConnectionType::is_terminator)
        .map_or(0, |i| i + 1);
    let segment = &before[start..];
    let word = segment.trim_start();
    if word.contains(char::is_whitespace) {
        return None;
    }
    Some((pos - word.len(), word))
}

impl ShellCompleter {
    pub fn new(path_env: PathEnv) -> Self {
        let builtins = BUILTIN_COMMANDS.with(|map| map.keys().copied().collect());
        Self { builtins, path_env }
    }

    fn candidate_executable_in_path<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = DirEntry> + 'a {
        fn dir_candidate_executable(prefix: &str, reader: ReadDir) -> impl Iterator<Item = DirEntry> + '_ {
            reader.flatten().filter(move |entry| {
                entry.path().is_executable() && entry.file_name().to_string_lossy().starts_with(prefix)
            })
        }

        self.path_env
            .iter()
            .filter_map(move |dir| fs::read_dir(dir).ok().map(|entries| dir_candidate_executable(prefix, entries)))
            .flatten()
    }

    /// Sorted, deduplicated command names starting with `prefix`.
    pub fn candidates(&self, prefix: &str) -> Vec<Pair> {
        let mut matches: Vec<_> = self
            .builtins
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|r| r.to_string())
            .chain(
                self.candidate_executable_in_path(prefix)
                    .map(|entry| entry.file_name().to_string_lossy().to_string()),
            )
            .map(|cmd| {
                let mut replacement = cmd.clone();
                replacement.push(' ');
                Pair {
                    display: cmd,
                    replacement,
                }
            })
            .collect();
        matches.sort_unstable_by(|a, b| a.display.cmp(&b.display));
        matches.dedup_by(|a, b| a.display == b.display);
        matches
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        match command_word(line, pos) {
            Some((start, word)) => Ok((start, self.candidates(word))),
            None => Ok((pos, Vec::new())),
        }
    }
}
