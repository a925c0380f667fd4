use std::{mem, path::PathBuf};

use tracing::debug;

use crate::{
    command::{Command, ConnectionType},
    error::ParseError,
    queue::Queue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between commands: skip blanks, stop at end of input
    Initial,
    EnteringPath,
    ParsingPath,
    LeavingPath,
    /// Decide what the next element of the current command is
    Default,
    EnteringToken,
    ParsingToken,
    LeavingToken,
    EnteringRedirection,
    ParsingRedirection,
    LeavingRedirection,
    ParsingCommandTerminator,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RedirectionKind {
    Output { append: bool },
    Input,
}

fn is_redirection_marker(c: char) -> bool {
    c == '<' || c == '>'
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || ConnectionType::is_terminator(c) || is_redirection_marker(c)
}

/// Read-only view over the input line with one character of lookahead.
struct Cursor {
    chars: Vec<char>,
    index: usize,
}

impl Cursor {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}

/// A word being collected, with the state of its quote spans.
#[derive(Debug, Default)]
struct Word {
    text: String,
    single_quote: bool,
    double_quote: bool,
    quoted: bool,
}

impl Word {
    fn in_quotes(&self) -> bool {
        self.single_quote || self.double_quote
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty() && !self.quoted
    }

    /// Feeds one character to the word. Returns `false` when `c` is a
    /// delimiter that ends the word; the character is then left unconsumed.
    fn accept(&mut self, c: char) -> bool {
        match c {
            '\'' if !self.double_quote => {
                self.single_quote = !self.single_quote;
                self.quoted = true;
            }
            '"' if !self.single_quote => {
                self.double_quote = !self.double_quote;
                self.quoted = true;
            }
            _ if self.in_quotes() => self.text.push(c),
            _ if is_delimiter(c) => return false,
            _ => self.text.push(c),
        }
        true
    }

    fn open_quote(&self) -> Option<char> {
        if self.single_quote {
            Some('\'')
        } else if self.double_quote {
            Some('"')
        } else {
            None
        }
    }

    fn take(&mut self) -> String {
        mem::take(self).text
    }
}

struct Parser {
    cursor: Cursor,
    state: State,
    commands: Queue<Command>,
    /// Path and arguments of the command being built, in textual order
    tokens: Queue<String>,
    word: Word,
    redirection: Option<RedirectionKind>,
    redirect_to: Option<(PathBuf, bool)>,
    redirect_from: Option<PathBuf>,
    last_terminator: Option<char>,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            cursor: Cursor::new(input),
            state: State::Initial,
            commands: Queue::new(),
            tokens: Queue::new(),
            word: Word::default(),
            redirection: None,
            redirect_to: None,
            redirect_from: None,
            last_terminator: None,
        }
    }

    /// Consumes the current word up to the next delimiter. Returns `true`
    /// once the word is complete.
    fn scan_word(&mut self) -> Result<bool, ParseError> {
        match self.cursor.peek() {
            Some(c) if self.word.accept(c) => {
                self.cursor.advance();
                Ok(false)
            }
            Some(_) => Ok(true),
            None => match self.word.open_quote() {
                Some(q) => Err(ParseError::UnterminatedQuote(q)),
                None => Ok(true),
            },
        }
    }

    /// Moves the collected tokens and redirections into a new command and
    /// queues it.
    fn finish_command(&mut self, connection: ConnectionType) {
        let argv: Vec<String> = mem::take(&mut self.tokens).into_iter().collect();
        let mut command = Command::new(argv);
        if let Some((path, append)) = self.redirect_to.take() {
            command.set_redirect_to(Some(path), append);
        }
        command.set_redirect_from(self.redirect_from.take());
        command.set_connection(connection);
        self.commands.insert(command);
    }

    fn step(&mut self) -> Result<(), ParseError> {
        self.state = match self.state {
            State::Initial => {
                self.cursor.skip_whitespace();
                match self.cursor.peek() {
                    None if self.last_terminator == Some('|') => {
                        return Err(ParseError::UnexpectedEndOfInput);
                    }
                    None => State::Terminal,
                    Some(c) if ConnectionType::is_terminator(c) || is_redirection_marker(c) => {
                        return Err(ParseError::UnexpectedOperator(c));
                    }
                    Some(_) => State::EnteringPath,
                }
            }
            State::EnteringPath => {
                self.word = Word::default();
                State::ParsingPath
            }
            State::ParsingPath => {
                if self.scan_word()? {
                    State::LeavingPath
                } else {
                    State::ParsingPath
                }
            }
            State::LeavingPath => {
                let path = self.word.take();
                self.tokens.insert(path);
                State::Default
            }
            State::Default => {
                self.cursor.skip_whitespace();
                match self.cursor.peek() {
                    None => State::Terminal,
                    Some(c) if ConnectionType::is_terminator(c) => State::ParsingCommandTerminator,
                    Some(c) if is_redirection_marker(c) => State::EnteringRedirection,
                    Some(_) => State::EnteringToken,
                }
            }
            State::EnteringToken => {
                self.word = Word::default();
                State::ParsingToken
            }
            State::ParsingToken => {
                if self.scan_word()? {
                    State::LeavingToken
                } else {
                    State::ParsingToken
                }
            }
            State::LeavingToken => {
                let token = self.word.take();
                self.tokens.insert(token);
                State::Default
            }
            State::EnteringRedirection => {
                let kind = match self.cursor.peek() {
                    Some('<') => RedirectionKind::Input,
                    _ => RedirectionKind::Output { append: false },
                };
                self.cursor.advance();
                let kind = match kind {
                    RedirectionKind::Output { .. } if self.cursor.peek() == Some('>') => {
                        self.cursor.advance();
                        RedirectionKind::Output { append: true }
                    }
                    kind => kind,
                };
                self.redirection = Some(kind);
                self.word = Word::default();
                State::ParsingRedirection
            }
            State::ParsingRedirection => {
                if self.word.is_empty() {
                    self.cursor.skip_whitespace();
                    match self.cursor.peek() {
                        None => return Err(ParseError::UnexpectedEndOfInput),
                        Some(c) if ConnectionType::is_terminator(c) || is_redirection_marker(c) => {
                            return Err(ParseError::UnexpectedOperator(c));
                        }
                        Some(_) => {}
                    }
                }
                if self.scan_word()? {
                    State::LeavingRedirection
                } else {
                    State::ParsingRedirection
                }
            }
            State::LeavingRedirection => {
                let target = PathBuf::from(self.word.take());
                match self.redirection.take() {
                    Some(RedirectionKind::Output { append }) => {
                        self.redirect_to = Some((target, append))
                    }
                    Some(RedirectionKind::Input) => self.redirect_from = Some(target),
                    None => unreachable!("leaving a redirection that was never entered"),
                }
                State::Default
            }
            State::ParsingCommandTerminator => {
                let c = self
                    .cursor
                    .peek()
                    .expect("terminator state entered at end of input");
                self.cursor.advance();
                self.finish_command(ConnectionType::from_terminator(c));
                self.last_terminator = Some(c);
                State::Initial
            }
            State::Terminal => {
                if !self.tokens.is_empty() {
                    self.finish_command(ConnectionType::None);
                }
                State::Terminal
            }
        };
        Ok(())
    }

    fn run(mut self) -> Result<Queue<Command>, ParseError> {
        while self.state != State::Terminal {
            self.step()?;
        }
        // flush the pending command
        self.step()?;
        Ok(self.commands)
    }
}

/// Parses one input line into the queue of commands it describes.
///
/// A line either parses completely or not at all: on error no command of the
/// line is returned.
pub fn parse_line(input: &str) -> Result<Queue<Command>, ParseError> {
    let result = Parser::new(input).run();
    match &result {
        Ok(commands) => debug!(count = commands.len(), "parsed line"),
        Err(e) => debug!(error = %e, "rejected line"),
    }
    result
}
