use std::{fmt, path::PathBuf};

/// How a command relates to the one that follows it in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionType {
    #[default]
    None,
    Pipe,
    Background,
    Sequential,
}

impl ConnectionType {
    pub fn from_terminator(c: char) -> Self {
        match c {
            '|' => ConnectionType::Pipe,
            '&' => ConnectionType::Background,
            ';' => ConnectionType::Sequential,
            _ => ConnectionType::None,
        }
    }

    pub fn is_terminator(c: char) -> bool {
        matches!(c, '|' | '&' | ';')
    }
}

/// One program invocation.
///
/// `argv` owns every argument, including the program name in slot zero;
/// [`Command::path`] only borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
    redirect_to: Option<PathBuf>,
    redirect_from: Option<PathBuf>,
    append: bool,
    connection: ConnectionType,
}

impl Command {
    /// Builds a command from its argument vector.
    ///
    /// Panics if `argv` is empty: every command has at least a program name.
    pub fn new(argv: Vec<String>) -> Self {
        assert!(!argv.is_empty(), "command without a program name");
        Self {
            argv,
            redirect_to: None,
            redirect_from: None,
            append: false,
            connection: ConnectionType::None,
        }
    }

    pub fn path(&self) -> &str {
        &self.argv[0]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn redirect_to(&self) -> Option<&PathBuf> {
        self.redirect_to.as_ref()
    }

    pub fn redirect_from(&self) -> Option<&PathBuf> {
        self.redirect_from.as_ref()
    }

    pub fn append(&self) -> bool {
        self.append
    }

    pub fn connection(&self) -> ConnectionType {
        self.connection
    }

    pub fn set_redirect_to(&mut self, path: Option<PathBuf>, append: bool) {
        self.redirect_to = path;
        self.append = append;
    }

    pub fn set_redirect_from(&mut self, path: Option<PathBuf>) {
        self.redirect_from = path;
    }

    pub fn set_connection(&mut self, connection: ConnectionType) {
        self.connection = connection;
    }

    pub fn into_argv(self) -> Vec<String> {
        self.argv
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))?;
        if let Some(from) = &self.redirect_from {
            write!(f, " < {}", from.display())?;
        }
        if let Some(to) = &self.redirect_to {
            let marker = if self.append { ">>" } else { ">" };
            write!(f, " {} {}", marker, to.display())?;
        }
        match self.connection {
            ConnectionType::Pipe => write!(f, " |"),
            ConnectionType::Background => write!(f, " &"),
            ConnectionType::Sequential => write!(f, ";"),
            ConnectionType::None => Ok(()),
        }
    }
}
