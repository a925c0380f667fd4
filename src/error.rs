use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parse error near '{0}'")]
    UnexpectedOperator(char),
    #[error("parse error near end of input")]
    UnexpectedEndOfInput,
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("could not create pipe: {0}")]
    Pipe(#[source] nix::Error),
    #[error("could not fork: {0}")]
    Fork(#[source] nix::Error),
    #[error("could not wait for process {pid}: {source}")]
    Wait {
        pid: i32,
        #[source]
        source: nix::Error,
    },
    #[error("invalid process id {0}")]
    InvalidPid(i32),
}

impl ShellError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::Parse(_) => ErrorKind::Parse,
            ShellError::Pipe(_) | ShellError::Wait { .. } => ErrorKind::Execution,
            ShellError::Fork(_) | ShellError::InvalidPid(_) => ErrorKind::Generic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    #[default]
    None,
    Generic,
    Parse,
    Execution,
}

/// Error channel of one session, consulted by the main loop after each line.
#[derive(Debug, Clone, Default)]
pub struct ErrorState {
    kind: ErrorKind,
    description: Option<String>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, error: &ShellError) {
        self.kind = error.kind();
        self.description = Some(error.to_string());
    }

    pub fn clear(&mut self) {
        self.kind = ErrorKind::None;
        self.description = None;
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.kind != ErrorKind::None
    }
}
