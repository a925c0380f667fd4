/// What the main loop does after a line or a builtin has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandResult {
    Exit,
    Normal,
}
