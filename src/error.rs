use std::fmt;
use std::io;

use thiserror::Error;

/// Boxed lookup failure carried by [`ShellError::CommandNotFound`].
pub type LookupError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which of the two failure categories occurred, independent of the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CommandNotFound,
    CommandProcessFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CommandNotFound => f.write_str("command not found"),
            ErrorKind::CommandProcessFailed => f.write_str("command process failed"),
        }
    }
}

/// Failure to run a command. A non-zero exit status is never one of these.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The executable could not be resolved; no process was started.
    #[error("command not found: {program}")]
    CommandNotFound {
        program: String,
        #[source]
        source: LookupError,
    },

    /// The process could not be started or run to completion.
    #[error("command process failed: {program}")]
    CommandProcessFailed {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ShellError {
    pub fn not_found(program: impl Into<String>, source: impl Into<LookupError>) -> Self {
        ShellError::CommandNotFound { program: program.into(), source: source.into() }
    }

    pub fn process_failed(program: impl Into<String>, source: io::Error) -> Self {
        ShellError::CommandProcessFailed { program: program.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::CommandNotFound { .. } => ErrorKind::CommandNotFound,
            ShellError::CommandProcessFailed { .. } => ErrorKind::CommandProcessFailed,
        }
    }

    /// The program as the caller named it.
    pub fn program(&self) -> &str {
        match self {
            ShellError::CommandNotFound { program, .. } => program,
            ShellError::CommandProcessFailed { program, .. } => program,
        }
    }

    pub fn is_not_found(&self) -> bool { self.kind() == ErrorKind::CommandNotFound }

    pub fn is_process_failed(&self) -> bool { self.kind() == ErrorKind::CommandProcessFailed }
}
