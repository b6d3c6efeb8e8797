//! shellout: run a command, capture its output in memory, report its exit code.
//!
//! A non-zero exit is data on [`ExecResult`], not an error. Errors come in two kinds:
//! the program could not be resolved ([`ErrorKind::CommandNotFound`]) or the process
//! could not be started or run ([`ErrorKind::CommandProcessFailed`]).
//!
//! Not meant for interactive sessions or for commands with very large output; both
//! streams are buffered whole.

pub mod error;
pub mod cmd;
pub mod exec;
pub mod prelude;
pub mod easy;
pub mod macros;

pub use cmd::{CommandSpec, Input};
pub use easy::{exec, executor};
pub use error::{ErrorKind, ShellError};
pub use exec::{ExecResult, Executor, StdExecutor};
