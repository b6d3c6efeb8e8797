//! Easy mode: the stateless default runner.

use crate::cmd::CommandSpec;
use crate::error::ShellError;
use crate::exec::{ExecResult, Executor, StdExecutor};

/// Run `cmd` on the default host executor.
pub fn exec(cmd: CommandSpec) -> Result<ExecResult, ShellError> { StdExecutor.exec(cmd) }

/// The default executor, for callers that take an `impl Executor`.
pub fn executor() -> StdExecutor { StdExecutor }
