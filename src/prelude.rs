//! shellout::prelude - grab-and-go imports for running commands

pub use crate::cmd::{CommandSpec, Input};
pub use crate::easy::{exec, executor};
pub use crate::error::{ErrorKind, ShellError};
pub use crate::exec::{ExecResult, Executor, StdExecutor};
pub use crate::{sh_cmd, sh_run};
