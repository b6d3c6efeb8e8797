//! Scripted executor for tests that must not touch the host.

use std::collections::VecDeque;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::cmd::CommandSpec;
use crate::error::ShellError;
use crate::exec::{ExecResult, Executor};

/// A command as the fake received it, with stdin drained to bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<Vec<u8>>,
}

/// Replays queued responses in order and records every call.
///
/// Once the queue is empty each call returns `ExecResult::default()`.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    responses: Mutex<VecDeque<Result<ExecResult, ShellError>>>,
    calls: Mutex<Vec<Recorded>>,
}

impl FakeExecutor {
    pub fn new() -> Self { Self::default() }

    pub fn with(self, response: Result<ExecResult, ShellError>) -> Self {
        self.push(response);
        self
    }

    /// Queue a successful run that printed `stdout` and exited with `exit_code`.
    pub fn with_output(self, exit_code: i32, stdout: &[u8]) -> Self {
        self.with(Ok(ExecResult { exit_code, stdout: stdout.to_vec(), stderr: Vec::new() }))
    }

    pub fn push(&self, response: Result<ExecResult, ShellError>) {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).push_back(response);
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Executor for FakeExecutor {
    fn exec(&self, cmd: CommandSpec) -> Result<ExecResult, ShellError> {
        let CommandSpec { program, args, env, cwd, stdin } = cmd;
        let stdin = match stdin {
            Some(mut input) => {
                let mut buf = Vec::new();
                input
                    .read_to_end(&mut buf)
                    .map_err(|e| ShellError::process_failed(program.clone(), e))?;
                Some(buf)
            }
            None => None,
        };
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Recorded { program, args, env, cwd, stdin });
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(ExecResult::default()))
    }
}
