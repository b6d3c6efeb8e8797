//! Execution interfaces and the host-backed runner.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;

use tracing::{debug, warn};

use crate::cmd::{CommandSpec, Input};
use crate::error::ShellError;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

/// Outcome of a process that ran to completion, whatever its exit status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecResult {
    pub fn success(&self) -> bool { self.exit_code == 0 }
    pub fn stdout_lossy(&self) -> String { String::from_utf8_lossy(&self.stdout).into_owned() }
    pub fn stderr_lossy(&self) -> String { String::from_utf8_lossy(&self.stderr).into_owned() }
}

/// Runs a [`CommandSpec`] and captures what it produced.
///
/// A non-zero exit is data on the returned [`ExecResult`], never an error.
pub trait Executor: Send + Sync {
    fn exec(&self, cmd: CommandSpec) -> Result<ExecResult, ShellError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn exec(&self, cmd: CommandSpec) -> Result<ExecResult, ShellError> { (**self).exec(cmd) }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn exec(&self, cmd: CommandSpec) -> Result<ExecResult, ShellError> { (**self).exec(cmd) }
}

/// Executor backed by `std::process::Command`. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdExecutor;

impl Executor for StdExecutor {
    fn exec(&self, mut cmd: CommandSpec) -> Result<ExecResult, ShellError> {
        if cmd.program.is_empty() {
            return Err(ShellError::process_failed(
                "",
                io::Error::new(io::ErrorKind::InvalidInput, "no command"),
            ));
        }

        let resolved = resolve(&cmd.program, cmd.working_dir()).map_err(|e| {
            warn!(program = %cmd.program, error = %e, "Command could not be resolved");
            ShellError::not_found(&cmd.program, e)
        })?;

        let input = cmd.stdin.take();
        let mut command = Command::new(&resolved);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.arg0(&cmd.program);
        }
        command.args(&cmd.args);
        if !cmd.env.is_empty() {
            let (pairs, rejected) = cmd.env_pairs();
            for entry in rejected {
                warn!(program = %cmd.program, entry, "Skipping environment entry without '='");
            }
            command.env_clear().envs(pairs);
        }
        if let Some(dir) = cmd.working_dir() {
            command.current_dir(dir);
        }
        command
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(command = %cmd, path = ?resolved, "Spawning command");
        let mut child = command.spawn().map_err(|e| {
            warn!(program = %cmd.program, error = %e, "Failed to spawn command process");
            ShellError::process_failed(&cmd.program, e)
        })?;

        let (captured, fed) = capture(&mut child, input);
        let status = child.wait().map_err(|e| {
            warn!(program = %cmd.program, error = %e, "Failed waiting on command process");
            ShellError::process_failed(&cmd.program, e)
        })?;
        let (stdout, stderr) = captured.map_err(|e| {
            warn!(program = %cmd.program, error = %e, "Failed reading command output");
            ShellError::process_failed(&cmd.program, e)
        })?;
        if let Err(e) = fed {
            if status.success() {
                warn!(program = %cmd.program, error = %e, "Failed writing command input");
                return Err(ShellError::process_failed(&cmd.program, e));
            }
            debug!(program = %cmd.program, error = %e, "Input write failed on a non-zero exit");
        }

        let result = ExecResult { exit_code: exit_code(status), stdout, stderr };
        debug!(
            program = %cmd.program,
            exit_code = result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "Command exited"
        );
        Ok(result)
    }
}

/// Resolve `program` to something the host can start.
///
/// Bare names go through the search path. Explicit paths are looked up directly,
/// relative ones against `cwd` when it is set, and made absolute. On Windows an
/// explicit path without an extension is also tried with each `PATHEXT` suffix.
pub fn resolve(program: &str, cwd: Option<&Path>) -> Result<PathBuf, crate::error::LookupError> {
    if !program.chars().any(std::path::is_separator) {
        return Ok(which::which(program)?);
    }
    #[cfg(windows)]
    {
        let base = match cwd {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        if let Ok(found) = which::which_in(program, None::<&str>, &base) {
            return Ok(std::path::absolute(&found).unwrap_or(found));
        }
    }
    let path = Path::new(program);
    let candidate = match cwd {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    };
    match candidate.metadata() {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(std::path::absolute(&candidate).unwrap_or(candidate)),
    }
}

/// Feed stdin and drain both output pipes until the child closes them.
///
/// On a read failure the child is killed so the caller's `wait` cannot hang.
fn capture(child: &mut Child, input: Option<Input>) -> (io::Result<(Vec<u8>, Vec<u8>)>, io::Result<()>) {
    let pipe = child.stdin.take();
    let out = child.stdout.take();
    let err = child.stderr.take();
    thread::scope(|s| {
        let feeder = match (input, pipe) {
            (Some(input), Some(pipe)) => Some(s.spawn(move || feed(input, pipe))),
            _ => None,
        };
        let err_reader = s.spawn(move || drain(err));
        let stdout = drain(out);
        if stdout.is_err() {
            abandon(child);
        }
        let stderr = err_reader.join().unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));
        if stdout.is_ok() && stderr.is_err() {
            abandon(child);
        }
        let captured = stdout.and_then(|o| stderr.map(|e| (o, e)));
        let fed = match feeder {
            Some(h) => h.join().unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
            None => Ok(()),
        };
        (captured, fed)
    })
}

fn drain<R: Read>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

/// Kill a child whose output can no longer be collected. It still needs a `wait`.
fn abandon(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(pid = child.id(), error = %e, "Kill after failed capture");
    }
}

fn feed(mut input: Input, mut pipe: ChildStdin) -> io::Result<()> {
    match io::copy(&mut input, &mut pipe) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}

/// Exit code, or -1 when the process was terminated without one.
fn exit_code(status: ExitStatus) -> i32 { status.code().unwrap_or(-1) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_result_helpers() {
        let r = ExecResult { exit_code: 0, stdout: b"ok\n".to_vec(), stderr: vec![0xff] };
        assert!(r.success());
        assert_eq!(r.stdout_lossy(), "ok\n");
        assert_eq!(r.stderr_lossy(), "\u{fffd}");
        assert!(!ExecResult { exit_code: 3, ..Default::default() }.success());
    }

    #[test]
    fn resolve_bare_name_missing() {
        assert!(resolve("icantbelievethisisacommandinyourenvironment", None).is_err());
    }

    #[test]
    fn resolve_explicit_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve("./missing-tool", Some(dir.path())).unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().expect("io error");
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn resolve_relative_path_against_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tool"), b"").unwrap();
        let resolved = resolve("./tool", Some(dir.path())).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("tool"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_bare_name_on_path() {
        let resolved = resolve("sh", None).unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn empty_program_is_process_failure() {
        let err = StdExecutor.exec(CommandSpec::default()).unwrap_err();
        assert!(err.is_process_failed());
    }

    #[test]
    fn missing_program_is_not_found() {
        let err = StdExecutor
            .exec(CommandSpec::new("icantbelievethisisacommandinyourenvironment"))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.program(), "icantbelievethisisacommandinyourenvironment");
    }

    #[cfg(unix)]
    #[test]
    fn signal_termination_reports_minus_one() {
        let r = StdExecutor.exec(CommandSpec::new("/bin/sh").args(["-c", "kill -9 $$"])).unwrap();
        assert_eq!(r.exit_code, -1);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.sh");
        std::fs::write(&script, b"#!/bin/sh\necho hi\n").unwrap();
        let err = StdExecutor
            .exec(CommandSpec::new(script.to_string_lossy().into_owned()))
            .unwrap_err();
        assert!(err.is_process_failed());
    }

    #[cfg(unix)]
    #[test]
    fn missing_cwd_is_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        let err = StdExecutor
            .exec(CommandSpec::new("/bin/sh").args(["-c", "true"]).cwd(gone))
            .unwrap_err();
        assert!(err.is_process_failed());
    }

    #[cfg(unix)]
    #[test]
    fn child_that_ignores_input_still_succeeds() {
        let big = vec![b'x'; 1 << 20];
        let r = StdExecutor
            .exec(CommandSpec::new("/bin/sh").args(["-c", "exit 0"]).stdin(big))
            .unwrap();
        assert_eq!(r.exit_code, 0);
    }

    /// Yields `n` bytes, then fails every read.
    struct FailsAfter(usize);

    impl Read for FailsAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0 == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "input source went away"));
            }
            let n = self.0.min(buf.len());
            buf[..n].fill(b'a');
            self.0 -= n;
            Ok(n)
        }
    }

    #[cfg(unix)]
    #[test]
    fn input_error_on_clean_exit_is_process_failure() {
        let err = StdExecutor
            .exec(CommandSpec::new("/bin/sh").args(["-c", "cat >/dev/null"]).stdin_reader(FailsAfter(16)))
            .unwrap_err();
        assert!(err.is_process_failed());
        assert_eq!(err.program(), "/bin/sh");
    }

    #[cfg(unix)]
    #[test]
    fn input_error_on_non_zero_exit_keeps_result() {
        let r = StdExecutor
            .exec(
                CommandSpec::new("/bin/sh")
                    .args(["-c", "cat >/dev/null; exit 3"])
                    .stdin_reader(FailsAfter(16)),
            )
            .unwrap();
        assert_eq!(r.exit_code, 3);
    }

    #[test]
    fn drain_reports_read_errors() {
        assert_eq!(drain(Some(&b"abc"[..])).unwrap(), b"abc");
        assert!(drain(None::<&[u8]>).unwrap().is_empty());
        assert!(drain(Some(FailsAfter(4))).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn abandoned_child_is_killed_and_reaped() {
        let mut child = Command::new("/bin/sh")
            .args(["-c", "sleep 30"])
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        abandon(&mut child);
        let status = child.wait().unwrap();
        assert_eq!(exit_code(status), -1);
        // Killing an already reaped child is harmless.
        abandon(&mut child);
    }

    #[cfg(windows)]
    #[test]
    fn resolve_explicit_path_tries_pathext() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        let cmd_exe = which::which("cmd").unwrap();
        std::fs::copy(&cmd_exe, dir.path().join("bin").join("tool.exe")).unwrap();
        let resolved = resolve(r".\bin\tool", Some(dir.path())).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with(r"bin\tool.exe"));
    }

    #[test]
    fn executor_through_reference_and_box() {
        fn run_with(e: impl Executor) -> Result<ExecResult, ShellError> { e.exec(CommandSpec::default()) }
        assert!(run_with(&StdExecutor).is_err());
        let boxed: Box<dyn Executor> = Box::new(StdExecutor);
        assert!(run_with(boxed).is_err());
    }
}
