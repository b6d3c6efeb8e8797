//! Command modeling: what to launch and what to feed it.

use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

/// Standard input for a child process.
pub struct Input(Box<dyn Read + Send>);

impl Input {
    pub fn from_reader<R: Read + Send + 'static>(r: R) -> Self { Input(Box::new(r)) }
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self { Input(Box::new(Cursor::new(bytes.into()))) }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> { self.0.read(buf) }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Input(..)") }
}

impl From<Vec<u8>> for Input {
    fn from(v: Vec<u8>) -> Self { Input::from_bytes(v) }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self { Input::from_bytes(s.as_bytes()) }
}

impl From<String> for Input {
    fn from(s: String) -> Self { Input::from_bytes(s.into_bytes()) }
}

/// A process to launch.
///
/// `env` holds `KEY=VALUE` entries. When it is empty the child inherits the caller's
/// environment; otherwise the child sees exactly these entries. A `cwd` of `None` (or an
/// empty path) runs the child in the caller's current directory. A `stdin` of `None`
/// connects the child to the null device.
#[derive(Debug, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub stdin: Option<Input>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec { program: program.into(), ..Default::default() }
    }

    pub fn arg(mut self, a: impl Into<String>) -> Self { self.args.push(a.into()); self }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{}={}", key, value));
        self
    }

    /// Push a raw `KEY=VALUE` entry.
    pub fn env_entry(mut self, entry: impl Into<String>) -> Self { self.env.push(entry.into()); self }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self { self.cwd = Some(dir.into()); self }

    pub fn stdin(mut self, input: impl Into<Input>) -> Self { self.stdin = Some(input.into()); self }

    pub fn stdin_reader<R: Read + Send + 'static>(mut self, r: R) -> Self {
        self.stdin = Some(Input::from_reader(r));
        self
    }

    /// Working directory, with an empty path treated as unset.
    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref().filter(|p| !p.as_os_str().is_empty())
    }

    /// Environment entries split into pairs, last duplicate winning.
    ///
    /// The key split skips the first character so Windows drive variables (`=C:=C:\`) keep
    /// their leading `=`. Entries with no separator come back in the second list.
    pub fn env_pairs(&self) -> (Vec<(&str, &str)>, Vec<&str>) {
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        let mut rejected = Vec::new();
        for entry in &self.env {
            match split_env(entry) {
                Some((k, v)) => {
                    pairs.retain(|(pk, _)| *pk != k);
                    pairs.push((k, v));
                }
                None => rejected.push(entry.as_str()),
            }
        }
        (pairs, rejected)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args { write!(f, " {}", a)?; }
        Ok(())
    }
}

fn split_env(entry: &str) -> Option<(&str, &str)> {
    let mut chars = entry.char_indices();
    chars.next()?;
    let (i, _) = chars.find(|(_, c)| *c == '=')?;
    Some((&entry[..i], &entry[i + 1..]))
}
