//! # Command Execution
//!
//! Every git (and curl) invocation made by the pipeline goes through the
//! [`CommandRunner`] trait. A command is a literal argument vector executed in
//! an explicit working directory; the process-wide current directory is never
//! changed.
//!
//! A nonzero exit status is *not* an error here: it is returned to the caller
//! inside [`CommandOutput`] and the pipeline decides what it means. Only a
//! failure to start the process at all becomes [`Error::Spawn`].
//!
//! [`SystemRunner`] uses `std::process::Command`, which means the user's git
//! configuration, SSH keys and credential helpers apply unchanged.

use std::path::Path;
use std::process::Command;

use log::debug;
use shlex::try_join;

use crate::error::{Error, Result};

/// Exit status and captured text of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Create an output with the given status and stdout.
    pub fn new(status: i32, stdout: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Stdout and stderr joined, the way a terminal would show them.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
        }
    }
}

/// Trait for command execution - allows mocking in tests
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` inside `cwd` and wait for it to exit.
    fn run(&self, cwd: &Path, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a git subcommand inside `cwd`.
    fn git(&self, cwd: &Path, args: &[&str]) -> Result<CommandOutput> {
        self.run(cwd, "git", args)
    }
}

/// The default implementation of `CommandRunner`, which spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cwd: &Path, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!("cwd={} cmd={}", cwd.display(), format_command(program, args));

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| Error::Spawn {
                command: format_command(program, args),
                cwd: cwd.display().to_string(),
                message: e.to_string(),
            })?;

        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!("status={} output={}", result.status, result.combined());
        Ok(result)
    }
}

/// Render an argument vector for logs and diagnostics.
///
/// The line is shell-quoted so it can be pasted back into a shell.
pub fn format_command(program: &str, args: &[&str]) -> String {
    let words = || std::iter::once(program).chain(args.iter().copied());
    try_join(words()).unwrap_or_else(|_| words().collect::<Vec<_>>().join(" "))
}

/// Most recent tag reachable from HEAD in `cwd` (`git describe --tags --abbrev=0`).
///
/// Returns the failed command output when git cannot find one.
pub fn most_recent_tag(
    runner: &dyn CommandRunner,
    cwd: &Path,
) -> Result<std::result::Result<String, CommandOutput>> {
    let out = runner.git(cwd, &["describe", "--tags", "--abbrev=0"])?;
    let tag = out.stdout.trim();
    if out.success() && !tag.is_empty() {
        Ok(Ok(tag.to_string()))
    } else {
        Ok(Err(out))
    }
}
