use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Locale forced on every supervision tool so its output is parseable.
const C_LOCALE: [(&str, &str); 4] = [
    ("LANG", "C"),
    ("LC_ALL", "C"),
    ("LC_MESSAGES", "C"),
    ("LC_CTYPE", "C"),
];

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs to completion, one at a time.
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[&OsStr]) -> Result<CommandOutput>;
}

/// Runs programs on the host with `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&OsStr]) -> Result<CommandOutput> {
        let args_str: Vec<_> = args.iter().map(|s| s.to_string_lossy()).collect();
        tracing::debug!("> {} {}", program.display(), args_str.join(" "));

        let output = Command::new(program)
            .args(args)
            .envs(C_LOCALE)
            .output()
            .map_err(|source| Error::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        tracing::debug!(code = ?result.code, "{} exited", program.display());

        Ok(result)
    }
}
