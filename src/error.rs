//! Error types for s6ctl.
//!
//! Every variant is fatal: nothing is retried and nothing is rolled back.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing input, including a missing service source on enable.
    #[error("{message}")]
    Configuration { message: String },

    /// A supervision command exited non-zero.
    #[error("s6 '{action}' failed.")]
    Command { action: String, stderr: String },

    /// Symlink creation or removal failed.
    #[error("{action}: {source}")]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No safe transition exists from the current state.
    #[error("Service is in {state} state, refusing to restart")]
    InvalidState { state: String },

    /// The process could not be executed at all.
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find '{tool}' in PATH or extra search paths")]
    ToolNotFound { tool: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Captured error text, for command failures.
    pub fn error_text(&self) -> Option<&str> {
        match self {
            Self::Command { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Path the failure relates to, for filesystem failures.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Filesystem { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
