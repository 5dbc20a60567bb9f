use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const SVC: &str = "s6-svc";
pub const SVSTAT: &str = "s6-svstat";

/// Control flags understood by s6-svc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvcFlag {
    Up,
    Down,
    Kill,
    Once,
}

impl SvcFlag {
    pub fn as_arg(&self) -> &'static str {
        match self {
            SvcFlag::Up => "-u",
            SvcFlag::Down => "-d",
            SvcFlag::Kill => "-k",
            SvcFlag::Once => "-O",
        }
    }
}

/// Resolved locations of the s6 control binaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolset {
    pub svc: PathBuf,
    pub svstat: PathBuf,
}

impl Toolset {
    pub fn new(svc: impl Into<PathBuf>, svstat: impl Into<PathBuf>) -> Self {
        Self {
            svc: svc.into(),
            svstat: svstat.into(),
        }
    }

    /// Resolve both tools, preferring explicit paths, then `extra_paths`, then `PATH`.
    pub fn resolve(
        svc: Option<&Path>,
        svstat: Option<&Path>,
        extra_paths: &[PathBuf],
    ) -> Result<Self> {
        let svc = match svc {
            Some(path) => path.to_path_buf(),
            None => find_tool(SVC, extra_paths)?,
        };
        let svstat = match svstat {
            Some(path) => path.to_path_buf(),
            None => find_tool(SVSTAT, extra_paths)?,
        };

        tracing::debug!("Using {} and {}", svc.display(), svstat.display());
        Ok(Self { svc, svstat })
    }
}

fn find_tool(tool: &str, extra_paths: &[PathBuf]) -> Result<PathBuf> {
    if !extra_paths.is_empty() {
        if let Ok(joined) = std::env::join_paths(extra_paths) {
            if let Ok(path) = which::which_in(tool, Some(joined), "/") {
                return Ok(path);
            }
        }
    }

    which::which(tool).map_err(|_| Error::ToolNotFound {
        tool: tool.to_string(),
    })
}
