use serde::Serialize;
use std::fmt;

/// Run state as reported by s6-svstat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Started,
    Stopped,
    Unknown,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Started => "started",
            RunState::Stopped => "stopped",
            RunState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one status query. Built fresh on every query and never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub raw_text: String,
    pub run_state: RunState,
    /// Supervisor was last told "down", even if the process is transiently up
    pub wants_down: bool,
    pub pid: Option<u32>,
    pub duration_seconds: Option<u64>,
}

impl StatusRecord {
    /// Status of a service that is not linked into the scan directory.
    pub fn unsupervised() -> Self {
        Self {
            raw_text: String::new(),
            run_state: RunState::Stopped,
            wants_down: false,
            pid: None,
            duration_seconds: None,
        }
    }

    fn unknown(raw_text: &str) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            run_state: RunState::Unknown,
            wants_down: false,
            pid: None,
            duration_seconds: None,
        }
    }

    /// Parse s6-svstat output.
    ///
    /// Anything on the error stream means the service isn't supervised (or the
    /// query failed), and that text becomes the status. Unrecognised stdout
    /// degrades to [`RunState::Unknown`]; parsing never fails.
    pub fn parse(stdout: &str, stderr: &str) -> Self {
        if !stderr.is_empty() {
            return Self::unknown(stderr);
        }

        let run_state = if stdout.starts_with("up") {
            RunState::Started
        } else if stdout.starts_with("down") {
            RunState::Stopped
        } else {
            tracing::warn!("Unrecognised s6-svstat output: {:?}", stdout);
            return Self::unknown(stdout);
        };

        let pid = match run_state {
            RunState::Started => find_pid(stdout),
            _ => None,
        };

        Self {
            raw_text: stdout.to_string(),
            run_state,
            wants_down: stdout.contains("want down"),
            pid,
            duration_seconds: find_duration(stdout),
        }
    }
}

/// Leading run of ASCII digits in `s`
fn leading_digits(s: &str) -> &str {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    &s[..end]
}

/// First `(pid N)` marker
fn find_pid(text: &str) -> Option<u32> {
    const MARKER: &str = "(pid ";

    text.match_indices(MARKER).find_map(|(idx, _)| {
        let rest = &text[idx + MARKER.len()..];
        let digits = leading_digits(rest);
        if digits.is_empty() || !rest[digits.len()..].starts_with(')') {
            return None;
        }
        digits.parse::<u32>().ok().filter(|pid| *pid > 0)
    })
}

/// First ` Ns` marker
fn find_duration(text: &str) -> Option<u64> {
    text.match_indices(' ').find_map(|(idx, _)| {
        let rest = &text[idx + 1..];
        let digits = leading_digits(rest);
        if digits.is_empty() || !rest[digits.len()..].starts_with('s') {
            return None;
        }
        digits.parse::<u64>().ok()
    })
}
