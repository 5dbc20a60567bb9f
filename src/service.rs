//! Transition controller: moves one supervised service towards a desired state.
//!
//! `started` and `stopped` are idempotent and only run s6-svc when the current
//! state differs. `killed`, `once` and `restarted` always act.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;

use crate::cmd::{CommandOutput, CommandRunner};
use crate::error::{Error, Result};
use crate::status::{RunState, StatusRecord};
use crate::toolset::{SvcFlag, Toolset};

/// Where a service lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRef {
    pub name: String,
    /// Scan directory holding the live symlink (e.g. /var/service)
    pub service_dir: PathBuf,
    /// Directory holding service definitions (e.g. /etc/sv)
    pub service_src: PathBuf,
}

impl ServiceRef {
    pub fn new(
        name: impl Into<String>,
        service_dir: impl Into<PathBuf>,
        service_src: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            service_dir: service_dir.into(),
            service_src: service_src.into(),
        }
    }

    pub fn enabled_path(&self) -> PathBuf {
        self.service_dir.join(&self.name)
    }

    pub fn source_path(&self) -> PathBuf {
        self.service_src.join(&self.name)
    }

    /// True if the link exists, dangling or not
    pub fn is_enabled(&self) -> bool {
        self.enabled_path().symlink_metadata().is_ok()
    }
}

/// Requested run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    Started,
    Stopped,
    Restarted,
    Killed,
    Once,
}

impl DesiredState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesiredState::Started => "started",
            DesiredState::Stopped => "stopped",
            DesiredState::Restarted => "restarted",
            DesiredState::Killed => "killed",
            DesiredState::Once => "once",
        }
    }

    /// Whether reaching this state from `current` requires action.
    pub fn differs_from(&self, current: RunState) -> bool {
        match self {
            DesiredState::Started => current != RunState::Started,
            DesiredState::Stopped => current != RunState::Stopped,
            DesiredState::Restarted | DesiredState::Killed | DesiredState::Once => true,
        }
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller asked for. `None` leaves that axis alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Request {
    pub enabled: Option<bool>,
    pub state: Option<DesiredState>,
}

/// Final state of a service as reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub state: RunState,
    pub enabled: bool,
    pub svc_full: PathBuf,
    pub src_full: PathBuf,
    pub pid: Option<u32>,
    pub duration: Option<u64>,
    pub full_state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub changed: bool,
    #[serde(rename = "sv")]
    pub report: Report,
}

/// A service bound to its tools and a command runner
pub struct Service<R: CommandRunner> {
    service: ServiceRef,
    tools: Toolset,
    runner: R,
    enabled: bool,
    status: StatusRecord,
}

impl<R: CommandRunner> Service<R> {
    /// Load the current state. An unlinked service is stopped and not queried.
    pub fn load(service: ServiceRef, tools: Toolset, runner: R) -> Result<Self> {
        let enabled = service.is_enabled();
        let mut this = Self {
            service,
            tools,
            runner,
            enabled,
            status: StatusRecord::unsupervised(),
        };

        if enabled {
            this.status = this.query()?;
        }

        tracing::debug!(
            service = %this.service.name,
            enabled,
            state = %this.status.run_state,
            "Loaded service"
        );
        Ok(this)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> &StatusRecord {
        &self.status
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run s6-svstat and parse what it prints
    pub fn query(&self) -> Result<StatusRecord> {
        let target = self.service.enabled_path();
        let out = self
            .runner
            .run(&self.tools.svstat, &[target.as_os_str()])?;
        Ok(StatusRecord::parse(&out.stdout, &out.stderr))
    }

    fn svc(&self, flag: SvcFlag) -> Result<CommandOutput> {
        let target = self.service.enabled_path();
        self.runner
            .run(&self.tools.svc, &[OsStr::new(flag.as_arg()), target.as_os_str()])
    }

    fn checked_svc(&self, action: &str, flag: SvcFlag) -> Result<()> {
        let out = self.svc(flag)?;
        if !out.success() {
            return Err(Error::Command {
                action: action.to_string(),
                stderr: out.stderr,
            });
        }
        tracing::info!("{}: {}", self.service.name, action);
        Ok(())
    }

    /// Link the service definition into the scan directory.
    pub fn enable(&mut self) -> Result<()> {
        let source = self.service.source_path();
        if !source.exists() {
            return Err(Error::config(format!(
                "Could not find source for service to enable ({}).",
                source.display()
            )));
        }

        std::os::unix::fs::symlink(&source, self.service.enabled_path()).map_err(|e| {
            Error::Filesystem {
                action: "Error while linking",
                path: source.clone(),
                source: e,
            }
        })?;

        tracing::info!("Enabled {}", self.service.name);
        self.enabled = true;
        Ok(())
    }

    /// Force-stop the service, then drop its link from the scan directory.
    ///
    /// The force-stop result is not checked: a dangling link has nothing
    /// supervising it, and the link must still go.
    pub fn disable(&mut self) -> Result<()> {
        let out = self.svc(SvcFlag::Kill)?;
        if !out.success() {
            tracing::warn!(
                "Force-stop of {} exited with {:?}: {}",
                self.service.name,
                out.code,
                out.stderr
            );
        }

        let link = self.service.enabled_path();
        std::fs::remove_file(&link).map_err(|e| Error::Filesystem {
            action: "Error while unlinking",
            path: link.clone(),
            source: e,
        })?;

        tracing::info!("Disabled {}", self.service.name);
        self.enabled = false;
        Ok(())
    }

    pub fn started(&self) -> Result<()> {
        self.checked_svc("started", SvcFlag::Up)
    }

    pub fn stopped(&self) -> Result<()> {
        self.checked_svc("stopped", SvcFlag::Down)
    }

    pub fn killed(&self) -> Result<()> {
        self.checked_svc("killed", SvcFlag::Kill)
    }

    pub fn once(&self) -> Result<()> {
        self.checked_svc("started once", SvcFlag::Once)
    }

    /// Bounce the service.
    ///
    /// A running service is killed first. A service that wants to be down is
    /// only run once afterwards rather than brought back under supervision.
    pub fn restarted(&self) -> Result<()> {
        match self.status.run_state {
            RunState::Unknown => {
                return Err(Error::InvalidState {
                    state: self.status.run_state.to_string(),
                })
            }
            RunState::Started => self.killed()?,
            RunState::Stopped => {}
        }

        if self.status.wants_down {
            self.once()
        } else {
            self.started()
        }
    }

    /// Perform the action for `state` unconditionally.
    pub fn transition(&self, state: DesiredState) -> Result<()> {
        match state {
            DesiredState::Started => self.started(),
            DesiredState::Stopped => self.stopped(),
            DesiredState::Restarted => self.restarted(),
            DesiredState::Killed => self.killed(),
            DesiredState::Once => self.once(),
        }
    }

    /// Bring the service in line with `request` and report the result.
    ///
    /// In check mode nothing is touched; `changed` says what would happen.
    pub fn apply(&mut self, request: Request, check_mode: bool) -> Result<Outcome> {
        let mut changed = false;

        if let Some(enabled) = request.enabled {
            if enabled != self.enabled {
                changed = true;
                if !check_mode {
                    if enabled {
                        self.enable()?;
                    } else {
                        self.disable()?;
                    }
                }
            }
        }

        if let Some(state) = request.state {
            if state.differs_from(self.status.run_state) {
                changed = true;
                if !check_mode {
                    self.transition(state)?;
                }
            }
        }

        Ok(Outcome {
            changed,
            report: self.report()?,
        })
    }

    /// Re-query and describe the service as it is now.
    ///
    /// An unlinked service reports as stopped without running s6-svstat.
    pub fn report(&mut self) -> Result<Report> {
        self.enabled = self.service.is_enabled();
        self.status = if self.enabled {
            self.query()?
        } else {
            StatusRecord::unsupervised()
        };

        Ok(Report {
            state: self.status.run_state,
            enabled: self.enabled,
            svc_full: self.service.enabled_path(),
            src_full: self.service.source_path(),
            pid: self.status.pid,
            duration: self.status.duration_seconds,
            full_state: self.status.raw_text.clone(),
        })
    }
}
