use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use s6ctl::params::{self, ParamsSource};
use s6ctl::{DesiredState, Outcome, Params};

/// Manage s6 supervised services idempotently
#[derive(Parser, Debug)]
#[command(name = "s6ctl", version)]
struct Cli {
    /// Read parameters from a JSON or YAML file ("-" for stdin)
    #[arg(long, value_name = "FILE")]
    params: Option<String>,

    /// Name of the service to manage
    #[arg(long)]
    name: Option<String>,

    /// Desired state
    #[arg(long, value_enum)]
    state: Option<DesiredState>,

    /// Whether the service is linked into the service directory
    #[arg(long, action = clap::ArgAction::Set, value_name = "BOOL")]
    enabled: Option<bool>,

    /// Directory s6-svscan watches
    #[arg(long, value_name = "DIR")]
    service_dir: Option<PathBuf>,

    /// Directory holding service definitions
    #[arg(long, value_name = "DIR")]
    service_src: Option<PathBuf>,

    /// Path to s6-svc
    #[arg(long, value_name = "PATH")]
    svc_bin: Option<PathBuf>,

    /// Path to s6-svstat
    #[arg(long, value_name = "PATH")]
    svstat_bin: Option<PathBuf>,

    /// Extra directory to search for the s6 tools (repeatable)
    #[arg(long = "extra-path", value_name = "DIR")]
    extra_paths: Vec<PathBuf>,

    /// Report what would change without changing anything
    #[arg(long)]
    check: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Params file first, then flags on top
    fn into_params(self) -> Result<Params> {
        let mut params = match self.params.as_deref() {
            Some(arg) => params::load(&ParamsSource::from_arg(arg))?,
            None => Params::default(),
        };

        if self.name.is_some() {
            params.name = self.name;
        }
        if self.state.is_some() {
            params.state = self.state;
        }
        if self.enabled.is_some() {
            params.enabled = self.enabled;
        }
        if let Some(dir) = self.service_dir {
            params.service_dir = dir;
        }
        if let Some(dir) = self.service_src {
            params.service_src = dir;
        }
        if self.svc_bin.is_some() {
            params.svc_bin = self.svc_bin;
        }
        if self.svstat_bin.is_some() {
            params.svstat_bin = self.svstat_bin;
        }
        params.extra_paths.extend(self.extra_paths);
        params.check_mode |= self.check;

        Ok(params)
    }
}

/// Emitted on stdout when the run fails
#[derive(Serialize, Debug)]
struct Failure<'a> {
    failed: bool,
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a Path>,
}

impl<'a> Failure<'a> {
    fn from_error(err: &'a anyhow::Error) -> Self {
        let lib_err = err.downcast_ref::<s6ctl::Error>();
        Self {
            failed: true,
            msg: err.to_string(),
            error: lib_err.and_then(|e| e.error_text()),
            path: lib_err.and_then(|e| e.path()),
        }
    }
}

fn setup_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<Outcome> {
    let params = cli.into_params()?;
    tracing::debug!(?params, "Resolved parameters");
    Ok(s6ctl::run(&params)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            println!("{}", serde_json::to_string_pretty(&Failure::from_error(&err))?);
            std::process::exit(1);
        }
    }
}
