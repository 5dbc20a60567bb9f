use serde::Deserialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::service::{DesiredState, Request, ServiceRef};

pub const DEFAULT_SERVICE_DIR: &str = "/var/service";
pub const DEFAULT_SERVICE_SRC: &str = "/etc/sv";

/// Caller-facing parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    pub name: Option<String>,
    pub state: Option<DesiredState>,
    pub enabled: Option<bool>,
    pub service_dir: PathBuf,
    pub service_src: PathBuf,
    /// Compute `changed` but touch nothing
    pub check_mode: bool,
    pub svc_bin: Option<PathBuf>,
    pub svstat_bin: Option<PathBuf>,
    /// Searched for the s6 tools before PATH
    pub extra_paths: Vec<PathBuf>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            name: None,
            state: None,
            enabled: None,
            service_dir: PathBuf::from(DEFAULT_SERVICE_DIR),
            service_src: PathBuf::from(DEFAULT_SERVICE_SRC),
            check_mode: false,
            svc_bin: None,
            svstat_bin: None,
            extra_paths: Vec::new(),
        }
    }
}

impl Params {
    pub fn service_ref(&self) -> Result<ServiceRef> {
        let name = match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => return Err(Error::config("missing required arguments: name")),
        };

        if name.contains('/') {
            return Err(Error::config(format!(
                "Invalid service name '{}': must not contain '/'",
                name
            )));
        }

        Ok(ServiceRef::new(name, &self.service_dir, &self.service_src))
    }

    pub fn request(&self) -> Request {
        Request {
            enabled: self.enabled,
            state: self.state,
        }
    }
}

/// Where to read a params file from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsSource {
    File(PathBuf),
    Stdin,
}

impl ParamsSource {
    /// Parse from command line argument
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "-" => Self::Stdin,
            path => Self::File(PathBuf::from(path)),
        }
    }
}

pub fn load(source: &ParamsSource) -> Result<Params> {
    match source {
        ParamsSource::File(path) => load_from_file(path),
        ParamsSource::Stdin => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .map_err(|e| Error::config(format!("Failed to read params from stdin: {}", e)))?;
            parse_auto(&content)
        }
    }
}

fn load_from_file(path: &Path) -> Result<Params> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read params file {}: {}", path.display(), e))
    })?;

    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "json" => parse_json(&content),
        "yaml" | "yml" => parse_yaml(&content),
        _ => parse_auto(&content),
    }
}

pub fn parse_json(content: &str) -> Result<Params> {
    serde_json::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse JSON params: {}", e)))
}

pub fn parse_yaml(content: &str) -> Result<Params> {
    serde_yaml::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse YAML params: {}", e)))
}

/// JSON if it looks like an object, YAML otherwise
pub fn parse_auto(content: &str) -> Result<Params> {
    if content.trim_start().starts_with('{') {
        parse_json(content)
    } else {
        parse_yaml(content)
    }
}
