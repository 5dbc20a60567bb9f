pub mod cmd;
pub mod error;
pub mod params;
pub mod service;
pub mod status;
pub mod toolset;

pub use error::{Error, Result};
pub use params::Params;
pub use service::{DesiredState, Outcome, Report, Request, Service, ServiceRef};
pub use status::{RunState, StatusRecord};

use cmd::SystemRunner;
use toolset::Toolset;

/// Resolve the s6 tools and bring the named service in line with `params`.
pub fn run(params: &Params) -> Result<Outcome> {
    let service = params.service_ref()?;
    let tools = Toolset::resolve(
        params.svc_bin.as_deref(),
        params.svstat_bin.as_deref(),
        &params.extra_paths,
    )?;

    let mut sv = Service::load(service, tools, SystemRunner)?;
    sv.apply(params.request(), params.check_mode)
}
