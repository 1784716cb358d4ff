use clap::Parser as ClapParser;
use cxir_driver::build_options::HostPlatform;
use cxir_driver::driver::{Cli, CompileOrchestrator};
use cxir_driver::error::DriverError;
use cxir_driver::logger;
use cxir_driver::process::SystemRunner;
use cxir_driver::session::BuildSession;
use log::error;
use std::process::exit;

/// The main entry point for the application.
///
/// Parses command-line arguments and runs one build.
fn main() {
    if !run() {
        exit(1);
    }
}

/// Runs the build; `false` when it failed for any reason.
fn run() -> bool {
    let cli = Cli::parse();
    logger::init(cli.verbose, cli.quiet);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return false;
        }
    };

    let host = HostPlatform::current();
    let mut session = BuildSession::new(config.build_options(host));
    match build(&mut session, &config, host) {
        Ok(()) => true,
        Err(DriverError::Diagnostics { errors }) => {
            error!("build failed with {} error(s)", errors);
            false
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    }
}

fn build(
    session: &mut BuildSession,
    config: &cxir_driver::driver::BuildConfig,
    host: HostPlatform,
) -> Result<(), DriverError> {
    let mut ids = Vec::new();
    for request in config.load_requests(host)? {
        ids.push(session.add_unit(request)?);
    }
    let Some(&primary) = ids.first() else {
        return Ok(());
    };

    let runner = SystemRunner::new(host);
    let mut orchestrator = CompileOrchestrator::new(&runner);
    let result = orchestrator.build(session, primary).and_then(|report| report.into_result());
    session.reset();
    result.map(|_| ())
}
