//! The bough command-line front end.
//!
//! A test binary registers its suites on a [`Runner`] and hands it to
//! [`run`], which parses the arguments, configures logging, runs, and maps
//! the outcome to a process exit code.

use std::process::ExitCode;

use clap::Parser;
use miette::Report;
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::config::RunConfig;
use crate::errors::BoughResult;
use crate::runner::Runner;

pub mod args;

/// Exit code when at least one pass failed.
pub const EXIT_FAILURES: u8 = 1;
/// Exit code for configuration or usage errors.
pub const EXIT_USAGE: u8 = 2;

/// The main entry point for a test binary.
pub fn run(runner: Runner) -> ExitCode {
    run_with_args(runner, CliArgs::parse())
}

pub fn run_with_args(mut runner: Runner, args: CliArgs) -> ExitCode {
    init_logging(args.verbose);

    match configure(&mut runner, &args).and_then(|()| runner.run()) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_FAILURES),
        Err(err) => {
            eprintln!("{:?}", Report::new(err));
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn configure(runner: &mut Runner, args: &CliArgs) -> BoughResult<()> {
    let base = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => runner.config().clone(),
    };
    *runner.config_mut() = args.apply(base);
    Ok(())
}

/// Installs a stderr `tracing` subscriber; `RUST_LOG` takes precedence.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "bough=info" } else { "bough=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed by the host; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
