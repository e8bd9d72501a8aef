//! `audio-marker`: a thin front end over the `audio_marker` library.
//!
//! Exit codes (§6): 0 success, 1 operation error, 2 invalid usage.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use commands::CliError;

fn main() {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    match commands::dispatch(cli.command) {
        Ok(()) => {}
        Err(CliError::Usage(message)) => {
            eprintln!("error: {message}");
            std::process::exit(2);
        }
        Err(CliError::Operation(message)) => {
            eprintln!("error: {message}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.parse().expect("valid default log level"))
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();
}
