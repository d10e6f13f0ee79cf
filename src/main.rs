//! Tagsmith: compose prompts and cleanup runs from macro tags in source files.
//!
//! This is the main entry point for the `tagsmith` CLI. It parses arguments,
//! sets up logging, dispatches to the appropriate command handler, and
//! handles errors with proper exit codes.

use std::process::ExitCode;
use tagsmith::cli::Cli;
use tagsmith::{commands, exit_codes};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Logs go to stderr so composed text printed on stdout stays clean.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "tagsmith=info",
        1 => "tagsmith=debug",
        _ => "tagsmith=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
