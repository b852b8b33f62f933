//! @dose
//! purpose: This is the CLI entry point for tokensmith. It parses command-line arguments using
//!     clap, installs the tracing subscriber, determines the project root directory, and
//!     dispatches to the appropriate command handler (build, check, or watch).
//!
//! when-editing:
//!     - !All command handlers are imported from the tokensmith crate
//!     - !The root directory defaults to current working directory if not specified
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - One and only one subcommand is always executed per invocation
//!     - The process exits with 0 on success, 1 on any error
//!
//! do-not:
//!     - Never add business logic here - delegate to command modules
//!
//! gotchas:
//!     - RUST_LOG takes precedence over --verbose for log filtering
//!     - Logs go to stderr so stdout stays clean for summaries

use anyhow::Context;
use clap::Parser;
use std::env;
use tokensmith::cli::{Cli, Commands};
use tokensmith::commands::{run_build, run_check, run_watch};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Determine root directory
    let root = match cli.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::Build(args) => run_build(&args, &root, cli.verbose),
        Commands::Check(args) => run_check(&args, &root, cli.verbose),
        Commands::Watch(args) => run_watch(&args, &root, cli.verbose),
    }
}
