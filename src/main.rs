//! e2e-orchestrator - Resolves end-to-end test projects and their backing servers
//!
//! Decides which application servers must be alive for the selected test
//! projects, how their readiness is judged, and can launch them around a
//! test runner invocation.

use std::path::PathBuf;

use clap::Parser;
use orchestrator::commands::Commands;
use orchestrator::common::logging;

#[derive(Parser)]
#[command(name = "e2e-orchestrator", about = "End-to-end test server orchestration")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    match orchestrator::cli::dispatch(cli.command, cli.config.as_deref()).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
