//! health-e2e - behavior-driven end-to-end checks for a health-check service
//!
//! Runs Gherkin scenarios against the service's REST and Connect RPC
//! surfaces after waiting for its liveness endpoint to answer.

use clap::Parser;
use health_e2e::{cli, commands, common};
use commands::Commands;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "health-e2e", about = "End-to-end BDD checks for a health-check service")]
#[command(version, long_about = None)]
struct Cli {
    /// Print every step and enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = common::logging::init(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    match cli::dispatch(cli.command, cli.verbose).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
