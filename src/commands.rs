//! CLI command definitions
//!
//! Defines the clap commands for the health-e2e CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Where the service under test lives
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Port of the service (overrides SERVER_PORT and the config file)
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Host of the service (default: localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run feature files against the service
    Run {
        /// Feature files, or directories containing *.feature files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Check that the service answers its liveness endpoint
    Ping {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List every registered step pattern
    Steps,
}
