//! CLI command handling
//!
//! Builds the session for a command, runs it, and formats output.

use colored::Colorize;

use crate::commands::{Commands, TargetArgs};
use crate::common::{HarnessConfig, Result};
use crate::testing::{print_summary, Runner, Session, StepKind, StepRegistry};

/// Resolve configuration: defaults, then file, then `SERVER_PORT`, then flags
pub fn resolve_config(target: &TargetArgs) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::load(target.config.as_deref())?;
    if let Some(host) = &target.host {
        config.server.host = host.clone();
    }
    if let Some(port) = target.port {
        config.server.port = port;
    }
    tracing::debug!(base_url = %config.base_url(), "configuration resolved");
    Ok(config)
}

/// Dispatch a CLI command
///
/// Returns whether the command succeeded; errors are reserved for setup
/// problems such as an unreachable service or an unreadable feature file.
pub async fn dispatch(command: Commands, verbose: bool) -> Result<bool> {
    match command {
        Commands::Run { paths, target } => {
            let config = resolve_config(&target)?;
            let registry = StepRegistry::standard()?;
            let (session, ready) = Session::connect(config).await?;
            println!(
                "{} {} (after {} attempt{})",
                "Service ready:".green(),
                ready.url,
                ready.attempts,
                if ready.attempts == 1 { "" } else { "s" }
            );

            let runner = Runner::new(session, registry, verbose);
            let summary = runner.run_paths(&paths).await?;
            print_summary(&summary);
            Ok(summary.success())
        }

        Commands::Ping { target } => {
            let config = resolve_config(&target)?;
            let session = Session::new(config)?;
            let ready = session.wait_until_ready().await?;
            println!(
                "{} {} answered after {} attempt{}",
                "✓".green(),
                ready.url,
                ready.attempts,
                if ready.attempts == 1 { "" } else { "s" }
            );
            Ok(true)
        }

        Commands::Steps => {
            let registry = StepRegistry::standard()?;
            for kind in [StepKind::Given, StepKind::When, StepKind::Then] {
                println!("{}", kind.to_string().cyan().bold());
                for definition in registry.definitions().iter().filter(|d| d.kind() == kind) {
                    println!("  {}", definition.pattern());
                }
            }
            Ok(true)
        }
    }
}
