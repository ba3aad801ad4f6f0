//! Scenario runner
//!
//! Executes parsed scenarios against a live service. Every step of a
//! scenario is bound to its definition before the first one runs, so an
//! undefined or ambiguous line fails the scenario without sending any
//! request. Steps then run in order; the first failure stops the scenario.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;

use super::registry::{ResolvedStep, StepRegistry, World};
use super::scenario::{collect_feature_files, load_feature, Feature, Scenario};
use super::session::Session;
use crate::common::Result;

/// Result of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    /// Text of the step that failed, when a step failed
    pub failed_step: Option<String>,
    pub error: Option<String>,
}

impl ScenarioReport {
    fn failed(scenario: &Scenario, steps_run: usize, failed_step: Option<String>, error: String) -> Self {
        Self {
            name: scenario.full_name(),
            passed: false,
            steps_run,
            steps_total: scenario.steps.len(),
            failed_step,
            error: Some(error),
        }
    }
}

/// Results of every scenario in one feature file
#[derive(Debug, Clone)]
pub struct FeatureReport {
    pub name: String,
    pub path: Option<PathBuf>,
    pub scenarios: Vec<ScenarioReport>,
}

impl FeatureReport {
    /// A file that could not be read or parsed counts as one failed scenario
    fn unloadable(path: &Path, error: &crate::common::Error) -> Self {
        let name = path.display().to_string();
        println!("\n{} {}", "Feature:".blue().bold(), name.white().bold());
        println!("  {} {}", "✗".red(), error.to_string().red());
        Self {
            name: name.clone(),
            path: Some(path.to_path_buf()),
            scenarios: vec![ScenarioReport {
                name,
                passed: false,
                steps_run: 0,
                steps_total: 0,
                failed_step: None,
                error: Some(error.to_string()),
            }],
        }
    }

    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(|s| s.passed)
    }
}

/// Results of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub features: Vec<FeatureReport>,
}

impl RunSummary {
    pub fn scenarios(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.features.iter().flat_map(|f| f.scenarios.iter())
    }

    pub fn total(&self) -> usize {
        self.scenarios().count()
    }

    pub fn passed(&self) -> usize {
        self.scenarios().filter(|s| s.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Every scenario passed
    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs scenarios against a ready session
pub struct Runner {
    session: Arc<Session>,
    registry: StepRegistry,
    verbose: bool,
}

impl Runner {
    pub fn new(session: Arc<Session>, registry: StepRegistry, verbose: bool) -> Self {
        Self {
            session,
            registry,
            verbose,
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Run feature files and directories of feature files
    pub async fn run_paths(&self, paths: &[PathBuf]) -> Result<RunSummary> {
        let files = collect_feature_files(paths)?;
        let mut summary = RunSummary::default();
        for file in &files {
            let report = match load_feature(file) {
                Ok(feature) => self.run_feature(&feature).await,
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "feature file not loaded");
                    FeatureReport::unloadable(file, &e)
                }
            };
            summary.features.push(report);
        }
        tracing::info!(
            features = summary.features.len(),
            scenarios = summary.total(),
            passed = summary.passed(),
            failed = summary.failed(),
            "run finished"
        );
        Ok(summary)
    }

    /// Load and run one feature file
    pub async fn run_file(&self, path: &Path) -> Result<FeatureReport> {
        let feature = load_feature(path)?;
        Ok(self.run_feature(&feature).await)
    }

    /// Run every scenario of a parsed feature, each with a fresh context
    pub async fn run_feature(&self, feature: &Feature) -> FeatureReport {
        println!(
            "\n{} {}",
            "Feature:".blue().bold(),
            feature.name.white().bold()
        );
        if let Some(path) = &feature.path {
            println!("  {}", path.display().to_string().dimmed());
        }

        let mut scenarios = Vec::with_capacity(feature.scenarios.len());
        for scenario in &feature.scenarios {
            scenarios.push(self.run_scenario(scenario).await);
        }

        FeatureReport {
            name: feature.name.clone(),
            path: feature.path.clone(),
            scenarios,
        }
    }

    /// Run one scenario
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioReport {
        let name = scenario.full_name();
        println!("\n  {} {}", "Scenario:".cyan(), name.white());

        if let Some(reason) = &scenario.unsupported {
            println!("    {} {}", "✗".red(), reason);
            return ScenarioReport::failed(scenario, 0, None, reason.clone());
        }

        let resolved = match self.resolve(scenario) {
            Ok(resolved) => resolved,
            Err((line, e)) => {
                println!("    {} line {}: {}", "✗".red(), line, e);
                return ScenarioReport::failed(scenario, 0, None, e.to_string());
            }
        };

        let mut world = World::new(self.session.clone());
        for (i, (step, bound)) in scenario.steps.iter().zip(&resolved).enumerate() {
            let label = format!("{} {}", step.keyword, step.text);
            tracing::debug!(scenario = %name, line = step.line, "step: {}", label);

            if let Err(e) = bound.definition.handler().invoke(&mut world, &bound.args).await {
                println!("    {} {}", "✗".red(), label);
                println!("      {}", e.to_string().red());
                return ScenarioReport::failed(scenario, i + 1, Some(label), e.to_string());
            }

            if self.verbose {
                println!("    {} {}", "✓".green(), label.dimmed());
            }
        }

        println!("    {} {}", "✓".green().bold(), "Passed".green());
        ScenarioReport {
            name,
            passed: true,
            steps_run: scenario.steps.len(),
            steps_total: scenario.steps.len(),
            failed_step: None,
            error: None,
        }
    }

    /// Bind every step line, reporting the first line that cannot be bound
    fn resolve<'r>(
        &'r self,
        scenario: &Scenario,
    ) -> std::result::Result<Vec<ResolvedStep<'r>>, (usize, crate::common::Error)> {
        scenario
            .steps
            .iter()
            .map(|step| {
                self.registry
                    .resolve(step.kind, &step.keyword, &step.text)
                    .map_err(|e| (step.line, e))
            })
            .collect()
    }
}

/// Print the end-of-run totals and every failure
pub fn print_summary(summary: &RunSummary) {
    println!();
    for report in summary.scenarios().filter(|s| !s.passed) {
        println!("{} {}", "✗".red(), report.name.white().bold());
        if let Some(step) = &report.failed_step {
            println!(
                "  at step {}/{}: {}",
                report.steps_run, report.steps_total, step
            );
        }
        if let Some(error) = &report.error {
            println!("  {}", error.red());
        }
    }

    let line = format!(
        "{} scenarios: {} passed, {} failed",
        summary.total(),
        summary.passed(),
        summary.failed()
    );
    if summary.success() {
        println!("\n{} {}\n", "✓".green().bold(), line.green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), line.red().bold());
    }
}
