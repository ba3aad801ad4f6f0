//! BDD scenario harness
//!
//! Loads Gherkin feature files, binds their lines to registered step
//! definitions, and runs them against the service under test. Assertions
//! are made on structured responses captured by the HTTP driver.

pub mod context;
pub mod readiness;
pub mod registry;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod steps;

pub use context::{ContextValue, ScenarioContext};
pub use readiness::{wait_until_ready, ReadyReport};
pub use registry::{StepArgs, StepHandler, StepKind, StepRegistry, World};
pub use runner::{print_summary, FeatureReport, Runner, RunSummary, ScenarioReport};
pub use scenario::{load_feature, parse_feature, Feature, Scenario, StepLine};
pub use session::Session;
