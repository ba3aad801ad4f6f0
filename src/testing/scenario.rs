//! Feature file loading
//!
//! Gherkin documents are parsed with the `gherkin` crate and flattened into
//! runnable scenarios: background steps (feature-level, then rule-level) are
//! prepended to each scenario, and `And`/`But` lines carry the kind of the
//! step before them.

use std::path::{Path, PathBuf};

use gherkin::{GherkinEnv, StepType};

use super::registry::StepKind;
use crate::common::{Error, Result};

/// One step line of a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLine {
    pub kind: StepKind,
    /// Keyword as written (`Given`, `And`, ...)
    pub keyword: String,
    pub text: String,
    pub line: usize,
}

impl StepLine {
    pub fn new(kind: StepKind, keyword: &str, text: &str, line: usize) -> Self {
        Self {
            kind,
            keyword: keyword.trim().to_string(),
            text: text.trim().to_string(),
            line,
        }
    }
}

/// A runnable scenario with its background already applied
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub rule: Option<String>,
    pub line: usize,
    pub steps: Vec<StepLine>,
    /// Set when the scenario cannot be run as written
    pub unsupported: Option<String>,
}

impl Scenario {
    /// Display name including the enclosing rule, if any
    pub fn full_name(&self) -> String {
        match &self.rule {
            Some(rule) => format!("{} / {}", rule, self.name),
            None => self.name.clone(),
        }
    }
}

/// A parsed feature file
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub path: Option<PathBuf>,
    pub scenarios: Vec<Scenario>,
}

/// Read and parse a feature file
pub fn load_feature(path: &Path) -> Result<Feature> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    let mut feature = parse_feature(&content, &path.display().to_string())?;
    feature.path = Some(path.to_path_buf());
    Ok(feature)
}

/// Parse feature text; `origin` names the source in diagnostics
pub fn parse_feature(content: &str, origin: &str) -> Result<Feature> {
    let parsed = gherkin::Feature::parse(content, GherkinEnv::default()).map_err(|e| {
        Error::FeatureParse {
            path: origin.to_string(),
            error: e.to_string(),
        }
    })?;

    let background = parsed
        .background
        .as_ref()
        .map(|b| convert_steps(&b.steps))
        .unwrap_or_default();

    let mut scenarios: Vec<Scenario> = parsed
        .scenarios
        .iter()
        .map(|s| convert_scenario(s, None, &background))
        .collect();

    for rule in &parsed.rules {
        let mut rule_background = background.clone();
        if let Some(b) = &rule.background {
            rule_background.extend(convert_steps(&b.steps));
        }
        scenarios.extend(
            rule.scenarios
                .iter()
                .map(|s| convert_scenario(s, Some(rule.name.as_str()), &rule_background)),
        );
    }

    // Rules follow top-level scenarios in the parsed tree; restore file order
    scenarios.sort_by_key(|s| s.line);

    Ok(Feature {
        name: parsed.name,
        path: None,
        scenarios,
    })
}

fn convert_scenario(
    scenario: &gherkin::Scenario,
    rule: Option<&str>,
    background: &[StepLine],
) -> Scenario {
    let mut steps = background.to_vec();
    steps.extend(convert_steps(&scenario.steps));

    let unsupported = if scenario.examples.is_empty() {
        None
    } else {
        Some("Scenario outlines with Examples are not supported".to_string())
    };

    Scenario {
        name: scenario.name.clone(),
        rule: rule.map(str::to_string),
        line: scenario.position.line,
        steps,
        unsupported,
    }
}

fn convert_steps(steps: &[gherkin::Step]) -> Vec<StepLine> {
    steps
        .iter()
        .map(|s| StepLine::new(step_kind(&s.ty), &s.keyword, &s.value, s.position.line))
        .collect()
}

fn step_kind(ty: &StepType) -> StepKind {
    match ty {
        StepType::Given => StepKind::Given,
        StepType::When => StepKind::When,
        StepType::Then => StepKind::Then,
    }
}

/// Expand the given paths into feature files
///
/// Files are taken as given. A directory contributes every `*.feature`
/// directly inside it, sorted by name.
pub fn collect_feature_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "feature"))
                .collect();
            found.sort();
            if found.is_empty() {
                tracing::warn!(dir = %path.display(), "no .feature files found");
            }
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(Error::FileRead {
                path: path.display().to_string(),
                error: "no such file or directory".to_string(),
            });
        }
    }
    Ok(files)
}
