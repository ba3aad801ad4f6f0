//! Step registry and dispatcher
//!
//! Step definitions are `(kind, pattern, handler)` tuples. A pattern is
//! literal text with typed placeholders:
//!
//! ```text
//! I make {int} concurrent requests to {string}
//! ```
//!
//! `{string}` matches double-quoted text (quotes excluded) and `{int}` an
//! optionally negative integer. Patterns are compiled to anchored regexes
//! when registered; arguments are extracted and typed when a scenario line
//! is resolved, before the scenario starts.

use futures_util::future::BoxFuture;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::context::ScenarioContext;
use super::session::Session;
use crate::common::{Error, Result};

/// Step keyword after `And`/`But` have been resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKind {
    Given,
    When,
    Then,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Given => write!(f, "Given"),
            StepKind::When => write!(f, "When"),
            StepKind::Then => write!(f, "Then"),
        }
    }
}

/// Placeholder types a pattern may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamType {
    Str,
    Int,
}

/// A typed argument extracted from a step line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArg {
    Str(String),
    Int(i64),
}

/// Arguments of one resolved step, in pattern order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs(Vec<StepArg>);

impl StepArgs {
    pub fn new(args: Vec<StepArg>) -> Self {
        Self(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `{string}` argument at `index`
    pub fn str(&self, index: usize) -> Result<&str> {
        match self.0.get(index) {
            Some(StepArg::Str(s)) => Ok(s),
            Some(StepArg::Int(_)) => Err(Error::StepArgument(format!(
                "argument {} is an integer, expected a string",
                index
            ))),
            None => Err(Error::StepArgument(format!("missing argument {}", index))),
        }
    }

    /// The `{int}` argument at `index`
    pub fn int(&self, index: usize) -> Result<i64> {
        match self.0.get(index) {
            Some(StepArg::Int(n)) => Ok(*n),
            Some(StepArg::Str(_)) => Err(Error::StepArgument(format!(
                "argument {} is a string, expected an integer",
                index
            ))),
            None => Err(Error::StepArgument(format!("missing argument {}", index))),
        }
    }

    /// An `{int}` argument used as a request count
    pub fn count(&self, index: usize) -> Result<usize> {
        let n = self.int(index)?;
        usize::try_from(n)
            .map_err(|_| Error::StepArgument(format!("request count must be non-negative, got {}", n)))
    }

    /// An `{int}` argument used as an HTTP status code
    pub fn status(&self, index: usize) -> Result<u16> {
        let n = self.int(index)?;
        u16::try_from(n)
            .ok()
            .filter(|code| (100..=599).contains(code))
            .ok_or_else(|| Error::StepArgument(format!("{} is not an HTTP status code", n)))
    }
}

/// State a step handler works on: the shared session plus this scenario's
/// context store
#[derive(Debug)]
pub struct World {
    pub session: Arc<Session>,
    pub context: ScenarioContext,
}

impl World {
    /// Fresh world for a new scenario
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            context: ScenarioContext::new(),
        }
    }
}

/// Future returned by action handlers
pub type ActionFuture<'a> = BoxFuture<'a, Result<()>>;

/// Executable side of a step definition
#[derive(Clone, Copy)]
pub enum StepHandler {
    /// Performs requests and records their outcomes in the context
    Action(for<'a> fn(&'a mut World, &'a StepArgs) -> ActionFuture<'a>),
    /// Read-only check; cannot modify the context
    Check(fn(&World, &StepArgs) -> Result<()>),
}

impl fmt::Debug for StepHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepHandler::Action(_) => write!(f, "Action"),
            StepHandler::Check(_) => write!(f, "Check"),
        }
    }
}

impl StepHandler {
    /// Run the handler against a world
    pub async fn invoke(&self, world: &mut World, args: &StepArgs) -> Result<()> {
        match self {
            StepHandler::Action(action) => action(world, args).await,
            StepHandler::Check(check) => check(world, args),
        }
    }
}

/// One registered step
#[derive(Debug)]
pub struct StepDefinition {
    kind: StepKind,
    pattern: String,
    regex: Regex,
    params: Vec<ParamType>,
    handler: StepHandler,
}

impl StepDefinition {
    /// Compile a pattern into a definition
    pub fn new(kind: StepKind, pattern: &str, handler: StepHandler) -> Result<Self> {
        let (regex, params) = compile_pattern(pattern)?;
        Ok(Self {
            kind,
            pattern: pattern.to_string(),
            regex,
            params,
            handler,
        })
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Pattern text as registered
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn handler(&self) -> StepHandler {
        self.handler
    }

    fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Typed arguments for a line this definition matches
    fn extract(&self, text: &str) -> Result<StepArgs> {
        let caps = self.regex.captures(text).ok_or_else(|| {
            Error::StepArgument(format!("'{}' does not match '{}'", text, self.pattern))
        })?;

        let mut args = Vec::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            let raw = caps.get(i + 1).map(|m| m.as_str()).unwrap_or_default();
            let arg = match param {
                ParamType::Str => StepArg::Str(raw.to_string()),
                ParamType::Int => StepArg::Int(raw.parse().map_err(|_| {
                    Error::StepArgument(format!("'{}' is not a valid integer", raw))
                })?),
            };
            args.push(arg);
        }
        Ok(StepArgs(args))
    }
}

/// A scenario line bound to its definition
#[derive(Debug)]
pub struct ResolvedStep<'r> {
    pub definition: &'r StepDefinition,
    pub args: StepArgs,
}

/// All known step definitions
#[derive(Debug, Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in step
    pub fn standard() -> Result<Self> {
        let mut registry = Self::new();
        super::steps::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Add a definition; the same kind and pattern may only be registered once
    pub fn register(&mut self, kind: StepKind, pattern: &str, handler: StepHandler) -> Result<()> {
        if self
            .definitions
            .iter()
            .any(|d| d.kind == kind && d.pattern == pattern)
        {
            return Err(Error::Config(format!(
                "Step '{} {}' is already registered",
                kind, pattern
            )));
        }
        self.definitions
            .push(StepDefinition::new(kind, pattern, handler)?);
        Ok(())
    }

    pub fn given(&mut self, pattern: &str, handler: StepHandler) -> Result<()> {
        self.register(StepKind::Given, pattern, handler)
    }

    pub fn when(&mut self, pattern: &str, handler: StepHandler) -> Result<()> {
        self.register(StepKind::When, pattern, handler)
    }

    pub fn then(&mut self, pattern: &str, handler: StepHandler) -> Result<()> {
        self.register(StepKind::Then, pattern, handler)
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    /// Bind a scenario line to exactly one definition of the same kind
    pub fn resolve(&self, kind: StepKind, keyword: &str, text: &str) -> Result<ResolvedStep<'_>> {
        let text = text.trim();
        let matching: Vec<&StepDefinition> = self
            .definitions
            .iter()
            .filter(|d| d.kind == kind && d.matches(text))
            .collect();

        match matching.as_slice() {
            [] => Err(Error::undefined_step(keyword, text)),
            [definition] => {
                let definition = *definition;
                Ok(ResolvedStep {
                    definition,
                    args: definition.extract(text)?,
                })
            }
            many => {
                let patterns: Vec<&str> = many.iter().map(|d| d.pattern()).collect();
                Err(Error::ambiguous_step(text, &patterns))
            }
        }
    }
}

/// Turn a placeholder pattern into an anchored regex and its parameter types
fn compile_pattern(pattern: &str) -> Result<(Regex, Vec<ParamType>)> {
    let mut source = String::from("^");
    let mut params = Vec::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        source.push_str(&regex::escape(&rest[..open]));
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            Error::Config(format!("Unclosed placeholder in step pattern '{}'", pattern))
        })?;
        match &after[..close] {
            "string" => {
                source.push_str(r#""([^"]*)""#);
                params.push(ParamType::Str);
            }
            "int" => {
                source.push_str(r"(-?\d+)");
                params.push(ParamType::Int);
            }
            other => {
                return Err(Error::Config(format!(
                    "Unknown placeholder '{{{}}}' in step pattern '{}'",
                    other, pattern
                )))
            }
        }
        rest = &after[close + 1..];
    }
    source.push_str(&regex::escape(rest));
    source.push('$');

    let regex = Regex::new(&source)
        .map_err(|e| Error::Config(format!("Invalid step pattern '{}': {}", pattern, e)))?;
    Ok((regex, params))
}
