//! Admission gate for the publish action
//!
//! Decides whether publishing may start and explains why not. Every
//! predicate is evaluated; each failing one contributes its own message, in
//! a fixed order, so the explanation is stable regardless of which
//! condition changed last.

use crate::config::PublisherConfig;
use crate::error::Result;
use regex::Regex;

/// Separator used by [`Admission::tooltip`]
pub const REASON_SEPARATOR: &str = "; ";

/// Message when the last validation did not pass (or never ran)
pub const VALIDATION_REASON: &str = "Run validation and resolve all issues";
/// Message when nothing is checked
pub const CHECKED_REASON: &str = "Select at least one item";
/// Message when a context lacks a task link
pub const TASK_REASON: &str = "Link every item to a task";

/// Snapshot of the state the gate looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateInput {
    /// Description the publish would use, already resolved
    pub description: String,
    /// Error count of the most recent validation; `None` if never run
    pub last_validation_errors: Option<usize>,
    /// Whether any node is checked
    pub any_checked: bool,
    /// Whether every top-level context has a non-empty task link
    pub all_contexts_have_task: bool,
}

/// Gate decision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Admission {
    /// Whether the publish action is enabled
    pub enabled: bool,
    /// One message per failing predicate, in predicate order
    pub reasons: Vec<String>,
}

impl Admission {
    /// Reasons joined into one line
    pub fn tooltip(&self) -> String {
        self.reasons.join(REASON_SEPARATOR)
    }
}

/// Composite publish predicate
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    pattern: Regex,
    hint: String,
    task_required: bool,
}

impl AdmissionGate {
    /// Build a gate from a description pattern and its failure message
    pub fn new(pattern: Regex, hint: impl Into<String>, task_required: bool) -> Self {
        Self {
            pattern,
            hint: hint.into(),
            task_required,
        }
    }

    /// Build a gate from the publisher config
    pub fn from_config(config: &PublisherConfig) -> Result<Self> {
        Ok(Self::new(
            config.description_regex()?,
            config.description_hint.clone(),
            config.task_required,
        ))
    }

    /// Whether `description` is acceptable
    pub fn description_ok(&self, description: &str) -> bool {
        self.pattern.is_match(description)
    }

    /// Evaluate every predicate
    pub fn evaluate(&self, input: &GateInput) -> Admission {
        let checks = [
            (self.description_ok(&input.description), self.hint.as_str()),
            (input.last_validation_errors == Some(0), VALIDATION_REASON),
            (input.any_checked, CHECKED_REASON),
            (
                !self.task_required || input.all_contexts_have_task,
                TASK_REASON,
            ),
        ];
        let reasons: Vec<String> = checks
            .iter()
            .filter(|(ok, _)| !ok)
            .map(|(_, reason)| (*reason).to_string())
            .collect();
        Admission {
            enabled: reasons.is_empty(),
            reasons,
        }
    }

    /// Whether validation can run: something is checked and, when
    /// required, every context has a task
    pub const fn can_validate(&self, input: &GateInput) -> bool {
        input.any_checked && (!self.task_required || input.all_contexts_have_task)
    }
}
