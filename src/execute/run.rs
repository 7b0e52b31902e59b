//! Full publish run: validate, publish, finalize
//!
//! Sequences the three phases, decides whether publish may follow
//! validation, and turns a plugin failure into one run-level outcome.

use super::phase::{NodeSelection, PhaseExecutor, PhaseReport, StepOutcome};
use crate::context::CancelToken;
use crate::error::Result;
use crate::progress::{MessageLevel, StatusTracker};
use crate::tree::ItemTree;
use crate::types::{NodeId, Phase};
use std::fmt;
use tracing::{error, info};

/// Phases a publish run walks
pub const RUN_PHASES: [Phase; 3] = [Phase::Validate, Phase::Publish, Phase::Finalize];

/// Where a run is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Nothing has run yet
    #[default]
    Idle,
    /// A phase is running
    Running(Phase),
    /// Every phase finished
    Completed,
    /// The user stopped the run
    Cancelled,
    /// A phase failed and the run stopped
    Aborted,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Validate, publish and finalize all ran
    Completed,
    /// Cancellation was observed; later phases did not run
    Cancelled,
    /// A plugin failure aborted `phase`
    Aborted {
        /// Phase that failed
        phase: Phase,
        /// Node whose plugin failed
        node: NodeId,
        /// Reported error
        message: String,
    },
    /// Validation found errors, so nothing was published
    ValidationFailed(usize),
    /// Publishing without validation was not confirmed
    Declined,
}

impl RunOutcome {
    /// Terminal state for this outcome
    pub const fn state(&self) -> RunState {
        match self {
            Self::Completed => RunState::Completed,
            Self::Cancelled | Self::Declined => RunState::Cancelled,
            Self::Aborted { .. } | Self::ValidationFailed(_) => RunState::Aborted,
        }
    }

    /// Whether the run published everything
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "Publish complete"),
            Self::Cancelled => write!(f, "Processing aborted by user"),
            Self::Aborted { phase, message, .. } => {
                write!(f, "Publish failed during {phase}: {message}")
            }
            Self::ValidationFailed(1) => write!(f, "Validation reported 1 error"),
            Self::ValidationFailed(n) => write!(f, "Validation reported {n} errors"),
            Self::Declined => write!(f, "Publish cancelled"),
        }
    }
}

/// Asked whether to publish when validation was skipped
pub trait PublishConfirmation {
    /// `true` to publish without validating
    fn confirm_without_validation(&self) -> bool;
}

impl<F: Fn() -> bool> PublishConfirmation for F {
    fn confirm_without_validation(&self) -> bool {
        self()
    }
}

/// Run policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Validate first and publish only if that is clean
    pub validate_on_publish: bool,
    /// A manual validation already passed with no errors
    pub validated: bool,
}

/// Everything a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// How the run ended
    pub outcome: RunOutcome,
    /// One report per phase that started
    pub phases: Vec<PhaseReport>,
}

impl RunReport {
    const fn new(outcome: RunOutcome, phases: Vec<PhaseReport>) -> Self {
        Self { outcome, phases }
    }

    /// States the run went through, ending in its terminal state
    pub fn states(&self) -> Vec<RunState> {
        self.phases
            .iter()
            .map(|p| RunState::Running(p.phase))
            .chain(std::iter::once(self.outcome.state()))
            .collect()
    }

    /// Report of `phase`, if it ran
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

/// Run validate, publish and finalize over every checked leaf
///
/// Publish only follows when validation is enabled and clean, when a
/// previous manual validation was clean, or when `confirm` approves
/// publishing unvalidated. Statuses are reset first.
pub fn run_publish<F>(
    tree: &mut ItemTree,
    tracker: &mut StatusTracker<'_>,
    cancel: &CancelToken,
    options: RunOptions,
    confirm: &dyn PublishConfirmation,
    mut action: F,
) -> Result<RunReport>
where
    F: FnMut(&mut ItemTree, NodeId, Phase) -> anyhow::Result<StepOutcome>,
{
    tree.reset_statuses();
    let executor = PhaseExecutor::new(cancel.clone());
    let leaves = tree.checked_leaves().len();
    tracker.begin_run(leaves * RUN_PHASES.len());
    let mut phases = Vec::new();

    if options.validate_on_publish {
        let report = executor.run(
            tree,
            tracker,
            Phase::Validate,
            &NodeSelection::All,
            &mut action,
        )?;
        let (cancelled, errors) = (report.cancelled, report.errors);
        phases.push(report);
        if cancelled {
            return Ok(cancelled_run(tracker, phases));
        }
        if errors > 0 {
            let outcome = RunOutcome::ValidationFailed(errors);
            tracker.sink().on_message(MessageLevel::Error, &outcome.to_string());
            return Ok(RunReport::new(outcome, phases));
        }
    } else if options.validated {
        info!("Validation already passed, publishing");
    } else if !confirm.confirm_without_validation() {
        info!("Publish without validation declined");
        return Ok(RunReport::new(RunOutcome::Declined, phases));
    }

    for phase in [Phase::Publish, Phase::Finalize] {
        if cancel.is_cancelled() {
            return Ok(cancelled_run(tracker, phases));
        }
        let report = executor.run(tree, tracker, phase, &NodeSelection::All, &mut action)?;
        let cancelled = report.cancelled;
        let failure = report.failure.clone();
        phases.push(report);

        if let Some(failure) = failure {
            error!("{phase} aborted at {}: {}", failure.node, failure.message);
            let outcome = RunOutcome::Aborted {
                phase,
                node: failure.node,
                message: failure.message,
            };
            tracker.sink().on_message(MessageLevel::Error, &outcome.to_string());
            return Ok(RunReport::new(outcome, phases));
        }
        if cancelled {
            return Ok(cancelled_run(tracker, phases));
        }
    }

    let outcome = RunOutcome::Completed;
    info!("{outcome}");
    tracker.sink().on_message(MessageLevel::Info, &outcome.to_string());
    Ok(RunReport::new(outcome, phases))
}

fn cancelled_run(tracker: &StatusTracker<'_>, phases: Vec<PhaseReport>) -> RunReport {
    let outcome = RunOutcome::Cancelled;
    info!("{outcome}");
    tracker.sink().on_message(MessageLevel::Warning, &outcome.to_string());
    RunReport::new(outcome, phases)
}
