//! Progress reporting for interface-agnostic updates
//!
//! The [`ProgressSink`] trait lets different front ends (CLI, GUI, tests)
//! observe a run without the orchestrator knowing how it is displayed.
//! [`StatusTracker`] is the single place node statuses and progress counters
//! are updated.

mod tracker;

pub use crate::types::Phase;
pub use tracker::{FrameGuard, StatusTracker};

use crate::types::{NodeId, Status};

/// "Currently processing node X" record pushed while a node runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressFrame {
    /// Phase the frame belongs to
    pub phase: Phase,
    /// Display label ("Validating: plate")
    pub label: String,
    /// Icon name
    pub icon: Option<String>,
    /// Node being processed
    pub node: Option<NodeId>,
}

impl ProgressFrame {
    /// Frame for `node` labelled with the phase verb
    pub fn for_node(phase: Phase, node: NodeId, name: &str, icon: Option<String>) -> Self {
        Self {
            phase,
            label: format!("{}: {name}", phase.verb()),
            icon,
            node: Some(node),
        }
    }
}

/// Counter snapshot sent when a frame is popped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Phase being run, if any
    pub phase: Option<Phase>,
    /// Frames completed in the current phase
    pub completed: usize,
    /// Frames expected in the current phase
    pub total: usize,
    /// Frames completed across the whole run
    pub run_completed: usize,
    /// Frames expected across the whole run
    pub run_total: usize,
}

impl ProgressUpdate {
    /// Completion of the current phase in percent
    pub fn percent(&self) -> u8 {
        percent(self.completed, self.total)
    }

    /// Completion of the whole run in percent
    pub fn run_percent(&self) -> u8 {
        percent(self.run_completed, self.run_total)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.min(total) * 100 / total) as u8
}

/// Severity of a free-form progress message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational
    Info,
    /// Needs attention
    Warning,
    /// Failure
    Error,
}

/// Progress sink trait
///
/// Implement this trait to observe a run.
/// - CLI implementations can print to terminal
/// - GUIs can update a progress bar and tree icons
pub trait ProgressSink: Send + Sync {
    /// Called when a phase starts, with the number of nodes it will visit
    fn on_phase(&self, phase: Phase, total: usize);

    /// Called when a frame is pushed
    fn on_push(&self, frame: &ProgressFrame);

    /// Called when a frame is popped
    fn on_pop(&self, update: ProgressUpdate);

    /// Called when a node's status is recorded
    fn on_status(&self, node: NodeId, status: Status, message: Option<&str>);

    /// Called with a general status message
    fn on_message(&self, level: MessageLevel, message: &str);
}

/// No-op progress sink for testing or when progress isn't needed
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_phase(&self, _phase: Phase, _total: usize) {}
    fn on_push(&self, _frame: &ProgressFrame) {}
    fn on_pop(&self, _update: ProgressUpdate) {}
    fn on_status(&self, _node: NodeId, _status: Status, _message: Option<&str>) {}
    fn on_message(&self, _level: MessageLevel, _message: &str) {}
}
