//! Phase execution
//!
//! - [`PhaseExecutor`]: one phase over the checked leaves of a tree
//! - [`run_publish`]: the validate → publish → finalize sequence

mod phase;
mod run;

pub use phase::{
    NodeSelection, PhaseExecutor, PhaseFailure, PhaseReport, StepOutcome, plugin_action,
};
pub use run::{
    PublishConfirmation, RUN_PHASES, RunOptions, RunOutcome, RunReport, RunState, run_publish,
};
