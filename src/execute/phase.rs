//! Single-phase execution
//!
//! Walks the checked leaves of the tree in pre-order, handing each node to
//! a caller-supplied action and recording what it reports. The executor
//! owns sequencing, cancellation and progress; the action decides what
//! "validate" or "publish" means for a node.

use crate::context::{CancelToken, RunContext};
use crate::error::{Error, Result};
use crate::plugin::PublishItem;
use crate::progress::{ProgressFrame, StatusTracker};
use crate::tree::ItemTree;
use crate::types::{NodeId, Phase, Status};
use tracing::{debug, info, warn};

/// What an action reports for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The node passed the phase
    Passed,
    /// The node reported a failure with a message
    Failed(String),
}

/// Which nodes a phase visits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeSelection {
    /// Every checked leaf
    #[default]
    All,
    /// Only these nodes, if they are checked leaves; tree order is kept
    Nodes(Vec<NodeId>),
}

/// The failure that stopped a phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseFailure {
    /// Node whose action failed
    pub node: NodeId,
    /// Reported error
    pub message: String,
}

/// Result of running one phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    /// Phase that ran
    pub phase: Phase,
    /// Nodes whose action was invoked
    pub visited: usize,
    /// Nodes that ended in an error status
    pub errors: usize,
    /// Whether cancellation stopped the phase
    pub cancelled: bool,
    /// Failure that aborted the phase
    pub failure: Option<PhaseFailure>,
}

impl PhaseReport {
    const fn new(phase: Phase) -> Self {
        Self {
            phase,
            visited: 0,
            errors: 0,
            cancelled: false,
            failure: None,
        }
    }

    /// Whether every visited node passed and the phase ran to the end
    pub const fn is_clean(&self) -> bool {
        self.errors == 0 && !self.cancelled && self.failure.is_none()
    }

    /// Turn an aborted phase into [`Error::PhaseAborted`]
    pub fn into_result(self) -> Result<Self> {
        match self.failure {
            Some(PhaseFailure { node, message }) => Err(Error::PhaseAborted {
                phase: self.phase,
                node,
                message,
            }),
            None => Ok(self),
        }
    }
}

/// Runs phases over a tree
#[derive(Debug, Clone)]
pub struct PhaseExecutor {
    cancel: CancelToken,
    standalone: bool,
}

impl PhaseExecutor {
    /// Executor polling `cancel` between nodes
    pub const fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            standalone: false,
        }
    }

    /// Record standalone validation statuses
    #[must_use]
    pub const fn standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Nodes `selection` visits, in pre-order
    pub fn nodes(tree: &ItemTree, selection: &NodeSelection) -> Vec<NodeId> {
        let leaves = tree.checked_leaves();
        match selection {
            NodeSelection::All => leaves,
            NodeSelection::Nodes(ids) => leaves
                .into_iter()
                .filter(|id| ids.contains(id))
                .collect(),
        }
    }

    /// Run `phase` over the nodes in `selection`
    ///
    /// Validate records failures and moves on. In Publish, any failure
    /// aborts the rest of the phase; in Finalize only an `Err` does, a
    /// reported failure is recorded and the phase continues. Nodes after a
    /// cancellation or an abort keep their status.
    pub fn run<F>(
        &self,
        tree: &mut ItemTree,
        tracker: &mut StatusTracker<'_>,
        phase: Phase,
        selection: &NodeSelection,
        mut action: F,
    ) -> Result<PhaseReport>
    where
        F: FnMut(&mut ItemTree, NodeId, Phase) -> anyhow::Result<StepOutcome>,
    {
        let nodes = Self::nodes(tree, selection);
        tracker.begin_phase(phase, nodes.len());
        info!("{} {} nodes", phase.verb(), nodes.len());
        let mut report = PhaseReport::new(phase);

        for node in nodes {
            if self.cancel.is_cancelled() {
                info!("{phase} cancelled after {} nodes", report.visited);
                report.cancelled = true;
                break;
            }

            let label = display_name(tree, node)?;
            let icon = tree.get(node)?.icon();
            let mut frame = tracker.push(ProgressFrame::for_node(phase, node, &label, icon));
            report.visited += 1;

            let (status, message, abort) = match action(tree, node, phase) {
                Ok(StepOutcome::Passed) => (Status::success(phase, self.standalone), None, false),
                Ok(StepOutcome::Failed(message)) => {
                    (Status::failure(phase), Some(message), phase == Phase::Publish)
                }
                Err(e) => (
                    Status::failure(phase),
                    Some(format!("{e:#}")),
                    matches!(phase, Phase::Publish | Phase::Finalize),
                ),
            };
            match &message {
                Some(message) if abort => warn!("{label}: {message}"),
                Some(message) => debug!("{label}: {message}"),
                None => debug!("{label}: {status:?}"),
            }
            frame.record(tree, node, status, message.clone())?;
            report.errors += frame.finish();

            if abort {
                report.failure = Some(PhaseFailure {
                    node,
                    message: message.unwrap_or_default(),
                });
                break;
            }
        }
        Ok(report)
    }
}

/// Label for progress frames: tasks show their item
fn display_name(tree: &ItemTree, node: NodeId) -> Result<String> {
    let current = tree.get(node)?;
    match current.parent().filter(|_| current.is_task()) {
        Some(item) => Ok(format!("{} ({})", tree.get(item)?.name, current.name)),
        None => Ok(current.name.clone()),
    }
}

/// Default action: dispatch to the plugin bound to a task node
///
/// Item leaves without tasks pass. Plugin changes to the item's properties
/// are kept even when the plugin fails.
pub fn plugin_action(
    ctx: &RunContext,
) -> impl FnMut(&mut ItemTree, NodeId, Phase) -> anyhow::Result<StepOutcome> + '_ {
    move |tree: &mut ItemTree, node: NodeId, phase: Phase| {
        let task = tree.get(node)?;
        let (Some(plugin), Some(settings)) = (task.plugin().cloned(), task.settings().cloned())
        else {
            return Ok(StepOutcome::Passed);
        };
        let mut item = PublishItem::from_tree(tree, ctx, node)?;

        let outcome = match phase {
            Phase::Load => Ok(StepOutcome::Passed),
            Phase::Validate => plugin.validate(&settings, &mut item).map(|v| {
                if v.passed {
                    StepOutcome::Passed
                } else {
                    let message = v
                        .message
                        .unwrap_or_else(|| "Validation failed".to_string());
                    StepOutcome::Failed(message)
                }
            }),
            Phase::Publish => plugin
                .publish(&settings, &mut item)
                .map(|()| StepOutcome::Passed),
            Phase::Finalize => plugin
                .finalize(&settings, &mut item)
                .map(|error| error.map_or(StepOutcome::Passed, StepOutcome::Failed)),
        };
        item.write_back(tree, node)?;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;
    use crate::tree::Node;
    use crate::types::ContextLink;

    fn flat(n: usize) -> (ItemTree, NodeId, Vec<NodeId>) {
        let mut tree = ItemTree::new();
        let ctx = tree
            .add(tree.root(), Node::context(ContextLink::new("sh010", "comp")))
            .unwrap();
        let items = (0..n)
            .map(|i| tree.add(ctx, Node::item(format!("item{i}"), "file")).unwrap())
            .collect();
        (tree, ctx, items)
    }

    #[test]
    fn test_validate_counts_failures_and_continues() {
        let (mut tree, ctx, items) = flat(3);
        let sink = NoopProgress;
        let mut tracker = StatusTracker::new(&sink);
        let executor = PhaseExecutor::new(CancelToken::new());

        let report = executor
            .run(&mut tree, &mut tracker, Phase::Validate, &NodeSelection::All, |_, node, _| {
                if node == items[1] {
                    Ok(StepOutcome::Failed("bad path".to_string()))
                } else {
                    Ok(StepOutcome::Passed)
                }
            })
            .unwrap();

        assert_eq!(report.visited, 3);
        assert_eq!(report.errors, 1);
        assert_eq!(tree.get(items[2]).unwrap().status(), Status::Validated);
        assert_eq!(tree.get(ctx).unwrap().status(), Status::ValidationError);
        assert_eq!(tracker.completed_count(), 3);
    }

    #[test]
    fn test_standalone_validation_status() {
        let (mut tree, _, items) = flat(1);
        let sink = NoopProgress;
        let mut tracker = StatusTracker::new(&sink);
        let executor = PhaseExecutor::new(CancelToken::new()).standalone(true);

        executor
            .run(&mut tree, &mut tracker, Phase::Validate, &NodeSelection::All, |_, _, _| {
                Ok(StepOutcome::Passed)
            })
            .unwrap();
        assert_eq!(
            tree.get(items[0]).unwrap().status(),
            Status::ValidatedStandalone
        );
    }

    #[test]
    fn test_finalize_reported_error_continues_but_err_aborts() {
        let (mut tree, _, items) = flat(3);
        let sink = NoopProgress;
        let mut tracker = StatusTracker::new(&sink);
        let executor = PhaseExecutor::new(CancelToken::new());

        let report = executor
            .run(&mut tree, &mut tracker, Phase::Finalize, &NodeSelection::All, |_, node, _| {
                if node == items[0] {
                    Ok(StepOutcome::Failed("no thumbnail".to_string()))
                } else {
                    anyhow::bail!("disk full")
                }
            })
            .unwrap();

        assert_eq!(report.visited, 2);
        assert_eq!(report.errors, 2);
        assert_eq!(report.failure.as_ref().map(|f| f.node), Some(items[1]));
        assert_eq!(tree.get(items[2]).unwrap().status(), Status::Ready);
        assert!(matches!(
            report.into_result(),
            Err(Error::PhaseAborted { phase: Phase::Finalize, .. })
        ));
    }

    #[test]
    fn test_selection_keeps_tree_order_and_skips_unchecked() {
        let (mut tree, _, items) = flat(3);
        tree.set_checked(items[1], false).unwrap();
        let selection = NodeSelection::Nodes(vec![items[2], items[1], items[0]]);
        assert_eq!(
            PhaseExecutor::nodes(&tree, &selection),
            vec![items[0], items[2]]
        );
    }

    #[test]
    fn test_labels_show_item_for_tasks() {
        let (tree, _, items) = flat(1);
        assert_eq!(display_name(&tree, items[0]).unwrap(), "item0");
    }
}
