//! Publisher session
//!
//! Owns the tree, the run context and the settings panel for one session
//! and exposes the operations a front end drives: collect, edit, validate,
//! publish, and the admission check for the publish action.

use crate::collect::{CollectReport, Collector, collect_into};
use crate::config::PublisherConfig;
use crate::context::{CancelToken, RunContext};
use crate::error::{Error, Result};
use crate::execute::{
    NodeSelection, PhaseExecutor, PhaseReport, PublishConfirmation, RunOptions, RunReport,
    RunState, plugin_action, run_publish,
};
use crate::gate::{Admission, AdmissionGate, GateInput};
use crate::plugin::PublishPlugin;
use crate::progress::{MessageLevel, ProgressFrame, ProgressSink, StatusTracker};
use crate::selection::{PanelState, SettingsPanel, TaskSelection};
use crate::tree::{ItemTree, MultipleValues, NodeKind, TreeSummary, inherit};
use crate::types::{ContextLink, NodeId, Phase, Thumbnail};
use std::sync::Arc;
use tracing::{debug, info};

/// One publisher session
#[derive(Debug)]
pub struct Publisher {
    config: PublisherConfig,
    gate: AdmissionGate,
    plugins: Vec<Arc<dyn PublishPlugin>>,
    tree: ItemTree,
    ctx: RunContext,
    panel: SettingsPanel,
    last_validation: Option<usize>,
    validation_run: bool,
    state: RunState,
}

impl Publisher {
    /// Create a session matching items against `plugins`
    pub fn new(config: PublisherConfig, plugins: Vec<Arc<dyn PublishPlugin>>) -> Result<Self> {
        let gate = AdmissionGate::from_config(&config)?;
        let ctx = RunContext::new(config.description_prefix.clone());
        Ok(Self {
            config,
            gate,
            plugins,
            tree: ItemTree::new(),
            ctx,
            panel: SettingsPanel::new(),
            last_validation: None,
            validation_run: false,
            state: RunState::Idle,
        })
    }

    /// Publish tree
    pub const fn tree(&self) -> &ItemTree {
        &self.tree
    }

    /// Publish tree, for structural edits
    pub const fn tree_mut(&mut self) -> &mut ItemTree {
        &mut self.tree
    }

    /// Session state shared with plugins
    pub const fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Active configuration
    pub const fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Registered plugins
    pub fn plugins(&self) -> &[Arc<dyn PublishPlugin>] {
        &self.plugins
    }

    /// Token that stops the running phase at the next node
    pub fn cancel_token(&self) -> CancelToken {
        self.ctx.cancel.clone()
    }

    /// State the last run ended in
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Error count of the last full validation; `None` if it never ran
    pub const fn last_validation(&self) -> Option<usize> {
        self.last_validation
    }

    /// Settings panel for the current task selection
    pub const fn panel(&self) -> &SettingsPanel {
        &self.panel
    }

    /// Settings panel, for form edits
    pub const fn panel_mut(&mut self) -> &mut SettingsPanel {
        &mut self.panel
    }

    /// Rebuild the tree from the collector
    ///
    /// Session items are cleared; externally loaded items stay with their
    /// tasks. The summary description goes back to the configured prefix.
    pub fn collect(
        &mut self,
        collector: &dyn Collector,
        sink: &dyn ProgressSink,
    ) -> Result<CollectReport> {
        self.panel = SettingsPanel::new();
        self.tree.clear(false);
        self.tree.reset_statuses();
        self.ctx.reseed();
        self.validation_run = false;
        self.last_validation = None;
        self.state = RunState::Idle;
        self.run_collect(collector, sink)
    }

    /// Add items to the existing tree (e.g. files loaded by the user)
    pub fn add_items(
        &mut self,
        collector: &dyn Collector,
        sink: &dyn ProgressSink,
    ) -> Result<CollectReport> {
        self.run_collect(collector, sink)
    }

    fn run_collect(
        &mut self,
        collector: &dyn Collector,
        sink: &dyn ProgressSink,
    ) -> Result<CollectReport> {
        let mut tracker = StatusTracker::new(sink);
        tracker.begin_phase(Phase::Load, 1);
        let frame = tracker.push(ProgressFrame {
            phase: Phase::Load,
            label: format!("Collecting items to {}...", self.config.display_name),
            icon: None,
            node: None,
        });

        let descriptors = collector
            .collect()
            .map_err(|e| Error::Collect(format!("{e:#}")));
        let report = descriptors
            .and_then(|d| collect_into(&mut self.tree, &self.ctx, &self.plugins, &d));
        drop(frame);

        match &report {
            Ok(r) if r.items.len() == 1 => {
                sink.on_message(MessageLevel::Info, "One item discovered by publisher.");
            }
            Ok(r) if r.items.is_empty() => {
                sink.on_message(MessageLevel::Info, "Nothing was added.");
            }
            Ok(r) => sink.on_message(
                MessageLevel::Info,
                &format!("{} items discovered by publisher.", r.items.len()),
            ),
            Err(e) => sink.on_message(MessageLevel::Error, &e.to_string()),
        }
        report
    }

    /// Check or uncheck a node with its subtree
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<()> {
        self.tree.set_checked(node, checked)
    }

    /// Check or uncheck everything
    pub fn check_all(&mut self, checked: bool) {
        self.tree.check_all(checked);
    }

    /// Set a node's description; returns what it now resolves to
    pub fn set_description(&mut self, node: NodeId, text: &str) -> Result<String> {
        inherit::set_description(&mut self.tree, &self.ctx, node, text)
    }

    /// Set the description every inheriting node falls back to
    pub fn set_summary_description(&mut self, text: &str) {
        self.ctx.summary_description = text.to_string();
    }

    /// Set or clear a node's thumbnail
    pub fn set_thumbnail(&mut self, node: NodeId, thumbnail: Option<Thumbnail>) -> Result<()> {
        inherit::set_thumbnail(&mut self.tree, node, thumbnail)
    }

    /// Set the summary thumbnail; a new image applies to every node
    pub fn set_summary_thumbnail(&mut self, thumbnail: Option<Thumbnail>) {
        inherit::set_summary_thumbnail(&mut self.tree, &mut self.ctx, thumbnail);
    }

    /// Move an item to another task/entity link
    pub fn set_item_context(&mut self, item: NodeId, link: &ContextLink) -> Result<()> {
        self.tree.set_item_context(item, link)
    }

    /// Move every movable item to `link`
    pub fn set_context_for_all(&mut self, link: &ContextLink) -> Result<usize> {
        self.tree.set_context_for_all(link)
    }

    /// Remove nodes and their subtrees
    ///
    /// Contexts left empty go away and top-level nodes inherit the summary
    /// description again.
    pub fn remove_nodes(&mut self, nodes: &[NodeId]) -> Result<()> {
        self.panel
            .switch_to(&mut self.tree, &self.ctx, TaskSelection::empty())?;
        for node in nodes {
            if self.tree.is_attached(*node) {
                self.tree.remove(*node)?;
            }
        }
        self.tree.prune_empty_contexts();
        inherit::reset_top_level_descriptions(&mut self.tree);
        debug!("Removed {} nodes", nodes.len());
        Ok(())
    }

    /// Point the settings panel at `tasks`
    ///
    /// A selection that cannot be edited as one (mixed plugins or non-task
    /// nodes) empties the panel.
    pub fn select_tasks(&mut self, tasks: &[NodeId]) -> Result<PanelState> {
        let selection = TaskSelection::from_nodes(&self.tree, tasks).unwrap_or_default();
        self.panel.switch_to(&mut self.tree, &self.ctx, selection)
    }

    /// What a publish would do
    pub fn summary(&self) -> TreeSummary {
        crate::tree::full_summary(&self.tree)
    }

    /// Whether any node overrides the summary description or thumbnail
    pub fn multiple_values(&self) -> MultipleValues {
        crate::tree::multiple_values(&self.tree, &self.ctx)
    }

    /// Gate input for the current tree; `selected` picks whose description
    /// is checked, the summary description otherwise
    pub fn gate_input(&self, selected: Option<NodeId>) -> Result<GateInput> {
        let description = match selected {
            Some(node) => inherit::resolve_description(&self.tree, &self.ctx, node)?,
            None => self.ctx.summary_description.clone(),
        };
        let all_contexts_have_task = self.tree.top_level().iter().all(|id| {
            self.tree.get(*id).is_ok_and(|n| match &n.kind {
                NodeKind::Context { link } => link.has_task(),
                _ => false,
            })
        });
        Ok(GateInput {
            description,
            last_validation_errors: self.last_validation,
            any_checked: self.tree.any_checked(),
            all_contexts_have_task,
        })
    }

    /// Whether the publish action is enabled, and why not
    pub fn admission(&self, selected: Option<NodeId>) -> Result<Admission> {
        Ok(self.gate.evaluate(&self.gate_input(selected)?))
    }

    /// Whether validation can run
    pub fn can_validate(&self) -> bool {
        self.gate_input(None)
            .is_ok_and(|input| self.gate.can_validate(&input))
    }

    /// Validate every checked task
    pub fn validate(&mut self, sink: &dyn ProgressSink) -> Result<PhaseReport> {
        let report = self.run_validation(&NodeSelection::All, sink)?;
        self.validation_run = !report.cancelled;
        self.last_validation = (!report.cancelled).then_some(report.errors);
        Ok(report)
    }

    /// Validate only `nodes`; does not count as a full validation
    pub fn validate_nodes(
        &mut self,
        nodes: &[NodeId],
        sink: &dyn ProgressSink,
    ) -> Result<PhaseReport> {
        self.run_validation(&NodeSelection::Nodes(nodes.to_vec()), sink)
    }

    fn run_validation(
        &mut self,
        selection: &NodeSelection,
        sink: &dyn ProgressSink,
    ) -> Result<PhaseReport> {
        self.panel.pull(&mut self.tree, &self.ctx)?;
        self.ctx.cancel.reset();
        if *selection == NodeSelection::All {
            self.tree.reset_statuses();
        }

        let mut tracker = StatusTracker::new(sink);
        tracker.begin_run(PhaseExecutor::nodes(&self.tree, selection).len());
        let executor = PhaseExecutor::new(self.ctx.cancel.clone()).standalone(true);
        let report = executor.run(
            &mut self.tree,
            &mut tracker,
            Phase::Validate,
            selection,
            plugin_action(&self.ctx),
        )?;

        if report.cancelled {
            sink.on_message(MessageLevel::Warning, "Processing aborted by user.");
            self.state = RunState::Cancelled;
        } else if report.errors > 0 {
            sink.on_message(
                MessageLevel::Error,
                &format!("Validation Complete. {} issues reported.", report.errors),
            );
            self.state = RunState::Completed;
        } else {
            sink.on_message(MessageLevel::Info, "Validation Complete. All checks passed.");
            self.state = RunState::Completed;
        }
        Ok(report)
    }

    /// Validate (per policy), publish and finalize every checked task
    pub fn publish(
        &mut self,
        sink: &dyn ProgressSink,
        confirm: &dyn PublishConfirmation,
    ) -> Result<RunReport> {
        self.panel.pull(&mut self.tree, &self.ctx)?;
        self.ctx.cancel.reset();
        let options = RunOptions {
            validate_on_publish: self.config.validate_on_publish,
            validated: self.validation_run && self.last_validation == Some(0),
        };

        let mut tracker = StatusTracker::new(sink);
        let report = run_publish(
            &mut self.tree,
            &mut tracker,
            &self.ctx.cancel,
            options,
            confirm,
            plugin_action(&self.ctx),
        )?;

        if let Some(validation) = report.phase(Phase::Validate) {
            self.validation_run = !validation.cancelled;
            self.last_validation = (!validation.cancelled).then_some(validation.errors);
        }
        self.state = report.outcome.state();
        info!("Run finished: {}", report.outcome);
        Ok(report)
    }
}
