//! Editing the settings of several tasks as one unit
//!
//! A selection of tasks can share one settings form when all tasks are
//! bound to interchangeable plugins. The [`SettingsPanel`] keeps the form
//! and the tasks' own settings maps in sync.

use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::plugin::{PublishItem, PublishPlugin};
use crate::tree::ItemTree;
use crate::types::{NodeId, SettingValues, setting_values};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Raised by a plugin that cannot edit several tasks in one form
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("editing multiple tasks at once is not supported")]
pub struct MultiEditUnsupported;

/// Plain model of a settings editor shared by the selected tasks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsForm {
    values: SettingValues,
    mixed: BTreeSet<String>,
}

impl SettingsForm {
    /// Populate from one snapshot per task; keys whose values disagree
    /// are marked as having multiple values
    pub fn merge(&mut self, snapshots: &[SettingValues]) {
        self.values.clear();
        self.mixed.clear();
        let Some((first, rest)) = snapshots.split_first() else {
            return;
        };
        self.values.clone_from(first);
        for snapshot in rest {
            for (key, value) in snapshot {
                match self.values.get(key) {
                    Some(existing) if existing == value => {}
                    Some(_) => {
                        self.mixed.insert(key.clone());
                    }
                    None => {
                        self.values.insert(key.clone(), value.clone());
                        self.mixed.insert(key.clone());
                    }
                }
            }
        }
    }

    /// Value shown for `key`
    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Whether `key` shows "multiple values"
    pub fn is_mixed(&self, key: &str) -> bool {
        self.mixed.contains(key)
    }

    /// User edit: sets the value for every selected task
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        self.mixed.remove(&key);
        self.values.insert(key, value);
    }

    /// Values to write back; untouched mixed keys are left alone
    pub fn edited_values(&self) -> SettingValues {
        self.values
            .iter()
            .filter(|(k, _)| !self.mixed.contains(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Whether `nodes` can be edited together: non-empty, all tasks, and every
/// plugin agrees with the first one's task type
pub fn is_homogeneous(tree: &ItemTree, nodes: &[NodeId]) -> bool {
    let plugins: Option<Vec<&Arc<dyn PublishPlugin>>> = nodes
        .iter()
        .map(|id| tree.get(*id).ok().and_then(|n| n.plugin()))
        .collect();
    match plugins.as_deref() {
        Some([first, rest @ ..]) => rest.iter().all(|p| first.is_same_task_type(&***p)),
        _ => false,
    }
}

/// Homogeneous selection of task nodes
#[derive(Clone, Default)]
pub struct TaskSelection {
    tasks: Vec<NodeId>,
    plugin: Option<Arc<dyn PublishPlugin>>,
}

impl std::fmt::Debug for TaskSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSelection")
            .field("tasks", &self.tasks)
            .field("plugin", &self.plugin.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

impl PartialEq for TaskSelection {
    fn eq(&self, other: &Self) -> bool {
        self.tasks == other.tasks
    }
}

impl TaskSelection {
    /// Empty selection
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a selection; `None` unless the nodes are homogeneous
    pub fn from_nodes(tree: &ItemTree, nodes: &[NodeId]) -> Option<Self> {
        if !is_homogeneous(tree, nodes) {
            return None;
        }
        let plugin = tree.get(*nodes.first()?).ok()?.plugin()?.clone();
        Some(Self {
            tasks: nodes.to_vec(),
            plugin: Some(plugin),
        })
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Selected task nodes
    pub fn tasks(&self) -> &[NodeId] {
        &self.tasks
    }

    /// Plugin shared by the selection
    pub fn plugin(&self) -> Option<&Arc<dyn PublishPlugin>> {
        self.plugin.as_ref()
    }

    /// Whether two selections can share one form; empty selections only
    /// match each other
    pub fn is_same_task_type(&self, other: &Self) -> bool {
        match (&self.plugin, &other.plugin) {
            (Some(a), Some(b)) => a.is_same_task_type(&**b),
            (None, None) => true,
            _ => false,
        }
    }

    fn items(&self, tree: &ItemTree, ctx: &RunContext) -> Result<Vec<PublishItem>> {
        self.tasks
            .iter()
            .map(|id| PublishItem::from_tree(tree, ctx, *id))
            .collect()
    }
}

/// What the settings area currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// No task selection
    Empty,
    /// Form populated for the current selection
    Editing,
    /// Plugin refused a multi-task selection; shown as read-only
    MultiEditNotSupported,
}

/// Settings editor state for the current task selection
#[derive(Debug)]
pub struct SettingsPanel {
    current: TaskSelection,
    form: SettingsForm,
    state: PanelState,
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self {
            current: TaskSelection::empty(),
            form: SettingsForm::default(),
            state: PanelState::Empty,
        }
    }
}

impl SettingsPanel {
    /// Create an empty panel
    pub fn new() -> Self {
        Self::default()
    }

    /// Current display state
    pub const fn state(&self) -> PanelState {
        self.state
    }

    /// Selection the form edits
    pub const fn selection(&self) -> &TaskSelection {
        &self.current
    }

    /// Shared form
    pub const fn form(&self) -> &SettingsForm {
        &self.form
    }

    /// Shared form, for user edits
    pub fn form_mut(&mut self) -> &mut SettingsForm {
        &mut self.form
    }

    /// Write the form back into every selected task's settings
    pub fn pull(&self, tree: &mut ItemTree, ctx: &RunContext) -> Result<()> {
        let Some(plugin) = self.current.plugin() else {
            return Ok(());
        };
        let values = if plugin.has_custom_ui() {
            let items = self.current.items(tree, ctx)?;
            plugin.get_ui_settings(&self.form, &items)
        } else {
            SettingValues::new()
        };
        debug!("Saving {} settings into {} tasks", values.len(), self.current.tasks.len());

        for task in &self.current.tasks {
            let settings = tree
                .get_mut(*task)?
                .settings_mut()
                .ok_or(Error::NotATask(*task))?;
            for (key, value) in &values {
                match settings.get_mut(key) {
                    Some(setting) => setting.value = value.clone(),
                    None => warn!("Task {task} has no setting {key:?}"),
                }
            }
        }
        Ok(())
    }

    /// Populate the form from `selection`'s settings; `false` when the
    /// plugin refuses to edit the selection as one
    pub fn push(
        &mut self,
        tree: &ItemTree,
        ctx: &RunContext,
        selection: &TaskSelection,
    ) -> Result<bool> {
        let Some(plugin) = selection.plugin() else {
            return Ok(true);
        };
        let snapshots: Vec<SettingValues> = selection
            .tasks
            .iter()
            .map(|id| {
                tree.get(*id)?
                    .settings()
                    .map(setting_values)
                    .ok_or(Error::NotATask(*id))
            })
            .collect::<Result<_>>()?;

        if plugin.has_custom_ui() {
            let items = selection.items(tree, ctx)?;
            if let Err(e) = plugin.set_ui_settings(&mut self.form, &snapshots, &items) {
                debug!("{}: {e}", plugin.name());
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Switch the panel to `selection`, saving the current one first
    pub fn switch_to(
        &mut self,
        tree: &mut ItemTree,
        ctx: &RunContext,
        selection: TaskSelection,
    ) -> Result<PanelState> {
        if self.current == selection && !selection.is_empty() {
            return Ok(self.state);
        }
        if !self.current.is_empty() {
            self.pull(tree, ctx)?;
        }
        if selection.is_empty() {
            self.current = TaskSelection::empty();
            self.form = SettingsForm::default();
            self.state = PanelState::Empty;
            return Ok(self.state);
        }

        let reuse = !self.current.is_empty() && self.current.is_same_task_type(&selection);
        if !reuse {
            if let Some(plugin) = selection.plugin() {
                debug!("Building a settings form for {}", plugin.name());
                let items = selection.items(tree, ctx)?;
                self.form = plugin.create_settings_form(&items);
            }
        }

        if self.push(tree, ctx, &selection)? {
            self.current = selection;
            self.state = PanelState::Editing;
        } else {
            self.current = TaskSelection::empty();
            self.state = PanelState::MultiEditNotSupported;
        }
        Ok(self.state)
    }
}
