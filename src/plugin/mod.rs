//! Publish plugins
//!
//! A plugin implements the validate/publish/finalize behavior for one
//! category of item. Plugins are matched to items once during the collect
//! pass and stored on the resulting task nodes.

mod copy;
mod filters;

pub use copy::CopyFilePlugin;
pub use filters::matches_filters;

use crate::context::RunContext;
use crate::error::Result;
use crate::selection::{MultiEditUnsupported, SettingsForm};
use crate::tree::{ItemTree, NodeKind, inherit};
use crate::types::{ContextLink, NodeId, Properties, SettingValues, Settings, Thumbnail};
use std::fmt;

/// The item a task operates on, as handed to its plugin
///
/// Built from the tree before each plugin call; `properties` and
/// `context_change_allowed` are written back afterwards.
#[derive(Debug, Clone, Default)]
pub struct PublishItem {
    /// Display name of the item
    pub name: String,
    /// Item type used for filter matching (e.g. `maya.session.render`)
    pub item_type: String,
    /// Task/entity link the item publishes to
    pub context: Option<ContextLink>,
    /// Effective description (after inheritance)
    pub description: Option<String>,
    /// Effective thumbnail (after inheritance)
    pub thumbnail: Option<Thumbnail>,
    /// Item properties; mutations persist on the node
    pub properties: Properties,
    /// Properties of the parent item, if the item is nested
    pub parent_properties: Properties,
    /// Whether the user may change the item's context
    pub context_change_allowed: bool,
}

impl PublishItem {
    /// Node carrying the item for `node`: a task's parent item, or the
    /// node itself
    pub fn item_node(tree: &ItemTree, node: NodeId) -> Result<NodeId> {
        let current = tree.get(node)?;
        match (current.is_task(), current.parent()) {
            (true, Some(parent)) => Ok(parent),
            _ => Ok(node),
        }
    }

    /// Build the view of the item `node` operates on
    pub fn from_tree(tree: &ItemTree, ctx: &RunContext, node: NodeId) -> Result<Self> {
        let item_id = Self::item_node(tree, node)?;
        let item = tree.get(item_id)?;
        let item_type = match &item.kind {
            NodeKind::Item { item_type } => item_type.clone(),
            _ => String::new(),
        };
        let parent_properties = item
            .parent()
            .and_then(|p| tree.get(p).ok())
            .filter(|p| p.is_item())
            .map(|p| p.properties.clone())
            .unwrap_or_default();

        Ok(Self {
            name: item.name.clone(),
            item_type,
            context: tree.context_of(item_id).cloned(),
            description: Some(inherit::resolve_description(tree, ctx, item_id)?),
            thumbnail: inherit::resolve_thumbnail(tree, ctx, item_id)?,
            properties: item.properties.clone(),
            parent_properties,
            context_change_allowed: item.context_change_allowed,
        })
    }

    /// Store plugin-made changes back on the item node
    pub fn write_back(self, tree: &mut ItemTree, node: NodeId) -> Result<()> {
        let item_id = Self::item_node(tree, node)?;
        let item = tree.get_mut(item_id)?;
        item.properties = self.properties;
        item.context_change_allowed = self.context_change_allowed;
        Ok(())
    }
}

/// Answer of [`PublishPlugin::accept`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acceptance {
    /// Whether the plugin creates a task for the item
    pub accepted: bool,
    /// Initial checked state of the task
    pub checked: bool,
}

impl Acceptance {
    /// Accept the item, with the task initially checked or not
    pub const fn accepted(checked: bool) -> Self {
        Self {
            accepted: true,
            checked,
        }
    }

    /// Decline the item
    pub const fn rejected() -> Self {
        Self {
            accepted: false,
            checked: false,
        }
    }
}

/// Answer of [`PublishPlugin::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Whether the task may be published
    pub passed: bool,
    /// Reason for a failure
    pub message: Option<String>,
}

impl Validation {
    /// Validation passed
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: None,
        }
    }

    /// Validation failed with a reason
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
        }
    }
}

/// Per-item-type publish behavior
///
/// `publish` signals failure by returning `Err`, which aborts the phase.
/// `validate` failures are reported and counted; `finalize` may report a
/// non-fatal error through `Ok(Some(message))`.
pub trait PublishPlugin: Send + Sync {
    /// Display name, also the default task-type identity
    fn name(&self) -> &str;

    /// Icon name shown in progress output
    fn icon(&self) -> Option<&str> {
        None
    }

    /// Glob patterns over item types this plugin is interested in
    fn item_filters(&self) -> Vec<String>;

    /// Default settings copied onto every task created by this plugin
    fn settings(&self) -> Settings {
        Settings::new()
    }

    /// Decide whether to create a task for `item`
    fn accept(&self, _settings: &Settings, _item: &mut PublishItem) -> Acceptance {
        Acceptance::accepted(true)
    }

    /// Check that the item can be published
    fn validate(&self, settings: &Settings, item: &mut PublishItem) -> anyhow::Result<Validation>;

    /// Publish the item
    fn publish(&self, settings: &Settings, item: &mut PublishItem) -> anyhow::Result<()>;

    /// Post-publish step; `Ok(Some(msg))` reports a non-fatal error
    fn finalize(
        &self,
        _settings: &Settings,
        _item: &mut PublishItem,
    ) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    /// Whether tasks of `other` can be edited together with tasks of `self`
    fn is_same_task_type(&self, other: &dyn PublishPlugin) -> bool {
        self.name() == other.name()
    }

    /// Whether the plugin exposes an editable settings form
    fn has_custom_ui(&self) -> bool {
        false
    }

    /// Build the settings form shown for a selection of tasks
    fn create_settings_form(&self, _items: &[PublishItem]) -> SettingsForm {
        SettingsForm::default()
    }

    /// Read the form back into plain setting values
    fn get_ui_settings(&self, form: &SettingsForm, _items: &[PublishItem]) -> SettingValues {
        form.edited_values()
    }

    /// Populate the form from one settings snapshot per selected task
    fn set_ui_settings(
        &self,
        form: &mut SettingsForm,
        settings: &[SettingValues],
        _items: &[PublishItem],
    ) -> std::result::Result<(), MultiEditUnsupported> {
        form.merge(settings);
        Ok(())
    }
}

impl fmt::Debug for dyn PublishPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishPlugin")
            .field("name", &self.name())
            .finish()
    }
}
