//! Collect pass
//!
//! Turns item descriptors from a [`Collector`] into context, item and task
//! nodes. Items are grouped under one context node per distinct task/entity
//! link, in the order the links are first seen. Plugins are matched to each
//! item by their type filters and asked whether to create a task.

mod manifest;

pub use manifest::ManifestCollector;

use crate::context::RunContext;
use crate::error::Result;
use crate::plugin::{PublishItem, PublishPlugin, matches_filters};
use crate::tree::{ItemTree, Node, NodeKind};
use crate::types::{ContextLink, NodeId, Properties};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, trace};

/// Something a collector found
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDescriptor {
    /// Display name
    pub name: String,
    /// Item type matched against plugin filters
    #[serde(rename = "type")]
    pub item_type: String,
    /// Task/entity link; items without one share an unlinked context
    #[serde(default)]
    pub context: Option<ContextLink>,
    /// Free-form properties handed to plugins
    #[serde(default)]
    pub properties: Properties,
    /// Initial checked state
    #[serde(default = "default_true")]
    pub checked: bool,
    /// Externally loaded item
    #[serde(default)]
    pub persistent: bool,
    /// Whether the user may move the item to another context
    #[serde(default = "default_true")]
    pub context_change_allowed: bool,
    /// Item's own description; absent to inherit
    #[serde(default)]
    pub description: Option<String>,
    /// Nested items
    #[serde(default)]
    pub children: Vec<ItemDescriptor>,
}

const fn default_true() -> bool {
    true
}

impl ItemDescriptor {
    /// Descriptor with defaults for everything but name and type
    pub fn new(name: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_type: item_type.into(),
            context: None,
            properties: Properties::new(),
            checked: true,
            persistent: false,
            context_change_allowed: true,
            description: None,
            children: Vec::new(),
        }
    }

    /// Set the task/entity link
    #[must_use]
    pub fn with_context(mut self, link: ContextLink) -> Self {
        self.context = Some(link);
        self
    }

    /// Set one property
    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Add a nested item
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }
}

/// Source of item descriptors (a host session, a manifest file, ...)
pub trait Collector {
    /// Find everything that can be published
    fn collect(&self) -> anyhow::Result<Vec<ItemDescriptor>>;
}

/// What a collect pass added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Item nodes created
    pub items: Vec<NodeId>,
    /// Task nodes created
    pub tasks: usize,
    /// Persistent descriptors skipped because the item is already loaded
    pub skipped: usize,
}

/// Add `descriptors` to `tree`, creating tasks for every accepting plugin
pub fn collect_into(
    tree: &mut ItemTree,
    ctx: &RunContext,
    plugins: &[Arc<dyn PublishPlugin>],
    descriptors: &[ItemDescriptor],
) -> Result<CollectReport> {
    let mut report = CollectReport::default();
    for descriptor in descriptors {
        if descriptor.persistent && already_loaded(tree, descriptor) {
            debug!("{} is already loaded, skipping", descriptor.name);
            report.skipped += 1;
            continue;
        }
        let link = descriptor.context.clone().unwrap_or_default();
        let context = tree.find_or_create_context(&link)?;
        add_item(tree, ctx, plugins, context, descriptor, &mut report)?;
        derive_checked(tree, context)?;
    }
    debug!(
        "Collected {} items with {} tasks",
        report.items.len(),
        report.tasks
    );
    Ok(report)
}

fn add_item(
    tree: &mut ItemTree,
    ctx: &RunContext,
    plugins: &[Arc<dyn PublishPlugin>],
    parent: NodeId,
    descriptor: &ItemDescriptor,
    report: &mut CollectReport,
) -> Result<NodeId> {
    let mut node = Node::item(&descriptor.name, &descriptor.item_type)
        .with_checked(descriptor.checked)
        .with_persistent(descriptor.persistent)
        .with_description(descriptor.description.clone())
        .with_properties(descriptor.properties.clone());
    node.context_change_allowed = descriptor.context_change_allowed;
    let item = tree.add(parent, node)?;
    report.items.push(item);

    for plugin in plugins {
        if !matches_filters(&plugin.item_filters(), &descriptor.item_type) {
            continue;
        }
        let mut view = PublishItem::from_tree(tree, ctx, item)?;
        let acceptance = plugin.accept(&plugin.settings(), &mut view);
        view.write_back(tree, item)?;
        if !acceptance.accepted {
            trace!("{} declined {}", plugin.name(), descriptor.name);
            continue;
        }
        let checked = descriptor.checked && acceptance.checked;
        tree.add(item, Node::task(Arc::clone(plugin)).with_checked(checked))?;
        report.tasks += 1;
        trace!("{} accepted {}", plugin.name(), descriptor.name);
    }

    for child in &descriptor.children {
        add_item(tree, ctx, plugins, item, child, report)?;
    }
    derive_checked(tree, item)?;
    Ok(item)
}

// A parent with children is checked while any child is
fn derive_checked(tree: &mut ItemTree, id: NodeId) -> Result<()> {
    let children = tree.children(id);
    if children.is_empty() {
        return Ok(());
    }
    let any = children
        .iter()
        .any(|c| tree.get(*c).is_ok_and(|n| n.checked));
    tree.get_mut(id)?.checked = any;
    Ok(())
}

fn already_loaded(tree: &ItemTree, descriptor: &ItemDescriptor) -> bool {
    tree.iter().any(|id| {
        tree.get(id).is_ok_and(|n| {
            n.persistent
                && n.name == descriptor.name
                && matches!(
                    &n.kind,
                    NodeKind::Item { item_type } if *item_type == descriptor.item_type
                )
        })
    })
}
