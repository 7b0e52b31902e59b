//! Arena-backed item tree
//!
//! Nodes live in a flat table addressed by [`NodeId`]; parents are referenced
//! by index and children by an ordered list. A hidden root owns the
//! top-level nodes. Slots of removed nodes are never reused, so a stale id
//! reports [`Error::DetachedNode`] instead of aliasing a newer node.

use crate::error::{Error, Result};
use crate::plugin::PublishPlugin;
use crate::types::{ContextLink, NodeId, Properties, Settings, Status, Thumbnail};
use std::sync::Arc;
use tracing::debug;

const ROOT: NodeId = NodeId(0);

/// What a node represents
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Hidden tree root
    Root,
    /// Groups items publishing to one task/entity link
    Context {
        /// Task/entity link
        link: ContextLink,
    },
    /// One publishable unit
    Item {
        /// Item type used for plugin filter matching
        item_type: String,
    },
    /// Leaf bound to exactly one plugin
    Task {
        /// Plugin resolved at collect time
        plugin: Arc<dyn PublishPlugin>,
        /// Task's own copy of the plugin settings
        settings: Settings,
    },
}

/// One element of the publish tree
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Display label
    pub name: String,
    /// Node kind
    pub kind: NodeKind,
    /// Whether the node participates in phase execution
    pub checked: bool,
    pub(crate) status: Status,
    pub(crate) status_message: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) inherit_description: bool,
    pub(crate) thumbnail: Option<Thumbnail>,
    pub(crate) thumbnail_explicit: bool,
    /// Free-form bag used by plugins
    pub properties: Properties,
    /// Whether the user may change the node's task/entity link
    pub context_change_allowed: bool,
    /// Externally loaded; survives a non-persistent clear
    pub persistent: bool,
}

impl Node {
    fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: ROOT,
            parent: None,
            children: Vec::new(),
            name: name.into(),
            kind,
            checked: true,
            status: Status::Ready,
            status_message: None,
            description: None,
            inherit_description: true,
            thumbnail: None,
            thumbnail_explicit: false,
            properties: Properties::new(),
            context_change_allowed: true,
            persistent: false,
        }
    }

    /// A context node bound to `link`
    pub fn context(link: ContextLink) -> Self {
        Self::new(link.to_string(), NodeKind::Context { link })
    }

    /// An item node of `item_type`
    pub fn item(name: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self::new(
            name,
            NodeKind::Item {
                item_type: item_type.into(),
            },
        )
    }

    /// A task node bound to `plugin`, seeded with the plugin's default settings
    pub fn task(plugin: Arc<dyn PublishPlugin>) -> Self {
        let settings = plugin.settings();
        let name = plugin.name().to_string();
        Self::new(name, NodeKind::Task { plugin, settings })
    }

    /// Set the initial checked state
    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Mark as externally loaded
    #[must_use]
    pub const fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Set the node's own description; empty text keeps inheriting
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        match description.filter(|d| !d.is_empty()) {
            Some(d) => {
                self.description = Some(d);
                self.inherit_description = false;
            }
            None => {
                self.description = None;
                self.inherit_description = true;
            }
        }
        self
    }

    /// Replace the property bag
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Identity within the tree
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Owning node, `None` for top-level nodes
    pub fn parent(&self) -> Option<NodeId> {
        self.parent.filter(|p| *p != ROOT)
    }

    /// Ordered children
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Current status
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Message recorded with the current status
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Own description (ignored while inheriting)
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the description is resolved from ancestors
    pub const fn inherits_description(&self) -> bool {
        self.inherit_description
    }

    /// Own thumbnail (ignored unless explicit)
    pub const fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    /// Whether the thumbnail was set on this node
    pub const fn thumbnail_explicit(&self) -> bool {
        self.thumbnail_explicit
    }

    /// Whether this is a task node
    pub const fn is_task(&self) -> bool {
        matches!(self.kind, NodeKind::Task { .. })
    }

    /// Whether this is an item node
    pub const fn is_item(&self) -> bool {
        matches!(self.kind, NodeKind::Item { .. })
    }

    /// Whether this is a context node
    pub const fn is_context(&self) -> bool {
        matches!(self.kind, NodeKind::Context { .. })
    }

    /// Plugin bound to a task node
    pub fn plugin(&self) -> Option<&Arc<dyn PublishPlugin>> {
        match &self.kind {
            NodeKind::Task { plugin, .. } => Some(plugin),
            _ => None,
        }
    }

    /// Settings of a task node
    pub const fn settings(&self) -> Option<&Settings> {
        match &self.kind {
            NodeKind::Task { settings, .. } => Some(settings),
            _ => None,
        }
    }

    /// Mutable settings of a task node
    pub fn settings_mut(&mut self) -> Option<&mut Settings> {
        match &mut self.kind {
            NodeKind::Task { settings, .. } => Some(settings),
            _ => None,
        }
    }

    /// Icon name used in progress frames
    pub fn icon(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Root => None,
            NodeKind::Context { .. } => Some("context".to_string()),
            NodeKind::Item { .. } => Some("item".to_string()),
            NodeKind::Task { plugin, .. } => {
                Some(plugin.icon().unwrap_or("task").to_string())
            }
        }
    }
}

/// Ownership hierarchy of publishable nodes
#[derive(Debug, Clone)]
pub struct ItemTree {
    nodes: Vec<Option<Node>>,
}

impl Default for ItemTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemTree {
    /// Create an empty tree
    pub fn new() -> Self {
        let mut root = Node::new("root", NodeKind::Root);
        root.checked = false;
        Self {
            nodes: vec![Some(root)],
        }
    }

    /// The hidden root; pass it to [`ItemTree::add`] to create top-level nodes
    pub const fn root(&self) -> NodeId {
        ROOT
    }

    /// Whether `id` refers to a live node
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(Option::is_some)
    }

    /// Look up a node
    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(Error::DetachedNode(id))
    }

    /// Look up a node mutably
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Error::DetachedNode(id))
    }

    /// Append `node` to `parent`'s children
    pub fn add(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        if !self.is_attached(parent) {
            return Err(Error::InvalidParent(parent));
        }
        let id = NodeId(self.nodes.len());
        node.id = id;
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(Some(node));
        self.get_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Detach `id` and its whole subtree
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == ROOT {
            return Err(Error::InvalidParent(id));
        }
        let parent = self.get(id)?.parent;
        let subtree = self.subtree(id);
        if let Some(parent) = parent
            .and_then(|p| self.nodes.get_mut(p.0))
            .and_then(Option::as_mut)
        {
            parent.children.retain(|c| *c != id);
        }
        for node in subtree {
            self.nodes[node.0] = None;
        }
        Ok(())
    }

    /// Remove session-derived items; with `persistent` remove everything
    ///
    /// A persistent item keeps its whole subtree. Context nodes left
    /// without children are removed as well.
    pub fn clear(&mut self, persistent: bool) {
        let doomed: Vec<NodeId> = self
            .iter()
            .filter(|id| {
                self.get(*id).is_ok_and(|n| {
                    n.is_item()
                        && (persistent
                            || (!n.persistent && !self.has_persistent_ancestor(*id)))
                })
            })
            .collect();
        for id in doomed {
            // Descendants of an already-removed node are gone by now
            if self.is_attached(id) {
                let _ = self.remove(id);
            }
        }
        self.prune_empty_contexts();
        debug!("Cleared tree (persistent: {persistent}), {} nodes left", self.len());
    }

    fn has_persistent_ancestor(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .iter()
            .any(|a| self.get(*a).is_ok_and(|n| n.persistent))
    }

    /// Remove top-level contexts without children
    pub(crate) fn prune_empty_contexts(&mut self) {
        let empty: Vec<NodeId> = self
            .top_level()
            .iter()
            .copied()
            .filter(|id| {
                self.get(*id)
                    .is_ok_and(|n| n.is_context() && n.children.is_empty())
            })
            .collect();
        for id in empty {
            let _ = self.remove(id);
        }
    }

    /// Owning node, `None` for top-level nodes and detached ids
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).ok().and_then(Node::parent)
    }

    /// Ordered children of `id`
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Top-level nodes in order
    pub fn top_level(&self) -> &[NodeId] {
        self.children(ROOT)
    }

    /// Strict ancestors of `id`, nearest first, excluding the hidden root
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Depth below the hidden root (top-level nodes are at depth 1)
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len() + 1
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Strict descendants of `id` in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut all = self.subtree(id);
        all.remove(0);
        all
    }

    /// All nodes in pre-order: parents before children, siblings in
    /// insertion order
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(ROOT).into_iter()
    }

    /// Number of live nodes, excluding the hidden root
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count() - 1
    }

    /// Whether the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.top_level().is_empty()
    }

    /// Whether `id` is processed directly by a phase: a task, or an item
    /// without task children
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.get(id).is_ok_and(|node| match node.kind {
            NodeKind::Task { .. } => true,
            NodeKind::Item { .. } => !node
                .children
                .iter()
                .any(|c| self.get(*c).is_ok_and(Node::is_task)),
            _ => false,
        })
    }

    /// Checked leaves in pre-order
    pub fn checked_leaves(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|id| self.get(*id).is_ok_and(|n| n.checked) && self.is_leaf(*id))
            .collect()
    }

    /// Whether any node is checked
    pub fn any_checked(&self) -> bool {
        self.iter().any(|id| self.get(id).is_ok_and(|n| n.checked))
    }

    /// Check or uncheck `id` with its subtree, then re-derive ancestors
    /// (an ancestor is checked while any of its children is)
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<()> {
        self.get(id)?;
        for node in self.subtree(id) {
            self.get_mut(node)?.checked = checked;
        }
        for ancestor in self.ancestors(id) {
            let any = self
                .children(ancestor)
                .iter()
                .any(|c| self.get(*c).is_ok_and(|n| n.checked));
            self.get_mut(ancestor)?.checked = any;
        }
        Ok(())
    }

    /// Check or uncheck every node
    pub fn check_all(&mut self, checked: bool) {
        let ids: Vec<NodeId> = self.iter().collect();
        for id in ids {
            if let Ok(node) = self.get_mut(id) {
                node.checked = checked;
            }
        }
    }

    /// Reset every node to `Ready` before a new run
    pub fn reset_statuses(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.status = Status::Ready;
            node.status_message = None;
        }
    }

    /// Task/entity link that applies to `id` (its own or nearest context's)
    pub fn context_of(&self, id: NodeId) -> Option<&ContextLink> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| match self.get(n).ok().map(|n| &n.kind) {
                Some(NodeKind::Context { link }) => Some(link),
                _ => None,
            })
    }

    /// Top-level context node bound to `link`, created at the end if missing
    pub fn find_or_create_context(&mut self, link: &ContextLink) -> Result<NodeId> {
        let existing = self.top_level().iter().copied().find(|id| {
            matches!(self.get(*id).map(|n| &n.kind), Ok(NodeKind::Context { link: l }) if l == link)
        });
        match existing {
            Some(id) => Ok(id),
            None => self.add(ROOT, Node::context(link.clone())),
        }
    }

    /// Move a top-level item to the context bound to `link`
    ///
    /// The item keeps its subtree and is appended to the target context; a
    /// context left empty is removed.
    pub fn set_item_context(&mut self, item: NodeId, link: &ContextLink) -> Result<()> {
        let node = self.get(item)?;
        if !node.is_item() {
            return Err(Error::NotAnItem(item));
        }
        if !node.context_change_allowed {
            return Err(Error::ContextChangeNotAllowed(item));
        }
        let old_parent = node.parent.ok_or(Error::DetachedNode(item))?;
        if !self.get(old_parent)?.is_context() {
            // Nested items follow their parent item
            return Err(Error::ContextChangeNotAllowed(item));
        }
        if self.context_of(old_parent) == Some(link) {
            return Ok(());
        }

        let target = self.find_or_create_context(link)?;
        self.get_mut(old_parent)?.children.retain(|c| *c != item);
        self.get_mut(target)?.children.push(item);
        self.get_mut(item)?.parent = Some(target);
        debug!("Moved item {item} to context {link}");

        if self.children(old_parent).is_empty() {
            self.remove(old_parent)?;
        }
        Ok(())
    }

    /// Move every item that allows it to `link`; returns how many moved
    pub fn set_context_for_all(&mut self, link: &ContextLink) -> Result<usize> {
        let items: Vec<NodeId> = self
            .top_level()
            .iter()
            .flat_map(|ctx| self.children(*ctx).iter().copied())
            .filter(|id| {
                self.get(*id)
                    .is_ok_and(|n| n.is_item() && n.context_change_allowed)
            })
            .collect();
        let mut moved = 0;
        for item in items {
            if self.context_of(item) != Some(link) {
                self.set_item_context(item, link)?;
                moved += 1;
            }
        }
        Ok(moved)
    }
}
