//! Description and thumbnail inheritance
//!
//! A node that does not set its own description shows the description of
//! its nearest ancestor that does, or the session-wide summary description
//! when no ancestor does. Thumbnails resolve the same way.

use super::ItemTree;
use crate::context::RunContext;
use crate::error::Result;
use crate::types::{NodeId, Thumbnail};

/// Nearest strict ancestor with its own description; `None` means the
/// summary description applies
pub fn inherited_from(tree: &ItemTree, node: NodeId) -> Result<Option<NodeId>> {
    tree.get(node)?;
    Ok(tree
        .ancestors(node)
        .into_iter()
        .find(|a| tree.get(*a).is_ok_and(|n| !n.inherit_description)))
}

/// Effective description of `node`
pub fn resolve_description(tree: &ItemTree, ctx: &RunContext, node: NodeId) -> Result<String> {
    let own = tree.get(node)?;
    if !own.inherit_description {
        return Ok(own.description.clone().unwrap_or_default());
    }
    match inherited_from(tree, node)? {
        Some(ancestor) => Ok(tree.get(ancestor)?.description.clone().unwrap_or_default()),
        None => Ok(ctx.summary_description.clone()),
    }
}

/// Set `node`'s description and return what it now resolves to
///
/// Empty text makes the node inherit again; anything else is stored
/// verbatim. Other nodes keep their flags but may resolve differently.
pub fn set_description(
    tree: &mut ItemTree,
    ctx: &RunContext,
    node: NodeId,
    text: &str,
) -> Result<String> {
    let target = tree.get_mut(node)?;
    if text.is_empty() {
        target.inherit_description = true;
        target.description = None;
    } else {
        target.inherit_description = false;
        target.description = Some(text.to_string());
    }
    resolve_description(tree, ctx, node)
}

/// Nearest strict ancestor with an explicit thumbnail
pub fn thumbnail_inherited_from(tree: &ItemTree, node: NodeId) -> Result<Option<NodeId>> {
    tree.get(node)?;
    Ok(tree
        .ancestors(node)
        .into_iter()
        .find(|a| tree.get(*a).is_ok_and(|n| n.thumbnail_explicit)))
}

/// Effective thumbnail of `node`
pub fn resolve_thumbnail(
    tree: &ItemTree,
    ctx: &RunContext,
    node: NodeId,
) -> Result<Option<Thumbnail>> {
    let own = tree.get(node)?;
    if own.thumbnail_explicit {
        return Ok(own.thumbnail.clone());
    }
    match thumbnail_inherited_from(tree, node)? {
        Some(ancestor) => Ok(tree.get(ancestor)?.thumbnail.clone()),
        None => Ok(ctx.summary_thumbnail.clone()),
    }
}

/// Set or clear `node`'s own thumbnail
pub fn set_thumbnail(
    tree: &mut ItemTree,
    node: NodeId,
    thumbnail: Option<Thumbnail>,
) -> Result<()> {
    let target = tree.get_mut(node)?;
    target.thumbnail_explicit = thumbnail.is_some();
    target.thumbnail = thumbnail;
    Ok(())
}

/// Set the summary thumbnail; a new image resets every node to inherit it
pub fn set_summary_thumbnail(
    tree: &mut ItemTree,
    ctx: &mut RunContext,
    thumbnail: Option<Thumbnail>,
) {
    let broadcast = thumbnail.is_some();
    ctx.summary_thumbnail = thumbnail;
    if broadcast {
        let ids: Vec<NodeId> = tree.iter().collect();
        for id in ids {
            if let Ok(node) = tree.get_mut(id) {
                node.thumbnail = None;
                node.thumbnail_explicit = false;
            }
        }
    }
}

/// Make every top-level node inherit the summary description again
pub fn reset_top_level_descriptions(tree: &mut ItemTree) {
    let top: Vec<NodeId> = tree.top_level().to_vec();
    for id in top {
        if let Ok(node) = tree.get_mut(id) {
            node.inherit_description = true;
            node.description = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;
    use crate::types::ContextLink;

    fn chain() -> (ItemTree, RunContext, NodeId, NodeId, NodeId) {
        let mut tree = ItemTree::new();
        let ctx_node = tree
            .add(tree.root(), Node::context(ContextLink::new("sh010", "comp")))
            .unwrap();
        let item = tree.add(ctx_node, Node::item("x", "file.exr")).unwrap();
        let child = tree.add(item, Node::item("x.1", "file.exr")).unwrap();
        let mut ctx = RunContext::new("CL ");
        ctx.summary_description = "CL 100001 - base".to_string();
        (tree, ctx, ctx_node, item, child)
    }

    #[test]
    fn test_falls_back_to_summary() {
        let (tree, ctx, _, item, child) = chain();
        assert_eq!(resolve_description(&tree, &ctx, item).unwrap(), "CL 100001 - base");
        assert_eq!(resolve_description(&tree, &ctx, child).unwrap(), "CL 100001 - base");
        assert_eq!(inherited_from(&tree, child).unwrap(), None);
    }

    #[test]
    fn test_nearest_non_inheriting_ancestor_wins() {
        let (mut tree, ctx, ctx_node, item, child) = chain();
        set_description(&mut tree, &ctx, ctx_node, "CL 100002 - fix").unwrap();
        assert_eq!(resolve_description(&tree, &ctx, child).unwrap(), "CL 100002 - fix");

        set_description(&mut tree, &ctx, item, "CL 100003 - item").unwrap();
        assert_eq!(resolve_description(&tree, &ctx, child).unwrap(), "CL 100003 - item");
        assert_eq!(inherited_from(&tree, child).unwrap(), Some(item));
    }

    #[test]
    fn test_empty_text_reinherits() {
        let (mut tree, ctx, ctx_node, item, _) = chain();
        set_description(&mut tree, &ctx, ctx_node, "CL 100002 - fix").unwrap();
        set_description(&mut tree, &ctx, item, "CL 100003 - own").unwrap();

        let resolved = set_description(&mut tree, &ctx, item, "").unwrap();
        assert_eq!(resolved, "CL 100002 - fix");
        assert!(tree.get(item).unwrap().inherits_description());
        // The context keeps its own flag
        assert!(!tree.get(ctx_node).unwrap().inherits_description());
    }

    #[test]
    fn test_whitespace_is_stored_verbatim() {
        let (mut tree, ctx, _, item, child) = chain();

        let resolved = set_description(&mut tree, &ctx, item, " ").unwrap();
        assert_eq!(resolved, " ");
        assert!(!tree.get(item).unwrap().inherits_description());
        assert_eq!(resolve_description(&tree, &ctx, child).unwrap(), " ");
        assert_eq!(inherited_from(&tree, child).unwrap(), Some(item));
    }

    #[test]
    fn test_thumbnail_inheritance_and_broadcast() {
        let (mut tree, mut ctx, _, item, child) = chain();
        let own = Thumbnail::new(vec![1, 2, 3]);
        set_thumbnail(&mut tree, item, Some(own.clone())).unwrap();
        assert_eq!(resolve_thumbnail(&tree, &ctx, child).unwrap(), Some(own));

        let summary = Thumbnail::new(vec![9]);
        set_summary_thumbnail(&mut tree, &mut ctx, Some(summary.clone()));
        assert!(!tree.get(item).unwrap().thumbnail_explicit());
        assert_eq!(resolve_thumbnail(&tree, &ctx, child).unwrap(), Some(summary));
    }

    #[test]
    fn test_reset_top_level_descriptions() {
        let (mut tree, ctx, ctx_node, _, child) = chain();
        set_description(&mut tree, &ctx, ctx_node, "CL 100002 - fix").unwrap();
        reset_top_level_descriptions(&mut tree);
        assert_eq!(resolve_description(&tree, &ctx, child).unwrap(), "CL 100001 - base");
    }
}
