//! Summary view over the whole tree

use super::{ItemTree, NodeKind};
use crate::context::RunContext;
use crate::types::NodeId;

/// What the tree will do when published
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSummary {
    /// Number of checked tasks
    pub task_count: usize,
    /// One line per context and per item with checked tasks
    pub lines: Vec<String>,
}

/// Whether any node overrides the summary description or thumbnail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultipleValues {
    /// Some node carries a description other than the summary one
    pub description: bool,
    /// Some node carries an explicit thumbnail
    pub thumbnail: bool,
}

/// Summarize checked tasks grouped by context and item
pub fn full_summary(tree: &ItemTree) -> TreeSummary {
    let mut summary = TreeSummary::default();
    for top in tree.top_level() {
        let Ok(node) = tree.get(*top) else { continue };
        let mut block = Vec::new();
        collect_items(tree, *top, &mut block, &mut summary.task_count);
        if block.is_empty() {
            continue;
        }
        if node.is_context() {
            summary.lines.push(node.name.clone());
        }
        summary.lines.extend(block);
    }
    summary
}

fn collect_items(tree: &ItemTree, parent: NodeId, lines: &mut Vec<String>, count: &mut usize) {
    for child in tree.children(parent) {
        let Ok(node) = tree.get(*child) else { continue };
        if !node.is_item() || !node.checked {
            continue;
        }
        let tasks: Vec<&str> = tree
            .children(*child)
            .iter()
            .filter_map(|t| tree.get(*t).ok())
            .filter(|t| t.checked && matches!(t.kind, NodeKind::Task { .. }))
            .map(|t| t.name.as_str())
            .collect();
        if !tasks.is_empty() {
            *count += tasks.len();
            let indent = "  ".repeat(tree.depth(*child).saturating_sub(1));
            lines.push(format!("{indent}{}: {}", node.name, tasks.join(", ")));
        }
        collect_items(tree, *child, lines, count);
    }
}

/// Detect nodes that override the summary description or thumbnail
pub fn multiple_values(tree: &ItemTree, ctx: &RunContext) -> MultipleValues {
    let mut out = MultipleValues::default();
    for id in tree.iter() {
        let Ok(node) = tree.get(id) else { continue };
        if node.thumbnail_explicit {
            out.thumbnail = true;
        }
        if !node.inherit_description
            && node.description.as_deref() != Some(ctx.summary_description.as_str())
        {
            out.description = true;
        }
        if out.description && out.thumbnail {
            break;
        }
    }
    out
}
