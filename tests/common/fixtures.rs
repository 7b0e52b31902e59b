//! Test data factories for publish trees
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use pubflow::collect::ItemDescriptor;
use pubflow::plugin::PublishPlugin;
use pubflow::tree::{ItemTree, Node};
use pubflow::types::{ContextLink, NodeId};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One context owning items, each with one task
pub struct ShotTree {
    pub tree: ItemTree,
    pub context: NodeId,
    pub items: Vec<NodeId>,
    pub tasks: Vec<NodeId>,
}

/// Create the default context link
pub fn make_link() -> ContextLink {
    ContextLink::new("sh010", "comp")
}

/// Create a tree with one context and one task per item name
pub fn make_shot_tree(plugin: &Arc<dyn PublishPlugin>, names: &[&str]) -> ShotTree {
    let mut tree = ItemTree::new();
    let context = tree.add(tree.root(), Node::context(make_link())).unwrap();
    let mut items = Vec::new();
    let mut tasks = Vec::new();
    for name in names {
        let item = tree.add(context, Node::item(*name, "file.image")).unwrap();
        tasks.push(tree.add(item, Node::task(Arc::clone(plugin))).unwrap());
        items.push(item);
    }
    ShotTree {
        tree,
        context,
        items,
        tasks,
    }
}

/// Create the two-item tree (A, B) most scenarios use
pub fn make_two_item_tree(plugin: &Arc<dyn PublishPlugin>) -> ShotTree {
    make_shot_tree(plugin, &["A", "B"])
}

/// Create a descriptor linked to the default context
pub fn make_descriptor(name: &str) -> ItemDescriptor {
    ItemDescriptor::new(name, "file.image").with_context(make_link())
}

/// Create a descriptor linked to `entity` with no task
pub fn make_descriptor_without_task(name: &str, entity: &str) -> ItemDescriptor {
    ItemDescriptor::new(name, "file.image").with_context(ContextLink::entity_only(entity))
}

/// Write `contents` to `dir/name` and return the path
pub fn make_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Write a TOML manifest listing one item per source file
pub fn make_manifest(dir: &Path, sources: &[&Path]) -> PathBuf {
    let mut text = String::new();
    for source in sources {
        let name = source.file_stem().unwrap().to_string_lossy();
        writeln!(text, "[[items]]").unwrap();
        writeln!(text, "name = \"{name}\"").unwrap();
        writeln!(text, "type = \"file.image\"").unwrap();
        writeln!(text, "context = {{ entity = \"sh010\", task = \"comp\" }}").unwrap();
        writeln!(text, "properties = {{ path = {:?} }}", source.display().to_string()).unwrap();
        writeln!(text).unwrap();
    }
    make_file(dir, "manifest.toml", text.as_bytes())
}
