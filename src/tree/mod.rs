//! Publish tree
//!
//! Ownership hierarchy of contexts, items and tasks, plus the description
//! and thumbnail inheritance rules and the summary view.

mod arena;
pub mod inherit;
pub mod summary;

pub use arena::{ItemTree, Node, NodeKind};
pub use summary::{MultipleValues, TreeSummary, full_summary, multiple_values};
