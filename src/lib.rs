//! pubflow - publish pipeline orchestrator
//!
//! Walks a tree of publishable things (contexts, items, tasks) through the
//! collect → validate → publish → finalize phases, tracking per-node status
//! and progress, honoring cooperative cancellation and gating the publish
//! action behind an admission check.

pub mod collect;
pub mod config;
pub mod context;
pub mod error;
pub mod execute;
pub mod gate;
pub mod plugin;
pub mod progress;
pub mod publisher;
pub mod selection;
pub mod tree;
pub mod types;
