//! Error types for pubflow

use crate::types::{NodeId, Phase};
use thiserror::Error;

/// Errors that can occur while building or running a publish tree
#[derive(Error, Debug)]
pub enum Error {
    /// Parent node is not attached to the tree
    #[error("invalid parent: node {0} is not attached to the tree")]
    InvalidParent(NodeId),

    /// Node was removed from the tree (or never existed)
    #[error("node {0} is not attached to the tree")]
    DetachedNode(NodeId),

    /// Operation requires a task node
    #[error("node {0} is not a task")]
    NotATask(NodeId),

    /// Operation requires an item node
    #[error("node {0} is not an item")]
    NotAnItem(NodeId),

    /// Item's task/entity link is locked
    #[error("context change is not allowed for node {0}")]
    ContextChangeNotAllowed(NodeId),

    /// A publish or finalize plugin raised and the phase was aborted
    #[error("{phase} aborted at node {node}: {message}")]
    PhaseAborted {
        /// Phase that was running
        phase: Phase,
        /// Node whose handler raised
        node: NodeId,
        /// Error reported by the handler
        message: String,
    },

    /// Collector failed to produce item descriptors
    #[error("collection failed: {0}")]
    Collect(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Invalid regular expression in configuration
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using pubflow's Error
pub type Result<T> = std::result::Result<T, Error>;
