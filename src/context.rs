//! Run context: state shared by one publisher session
//!
//! Holds the summary fallback description/thumbnail and the cancellation
//! token, so that runs (and tests) never share ambient global state.

use crate::types::Thumbnail;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag, cheap to clone and safe to set from
/// another thread. Polled by the executor only at node boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that processing stop at the next node boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag before a new run
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// State owned by one publisher session
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Fallback description for nodes whose whole ancestry inherits
    pub summary_description: String,
    /// Fallback thumbnail for nodes without an explicit one
    pub summary_thumbnail: Option<Thumbnail>,
    /// Placeholder the summary description is reset to on each collect
    pub description_placeholder: String,
    /// Cancellation flag for the running phase
    pub cancel: CancelToken,
}

impl RunContext {
    /// Create a context whose summary description starts at `placeholder`
    pub fn new(placeholder: impl Into<String>) -> Self {
        let placeholder = placeholder.into();
        Self {
            summary_description: placeholder.clone(),
            summary_thumbnail: None,
            description_placeholder: placeholder,
            cancel: CancelToken::new(),
        }
    }

    /// Reset the summary description to the placeholder (collect pass)
    pub fn reseed(&mut self) {
        self.summary_description.clone_from(&self.description_placeholder);
    }

    /// Whether the summary description was never edited past the placeholder
    pub fn summary_is_placeholder(&self) -> bool {
        self.summary_description.trim().is_empty()
            || self.summary_description == self.description_placeholder
    }
}
