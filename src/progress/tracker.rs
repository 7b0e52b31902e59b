//! Status and progress tracking
//!
//! Receives "phase visited node X with result Y" events, updates the node,
//! propagates errors to its ancestors and drives the progress counters.

use super::{ProgressFrame, ProgressSink, ProgressUpdate};
use crate::error::Result;
use crate::tree::ItemTree;
use crate::types::{NodeId, Phase, Status};
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};

#[derive(Debug)]
struct OpenFrame {
    frame: ProgressFrame,
    errors: usize,
}

/// Central recorder for node statuses and progress
pub struct StatusTracker<'s> {
    sink: &'s dyn ProgressSink,
    phase: Option<Phase>,
    completed: usize,
    total: usize,
    run_completed: usize,
    run_total: usize,
    frames: Vec<OpenFrame>,
}

impl<'s> StatusTracker<'s> {
    /// Create a tracker reporting to `sink`
    pub fn new(sink: &'s dyn ProgressSink) -> Self {
        Self {
            sink,
            phase: None,
            completed: 0,
            total: 0,
            run_completed: 0,
            run_total: 0,
            frames: Vec::new(),
        }
    }

    /// Sink this tracker reports to
    pub fn sink(&self) -> &'s dyn ProgressSink {
        self.sink
    }

    /// Size the aggregate run counter (checked nodes × phases)
    pub fn begin_run(&mut self, total: usize) {
        self.run_completed = 0;
        self.run_total = total;
    }

    /// Start a phase expected to visit `total` nodes
    pub fn begin_phase(&mut self, phase: Phase, total: usize) {
        self.phase = Some(phase);
        self.completed = 0;
        self.total = total;
        debug!("Starting {phase} phase over {total} nodes");
        self.sink.on_phase(phase, total);
    }

    /// Count one more completed frame
    pub fn advance(&mut self) {
        self.completed += 1;
        self.run_completed += 1;
    }

    /// Frames completed in the current phase
    pub const fn completed_count(&self) -> usize {
        self.completed
    }

    /// Frames expected in the current phase
    pub const fn total_count(&self) -> usize {
        self.total
    }

    /// Number of frames currently pushed
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Current counters
    pub const fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            phase: self.phase,
            completed: self.completed,
            total: self.total,
            run_completed: self.run_completed,
            run_total: self.run_total,
        }
    }

    /// Record `status` on `node`
    ///
    /// Error statuses are also written to every ancestor up to the root,
    /// unless that ancestor already carries an error at least as severe.
    /// Siblings are never touched.
    pub fn record(
        &mut self,
        tree: &mut ItemTree,
        node: NodeId,
        status: Status,
        message: Option<String>,
    ) -> Result<()> {
        let target = tree.get_mut(node)?;
        target.status = status;
        target.status_message.clone_from(&message);
        trace!("{node} -> {status:?}");
        self.sink.on_status(node, status, message.as_deref());

        if !status.is_error() {
            return Ok(());
        }
        for frame in &mut self.frames {
            frame.errors += 1;
        }
        for ancestor in tree.ancestors(node) {
            let up = tree.get_mut(ancestor)?;
            if up.status.severity() >= status.severity() {
                continue;
            }
            up.status = status;
            up.status_message.clone_from(&message);
            self.sink.on_status(ancestor, status, message.as_deref());
        }
        Ok(())
    }

    /// Push a frame; the returned guard pops it exactly once, including
    /// when the scope is left early
    pub fn push(&mut self, frame: ProgressFrame) -> FrameGuard<'_, 's> {
        self.sink.on_push(&frame);
        self.frames.push(OpenFrame { frame, errors: 0 });
        FrameGuard {
            tracker: self,
            popped: false,
        }
    }

    fn pop(&mut self) -> usize {
        let errors = self.frames.pop().map_or(0, |open| {
            trace!("Popped {:?}", open.frame.label);
            open.errors
        });
        self.advance();
        self.sink.on_pop(self.snapshot());
        errors
    }
}

/// Scoped progress frame; derefs to the tracker while open
pub struct FrameGuard<'t, 's> {
    tracker: &'t mut StatusTracker<'s>,
    popped: bool,
}

impl FrameGuard<'_, '_> {
    /// Pop the frame now and return the number of errors recorded inside it
    pub fn finish(mut self) -> usize {
        self.popped = true;
        self.tracker.pop()
    }
}

impl<'s> Deref for FrameGuard<'_, 's> {
    type Target = StatusTracker<'s>;

    fn deref(&self) -> &Self::Target {
        &*self.tracker
    }
}

impl DerefMut for FrameGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.tracker
    }
}

impl Drop for FrameGuard<'_, '_> {
    fn drop(&mut self) {
        if !self.popped {
            self.tracker.pop();
        }
    }
}
