//! Shared CLI progress sink with styled output and a progress bar

use crate::cli::style::{Stylize, bang, bar_style, status_marker};
use anstream::{eprintln, println};
use indicatif::ProgressBar;
use pubflow::progress::{MessageLevel, Phase, ProgressFrame, ProgressSink, ProgressUpdate};
use pubflow::types::{NodeId, Status};
use std::sync::Mutex;

/// CLI progress sink that prints node results as they are recorded
///
/// Two modes:
/// - verbose: phase headers and one line per node
/// - compact: progress bar, failures only
pub struct CliProgress {
    /// Verbose mode prints every node result
    pub verbose: bool,
    bar: Mutex<Option<ProgressBar>>,
    current: Mutex<Option<ProgressFrame>>,
}

impl CliProgress {
    fn new(verbose: bool) -> Self {
        Self {
            verbose,
            bar: Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    /// Create verbose progress
    pub fn verbose() -> Self {
        Self::new(true)
    }

    /// Create compact progress
    pub fn compact() -> Self {
        Self::new(false)
    }

    /// Run `f` with the bar hidden so printed lines are not overdrawn
    fn print(&self, f: impl FnOnce()) {
        match self.bar.lock().ok().and_then(|b| b.clone()) {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(bar) = bar.take() {
                bar.finish_and_clear();
            }
        }
    }
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Node part of a frame label ("Validating: plate" → "plate")
fn node_label(frame: &ProgressFrame) -> &str {
    frame
        .label
        .split_once(": ")
        .map_or(frame.label.as_str(), |(_, name)| name)
}

impl ProgressSink for CliProgress {
    fn on_phase(&self, phase: Phase, total: usize) {
        self.finish_bar();
        if self.verbose && phase != Phase::Load {
            println!("{}...", phase.verb().emphasis());
        }
        let bar = ProgressBar::new(to_u64(total))
            .with_style(bar_style())
            .with_prefix(phase.verb());
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_push(&self, frame: &ProgressFrame) {
        if let Some(bar) = self.bar.lock().ok().and_then(|b| b.clone()) {
            bar.set_message(node_label(frame).to_string());
        }
        if let Ok(mut current) = self.current.lock() {
            *current = Some(frame.clone());
        }
    }

    fn on_pop(&self, update: ProgressUpdate) {
        if let Some(bar) = self.bar.lock().ok().and_then(|b| b.clone()) {
            bar.set_position(to_u64(update.completed));
        }
        if update.completed >= update.total {
            self.finish_bar();
        }
    }

    fn on_status(&self, node: NodeId, status: Status, message: Option<&str>) {
        // Propagated statuses on ancestors are summarized by the caller
        let Some(frame) = self
            .current
            .lock()
            .ok()
            .and_then(|c| c.clone())
            .filter(|f| f.node == Some(node))
        else {
            return;
        };
        let name = node_label(&frame);

        if status.is_error() {
            let message = message.unwrap_or("failed");
            self.print(|| {
                eprintln!(
                    "  {} {}: {}",
                    status_marker(status).for_stderr(),
                    name.accent().for_stderr(),
                    message.error()
                );
            });
        } else if self.verbose {
            self.print(|| println!("  {} {}", status_marker(status), name));
        }
    }

    fn on_message(&self, level: MessageLevel, message: &str) {
        self.print(|| match level {
            MessageLevel::Info => println!("{message}"),
            MessageLevel::Warning => eprintln!("{} {}", bang(), message.warn()),
            MessageLevel::Error => eprintln!("{}: {}", "error".error(), message),
        });
    }
}
