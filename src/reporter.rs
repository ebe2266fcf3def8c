//! Progress reporting for long-running batches.
//!
//! The enrichment pipeline emits lifecycle events through a
//! [`ProgressReporter`]; the CLI plugs in [`TracingReporter`], which turns them
//! into log lines.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{info, warn};

/// Receiver of batch lifecycle events.
///
/// Workers call into the reporter concurrently, so implementations must be
/// `Send + Sync` and use interior mutability for any state.
pub trait ProgressReporter: Send + Sync {
    /// A batch of `total` items titled `title` is starting.
    fn start(&self, total: usize, title: &str);

    /// One item finished, whatever its outcome.
    fn advance(&self);

    /// Short description of what is being worked on right now.
    fn set_status(&self, status: &str);

    /// Free-form log line.
    fn log(&self, message: &str);

    /// A batch-level error.
    fn error(&self, err: &dyn std::error::Error);

    /// The batch is over; `summary` is human readable.
    fn finish(&self, summary: &str);
}

/// Reporter that writes every event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items advanced so far.
    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    fn counter(&self) -> String {
        format!(
            "[{}/{}]",
            self.done.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed)
        )
    }
}

impl ProgressReporter for TracingReporter {
    fn start(&self, total: usize, title: &str) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        info!(total, "Starting: {title}");
    }

    fn advance(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    fn set_status(&self, status: &str) {
        info!("{} {status}", self.counter());
    }

    fn log(&self, message: &str) {
        info!("{message}");
    }

    fn error(&self, err: &dyn std::error::Error) {
        warn!("Error: {err}");
    }

    fn finish(&self, summary: &str) {
        info!(completed = self.completed(), "Finished: {summary}");
    }
}
