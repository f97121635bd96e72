//! Per-attempt progress reporting.
//!
//! A session reports after every attempt, successful or skipped, through a
//! [`ProgressCallback`]. Each [`ProgressInfo`] carries the attempt's outcome
//! and the running [`RunTally`], so a front end can show classifications as
//! they happen instead of waiting for the final report.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stillpick::{AttemptOutcome, FfmpegEngine, ProgressCallback, ProgressInfo, RunOptions, Session};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         match &info.outcome {
//!             AttemptOutcome::Scored(score) => {
//!                 println!("[{}/{}] {}", info.current, info.total, score.verdict())
//!             }
//!             AttemptOutcome::Skipped { reason } => println!("skipped: {reason}"),
//!         }
//!     }
//! }
//!
//! let options = RunOptions::new().with_progress(Arc::new(PrintProgress));
//! let mut session = Session::with_options(FfmpegEngine::new()?, options);
//! let report = session.run("input.mkv")?;
//! println!("{}", report.tally);
//! # Ok::<(), stillpick::StillpickError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::session::{AttemptOutcome, RunTally};

/// A snapshot taken right after an attempt completes.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// 1-based index of the attempt that just completed.
    pub current: u32,
    /// Attempt budget for the run.
    pub total: u32,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: f32,
    /// Wall-clock time elapsed since sampling started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on the average attempt so far.
    pub estimated_remaining: Option<Duration>,
    /// Timestamp the attempt sampled, in seconds.
    pub timestamp: u64,
    /// What the attempt produced.
    pub outcome: AttemptOutcome,
    /// Counts after this attempt.
    pub tally: RunTally,
}

/// Trait for receiving progress updates during a run.
///
/// Callbacks are **infallible** and observe only; they cannot stop a run.
pub trait ProgressCallback: Send + Sync {
    /// Called once after every attempt.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. This is the default.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks attempt timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: u32,
    current: u32,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: u32) -> Self {
        Self {
            callback,
            total,
            current: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one completed attempt and report it.
    pub(crate) fn advance(&mut self, timestamp: u64, outcome: &AttemptOutcome, tally: RunTally) {
        self.current += 1;
        let elapsed = self.start_time.elapsed();

        let percentage = if self.total > 0 {
            (self.current as f32 / self.total as f32) * 100.0
        } else {
            100.0
        };

        let remaining = self.total.saturating_sub(self.current);
        let estimated_remaining = (self.current > 0).then(|| {
            let per_attempt = elapsed / self.current;
            per_attempt * remaining
        });

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            timestamp,
            outcome: outcome.clone(),
            tally,
        };

        self.callback.on_progress(&info);
    }
}
