//! Run configuration.
//!
//! [`RunOptions`] is a builder that threads the progress callback and an
//! optional random seed through a [`Session`](crate::Session). The attempt
//! budget and quality thresholds are fixed and are not part of it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use stillpick::{ProgressCallback, ProgressInfo, RunOptions};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{}: {}", info.current, info.total, info.tally);
//!     }
//! }
//!
//! let options = RunOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_seed(2024);
//! assert_eq!(options.seed(), Some(2024));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Options for a sampling run.
///
/// A default-constructed value reports nothing and seeds the sampler from
/// the operating system.
#[derive(Clone)]
pub struct RunOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) seed: Option<u64>,
}

impl Debug for RunOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RunOptions")
            .field("has_progress", &true)
            .field("seed", &self.seed)
            .finish()
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RunOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            seed: None,
        }
    }

    /// Attach a progress callback, invoked once per attempt.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Seed the timestamp sampler so a run is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The configured seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}
