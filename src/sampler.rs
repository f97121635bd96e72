//! Random timestamp sampling.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::StillpickError;

/// Earliest timestamp, in seconds, that the sampler will draw.
pub const MIN_START_SECONDS: u64 = 0;

/// Draws whole-second timestamps uniformly from `[min_start, duration)`.
///
/// The sampler has no memory: two draws may return the same timestamp.
///
/// # Example
///
/// ```
/// use stillpick::TimestampSampler;
///
/// let mut sampler = TimestampSampler::seeded(120, 7)?;
/// let timestamp = sampler.sample();
/// assert!(timestamp < 120);
/// # Ok::<(), stillpick::StillpickError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TimestampSampler<R = StdRng> {
    min_start: u64,
    duration: u64,
    rng: R,
}

impl TimestampSampler<StdRng> {
    /// Sampler over `[0, duration)` seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns [`StillpickError::EmptyClip`] if `duration` is zero.
    pub fn new(duration: u64) -> Result<Self, StillpickError> {
        Self::with_rng(duration, StdRng::from_entropy())
    }

    /// Sampler over `[0, duration)` with a fixed seed, for reproducible runs.
    pub fn seeded(duration: u64, seed: u64) -> Result<Self, StillpickError> {
        Self::with_rng(duration, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TimestampSampler<R> {
    /// Sampler over `[0, duration)` drawing from `rng`.
    pub fn with_rng(duration: u64, rng: R) -> Result<Self, StillpickError> {
        if duration <= MIN_START_SECONDS {
            return Err(StillpickError::EmptyClip {
                duration_seconds: duration,
            });
        }
        Ok(Self {
            min_start: MIN_START_SECONDS,
            duration,
            rng,
        })
    }

    /// Draw the next timestamp.
    pub fn sample(&mut self) -> u64 {
        self.rng.gen_range(self.min_start..self.duration)
    }

    /// The exclusive upper bound of drawn timestamps.
    pub fn duration(&self) -> u64 {
        self.duration
    }
}
