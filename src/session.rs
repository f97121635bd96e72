//! The sampling run.
//!
//! A [`Session`] owns a decode engine handle and drives one run over one
//! input:
//!
//! ```text
//! Initializing ─► Probing ─► Sampling(1) ─► … ─► Sampling(10) ─► Done
//!                    │
//!                    └─► Failed   (mount or probe error, no duration)
//! ```
//!
//! Attempts are strictly sequential. Extraction, decoding and scoring of one
//! attempt finish, and its engine artifact is deleted, before the next
//! timestamp is drawn.
//!
//! An attempt that fails (no artifact, unreadable PNG, ...) is logged,
//! counted as skipped, and uses up its slot in the budget. It never aborts
//! the run and is never retried.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use crate::config::RunOptions;
use crate::engine::DecodeEngine;
use crate::error::StillpickError;
use crate::extract::{ExtractedFrame, FrameExtractor};
use crate::filter::FilterGraph;
use crate::probe::{self, ProbeResult};
use crate::progress::ProgressTracker;
use crate::quality::{self, QualityScore};
use crate::sampler::TimestampSampler;

/// Number of attempts in every run.
pub const ATTEMPT_BUDGET: u32 = 10;

/// Engine directory the input is mounted into.
pub const INPUT_DIR: &str = "videos";

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Mounting the input.
    Initializing,
    /// Running the probe invocation.
    Probing,
    /// Working on the given 1-based attempt.
    Sampling(u32),
    /// All attempts completed.
    Done,
    /// The run stopped before sampling.
    Failed,
}

/// Running counts for a session.
///
/// `dark` and `blurry` are independent: a frame that is both is counted in
/// each, and in neither `valid` nor `skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunTally {
    /// Attempts completed, including skipped ones.
    pub attempts: u32,
    /// Frames that were neither dark nor blurry.
    pub valid: u32,
    /// Frames below the sharpness threshold.
    pub blurry: u32,
    /// Frames below the brightness threshold.
    pub dark: u32,
    /// Attempts that produced no score.
    pub skipped: u32,
}

impl RunTally {
    /// Count one finished attempt.
    pub fn record(&mut self, outcome: &AttemptOutcome) {
        self.attempts += 1;
        match outcome {
            AttemptOutcome::Scored(score) => {
                if score.is_dark {
                    self.dark += 1;
                }
                if score.is_blurry {
                    self.blurry += 1;
                }
                if score.is_valid() {
                    self.valid += 1;
                }
            }
            AttemptOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Attempts that produced a score.
    pub fn scored(&self) -> u32 {
        self.attempts - self.skipped
    }
}

impl Display for RunTally {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Generated {} screenshots: {} clear, {} blurry, {} dark",
            self.attempts, self.valid, self.blurry, self.dark
        )?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        Ok(())
    }
}

/// What a single attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The frame was extracted and scored.
    Scored(QualityScore),
    /// The attempt failed and was skipped.
    Skipped {
        /// Why the attempt failed.
        reason: String,
    },
}

/// A frame that scored valid, kept for the caller.
#[derive(Debug, Clone)]
pub struct RetainedFrame {
    /// The extracted PNG.
    pub frame: ExtractedFrame,
    /// Its score.
    pub score: QualityScore,
}

/// The result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// What the probe found.
    pub probe: ProbeResult,
    /// Clip duration used for sampling, in seconds.
    pub duration_seconds: u64,
    /// The filter graph used for every extraction.
    pub filter_graph: FilterGraph,
    /// Final counts.
    pub tally: RunTally,
    /// Valid frames in attempt order.
    pub frames: Vec<RetainedFrame>,
}

/// One sampling run over a decode engine.
///
/// # Example
///
/// ```no_run
/// use stillpick::{FfmpegEngine, Session};
///
/// let mut session = Session::new(FfmpegEngine::new()?);
/// let report = session.run("input.mkv")?;
/// println!("{}", report.tally);
/// for retained in &report.frames {
///     println!("clear frame at {}s", retained.frame.timestamp);
/// }
/// # Ok::<(), stillpick::StillpickError>(())
/// ```
pub struct Session<E: DecodeEngine> {
    engine: E,
    options: RunOptions,
    state: RunState,
}

impl<E: DecodeEngine> Session<E> {
    /// Create a session with default options.
    pub fn new(engine: E) -> Self {
        Self::with_options(engine, RunOptions::default())
    }

    /// Create a session with explicit options.
    pub fn with_options(engine: E, options: RunOptions) -> Self {
        Self {
            engine,
            options,
            state: RunState::Initializing,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The engine handle.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Give back the engine handle.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Mount `input` and run only the probe.
    ///
    /// Does not require a duration to be found.
    pub fn probe<P: AsRef<Path>>(&mut self, input: P) -> Result<ProbeResult, StillpickError> {
        match self.mount_and_probe(input.as_ref()) {
            Ok((_, probe)) => Ok(probe),
            Err(error) => {
                self.state = RunState::Failed;
                Err(error)
            }
        }
    }

    /// Run the whole pipeline over `input`.
    ///
    /// # Errors
    ///
    /// Only run-aborting errors are returned: a mount or engine start
    /// failure, [`StillpickError::DurationUnknown`], or
    /// [`StillpickError::EmptyClip`]. Attempt failures are reported through
    /// the tally instead.
    pub fn run<P: AsRef<Path>>(&mut self, input: P) -> Result<RunReport, StillpickError> {
        let prepared = self
            .mount_and_probe(input.as_ref())
            .and_then(|(engine_path, probe)| {
                let duration = probe.require_duration()?;
                Ok((engine_path, probe, duration))
            });
        let (engine_path, probe, duration) = match prepared {
            Ok(prepared) => prepared,
            Err(error) => {
                self.state = RunState::Failed;
                return Err(error);
            }
        };

        let filter_graph = FilterGraph::for_probe(&probe);
        log::info!("Filter graph: {filter_graph}");

        let mut sampler = match self.options.seed {
            Some(seed) => TimestampSampler::seeded(duration, seed)?,
            None => TimestampSampler::new(duration)?,
        };
        let mut tracker = ProgressTracker::new(self.options.progress.clone(), ATTEMPT_BUDGET);
        let mut extractor = FrameExtractor::new(&mut self.engine, &engine_path, &filter_graph);
        let mut tally = RunTally::default();
        let mut frames = Vec::new();

        for attempt in 1..=ATTEMPT_BUDGET {
            self.state = RunState::Sampling(attempt);
            let timestamp = sampler.sample();

            let outcome = match run_attempt(&mut extractor, attempt, timestamp) {
                Ok((frame, score)) => {
                    log::info!(
                        "Attempt {attempt} at {timestamp}s: {} (brightness {:.2}, variance {:.2})",
                        score.verdict(),
                        score.mean_intensity,
                        score.blur_variance
                    );
                    if score.is_valid() {
                        frames.push(RetainedFrame { frame, score });
                    }
                    AttemptOutcome::Scored(score)
                }
                Err(error) => {
                    log::warn!("Attempt {attempt} at {timestamp}s skipped: {error}");
                    AttemptOutcome::Skipped {
                        reason: error.to_string(),
                    }
                }
            };

            tally.record(&outcome);
            log::info!("{tally}");
            tracker.advance(timestamp, &outcome, tally);
        }

        self.state = RunState::Done;
        Ok(RunReport {
            probe,
            duration_seconds: duration,
            filter_graph,
            tally,
            frames,
        })
    }

    fn mount_and_probe(&mut self, input: &Path) -> Result<(String, ProbeResult), StillpickError> {
        self.state = RunState::Initializing;
        self.engine.create_dir(INPUT_DIR)?;
        let engine_path = self.engine.mount(INPUT_DIR, input)?;

        self.state = RunState::Probing;
        let probe = probe::probe(&mut self.engine, &engine_path)?;
        Ok((engine_path, probe))
    }
}

/// Extract, decode and score one frame.
///
/// The decoded image is dropped before returning; only the PNG bytes
/// survive, and only so the caller can keep valid frames.
fn run_attempt<E: DecodeEngine + ?Sized>(
    extractor: &mut FrameExtractor<'_, E>,
    attempt: u32,
    timestamp: u64,
) -> Result<(ExtractedFrame, QualityScore), StillpickError> {
    let frame = extractor.extract(attempt, timestamp)?;
    let score = {
        let image = frame.decode()?;
        quality::score(&image)?
    };
    Ok((frame, score))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(mean: f64, variance: f64) -> AttemptOutcome {
        AttemptOutcome::Scored(QualityScore::from_statistics(mean, variance))
    }

    #[test]
    fn tally_counts_dark_and_blurry_independently() {
        let mut tally = RunTally::default();
        tally.record(&scored(10.0, 10.0));
        tally.record(&scored(120.0, 5_000.0));
        tally.record(&scored(10.0, 5_000.0));
        tally.record(&AttemptOutcome::Skipped {
            reason: "no artifact".into(),
        });

        assert_eq!(
            tally,
            RunTally {
                attempts: 4,
                valid: 1,
                blurry: 1,
                dark: 2,
                skipped: 1,
            }
        );
        assert_eq!(tally.scored(), 3);
    }

    #[test]
    fn tally_display_mentions_skips_only_when_present() {
        let mut tally = RunTally::default();
        tally.record(&scored(120.0, 5_000.0));
        assert_eq!(
            tally.to_string(),
            "Generated 1 screenshots: 1 clear, 0 blurry, 0 dark"
        );
        tally.record(&AttemptOutcome::Skipped {
            reason: "x".into(),
        });
        assert!(tally.to_string().ends_with(", 1 skipped"));
    }
}
