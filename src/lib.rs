//! # stillpick
//!
//! Pick sharp, well-lit still frames from a video.
//!
//! `stillpick` samples random timestamps from a clip, has FFmpeg extract one
//! frame at each, and rejects frames that are too dark or too blurry. HDR10
//! (PQ) sources are tone mapped to SDR before scoring so that brightness is
//! judged on what a viewer would actually see.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stillpick::{FfmpegEngine, Session};
//!
//! let mut session = Session::new(FfmpegEngine::new()?);
//! let report = session.run("input.mkv")?;
//! println!("{}", report.tally);
//! for retained in &report.frames {
//!     std::fs::write(
//!         format!("frame_{}.png", retained.frame.timestamp),
//!         &retained.frame.bytes,
//!     )?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. **Probe**: one FFmpeg invocation prints the container header. The
//!    duration and the HDR transfer marker are parsed out of that log
//!    ([`probe`]).
//! 2. **Filter graph**: square-pixel scaling, plus a tone-mapping chain for
//!    HDR input ([`FilterGraph`]).
//! 3. **Attempts**: ten times, draw a timestamp ([`TimestampSampler`]),
//!    extract one PNG ([`FrameExtractor`]) and score it ([`quality`]).
//! 4. **Report**: counts and the valid frames ([`RunReport`]).
//!
//! The decode engine is a trait ([`DecodeEngine`]), so the whole pipeline
//! can run against something other than the `ffmpeg` binary.
//!
//! ## Requirements
//!
//! An `ffmpeg` binary built with `zscale` (libzimg) support, on `PATH` or
//! named by the `STILLPICK_FFMPEG` environment variable. `zscale` is only
//! used for HDR input.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod filter;
pub mod probe;
pub mod progress;
pub mod quality;
pub mod sampler;
pub mod session;

pub use config::RunOptions;
pub use engine::{DecodeEngine, Invocation, LogLine};
pub use error::StillpickError;
pub use extract::{ExtractedFrame, FrameExtractor};
pub use ffmpeg::{FfmpegEngine, FfmpegLogLevel};
pub use filter::FilterGraph;
pub use probe::ProbeResult;
pub use progress::{ProgressCallback, ProgressInfo};
pub use quality::{QualityScore, Verdict};
pub use sampler::TimestampSampler;
pub use session::{
    ATTEMPT_BUDGET, AttemptOutcome, RetainedFrame, RunReport, RunState, RunTally, Session,
};
