//! Error types for the `stillpick` crate.
//!
//! This module defines [`StillpickError`], the unified error type returned by
//! all fallible operations in the crate. Variants carry the engine arguments,
//! artifact names, and upstream messages needed to diagnose a failure.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `stillpick` operations.
///
/// Errors fall into two groups. Run-aborting errors ([`DurationUnknown`],
/// [`EmptyClip`], [`EngineSpawn`], [`Mount`]) stop a session before any
/// attempt is made. Everything else can occur inside a single attempt, where
/// the session logs it and moves on to the next timestamp.
///
/// [`DurationUnknown`]: StillpickError::DurationUnknown
/// [`EmptyClip`]: StillpickError::EmptyClip
/// [`EngineSpawn`]: StillpickError::EngineSpawn
/// [`Mount`]: StillpickError::Mount
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StillpickError {
    /// No `Duration:` line appeared in the probe log.
    #[error("Could not determine video duration from probe output")]
    DurationUnknown,

    /// The clip is too short to sample a single whole-second timestamp.
    #[error("Clip duration of {duration_seconds}s leaves nothing to sample")]
    EmptyClip {
        /// Duration reported by the probe, in whole seconds.
        duration_seconds: u64,
    },

    /// The decode engine binary could not be started.
    #[error("Failed to start decode engine {binary}: {reason}")]
    EngineSpawn {
        /// Path or name of the engine binary.
        binary: PathBuf,
        /// Underlying reason the spawn failed.
        reason: String,
    },

    /// The input file could not be mounted into the engine filesystem.
    #[error("Failed to mount {path} into the engine filesystem: {reason}")]
    Mount {
        /// Host path of the input file.
        path: PathBuf,
        /// Underlying reason the mount failed.
        reason: String,
    },

    /// An extraction finished but left no output artifact behind.
    #[error("Engine produced no artifact {name} (exit code {exit_code:?})")]
    ArtifactMissing {
        /// Name of the expected artifact in the engine filesystem.
        name: String,
        /// Exit code of the extraction invocation, if it exited normally.
        exit_code: Option<i32>,
    },

    /// The image to score has no pixels.
    #[error("Cannot score an empty {width}x{height} image")]
    EmptyImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// An I/O error occurred while talking to the engine filesystem.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while decoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl StillpickError {
    /// Returns `true` if this error aborts the whole run rather than a
    /// single attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StillpickError::DurationUnknown
                | StillpickError::EmptyClip { .. }
                | StillpickError::EngineSpawn { .. }
                | StillpickError::Mount { .. }
        )
    }
}
