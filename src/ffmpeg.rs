//! The `ffmpeg` command-line program as a [`DecodeEngine`].
//!
//! [`FfmpegEngine`] spawns the `ffmpeg` binary once per invocation inside a
//! private scratch directory. That directory stands in for the engine's
//! filesystem: inputs are mounted into it and extracted frames are written to
//! it. It is removed when the engine is dropped.
//!
//! Every invocation runs with `-nostdin -loglevel level+info`, so each line
//! FFmpeg writes to stderr carries a severity tag that
//! [`LogLine::parse`] turns into an [`FfmpegLogLevel`].
//!
//! # Example
//!
//! ```no_run
//! use stillpick::{DecodeEngine, FfmpegEngine};
//!
//! let mut engine = FfmpegEngine::new()?.with_binary("/opt/ffmpeg/bin/ffmpeg");
//! let invocation = engine.invoke(&["-version".to_string()])?;
//! for line in invocation.lines() {
//!     println!("{line}");
//! }
//! # Ok::<(), stillpick::StillpickError>(())
//! ```

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tempfile::TempDir;

use crate::engine::{DecodeEngine, Invocation, LogLine};
use crate::error::StillpickError;

/// Environment variable that overrides the default `ffmpeg` binary.
pub const FFMPEG_BINARY_ENV: &str = "STILLPICK_FFMPEG";

/// FFmpeg log severity.
///
/// Maps directly to FFmpeg's `AV_LOG_*` levels and the tags printed by the
/// `level` log flag.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Unrecoverable condition; the process will abort.
    Panic,
    /// Unrecoverable error.
    Fatal,
    /// Recoverable error.
    Error,
    /// Warning.
    Warning,
    /// Informational message. Stream headers, including `Duration:`, are
    /// printed at this level.
    Info,
    /// Verbose informational message.
    Verbose,
    /// Debugging message.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    /// Parse the tag FFmpeg prints between brackets, e.g. `warning`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "quiet" => Some(FfmpegLogLevel::Quiet),
            "panic" => Some(FfmpegLogLevel::Panic),
            "fatal" => Some(FfmpegLogLevel::Fatal),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "verbose" => Some(FfmpegLogLevel::Verbose),
            "debug" => Some(FfmpegLogLevel::Debug),
            "trace" => Some(FfmpegLogLevel::Trace),
            _ => None,
        }
    }

    /// The level at which a line of this severity is forwarded to the `log`
    /// facade.
    ///
    /// Engine output is chatty, so even FFmpeg errors are forwarded at
    /// `debug`: the pipeline decides for itself what is worth a warning.
    pub fn forward_level(self) -> log::Level {
        match self {
            FfmpegLogLevel::Verbose | FfmpegLogLevel::Debug | FfmpegLogLevel::Trace => {
                log::Level::Trace
            }
            _ => log::Level::Debug,
        }
    }
}

/// Drives the `ffmpeg` binary in a private scratch directory.
#[derive(Debug)]
pub struct FfmpegEngine {
    binary: PathBuf,
    root: TempDir,
}

impl FfmpegEngine {
    /// Create an engine with a fresh scratch directory.
    ///
    /// The binary is taken from `STILLPICK_FFMPEG` if set, otherwise `ffmpeg`
    /// is looked up on `PATH` at invocation time.
    ///
    /// # Errors
    ///
    /// Returns [`StillpickError::IoError`] if the scratch directory cannot be
    /// created.
    pub fn new() -> Result<Self, StillpickError> {
        let binary = env::var_os(FFMPEG_BINARY_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        let root = tempfile::Builder::new().prefix("stillpick-").tempdir()?;
        log::debug!("Engine scratch directory at {}", root.path().display());
        Ok(Self { binary, root })
    }

    /// Use a specific `ffmpeg` binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// The binary this engine spawns.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Host path of the scratch directory.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.path().join(name.trim_start_matches('/'))
    }
}

impl DecodeEngine for FfmpegEngine {
    fn invoke(&mut self, arguments: &[String]) -> Result<Invocation, StillpickError> {
        let output = Command::new(&self.binary)
            .current_dir(self.root.path())
            .args(["-nostdin", "-loglevel", "level+info"])
            .args(arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|error| StillpickError::EngineSpawn {
                binary: self.binary.clone(),
                reason: error.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        // Progress lines end in a bare carriage return.
        let log: Vec<LogLine> = stderr
            .split(['\n', '\r'])
            .filter(|raw| !raw.trim().is_empty())
            .map(LogLine::parse)
            .collect();

        for line in &log {
            log::log!(target: "stillpick::engine", line.level.forward_level(), "{}", line.text);
        }

        Ok(Invocation {
            exit_code: output.status.code(),
            log,
        })
    }

    fn create_dir(&mut self, dir: &str) -> Result<(), StillpickError> {
        fs::create_dir_all(self.resolve(dir))?;
        Ok(())
    }

    fn mount(&mut self, dir: &str, input: &Path) -> Result<String, StillpickError> {
        let mount_error = |reason: String| StillpickError::Mount {
            path: input.to_path_buf(),
            reason,
        };

        let source = input
            .canonicalize()
            .map_err(|error| mount_error(error.to_string()))?;
        let file_name = source
            .file_name()
            .ok_or_else(|| mount_error("input has no file name".to_string()))?
            .to_string_lossy()
            .into_owned();

        let engine_path = format!("{}/{}", dir.trim_matches('/'), file_name);
        let target = self.resolve(&engine_path);
        if target.symlink_metadata().is_ok() {
            fs::remove_file(&target).map_err(|error| mount_error(error.to_string()))?;
        }

        #[cfg(unix)]
        std::os::unix::fs::symlink(&source, &target)
            .map_err(|error| mount_error(error.to_string()))?;

        #[cfg(not(unix))]
        fs::copy(&source, &target).map_err(|error| mount_error(error.to_string()))?;

        log::debug!("Mounted {} at {}", source.display(), engine_path);
        Ok(engine_path)
    }

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>, StillpickError> {
        Ok(fs::read(self.resolve(name))?)
    }

    fn delete_file(&mut self, name: &str) -> Result<(), StillpickError> {
        fs::remove_file(self.resolve(name))?;
        Ok(())
    }
}
