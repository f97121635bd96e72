//! Decode engine abstraction.
//!
//! The pipeline never links against a decoder. It drives an engine that
//! takes an argument vector, writes free-form log lines, and exchanges files
//! through its own scratch filesystem. [`DecodeEngine`] is that contract;
//! [`FfmpegEngine`](crate::FfmpegEngine) is the production implementation.
//!
//! Each [`invoke`](DecodeEngine::invoke) returns the complete log of the
//! invocation together with its exit status, so log parsing stays a pure
//! function over a finite slice of [`LogLine`]s.

use std::path::Path;

use crate::error::StillpickError;
use crate::ffmpeg::FfmpegLogLevel;

/// One line of engine diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Severity tag attached by the engine.
    pub level: FfmpegLogLevel,
    /// Line text with the severity tag removed.
    pub text: String,
}

impl LogLine {
    /// Create a log line with an explicit level.
    pub fn new(level: FfmpegLogLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Parse a raw stderr line printed with FFmpeg's `level` log flag.
    ///
    /// FFmpeg places the `[level]` tag after any `[component @ 0x..]`
    /// context groups. The tag is removed and the context kept, so the
    /// stream header line `[info]   Duration: ...` becomes
    /// `  Duration: ...`. Lines without a recognised tag are `Info`.
    pub fn parse(raw: &str) -> Self {
        let mut offset = 0;
        while let Some(group) = raw[offset..].strip_prefix('[') {
            let Some(close) = group.find("] ") else {
                break;
            };
            if let Some(level) = FfmpegLogLevel::from_tag(&group[..close]) {
                let text = format!("{}{}", &raw[..offset], &group[close + 2..]);
                return Self { level, text };
            }
            offset += close + 3;
        }
        Self::new(FfmpegLogLevel::Info, raw)
    }
}

/// The completed result of one engine invocation.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Process exit code. `None` if the engine was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Every log line emitted during the invocation, in order.
    pub log: Vec<LogLine>,
}

impl Invocation {
    /// Returns `true` if the engine reported success.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Iterate over the text of each log line.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(|line| line.text.as_str())
    }
}

/// A text-log-driven decode engine with its own scratch filesystem.
///
/// Every method takes `&mut self`: an engine handle serves one call at a
/// time, and holding the borrow is what keeps probe and extraction
/// invocations from overlapping.
///
/// Names passed to the filesystem methods are engine-side paths, relative to
/// the engine's root.
pub trait DecodeEngine {
    /// Run the engine with `arguments` and wait for it to finish.
    ///
    /// A non-zero exit is not an error at this level. Only a failure to run
    /// the engine at all is.
    fn invoke(&mut self, arguments: &[String]) -> Result<Invocation, StillpickError>;

    /// Create a directory in the engine filesystem.
    fn create_dir(&mut self, dir: &str) -> Result<(), StillpickError>;

    /// Make the host file `input` visible inside `dir`.
    ///
    /// Returns the engine-side path of the mounted file.
    fn mount(&mut self, dir: &str, input: &Path) -> Result<String, StillpickError>;

    /// Read a file from the engine filesystem.
    ///
    /// A missing file is reported as an [`std::io::ErrorKind::NotFound`]
    /// I/O error.
    fn read_file(&mut self, name: &str) -> Result<Vec<u8>, StillpickError>;

    /// Delete a file from the engine filesystem.
    fn delete_file(&mut self, name: &str) -> Result<(), StillpickError>;
}

impl<E: DecodeEngine + ?Sized> DecodeEngine for &mut E {
    fn invoke(&mut self, arguments: &[String]) -> Result<Invocation, StillpickError> {
        (**self).invoke(arguments)
    }

    fn create_dir(&mut self, dir: &str) -> Result<(), StillpickError> {
        (**self).create_dir(dir)
    }

    fn mount(&mut self, dir: &str, input: &Path) -> Result<String, StillpickError> {
        (**self).mount(dir, input)
    }

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>, StillpickError> {
        (**self).read_file(name)
    }

    fn delete_file(&mut self, name: &str) -> Result<(), StillpickError> {
        (**self).delete_file(name)
    }
}

/// Render an argument vector the way it would be typed at a shell.
pub(crate) fn command_line(arguments: &[String]) -> String {
    let mut rendered = String::from("ffmpeg");
    for argument in arguments {
        rendered.push(' ');
        rendered.push_str(argument);
    }
    rendered
}
