//! Probe-log parsing.
//!
//! A probe is a single engine invocation that opens the input without
//! producing output. FFmpeg prints the container header while doing so, and
//! two facts are read out of that text:
//!
//! - the clip duration, from the `Duration: HH:MM:SS.cc` header line, and
//! - whether the first video stream uses the SMPTE ST 2084 (PQ) transfer,
//!   from a `smpte2084` token in the stream description.
//!
//! Both parsers are plain functions over individual lines, folded together
//! by [`ProbeResult::from_lines`].
//!
//! # Example
//!
//! ```
//! use stillpick::ProbeResult;
//!
//! let log = [
//!     "Input #0, matroska,webm, from 'videos/clip.mkv':",
//!     "  Duration: 00:01:30.04, start: 0.000000, bitrate: 15041 kb/s",
//!     "  Stream #0:0: Video: hevc (Main 10), yuv420p10le(tv, bt2020nc/bt2020/smpte2084)",
//! ];
//! let probe = ProbeResult::from_lines(log);
//! assert_eq!(probe.duration_seconds, Some(90));
//! assert!(probe.is_hdr);
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::engine::DecodeEngine;
use crate::error::StillpickError;

/// Substring identifying the PQ transfer characteristic in a stream line.
pub const HDR_MARKER: &str = "smpte2084";

static DURATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})")
        .expect("duration pattern is a valid regex")
});

/// What a probe invocation revealed about the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeResult {
    /// Clip duration in whole seconds, if a duration line was seen.
    pub duration_seconds: Option<u64>,
    /// `true` once any line carried the [`HDR_MARKER`].
    pub is_hdr: bool,
}

impl ProbeResult {
    /// Fold the duration and HDR parsers over a finite log.
    ///
    /// The first duration line wins. The HDR flag is sticky.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut result = ProbeResult::default();
        for line in lines {
            result.observe(line);
        }
        result
    }

    /// Feed one more log line.
    pub fn observe(&mut self, line: &str) {
        if self.duration_seconds.is_none() {
            if let Some(seconds) = parse_duration(line) {
                log::info!("Video duration: {seconds} seconds");
                self.duration_seconds = Some(seconds);
            }
        }
        if !self.is_hdr && is_hdr_marker(line) {
            log::info!(
                "Tone mapping enabled, HDR detected from line: {}",
                line.trim()
            );
            self.is_hdr = true;
        }
    }

    /// The duration, which must be known and positive before sampling.
    ///
    /// # Errors
    ///
    /// [`StillpickError::DurationUnknown`] if no duration line was seen,
    /// [`StillpickError::EmptyClip`] if the clip is shorter than a second.
    pub fn require_duration(&self) -> Result<u64, StillpickError> {
        match self.duration_seconds {
            None => Err(StillpickError::DurationUnknown),
            Some(0) => Err(StillpickError::EmptyClip {
                duration_seconds: 0,
            }),
            Some(seconds) => Ok(seconds),
        }
    }
}

/// Parse a `Duration: HH:MM:SS.cc` header line into whole seconds.
///
/// Leading whitespace is allowed; centiseconds are discarded. Returns `None`
/// for every other line, including `Duration: N/A`.
pub fn parse_duration(line: &str) -> Option<u64> {
    let captures = DURATION_LINE.captures(line)?;
    let field = |index: usize| -> Option<u64> { captures.get(index)?.as_str().parse().ok() };
    let (hours, minutes, seconds) = (field(1)?, field(2)?, field(3)?);
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Returns `true` if `line` mentions the PQ transfer characteristic.
///
/// Other HDR transfers, such as HLG (`arib-std-b67`), are not recognised.
pub fn is_hdr_marker(line: &str) -> bool {
    line.contains(HDR_MARKER)
}

/// Argument vector for the probe invocation of `input`.
pub fn probe_arguments(input: &str) -> Vec<String> {
    [
        "-i",
        input,
        "-an",
        "-sn",
        "-map",
        "0:v:0",
        "-vn",
        "-hide_banner",
    ]
    .iter()
    .map(|argument| argument.to_string())
    .collect()
}

/// Run the probe invocation for an already-mounted input.
///
/// The probe names no output file, so FFmpeg exits with an error after
/// printing the header. The exit status is therefore ignored; only the log
/// matters.
///
/// # Errors
///
/// Only engine failures are returned here. A missing duration is reported
/// later by [`ProbeResult::require_duration`].
pub fn probe<E: DecodeEngine + ?Sized>(
    engine: &mut E,
    input: &str,
) -> Result<ProbeResult, StillpickError> {
    let arguments = probe_arguments(input);
    log::debug!("> {}", crate::engine::command_line(&arguments));
    let invocation = engine.invoke(&arguments)?;
    Ok(ProbeResult::from_lines(invocation.lines()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_ninety_seconds() {
        assert_eq!(parse_duration("Duration: 00:01:30.00"), Some(90));
    }

    #[test]
    fn duration_with_leading_whitespace_and_trailer() {
        assert_eq!(
            parse_duration("  Duration: 01:02:03.99, start: 0.000000, bitrate: 3 kb/s"),
            Some(3723)
        );
    }

    #[test]
    fn duration_rejects_other_lines() {
        assert_eq!(parse_duration("  Duration: N/A, bitrate: N/A"), None);
        assert_eq!(parse_duration("Stream #0:0 Duration: 00:00:10.00"), None);
        assert_eq!(parse_duration("  Duration: 0:01:30.00"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn first_duration_line_wins() {
        let probe = ProbeResult::from_lines([
            "  Duration: 00:02:00.00, start: 0.000000",
            "  Duration: 00:00:05.00, start: 0.000000",
        ]);
        assert_eq!(probe.duration_seconds, Some(120));
    }

    #[test]
    fn hdr_flag_is_sticky() {
        let probe = ProbeResult::from_lines([
            "  Stream #0:0: Video: hevc (Main 10), yuv420p10le(tv, bt2020nc/bt2020/smpte2084)",
            "  Stream #0:1: Audio: eac3, 48000 Hz, 5.1(side)",
            "At least one output file must be specified",
        ]);
        assert!(probe.is_hdr);
    }

    #[test]
    fn hlg_is_not_flagged() {
        let probe = ProbeResult::from_lines([
            "  Stream #0:0: Video: hevc (Main 10), yuv420p10le(tv, bt2020nc/bt2020/arib-std-b67)",
        ]);
        assert!(!probe.is_hdr);
    }

    #[test]
    fn require_duration_errors() {
        assert!(matches!(
            ProbeResult::default().require_duration(),
            Err(StillpickError::DurationUnknown)
        ));
        let zero = ProbeResult {
            duration_seconds: Some(0),
            is_hdr: false,
        };
        assert!(matches!(
            zero.require_duration(),
            Err(StillpickError::EmptyClip { .. })
        ));
    }

    #[test]
    fn probe_argument_shape() {
        assert_eq!(
            probe_arguments("videos/clip.mp4"),
            ["-i", "videos/clip.mp4", "-an", "-sn", "-map", "0:v:0", "-vn", "-hide_banner"]
        );
    }
}
