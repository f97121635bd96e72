//! Single-frame extraction through the decode engine.
//!
//! Each extraction is one engine invocation that seeks to a timestamp and
//! writes a single PNG into the engine filesystem. The bytes are read back
//! and the artifact is deleted before [`FrameExtractor::extract`] returns,
//! whether or not the read succeeded.

use std::io::ErrorKind;

use image::{DynamicImage, ImageFormat};

use crate::engine::{DecodeEngine, command_line};
use crate::error::StillpickError;
use crate::filter::FilterGraph;

/// MIME type of every extracted frame.
pub const FRAME_MIME_TYPE: &str = "image/png";

/// One still frame pulled out of the input.
#[derive(Debug, Clone)]
pub struct ExtractedFrame {
    /// 1-based attempt index that produced the frame.
    pub attempt: u32,
    /// Seek position in whole seconds.
    pub timestamp: u64,
    /// Encoded PNG bytes.
    pub bytes: Vec<u8>,
    /// Always [`FRAME_MIME_TYPE`].
    pub mime_type: &'static str,
}

impl ExtractedFrame {
    /// Decode the PNG bytes into an image.
    pub fn decode(&self) -> Result<DynamicImage, StillpickError> {
        Ok(image::load_from_memory_with_format(
            &self.bytes,
            ImageFormat::Png,
        )?)
    }
}

/// Name of the artifact written for an attempt.
///
/// Embeds the attempt index and timestamp so that attempts never collide,
/// even when the same timestamp is drawn twice.
pub fn artifact_name(attempt: u32, timestamp: u64) -> String {
    format!("screen_{attempt}_{timestamp}.png")
}

/// Argument vector for extracting the frame at `timestamp`.
pub fn extraction_arguments(
    input: &str,
    timestamp: u64,
    filter_graph: &FilterGraph,
    output: &str,
) -> Vec<String> {
    vec![
        "-ss".to_string(),
        timestamp.to_string(),
        "-i".to_string(),
        input.to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-vf".to_string(),
        filter_graph.to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        output.to_string(),
    ]
}

/// Extracts frames from one mounted input with a fixed filter graph.
pub struct FrameExtractor<'a, E: DecodeEngine + ?Sized> {
    engine: &'a mut E,
    input: &'a str,
    filter_graph: &'a FilterGraph,
}

impl<'a, E: DecodeEngine + ?Sized> FrameExtractor<'a, E> {
    /// Create an extractor for the engine-side path `input`.
    pub fn new(engine: &'a mut E, input: &'a str, filter_graph: &'a FilterGraph) -> Self {
        Self {
            engine,
            input,
            filter_graph,
        }
    }

    /// Extract the frame at `timestamp` for attempt number `attempt`.
    ///
    /// # Errors
    ///
    /// [`StillpickError::ArtifactMissing`] if the engine produced no output
    /// file, or the engine's own error if the invocation could not run.
    pub fn extract(
        &mut self,
        attempt: u32,
        timestamp: u64,
    ) -> Result<ExtractedFrame, StillpickError> {
        let name = artifact_name(attempt, timestamp);
        let arguments = extraction_arguments(self.input, timestamp, self.filter_graph, &name);
        log::debug!("> {}", command_line(&arguments));

        let invocation = self.engine.invoke(&arguments)?;
        if !invocation.success() {
            log::debug!(
                "Extraction at {timestamp}s exited with {:?}",
                invocation.exit_code
            );
        }

        let read = {
            let mut artifact = Artifact {
                engine: &mut *self.engine,
                name: &name,
            };
            artifact.read()
        };
        let bytes = match read {
            Ok(bytes) => bytes,
            Err(StillpickError::IoError(error)) if error.kind() == ErrorKind::NotFound => {
                return Err(StillpickError::ArtifactMissing {
                    name,
                    exit_code: invocation.exit_code,
                });
            }
            Err(error) => return Err(error),
        };

        Ok(ExtractedFrame {
            attempt,
            timestamp,
            bytes,
            mime_type: FRAME_MIME_TYPE,
        })
    }
}

/// An engine-side file that is deleted when dropped.
struct Artifact<'e, 'n, E: DecodeEngine + ?Sized> {
    engine: &'e mut E,
    name: &'n str,
}

impl<E: DecodeEngine + ?Sized> Artifact<'_, '_, E> {
    fn read(&mut self) -> Result<Vec<u8>, StillpickError> {
        self.engine.read_file(self.name)
    }
}

impl<E: DecodeEngine + ?Sized> Drop for Artifact<'_, '_, E> {
    fn drop(&mut self) {
        match self.engine.delete_file(self.name) {
            Ok(()) => log::trace!("Deleted artifact {}", self.name),
            Err(StillpickError::IoError(error)) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => log::warn!("Failed to delete artifact {}: {error}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_name_embeds_attempt_and_timestamp() {
        assert_eq!(artifact_name(3, 42), "screen_3_42.png");
        assert_ne!(artifact_name(1, 42), artifact_name(2, 42));
    }

    #[test]
    fn extraction_argument_shape() {
        let graph = FilterGraph::new(false);
        let arguments = extraction_arguments("videos/clip.mp4", 17, &graph, "screen_1_17.png");
        assert_eq!(
            arguments,
            [
                "-ss",
                "17",
                "-i",
                "videos/clip.mp4",
                "-an",
                "-sn",
                "-map",
                "0:v:0",
                "-vf",
                graph.as_str(),
                "-pix_fmt",
                "rgb24",
                "-frames:v",
                "1",
                "screen_1_17.png",
            ]
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        let frame = ExtractedFrame {
            attempt: 1,
            timestamp: 0,
            bytes: b"not a png".to_vec(),
            mime_type: FRAME_MIME_TYPE,
        };
        assert!(matches!(frame.decode(), Err(StillpickError::ImageError(_))));
    }
}
