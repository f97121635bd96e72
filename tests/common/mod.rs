//! In-memory decode engine shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Error as IoError, ErrorKind};
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use stillpick::{DecodeEngine, FfmpegLogLevel, Invocation, LogLine, StillpickError};

/// What the fake engine does for one extraction invocation.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Write these bytes as the output artifact.
    Write(Vec<u8>),
    /// Exit with an error and write nothing.
    Fail,
}

/// Scripted stand-in for FFmpeg.
///
/// Probe invocations (those with `-vn`) return `probe_log`. Extraction
/// invocations pop the next scripted [`Extraction`], falling back to a sharp,
/// bright frame once the script runs out.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub probe_log: Vec<String>,
    pub script: VecDeque<Extraction>,
    pub files: HashMap<String, Vec<u8>>,
    pub directories: Vec<String>,
    pub invocations: Vec<Vec<String>>,
    pub deleted: Vec<String>,
    pub unreadable: bool,
    pub unmountable: bool,
}

impl FakeEngine {
    pub fn with_probe_log(lines: &[&str]) -> Self {
        Self {
            probe_log: lines.iter().map(|line| line.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn script(mut self, extractions: impl IntoIterator<Item = Extraction>) -> Self {
        self.script.extend(extractions);
        self
    }

    /// Argument vectors of every extraction invocation.
    pub fn extractions(&self) -> Vec<&Vec<String>> {
        self.invocations
            .iter()
            .filter(|arguments| !arguments.iter().any(|argument| argument == "-vn"))
            .collect()
    }

    /// Value following `flag` in an argument vector.
    pub fn argument<'a>(arguments: &'a [String], flag: &str) -> &'a str {
        let index = arguments
            .iter()
            .position(|argument| argument == flag)
            .unwrap_or_else(|| panic!("missing {flag} in {arguments:?}"));
        &arguments[index + 1]
    }
}

impl DecodeEngine for FakeEngine {
    fn invoke(&mut self, arguments: &[String]) -> Result<Invocation, StillpickError> {
        self.invocations.push(arguments.to_vec());

        if arguments.iter().any(|argument| argument == "-vn") {
            return Ok(Invocation {
                exit_code: Some(1),
                log: self
                    .probe_log
                    .iter()
                    .map(|line| LogLine::new(FfmpegLogLevel::Info, line.clone()))
                    .collect(),
            });
        }

        let output = arguments.last().cloned().unwrap_or_default();
        match self
            .script
            .pop_front()
            .unwrap_or_else(|| Extraction::Write(png(&checkerboard(0, 255))))
        {
            Extraction::Write(bytes) => {
                self.files.insert(output, bytes);
                Ok(Invocation {
                    exit_code: Some(0),
                    log: Vec::new(),
                })
            }
            Extraction::Fail => Ok(Invocation {
                exit_code: Some(1),
                log: vec![LogLine::new(
                    FfmpegLogLevel::Error,
                    "Output file is empty, nothing was encoded",
                )],
            }),
        }
    }

    fn create_dir(&mut self, dir: &str) -> Result<(), StillpickError> {
        self.directories.push(dir.to_string());
        Ok(())
    }

    fn mount(&mut self, dir: &str, input: &Path) -> Result<String, StillpickError> {
        if self.unmountable {
            return Err(StillpickError::Mount {
                path: input.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }
        let name = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("{dir}/{name}"))
    }

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>, StillpickError> {
        if self.unreadable && self.files.contains_key(name) {
            return Err(IoError::new(ErrorKind::PermissionDenied, "unreadable").into());
        }
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| IoError::new(ErrorKind::NotFound, name.to_string()).into())
    }

    fn delete_file(&mut self, name: &str) -> Result<(), StillpickError> {
        match self.files.remove(name) {
            Some(_) => {
                self.deleted.push(name.to_string());
                Ok(())
            }
            None => Err(IoError::new(ErrorKind::NotFound, name.to_string()).into()),
        }
    }
}

pub fn uniform(value: u8) -> GrayImage {
    GrayImage::from_pixel(48, 27, Luma([value]))
}

/// One-pixel checkerboard alternating between `low` and `high`.
pub fn checkerboard(low: u8, high: u8) -> GrayImage {
    GrayImage::from_fn(48, 27, |x, y| {
        if (x + y) % 2 == 0 {
            Luma([high])
        } else {
            Luma([low])
        }
    })
}

pub fn png(image: &GrayImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image.clone())
        .to_rgb8()
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode PNG");
    bytes
}

pub fn sharp() -> Extraction {
    Extraction::Write(png(&checkerboard(0, 255)))
}

pub fn dark_and_blurry() -> Extraction {
    Extraction::Write(png(&uniform(20)))
}

pub fn blurry() -> Extraction {
    Extraction::Write(png(&uniform(200)))
}

pub fn dark() -> Extraction {
    Extraction::Write(png(&checkerboard(0, 40)))
}
