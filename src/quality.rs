//! Frame quality scoring.
//!
//! A frame is judged on two grayscale statistics, taken after converting
//! colour frames with BT.601 luma weights ([`to_gray`]):
//!
//! - **brightness**, the mean intensity on a 0–255 scale, and
//! - **sharpness**, the variance of the image's Laplacian response. Sharp
//!   edges produce large second derivatives of both signs; a defocused or
//!   motion-smeared frame produces a response close to zero everywhere.
//!
//! Both thresholds are fixed. They were tuned by eye on typical film and TV
//! material and are not derived from the image size or content.
//!
//! All working buffers (the grayscale copy and the Laplacian response) are
//! owned by the scoring call and freed when it returns, on every path.
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, GrayImage, Luma};
//! use stillpick::quality::{self, Verdict};
//!
//! let night = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([12])));
//! let score = quality::score(&night)?;
//! assert_eq!(score.verdict(), Verdict::DarkAndBlurry);
//! # Ok::<(), stillpick::StillpickError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use image::{DynamicImage, GrayImage, Luma, Rgb};

use crate::error::StillpickError;

/// Frames with a mean intensity below this are dark.
pub const DARK_THRESHOLD: f64 = 50.0;

/// Frames with a Laplacian variance below this are blurry.
pub const BLUR_THRESHOLD: f64 = 1000.0;

/// Brightness and sharpness statistics for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityScore {
    /// Mean grayscale intensity, 0–255.
    pub mean_intensity: f64,
    /// Variance of the Laplacian response.
    pub blur_variance: f64,
    /// `mean_intensity < DARK_THRESHOLD`.
    pub is_dark: bool,
    /// `blur_variance < BLUR_THRESHOLD`.
    pub is_blurry: bool,
}

impl QualityScore {
    /// Build a score from the two raw statistics.
    pub fn from_statistics(mean_intensity: f64, blur_variance: f64) -> Self {
        Self {
            mean_intensity,
            blur_variance,
            is_dark: mean_intensity < DARK_THRESHOLD,
            is_blurry: blur_variance < BLUR_THRESHOLD,
        }
    }

    /// Returns `true` if the frame is neither dark nor blurry.
    pub fn is_valid(&self) -> bool {
        !self.is_dark && !self.is_blurry
    }

    /// Classify the frame.
    pub fn verdict(&self) -> Verdict {
        match (self.is_dark, self.is_blurry) {
            (false, false) => Verdict::Valid,
            (true, false) => Verdict::Dark,
            (false, true) => Verdict::Blurry,
            (true, true) => Verdict::DarkAndBlurry,
        }
    }
}

/// The classification of a scored frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Bright enough and sharp enough.
    Valid,
    /// Too dark, but sharp.
    Dark,
    /// Too blurry, but bright enough.
    Blurry,
    /// Both too dark and too blurry.
    DarkAndBlurry,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Verdict::Valid => "clear",
            Verdict::Dark => "dark",
            Verdict::Blurry => "blurry",
            Verdict::DarkAndBlurry => "dark and blurry",
        })
    }
}

/// Score a decoded frame.
///
/// # Errors
///
/// Returns [`StillpickError::EmptyImage`] if the image has no pixels.
pub fn score(image: &DynamicImage) -> Result<QualityScore, StillpickError> {
    score_gray(&to_gray(image))
}

/// BT.601 weights for R, G and B in 14-bit fixed point. They sum to
/// `1 << GRAY_SHIFT`, so equal channels map to the same gray value.
const GRAY_WEIGHTS: [u32; 3] = [4899, 9617, 1868];
const GRAY_SHIFT: u32 = 14;

/// Convert to 8-bit gray as `0.299 R + 0.587 G + 0.114 B`, rounded to
/// nearest. Alpha is ignored.
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
        Luma([bt601(r, g, b)])
    })
}

fn bt601(r: u8, g: u8, b: u8) -> u8 {
    let [wr, wg, wb] = GRAY_WEIGHTS;
    let weighted = r as u32 * wr + g as u32 * wg + b as u32 * wb;
    ((weighted + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8
}

/// Score an image that is already grayscale.
pub fn score_gray(gray: &GrayImage) -> Result<QualityScore, StillpickError> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(StillpickError::EmptyImage { width, height });
    }

    let mean = mean_intensity(gray);
    let variance = laplacian_variance(gray);
    log::debug!("Average intensity (brightness): {mean:.2}, variance (blurriness): {variance:.2}");

    Ok(QualityScore::from_statistics(mean, variance))
}

/// Arithmetic mean of all pixels.
pub fn mean_intensity(gray: &GrayImage) -> f64 {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    pixels.iter().map(|&p| p as f64).sum::<f64>() / pixels.len() as f64
}

/// The 4-neighbour Laplacian `[0 1 0; 1 -4 1; 0 1 0]`, row-major.
///
/// Borders are reflected without repeating the edge pixel
/// (`dcb|abcd|cba`), so a flat image has a response of exactly zero.
pub fn laplacian(gray: &GrayImage) -> Vec<f64> {
    let (width, height) = gray.dimensions();
    let (width, height) = (width as i64, height as i64);
    let at = |x: i64, y: i64| -> f64 {
        let x = reflect_101(x, width);
        let y = reflect_101(y, height);
        gray.get_pixel(x as u32, y as u32).0[0] as f64
    };

    let mut response = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let value = at(x, y - 1) + at(x - 1, y) + at(x + 1, y) + at(x, y + 1) - 4.0 * at(x, y);
            response.push(value);
        }
    }
    response
}

/// Population variance of the Laplacian response.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let response = laplacian(gray);
    if response.is_empty() {
        return 0.0;
    }
    let count = response.len() as f64;
    let mean = response.iter().sum::<f64>() / count;
    response
        .iter()
        .map(|&value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / count
}

fn reflect_101(index: i64, length: i64) -> i64 {
    if length == 1 {
        return 0;
    }
    if index < 0 {
        -index
    } else if index >= length {
        2 * length - 2 - index
    } else {
        index
    }
}
