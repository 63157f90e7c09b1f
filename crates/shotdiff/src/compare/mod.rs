pub mod classify;
pub mod metrics;
pub mod render;
mod yiq;

use std::fmt;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::codec::{self, CodecError};

pub use self::classify::classify;
pub use self::metrics::{ComparisonMetrics, aggregate};
pub use self::render::render;

/// How mismatched pixels are coloured in the diff image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScheme {
    /// Every mismatch is red.
    SingleToneRed,
    /// Green for removed content, red for added content, yellow for noise.
    #[default]
    TwoToneDirectional,
    /// Yellow to red by perceptual distance.
    Heatmap,
}

/// Tuning for a single comparison.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Perceptual tolerance (0.0-1.0). Higher is more tolerant.
    pub threshold: f64,
    /// Alpha-only differences up to this fraction of 255 are ignored.
    pub alpha: f64,
    /// Count anti-aliased pixels as mismatches. `false` runs the
    /// anti-aliasing detector and excludes what it finds.
    pub include_aa: bool,
    pub color_scheme: ColorScheme,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            alpha: 0.1,
            include_aa: true,
            color_scheme: ColorScheme::default(),
        }
    }
}

impl CompareOptions {
    pub fn validate(&self) -> Result<(), CompareError> {
        validate_unit("threshold", self.threshold).map_err(CompareError::InvalidOptions)?;
        validate_unit("alpha", self.alpha).map_err(CompareError::InvalidOptions)?;
        Ok(())
    }
}

/// Check that `v` lies in `0.0..=1.0`.
pub fn validate_unit(name: &str, v: f64) -> Result<f64, String> {
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("{name} must be between 0.0 and 1.0, got {v}"));
    }
    Ok(v)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Baseline,
    Current,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::Current => f.write_str("current"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to decode {side} image: {source}")]
    Codec {
        side: Side,
        #[source]
        source: CodecError,
    },

    #[error(
        "cannot compare images of different size: baseline is \
         {baseline_width}x{baseline_height}, current is {current_width}x{current_height}"
    )]
    DimensionMismatch {
        baseline_width: u32,
        baseline_height: u32,
        current_width: u32,
        current_height: u32,
    },

    #[error("invalid comparison options: {0}")]
    InvalidOptions(String),

    #[error("failed to encode diff image: {0}")]
    Encode(#[source] CodecError),
}

impl CompareError {
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }
}

/// Per-pixel mismatch flags plus their visualization colours.
///
/// Same shape as the compared images. Alpha is nonzero exactly where the
/// pixel is a mismatch; RGB is meaningful only after [`render`].
#[derive(Clone, Debug, PartialEq)]
pub struct DiffMask(RgbaImage);

/// Placeholder written by the classifier; the renderer replaces it.
const MARK: Rgba<u8> = Rgba([0, 0, 0, 255]);

impl DiffMask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self(RgbaImage::new(width, height))
    }

    pub fn mark(&mut self, x: u32, y: u32) {
        self.0.put_pixel(x, y, MARK);
    }

    pub fn is_marked(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[3] != 0
    }

    pub fn marked_count(&self) -> u64 {
        self.0.pixels().filter(|p| p[3] != 0).count() as u64
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.0
    }

    pub(crate) fn paint(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        debug_assert!(color[3] != 0);
        self.0.put_pixel(x, y, color);
    }
}

/// Outcome of comparing two decoded images.
pub struct ImageComparison {
    pub metrics: ComparisonMetrics,
    /// Rendered diff, `None` when nothing mismatched.
    pub diff: Option<DiffMask>,
}

/// Externally visible output of the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub metrics: ComparisonMetrics,
    /// PNG-encoded diff, `None` when nothing mismatched.
    #[serde(skip)]
    pub diff_image: Option<Vec<u8>>,
}

/// Fail unless both images have the same dimensions.
pub fn check_dimensions(baseline: &RgbaImage, current: &RgbaImage) -> Result<(), CompareError> {
    if baseline.dimensions() != current.dimensions() {
        return Err(CompareError::DimensionMismatch {
            baseline_width: baseline.width(),
            baseline_height: baseline.height(),
            current_width: current.width(),
            current_height: current.height(),
        });
    }
    Ok(())
}

/// Classify, render and aggregate two decoded images.
pub fn compare_images(
    baseline: &RgbaImage,
    current: &RgbaImage,
    options: &CompareOptions,
) -> Result<ImageComparison, CompareError> {
    let (mismatched, mask) = classify(baseline, current, options)?;
    let total = u64::from(baseline.width()) * u64::from(baseline.height());
    let metrics = aggregate(mismatched, total);
    debug!(
        mismatched,
        total,
        percent = metrics.mismatch_percent,
        "comparison finished"
    );

    let diff = (mismatched > 0).then(|| render(baseline, current, mask, options.color_scheme));
    Ok(ImageComparison { metrics, diff })
}

/// Full pipeline: decode both PNGs, compare, encode the diff.
///
/// Runs synchronously; call via `spawn_blocking` from async code.
pub fn compare_png(
    baseline_png: &[u8],
    current_png: &[u8],
    options: &CompareOptions,
) -> Result<ComparisonResult, CompareError> {
    let baseline = codec::decode(baseline_png).map_err(|source| CompareError::Codec {
        side: Side::Baseline,
        source,
    })?;
    let current = codec::decode(current_png).map_err(|source| CompareError::Codec {
        side: Side::Current,
        source,
    })?;

    let comparison = compare_images(&baseline, &current, options)?;
    let diff_image = comparison
        .diff
        .map(|mask| codec::encode(mask.as_image()))
        .transpose()
        .map_err(CompareError::Encode)?;

    Ok(ComparisonResult {
        metrics: comparison.metrics,
        diff_image,
    })
}
