//! Screenshot comparison: perceptual pixel diff, diff rendering, and
//! semantic classification of the change by an external vision model.

pub mod batch;
pub mod codec;
pub mod compare;
pub mod insight;

pub use compare::{
    ColorScheme, CompareError, CompareOptions, ComparisonMetrics, ComparisonResult, DiffMask,
    compare_images, compare_png,
};
pub use insight::{InsightBuilder, InsightContext, InsightResult, InsightUnavailable, Severity};
