pub mod terminal;

use shotdiff::batch::BatchError;
use shotdiff::{CompareError, ComparisonMetrics};

/// Status of a single pair comparison.
pub enum PairStatus {
    Pass,
    Fail {
        mismatched: u64,
        percent: f64,
    },
    SizeChanged {
        baseline: (u32, u32),
        current: (u32, u32),
    },
    Error(String),
}

impl PairStatus {
    pub fn from_metrics(metrics: &ComparisonMetrics) -> Self {
        if metrics.pass {
            Self::Pass
        } else {
            Self::Fail {
                mismatched: metrics.mismatched_pixel_count,
                percent: metrics.mismatch_percent,
            }
        }
    }

    pub fn from_compare_error(err: &CompareError) -> Self {
        match *err {
            CompareError::DimensionMismatch {
                baseline_width,
                baseline_height,
                current_width,
                current_height,
            } => Self::SizeChanged {
                baseline: (baseline_width, baseline_height),
                current: (current_width, current_height),
            },
            ref other => Self::Error(other.to_string()),
        }
    }

    pub fn from_batch_error(err: &BatchError) -> Self {
        match err {
            BatchError::Compare(e) => Self::from_compare_error(e),
            other => Self::Error(other.to_string()),
        }
    }
}
