use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMetrics {
    pub mismatched_pixel_count: u64,
    pub total_pixel_count: u64,
    /// 0.0-100.0, rounded to 4 decimal places.
    pub mismatch_percent: f64,
    /// True only when nothing mismatched. How much residual difference is
    /// acceptable is the insight classifier's call, not ours.
    pub pass: bool,
}

/// Derive percentage and verdict from raw counts.
pub fn aggregate(mismatched: u64, total: u64) -> ComparisonMetrics {
    let mismatch_percent = if total > 0 {
        round4(mismatched as f64 / total as f64 * 100.0)
    } else {
        0.0
    };
    ComparisonMetrics {
        mismatched_pixel_count: mismatched,
        total_pixel_count: total,
        mismatch_percent,
        pass: mismatched == 0,
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
