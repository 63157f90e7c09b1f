use serde::{Deserialize, Serialize};
use shotdiff::compare::validate_unit;
use shotdiff::{ColorScheme, CompareOptions};

fn parse_unit(name: &str, s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_unit(name, v)
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    parse_unit("threshold", s)
}

fn parse_alpha(s: &str) -> Result<f64, String> {
    parse_unit("alpha", s)
}

/// Comparison tuning.
///
/// Fields are `Option`; `None` means "use default".
/// Serves both TOML deserialization (`[diff]`) and CLI argument parsing.
#[derive(Clone, Debug, Default, clap::Args, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Perceptual tolerance (0.0-1.0, higher is more tolerant) [default: 0.1]
    #[arg(long, value_parser = parse_threshold)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Ignore alpha-only differences up to this fraction (0.0-1.0) [default: 0.1]
    #[arg(long, value_parser = parse_alpha)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,

    /// Count anti-aliased pixels as differences; `false` detects and skips them [default: true]
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_aa: Option<bool>,

    /// Diff image colouring [default: two-tone-directional]
    #[arg(long, value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<ColorScheme>,
}

impl DiffConfig {
    /// Overlay non-None fields from `other` onto self.
    pub fn merge(&mut self, other: &DiffConfig) {
        if other.threshold.is_some() {
            self.threshold = other.threshold;
        }
        if other.alpha.is_some() {
            self.alpha = other.alpha;
        }
        if other.include_aa.is_some() {
            self.include_aa = other.include_aa;
        }
        if other.color_scheme.is_some() {
            self.color_scheme = other.color_scheme;
        }
    }

    pub fn options(&self) -> CompareOptions {
        let defaults = CompareOptions::default();
        CompareOptions {
            threshold: self.threshold.unwrap_or(defaults.threshold),
            alpha: self.alpha.unwrap_or(defaults.alpha),
            include_aa: self.include_aa.unwrap_or(defaults.include_aa),
            color_scheme: self.color_scheme.unwrap_or(defaults.color_scheme),
        }
    }
}
