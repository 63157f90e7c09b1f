pub mod diff;
pub mod resolve;
pub mod template;

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use shotdiff::compare::validate_unit;

pub use self::diff::DiffConfig;
pub use self::resolve::{CliOverrides, ResolvedConfig};
pub use self::template::{config_file_exists, write_template};

pub(crate) const CONFIG_DIR: &str = ".shotdiff";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PARALLEL: usize = 4;

/// External vision classifier settings (`[insight]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl InsightConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

/// Batch comparison settings (`[batch]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Comparisons in flight at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,
}

impl BatchConfig {
    pub fn parallel(&self) -> usize {
        self.parallel.unwrap_or(DEFAULT_PARALLEL)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub insight: InsightConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Config {
    /// Validate semantic constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        if let Some(v) = self.diff.threshold {
            validate_unit("threshold", v).map_err(|e| anyhow::anyhow!("diff.{e}"))?;
        }
        if let Some(v) = self.diff.alpha {
            validate_unit("alpha", v).map_err(|e| anyhow::anyhow!("diff.{e}"))?;
        }
        if self.insight.timeout_secs == Some(0) {
            bail!("insight.timeout_secs must be > 0");
        }
        if self.batch.parallel == Some(0) {
            bail!("batch.parallel must be > 0");
        }
        Ok(())
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Load `.shotdiff/config.toml`, or defaults when it does not exist.
pub fn load() -> Result<Config> {
    let path = Path::new(CONFIG_DIR).join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Config::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shotdiff::ColorScheme;

    #[test]
    fn empty_file_means_defaults() {
        let c = Config::parse("").unwrap();
        assert_eq!(c.insight.model(), DEFAULT_MODEL);
        assert_eq!(c.insight.timeout_secs(), 30);
        assert_eq!(c.batch.parallel(), 4);
        assert_eq!(c.diff.options(), shotdiff::CompareOptions::default());
    }

    #[test]
    fn sections_are_read() {
        let c = Config::parse(
            r#"
[diff]
threshold = 0.05
include_aa = false
color_scheme = "heatmap"

[insight]
endpoint = "http://localhost:8080/v1"
timeout_secs = 10

[batch]
parallel = 8
"#,
        )
        .unwrap();
        let o = c.diff.options();
        assert_eq!(o.threshold, 0.05);
        assert!(!o.include_aa);
        assert_eq!(o.color_scheme, ColorScheme::Heatmap);
        assert_eq!(c.insight.endpoint(), "http://localhost:8080/v1");
        assert_eq!(c.insight.timeout_secs(), 10);
        assert_eq!(c.batch.parallel(), 8);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = Config::parse("[diff]\nthreshold = 2.0").unwrap_err();
        assert!(err.to_string().contains("diff.threshold"), "{err}");
    }

    #[test]
    fn zero_parallel_is_rejected() {
        assert!(Config::parse("[batch]\nparallel = 0").is_err());
        assert!(Config::parse("[insight]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn unknown_color_scheme_is_rejected() {
        assert!(Config::parse("[diff]\ncolor_scheme = \"rainbow\"").is_err());
    }
}
