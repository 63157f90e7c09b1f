use std::time::Duration;

use anyhow::{Context, Result};
use shotdiff::CompareOptions;
use shotdiff::compare::validate_unit;

use super::diff::DiffConfig;
use super::{Config, load};

/// Values extracted from the CLI that participate in the merge.
#[derive(Default)]
pub struct CliOverrides {
    pub diff: DiffConfig,
    pub parallel: Option<usize>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

/// Insight settings after the merge. The key is looked up, not validated.
pub struct ResolvedInsight {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Fully resolved config after CLI > env > file > defaults merge.
pub struct ResolvedConfig {
    pub compare: CompareOptions,
    pub insight: ResolvedInsight,
    pub parallel: usize,
}

impl ResolvedConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file_config = load()?;
        Self::resolve(file_config, cli, |key| std::env::var(key).ok())
    }

    fn resolve(
        file_config: Config,
        cli: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        // 1. Env layer
        let env_unit = |key: &str, name: &str| -> Result<Option<f64>> {
            env(key)
                .map(|v| v.parse::<f64>())
                .transpose()
                .with_context(|| format!("{key} must be a valid float"))?
                .map(|v| validate_unit(name, v).map_err(|e| anyhow::anyhow!("{key}: {e}")))
                .transpose()
        };
        let env_diff = DiffConfig {
            threshold: env_unit("SHOTDIFF_THRESHOLD", "threshold")?,
            alpha: env_unit("SHOTDIFF_ALPHA", "alpha")?,
            ..DiffConfig::default()
        };

        // 2. Diff: file base, then env, then CLI
        let mut diff = file_config.diff;
        diff.merge(&env_diff);
        diff.merge(&cli.diff);

        // 3. Insight: CLI > env > file
        let insight = &file_config.insight;
        let endpoint = cli
            .endpoint
            .or_else(|| env("SHOTDIFF_INSIGHT_ENDPOINT"))
            .unwrap_or_else(|| insight.endpoint().to_owned());
        let model = cli
            .model
            .or_else(|| env("SHOTDIFF_INSIGHT_MODEL"))
            .unwrap_or_else(|| insight.model().to_owned());
        let api_key_env = insight.api_key_env().to_owned();
        let api_key = env(&api_key_env).filter(|k| !k.trim().is_empty());

        let parallel = cli.parallel.unwrap_or(file_config.batch.parallel()).max(1);

        Ok(Self {
            compare: diff.options(),
            insight: ResolvedInsight {
                endpoint,
                model,
                api_key_env,
                api_key,
                timeout: Duration::from_secs(insight.timeout_secs()),
            },
            parallel,
        })
    }
}
