use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, CONFIG_FILE};

/// Hand-crafted config template with commented-out keys, so users can see
/// the available knobs without uncommenting section headers.
pub(crate) const CONFIG_TEMPLATE: &str = r#"# ─────────────────────────────────────────────────────────
# Pixel comparison. All fields optional.
# ─────────────────────────────────────────────────────────
[diff]
# threshold = 0.1                   # perceptual tolerance, 0.0 = strict, 1.0 = anything goes
# alpha = 0.1                       # ignore alpha-only changes up to this fraction
# include_aa = true                 # false = detect anti-aliasing and skip it
# color_scheme = "two-tone-directional"  # | "single-tone-red" | "heatmap"

# ─────────────────────────────────────────────────────────
# Semantic insight (OpenAI-compatible chat completions API).
# ─────────────────────────────────────────────────────────
[insight]
# endpoint = "https://api.openai.com/v1"
# model = "gpt-4o-mini"
# api_key_env = "OPENAI_API_KEY"    # env var that holds the key
# timeout_secs = 30

# ─────────────────────────────────────────────────────────
# Directory comparison (`shotdiff test`).
# ─────────────────────────────────────────────────────────
[batch]
# parallel = 4                      # comparisons in flight
"#;

pub fn config_file_exists() -> bool {
    Path::new(CONFIG_DIR).join(CONFIG_FILE).exists()
}

/// Write the commented template to `.shotdiff/config.toml`.
pub fn write_template() -> Result<()> {
    let dir = Path::new(CONFIG_DIR);
    std::fs::create_dir_all(dir).context("Failed to create .shotdiff directory")?;
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::Config;
    use super::*;

    #[test]
    fn template_parses_to_defaults() {
        let c = Config::parse(CONFIG_TEMPLATE).unwrap();
        assert!(c.diff.threshold.is_none());
        assert!(c.insight.endpoint.is_none());
        assert!(c.batch.parallel.is_none());
    }
}
