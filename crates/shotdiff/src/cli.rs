use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DiffConfig;

#[derive(Parser)]
#[command(
    name = "shotdiff",
    about = "Perceptual screenshot diffing with optional semantic insight"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .shotdiff/config.toml with commented defaults
    Init {
        /// Overwrite an existing config
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Compare two PNG files (exit 0 on pass, 1 on fail)
    Compare {
        baseline: PathBuf,
        current: PathBuf,
        /// Write the diff PNG here when pixels differ
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Print metrics as JSON instead of a status line
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        diff: DiffConfig,
    },

    /// Compare every PNG pair under two directory trees (exit 0/1)
    Test {
        baseline_dir: PathBuf,
        current_dir: PathBuf,
        /// Directory for diff PNGs, mirroring the input layout
        #[arg(long, short = 'o', default_value = ".shotdiff/diff")]
        out: PathBuf,
        /// Only compare pairs whose id matches PATTERN (glob or substring)
        #[arg(long, short = 'f')]
        filter: Option<String>,
        /// Comparisons in flight at once (overrides config)
        #[arg(long, short = 'p')]
        parallel: Option<usize>,
        #[command(flatten)]
        diff: DiffConfig,
    },

    /// Compare two PNG files and ask a vision model to classify the change
    Insight {
        baseline: PathBuf,
        current: PathBuf,
        /// Hosted baseline image; inlined as a data URI when omitted
        #[arg(long)]
        baseline_url: Option<String>,
        /// Hosted current image; inlined as a data URI when omitted
        #[arg(long)]
        current_url: Option<String>,
        /// Hosted diff image; inlined as a data URI when omitted
        #[arg(long)]
        diff_url: Option<String>,
        /// Where the baseline came from, e.g. the page URL
        #[arg(long)]
        baseline_label: Option<String>,
        /// Where the current capture came from
        #[arg(long)]
        current_label: Option<String>,
        /// Write the diff PNG here when pixels differ
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Model name (overrides config)
        #[arg(long)]
        model: Option<String>,
        /// OpenAI-compatible API base URL (overrides config)
        #[arg(long)]
        endpoint: Option<String>,
        /// Print metrics and insight as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        diff: DiffConfig,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compare_flags_flatten_into_diff_config() {
        let cli = Cli::try_parse_from([
            "shotdiff",
            "compare",
            "a.png",
            "b.png",
            "--threshold",
            "0.2",
            "--include-aa",
            "false",
            "--color-scheme",
            "heatmap",
        ])
        .unwrap();
        let Command::Compare { diff, json, .. } = cli.command else {
            panic!("expected compare");
        };
        assert!(!json);
        assert_eq!(diff.threshold, Some(0.2));
        assert_eq!(diff.include_aa, Some(false));
        assert_eq!(diff.color_scheme, Some(shotdiff::ColorScheme::Heatmap));
    }

    #[test]
    fn out_of_range_threshold_is_a_usage_error() {
        assert!(Cli::try_parse_from(["shotdiff", "compare", "a", "b", "--threshold", "7"]).is_err());
    }
}
