mod cli;
mod commands;
mod config;
mod report;
mod store;

use clap::Parser;
use config::{CliOverrides, ResolvedConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shotdiff=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Init { force } => {
            commands::init(force)?;
        }
        cli::Command::Compare {
            baseline,
            current,
            out,
            json,
            diff,
        } => {
            let config = ResolvedConfig::new(CliOverrides {
                diff,
                ..CliOverrides::default()
            })?;
            let code = commands::compare(config, baseline, current, out.as_deref(), json).await?;
            std::process::exit(code);
        }
        cli::Command::Test {
            baseline_dir,
            current_dir,
            out,
            filter,
            parallel,
            diff,
        } => {
            let config = ResolvedConfig::new(CliOverrides {
                diff,
                parallel,
                ..CliOverrides::default()
            })?;
            let code =
                commands::test(config, &baseline_dir, &current_dir, &out, filter.as_deref())
                    .await?;
            std::process::exit(code);
        }
        cli::Command::Insight {
            baseline,
            current,
            baseline_url,
            current_url,
            diff_url,
            baseline_label,
            current_label,
            out,
            model,
            endpoint,
            json,
            diff,
        } => {
            let config = ResolvedConfig::new(CliOverrides {
                diff,
                model,
                endpoint,
                ..CliOverrides::default()
            })?;
            let args = commands::InsightArgs {
                baseline,
                current,
                baseline_url,
                current_url,
                diff_url,
                baseline_label,
                current_label,
                out,
                json,
            };
            let code = commands::insight(config, args).await?;
            std::process::exit(code);
        }
    }

    Ok(())
}
