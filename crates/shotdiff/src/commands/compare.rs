use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use shotdiff::batch::{self, BatchError, Pair};

use crate::config::ResolvedConfig;
use crate::report::PairStatus;
use crate::report::terminal;
use crate::store;

/// `shotdiff compare`: one pair of files.
/// Returns exit code: 0 = pass, 1 = fail or size change.
pub async fn compare(
    config: ResolvedConfig,
    baseline: PathBuf,
    current: PathBuf,
    out: Option<&Path>,
    json: bool,
) -> Result<i32> {
    let pair = Pair {
        id: current.display().to_string(),
        baseline,
        current,
    };
    let options = config.compare;
    let job = pair.clone();
    let outcome = tokio::task::spawn_blocking(move || batch::compare_pair(&job, &options))
        .await
        .context("Comparison task panicked")?;

    let compared = match outcome {
        Ok(compared) => compared,
        Err(BatchError::Compare(e)) if e.is_dimension_mismatch() => {
            if json {
                println!("{}", json!({ "error": e.to_string() }));
            } else {
                let status = PairStatus::from_compare_error(&e);
                terminal::print_line(&pair.id, &status, Default::default());
            }
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    if let (Some(out), Some(png)) = (out, &compared.result.diff_image) {
        store::write_file(out, png)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&compared.result)?);
    } else {
        let status = PairStatus::from_metrics(&compared.result.metrics);
        terminal::print_line(&pair.id, &status, compared.elapsed);
        if let (Some(out), Some(_)) = (out, &compared.result.diff_image) {
            println!("  diff:  {}", out.display());
        }
    }

    Ok(if compared.result.metrics.pass { 0 } else { 1 })
}
