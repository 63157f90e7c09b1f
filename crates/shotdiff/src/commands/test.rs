use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use shotdiff::batch::{self, BatchPlan};
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::report::PairStatus;
use crate::report::terminal::{self, Totals};
use crate::store::DiffStore;

/// `shotdiff test`: pair two directory trees, compare, report.
/// Returns exit code: 0 = all pass, 1 = any fail, error or missing current.
pub async fn test(
    config: ResolvedConfig,
    baseline_dir: &Path,
    current_dir: &Path,
    out: &Path,
    filter: Option<&str>,
) -> Result<i32> {
    let plan = BatchPlan::plan(baseline_dir, current_dir, filter)?;
    let store = DiffStore::new(out);

    // Full run: wipe every old diff. Filtered run: only the pairs being compared.
    if filter.is_none() {
        store.clear();
    } else {
        for pair in &plan.pairs {
            store.remove(&pair.id);
        }
    }

    for id in &plan.missing_current {
        terminal::print_missing_line(id, "current capture");
    }
    for id in &plan.missing_baseline {
        terminal::print_missing_line(id, "baseline");
    }

    let run_start = Instant::now();
    let total = plan.total();
    let mut rx = batch::run(plan.pairs, config.compare, config.parallel);

    let mut done = 0usize;
    let mut passed = 0usize;
    let mut failed_names: Vec<String> = Vec::new();
    let mut errored_names: Vec<String> = Vec::new();

    debug!(total, parallel = config.parallel, "waiting for comparison results");
    while let Some((pair, outcome)) = rx.recv().await {
        done += 1;
        debug!(done, total, pair = %pair.id, "received result");

        let (status, elapsed) = match outcome {
            Ok(compared) => {
                if let Some(png) = &compared.result.diff_image {
                    store.write(&pair.id, png)?;
                }
                (
                    PairStatus::from_metrics(&compared.result.metrics),
                    compared.elapsed,
                )
            }
            Err(e) => (PairStatus::from_batch_error(&e), Default::default()),
        };

        match &status {
            PairStatus::Pass => passed += 1,
            PairStatus::Fail { .. } | PairStatus::SizeChanged { .. } => {
                failed_names.push(pair.id.clone());
            }
            PairStatus::Error(_) => errored_names.push(pair.id.clone()),
        }

        terminal::print_line(&pair.id, &status, elapsed);
        terminal::show_progress(done, total);
    }

    terminal::print_actionable_summary(
        &failed_names,
        &errored_names,
        &plan.missing_current,
        &plan.missing_baseline,
    );
    terminal::print_summary(
        &Totals {
            total,
            passed,
            failed: failed_names.len(),
            errored: errored_names.len(),
            missing_current: plan.missing_current.len(),
            missing_baseline: plan.missing_baseline.len(),
        },
        run_start.elapsed(),
    );

    // A current capture without a baseline is new, not a regression.
    let code = if !failed_names.is_empty()
        || !errored_names.is_empty()
        || !plan.missing_current.is_empty()
    {
        1
    } else {
        0
    };
    Ok(code)
}
