use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use shotdiff::insight::{HttpClassifier, ImageRef};
use shotdiff::{
    ComparisonMetrics, InsightBuilder, InsightContext, InsightResult, InsightUnavailable,
    Severity, compare_png,
};
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::config::resolve::ResolvedInsight;
use crate::report::PairStatus;
use crate::report::terminal;
use crate::store;

/// Inputs of `shotdiff insight` beyond the resolved config.
pub struct InsightArgs {
    pub baseline: PathBuf,
    pub current: PathBuf,
    pub baseline_url: Option<String>,
    pub current_url: Option<String>,
    pub diff_url: Option<String>,
    pub baseline_label: Option<String>,
    pub current_label: Option<String>,
    pub out: Option<PathBuf>,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightReport<'a> {
    metrics: &'a ComparisonMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    insight: Option<&'a InsightResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    insight_error: Option<String>,
}

fn read_png(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// `shotdiff insight`: compare, then ask the classifier what changed.
/// Returns exit code: 0 = insight says pass, 1 = any other severity or a
/// size change, 2 = no insight could be produced.
pub async fn insight(config: ResolvedConfig, args: InsightArgs) -> Result<i32> {
    let baseline_png = read_png(&args.baseline)?;
    let current_png = read_png(&args.current)?;
    let options = config.compare;

    let start = Instant::now();
    let (baseline_png, current_png, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = compare_png(&baseline_png, &current_png, &options);
        (baseline_png, current_png, outcome)
    })
    .await
    .context("Comparison task panicked")?;
    let elapsed = start.elapsed();

    let name = args.current.display().to_string();
    let result = match outcome {
        Ok(result) => result,
        Err(e) if e.is_dimension_mismatch() => {
            if args.json {
                println!("{}", json!({ "error": e.to_string() }));
            } else {
                terminal::print_line(&name, &PairStatus::from_compare_error(&e), elapsed);
            }
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };

    if let (Some(out), Some(png)) = (&args.out, &result.diff_image) {
        store::write_file(out, png)?;
    }
    if !args.json {
        terminal::print_line(&name, &PairStatus::from_metrics(&result.metrics), elapsed);
    }

    let context = InsightContext {
        baseline_image: image_ref(args.baseline_url, &baseline_png),
        current_image: image_ref(args.current_url, &current_png),
        diff_image: match args.diff_url {
            Some(url) => Some(ImageRef::url(url)),
            None => result.diff_image.as_deref().map(ImageRef::png_data),
        },
        baseline_label: args.baseline_label,
        current_label: args.current_label,
    };

    let insight = request_insight(&config.insight, &result.metrics, &context).await;

    if args.json {
        let report = InsightReport {
            metrics: &result.metrics,
            insight: insight.as_ref().ok(),
            insight_error: insight.as_ref().err().map(ToString::to_string),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &insight {
            Ok(insight) => terminal::print_insight(insight),
            Err(e) => eprintln!("\x1b[33mInsight unavailable:\x1b[0m {e}"),
        }
    }

    Ok(match insight {
        Ok(insight) if insight.severity == Severity::Pass => 0,
        Ok(_) => 1,
        Err(_) => 2,
    })
}

fn image_ref(url: Option<String>, png: &[u8]) -> ImageRef {
    match url {
        Some(url) => ImageRef::url(url),
        None => ImageRef::png_data(png),
    }
}

async fn request_insight(
    settings: &ResolvedInsight,
    metrics: &ComparisonMetrics,
    context: &InsightContext,
) -> Result<InsightResult, InsightUnavailable> {
    let api_key = settings.api_key.as_deref().ok_or_else(|| {
        InsightUnavailable::NotConfigured(format!("{} is not set", settings.api_key_env))
    })?;
    let classifier = HttpClassifier::new(&settings.endpoint, api_key, settings.timeout)?;
    debug!(
        endpoint = %settings.endpoint,
        inline_images = [&context.baseline_image, &context.current_image]
            .iter()
            .filter(|r| r.is_inline())
            .count(),
        "requesting insight"
    );

    InsightBuilder::new(classifier, settings.model.as_str())
        .with_timeout(settings.timeout)
        .build_and_interpret(metrics, context)
        .await
}
