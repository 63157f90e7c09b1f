//! Semantic classification of a comparison by an external vision model.
//!
//! The model is a black box behind [`Classifier`]. This module owns the
//! request shape and the response contract, and enforces the timeout.

pub mod http;
pub mod prompt;
pub mod schema;

use std::future::Future;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::compare::ComparisonMetrics;

pub use self::http::HttpClassifier;
pub use self::schema::{InsightIssue, InsightResult, Severity};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Why no insight could be produced. The pixel comparison that preceded the
/// request stays valid.
#[derive(Debug, Error)]
pub enum InsightUnavailable {
    #[error("insight classifier is not configured: {0}")]
    NotConfigured(String),

    #[error("insight classifier timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("insight classifier unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("insight classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("insight classifier returned no content")]
    EmptyResponse,

    #[error("insight response failed validation: {0}")]
    Schema(String),
}

/// Something that answers a chat-completions request body with the
/// assistant's message content.
pub trait Classifier {
    fn complete(
        &self,
        body: &Value,
    ) -> impl Future<Output = Result<String, InsightUnavailable>> + Send;
}

/// An image the classifier can fetch: a public or signed URL, or inline data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Inline PNG as a `data:` URI, for images with no hosted copy.
    pub fn png_data(png: &[u8]) -> Self {
        Self(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }
}

/// Caller-supplied grounding for one insight request.
#[derive(Debug, Clone)]
pub struct InsightContext {
    pub baseline_image: ImageRef,
    pub current_image: ImageRef,
    pub diff_image: Option<ImageRef>,
    /// Human-readable origin, e.g. the captured page URL.
    pub baseline_label: Option<String>,
    pub current_label: Option<String>,
}

/// Everything the classifier sees about one comparison.
#[derive(Debug, Clone)]
pub struct InsightRequest {
    pub baseline_image: ImageRef,
    pub current_image: ImageRef,
    pub diff_image: Option<ImageRef>,
    pub mismatch_percent: f64,
    pub mismatched_pixel_count: u64,
    pub baseline_label: Option<String>,
    pub current_label: Option<String>,
}

impl InsightRequest {
    pub fn new(metrics: &ComparisonMetrics, context: &InsightContext) -> Self {
        Self {
            baseline_image: context.baseline_image.clone(),
            current_image: context.current_image.clone(),
            diff_image: context.diff_image.clone(),
            mismatch_percent: metrics.mismatch_percent,
            mismatched_pixel_count: metrics.mismatched_pixel_count,
            baseline_label: context.baseline_label.clone(),
            current_label: context.current_label.clone(),
        }
    }
}

/// Builds requests, calls the classifier, and validates what comes back.
pub struct InsightBuilder<C> {
    classifier: C,
    model: String,
    timeout: Duration,
}

impl<C: Classifier> InsightBuilder<C> {
    pub fn new(classifier: C, model: impl Into<String>) -> Self {
        Self {
            classifier,
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One classifier round trip. Never retried here.
    pub async fn build_and_interpret(
        &self,
        metrics: &ComparisonMetrics,
        context: &InsightContext,
    ) -> Result<InsightResult, InsightUnavailable> {
        let request = InsightRequest::new(metrics, context);
        let body = prompt::request_body(&self.model, &request);
        debug!(
            model = %self.model,
            percent = request.mismatch_percent,
            has_diff = request.diff_image.is_some(),
            "requesting insight"
        );

        let content = tokio::time::timeout(self.timeout, self.classifier.complete(&body))
            .await
            .map_err(|_| InsightUnavailable::Timeout {
                after: self.timeout,
            })
            .and_then(|r| r)
            .inspect_err(|e| warn!(error = %e, "insight request failed"))?;

        let result = schema::parse(&content)
            .inspect_err(|e| warn!(error = %e, "insight response rejected"))?;
        debug!(severity = %result.severity, issues = result.issues.len(), "insight received");
        Ok(result)
    }
}
