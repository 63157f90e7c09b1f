//! Chat-completions request assembly.

use serde_json::{Value, json};

use super::InsightRequest;
use super::schema::response_schema;

/// Prior expectation for a mismatch percentage. Guidance for the classifier,
/// which may override it on visual evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchBand {
    /// Under 0.1%.
    Noise,
    /// 0.1% to 1%.
    Minor,
    /// 1% to 5%.
    Noticeable,
    /// Over 5%.
    Major,
}

impl MismatchBand {
    pub fn for_percent(percent: f64) -> Self {
        if percent < 0.1 {
            Self::Noise
        } else if percent < 1.0 {
            Self::Minor
        } else if percent <= 5.0 {
            Self::Noticeable
        } else {
            Self::Major
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::Noise => "under 0.1%, presumptively rendering noise",
            Self::Minor => "between 0.1% and 1%, typically a minor change",
            Self::Noticeable => "between 1% and 5%, typically a noticeable change",
            Self::Major => "over 5%, likely a major or critical change",
        }
    }
}

const SYSTEM_PROMPT: &str = "\
You are a visual QA reviewer. You receive a BASELINE screenshot, a CURRENT \
screenshot of the same page taken later, and usually a DIFF overlay in which \
green marks content that disappeared, red marks content that appeared and \
yellow marks pixels that were flagged but are probably imperceptible.

Judge how consequential the visible change is and answer with JSON matching \
the provided schema.

Severity guidance, by mismatch percentage:
- under 0.1%: presumptively noise
- 0.1% to 1%: minor
- 1% to 5%: noticeable
- over 5%: likely major or critical
These bands are a prior, not a rule. Override them with what you actually \
see: sub-pixel or anti-aliasing noise is `pass` even at a few percent, and a \
tiny change to a price, a legal notice or a call to action can be `critical`.

If the two screenshots depict unrelated pages (a different site, product or \
screen), say so explicitly in the summary, set severity to `critical`, and do \
not list per-element issues.

Every issue needs a short title, where on the page it is, a category such as \
layout, content, typography, color, imagery or missing-element, its own \
severity, the visual evidence, and a concrete recommendation. Use an empty \
issues array when nothing changed. quickWins lists short, immediately \
actionable fixes.";

/// User message text: numeric context plus optional source labels.
pub fn context_text(req: &InsightRequest) -> String {
    let band = MismatchBand::for_percent(req.mismatch_percent);
    let mut text = format!(
        "Mismatched pixels: {} ({:.4}% of the page, {}).",
        req.mismatched_pixel_count,
        req.mismatch_percent,
        band.hint(),
    );
    if let Some(label) = &req.baseline_label {
        text.push_str(&format!("\nBaseline source: {label}"));
    }
    if let Some(label) = &req.current_label {
        text.push_str(&format!("\nCurrent source: {label}"));
    }
    if req.diff_image.is_none() {
        text.push_str("\nNo diff overlay is attached.");
    }
    text
}

fn image_part(label: &str, url: &str) -> [Value; 2] {
    [
        json!({ "type": "text", "text": label }),
        json!({ "type": "image_url", "image_url": { "url": url, "detail": "high" } }),
    ]
}

/// Full chat-completions body for `model`.
pub fn request_body(model: &str, req: &InsightRequest) -> Value {
    let mut content = vec![json!({ "type": "text", "text": context_text(req) })];
    content.extend(image_part("BASELINE", req.baseline_image.as_str()));
    content.extend(image_part("CURRENT", req.current_image.as_str()));
    if let Some(diff) = &req.diff_image {
        content.extend(image_part("DIFF", diff.as_str()));
    }

    json!({
        "model": model,
        "temperature": 0,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": content },
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "visual_insight",
                "strict": true,
                "schema": response_schema(),
            },
        },
    })
}
