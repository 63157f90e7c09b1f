//! Typed classifier response and the JSON schema sent alongside the request.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::InsightUnavailable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Pass,
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Pass, Self::Minor, Self::Major, Self::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One located, actionable finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsightIssue {
    pub title: String,
    pub location: String,
    pub category: String,
    pub severity: Severity,
    pub evidence: String,
    pub recommendation: String,
}

/// The classifier's verdict on a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsightResult {
    pub summary: String,
    pub severity: Severity,
    /// Empty, never absent, when nothing was found.
    pub issues: Vec<InsightIssue>,
    pub quick_wins: Vec<String>,
    #[serde(default)]
    pub verdict: Option<String>,
}

/// Decode and validate the classifier's message content.
///
/// Any missing required field, wrong type, unknown field or out-of-enum
/// severity is rejected; nothing is filled in.
pub fn parse(content: &str) -> Result<InsightResult, InsightUnavailable> {
    let result: InsightResult =
        serde_json::from_str(content).map_err(|e| InsightUnavailable::Schema(e.to_string()))?;
    result.validate()?;
    Ok(result)
}

impl InsightResult {
    fn validate(&self) -> Result<(), InsightUnavailable> {
        if self.summary.trim().is_empty() {
            return Err(InsightUnavailable::Schema("summary is empty".into()));
        }
        if let Some(i) = self.issues.iter().position(|i| i.title.trim().is_empty()) {
            return Err(InsightUnavailable::Schema(format!(
                "issues[{i}].title is empty"
            )));
        }
        Ok(())
    }
}

/// Strict JSON schema for [`InsightResult`], in the shape OpenAI-compatible
/// `response_format: json_schema` expects.
pub fn response_schema() -> Value {
    let severity = json!({
        "type": "string",
        "enum": Severity::ALL.map(Severity::as_str),
    });
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["summary", "severity", "issues", "quickWins", "verdict"],
        "properties": {
            "summary": { "type": "string" },
            "severity": severity,
            "issues": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": [
                        "title", "location", "category", "severity", "evidence", "recommendation"
                    ],
                    "properties": {
                        "title": { "type": "string" },
                        "location": { "type": "string" },
                        "category": { "type": "string" },
                        "severity": severity,
                        "evidence": { "type": "string" },
                        "recommendation": { "type": "string" },
                    },
                },
            },
            "quickWins": { "type": "array", "items": { "type": "string" } },
            "verdict": { "type": ["string", "null"] },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Value {
        json!({
            "summary": "Hero button moved 12px down.",
            "severity": "minor",
            "issues": [{
                "title": "CTA shifted",
                "location": "hero section, right column",
                "category": "layout",
                "severity": "minor",
                "evidence": "red band under the button in the diff",
                "recommendation": "check the margin change in the hero stylesheet",
            }],
            "quickWins": ["restore hero margin-top"],
            "verdict": "Acceptable after review",
        })
    }

    fn parse_value(v: &Value) -> Result<InsightResult, InsightUnavailable> {
        parse(&v.to_string())
    }

    #[test]
    fn well_formed_response_parses() {
        let r = parse_value(&full()).unwrap();
        assert_eq!(r.severity, Severity::Minor);
        assert_eq!(r.issues.len(), 1);
        assert_eq!(r.issues[0].category, "layout");
        assert_eq!(r.quick_wins, vec!["restore hero margin-top".to_string()]);
        assert_eq!(r.verdict.as_deref(), Some("Acceptable after review"));
    }

    #[test]
    fn verdict_may_be_null_or_absent() {
        let mut v = full();
        v["verdict"] = Value::Null;
        assert_eq!(parse_value(&v).unwrap().verdict, None);
        v.as_object_mut().unwrap().remove("verdict");
        assert_eq!(parse_value(&v).unwrap().verdict, None);
    }

    #[test]
    fn missing_severity_is_rejected() {
        let mut v = full();
        v.as_object_mut().unwrap().remove("severity");
        let err = parse_value(&v).unwrap_err();
        assert!(matches!(err, InsightUnavailable::Schema(ref d) if d.contains("severity")), "{err}");
    }

    #[test]
    fn legacy_fail_severity_is_rejected() {
        let mut v = full();
        v["severity"] = json!("fail");
        assert!(matches!(parse_value(&v), Err(InsightUnavailable::Schema(_))));
    }

    #[test]
    fn out_of_enum_issue_severity_is_rejected() {
        let mut v = full();
        v["issues"][0]["severity"] = json!("high");
        assert!(matches!(parse_value(&v), Err(InsightUnavailable::Schema(_))));
    }

    #[test]
    fn null_issues_are_rejected() {
        let mut v = full();
        v["issues"] = Value::Null;
        assert!(matches!(parse_value(&v), Err(InsightUnavailable::Schema(_))));
    }

    #[test]
    fn missing_quick_wins_is_rejected() {
        let mut v = full();
        v.as_object_mut().unwrap().remove("quickWins");
        assert!(matches!(parse_value(&v), Err(InsightUnavailable::Schema(_))));
    }

    #[test]
    fn issue_missing_field_is_rejected() {
        let mut v = full();
        v["issues"][0].as_object_mut().unwrap().remove("evidence");
        assert!(matches!(parse_value(&v), Err(InsightUnavailable::Schema(_))));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut v = full();
        v["confidence"] = json!(0.9);
        assert!(matches!(parse_value(&v), Err(InsightUnavailable::Schema(_))));
    }

    #[test]
    fn blank_summary_is_rejected() {
        let mut v = full();
        v["summary"] = json!("   ");
        assert!(matches!(parse_value(&v), Err(InsightUnavailable::Schema(_))));
    }

    #[test]
    fn non_json_is_rejected() {
        assert!(matches!(
            parse("The pages look the same."),
            Err(InsightUnavailable::Schema(_))
        ));
    }

    #[test]
    fn empty_issue_list_serializes_as_array() {
        let r = InsightResult {
            summary: "No visible change.".into(),
            severity: Severity::Pass,
            issues: Vec::new(),
            quick_wins: Vec::new(),
            verdict: None,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["issues"], json!([]));
        assert_eq!(v["severity"], "pass");
    }

    #[test]
    fn schema_lists_every_severity() {
        let schema = response_schema();
        assert_eq!(
            schema["properties"]["severity"]["enum"],
            json!(["pass", "minor", "major", "critical"])
        );
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(
            schema["properties"]["issues"]["items"]["properties"]["severity"],
            schema["properties"]["severity"]
        );
    }
}
