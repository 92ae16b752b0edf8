//! Per-aspect verdict badge read from an analysis output's `category.verdict`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Badge colour class for one aspect analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectStatus {
    Match,
    Different,
    Unclear,
}

impl AspectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Match => "Match",
            Self::Different => "Different",
            Self::Unclear => "Unclear",
        }
    }
}

impl fmt::Display for AspectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectVerdict {
    pub status: AspectStatus,
    /// The raw verdict string, when the output carries a non-empty one.
    pub verdict: Option<String>,
}

impl AspectVerdict {
    /// Badge text: the raw verdict if present, else the status label.
    pub fn badge(&self) -> &str {
        self.verdict.as_deref().unwrap_or(self.status.label())
    }
}

/// Read the verdict of an analysis output.
///
/// `strong_match` is a match and `likely_no_match` is different. Any other
/// verdict, a missing one, or output that is not JSON is unclear.
pub fn aspect_verdict(raw: &str) -> AspectVerdict {
    let verdict = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("category")?.get("verdict")?.as_str().map(str::to_string))
        .filter(|v| !v.is_empty());

    let status = match verdict.as_deref() {
        Some("strong_match") => AspectStatus::Match,
        Some("likely_no_match") => AspectStatus::Different,
        _ => AspectStatus::Unclear,
    };
    AspectVerdict { status, verdict }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_match_is_match() {
        let v = aspect_verdict(r#"{"category": {"verdict": "strong_match"}, "reasoning": "x"}"#);
        assert_eq!(v.status, AspectStatus::Match);
        assert_eq!(v.badge(), "strong_match");
    }

    #[test]
    fn likely_no_match_is_different() {
        let v = aspect_verdict(r#"{"category": {"verdict": "likely_no_match"}}"#);
        assert_eq!(v.status, AspectStatus::Different);
        assert_eq!(v.verdict.as_deref(), Some("likely_no_match"));
    }

    #[test]
    fn other_verdicts_are_unclear_but_keep_label() {
        let v = aspect_verdict(r#"{"category": {"verdict": "possible_match"}}"#);
        assert_eq!(v.status, AspectStatus::Unclear);
        assert_eq!(v.badge(), "possible_match");
    }

    #[test]
    fn missing_or_empty_verdict_is_unclear() {
        for raw in [
            r#"{"reasoning": "no category"}"#,
            r#"{"category": {"verdict": ""}}"#,
            r#"{"category": "strong_match"}"#,
            "",
        ] {
            let v = aspect_verdict(raw);
            assert_eq!(v.status, AspectStatus::Unclear, "{raw}");
            assert_eq!(v.badge(), "Unclear");
        }
    }

    #[test]
    fn malformed_output_is_unclear() {
        let v = aspect_verdict("not json {{ record:1:1");
        assert_eq!(
            v,
            AspectVerdict {
                status: AspectStatus::Unclear,
                verdict: None
            }
        );
    }
}
