//! Shared case-review types exchanged with the screening API.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseCaseValueError {
    kind: &'static str,
    value: String,
}

/// Parse a wire enum from its snake_case name; kebab-case is accepted too.
fn parse_wire<T: DeserializeOwned>(kind: &'static str, s: &str) -> Result<T, ParseCaseValueError> {
    serde_json::from_value(Value::String(s.trim().replace('-', "_"))).map_err(|_| {
        ParseCaseValueError {
            kind,
            value: s.to_string(),
        }
    })
}

/// One of the four AI-analysed aspects of a screening hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectType {
    Name,
    Age,
    Nationality,
    Risk,
}

impl AspectType {
    pub const ALL: [AspectType; 4] = [Self::Name, Self::Age, Self::Nationality, Self::Risk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Nationality => "nationality",
            Self::Risk => "risk",
        }
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectType {
    type Err = ParseCaseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("aspect", s)
    }
}

/// Operator's reaction to one aspect analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Agree,
    Disagree,
    NotRelated,
}

impl FromStr for FeedbackType {
    type Err = ParseCaseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("feedback", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalVerdict {
    FalsePositive,
    TrueMatch,
}

impl FromStr for FinalVerdict {
    type Err = ParseCaseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire("verdict", s)
    }
}

/// A screening case: the candidate profile paired with one World-Check hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCase {
    pub id: i64,
    pub profile_unique_id: String,
    pub dj_profile_id: String,
    pub reference_id: Option<String>,
    pub profile_info: Option<Value>,
    /// Line-oriented hit record, the input to record segmentation.
    pub structured_record: String,
    pub hit_record: Option<Value>,
    pub candidate_name: Option<String>,
    pub final_score: Option<f64>,
    pub aspect_name_json: Option<String>,
    pub aspect_age_json: Option<String>,
    pub aspect_nationality_json: Option<String>,
    pub aspect_risk_json: Option<String>,
    /// ISO 8601 timestamp string.
    pub created_at: String,
}

impl SourceCase {
    /// Raw AI output for an aspect, if the case has one.
    pub fn aspect_output(&self, aspect: AspectType) -> Option<&str> {
        let field = match aspect {
            AspectType::Name => &self.aspect_name_json,
            AspectType::Age => &self.aspect_age_json,
            AspectType::Nationality => &self.aspect_nationality_json,
            AspectType::Risk => &self.aspect_risk_json,
        };
        field.as_deref().filter(|s| !s.is_empty())
    }
}

/// Review status snapshot for a case.
///
/// `case_status` is free-form on the wire (`unreviewed`, `draft`,
/// `submitted`, ...); `aspects_status` carries the draft verdict and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStatus {
    pub id: i64,
    pub profile_unique_id: String,
    pub dj_profile_id: String,
    pub case_status: String,
    pub aspects_status: Option<Value>,
    /// ISO 8601 timestamp string.
    pub last_updated_at: String,
    pub last_updated_by: Option<i64>,
}

/// Partial update for a case status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseStatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspects_status: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseKey {
    pub profile_unique_id: String,
    pub dj_profile_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCaseStatusRequest {
    pub pairs: Vec<CaseKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCaseStatusItem {
    pub profile_unique_id: String,
    pub dj_profile_id: String,
    pub status: CaseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCaseStatusResponse {
    pub items: Vec<BatchCaseStatusItem>,
}

/// Stored operator feedback on one aspect analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AspectFeedback {
    pub id: i64,
    pub profile_unique_id: String,
    pub dj_profile_id: String,
    pub aspect_type: AspectType,
    pub llm_output: Option<String>,
    pub llm_verdict_score: Option<f64>,
    pub operator_feedback: Option<FeedbackType>,
    pub operator_comment: Option<String>,
    /// ISO 8601 timestamp string.
    pub created_at: String,
    /// ISO 8601 timestamp string.
    pub updated_at: String,
    pub operator_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AspectFeedbackCreate {
    pub aspect_type: AspectType,
    pub llm_output: Option<String>,
    pub llm_verdict_score: Option<f64>,
    pub operator_feedback: Option<FeedbackType>,
    pub operator_comment: Option<String>,
}

/// Append-only audit log entry for a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseLogEntry {
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}
