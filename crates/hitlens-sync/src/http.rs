//! HTTP client for the screening case API.
//!
//! Covers the calls the case-review screen depends on: case listing and
//! detail, review status, operator feedback, and the append-only case log.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use hitlens_core::case::{
    AspectFeedback, AspectFeedbackCreate, BatchCaseStatusRequest, BatchCaseStatusResponse,
    CaseKey, CaseLogEntry, CaseStatus, CaseStatusUpdate, FinalVerdict, LoginRequest, SourceCase,
    Token,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Query parameters for [`SyncClient::list_cases`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_unique_id: Option<String>,
}

impl CaseFilter {
    /// The first case for a profile.
    pub fn profile(profile_unique_id: impl Into<String>) -> Self {
        Self {
            skip: None,
            limit: Some(1),
            profile_unique_id: Some(profile_unique_id.into()),
        }
    }
}

/// HTTP client for the case API.
pub struct SyncClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl SyncClient {
    /// Create a client for the given API base URL.
    ///
    /// `base_url` should be like `http://localhost:8000` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Send `token` as a bearer token on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange operator credentials for an access token.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Token, SyncError> {
        let url = format!("{}/auth/login", self.base_url);
        info!(url = %url, "logging in");
        let req = self.request(Method::POST, &url).json(credentials);
        self.send_json(req).await
    }

    pub async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<SourceCase>, SyncError> {
        let url = format!("{}/v2/cases", self.base_url);
        info!(url = %url, ?filter, "listing cases");
        let req = self.request(Method::GET, &url).query(filter);
        let cases: Vec<SourceCase> = self.send_json(req).await?;
        info!(count = cases.len(), "listed cases");
        Ok(cases)
    }

    pub async fn get_case(&self, key: &CaseKey) -> Result<SourceCase, SyncError> {
        let url = self.case_url(key, "");
        info!(url = %url, "fetching case");
        self.send_json(self.request(Method::GET, &url)).await
    }

    pub async fn get_case_status(&self, key: &CaseKey) -> Result<CaseStatus, SyncError> {
        let url = self.case_url(key, "/status");
        info!(url = %url, "fetching case status");
        self.send_json(self.request(Method::GET, &url)).await
    }

    pub async fn update_case_status(
        &self,
        key: &CaseKey,
        update: &CaseStatusUpdate,
    ) -> Result<CaseStatus, SyncError> {
        let url = self.case_url(key, "/status");
        info!(url = %url, status = ?update.case_status, "updating case status");
        let req = self.request(Method::PATCH, &url).json(update);
        self.send_json(req).await
    }

    pub async fn batch_case_status(
        &self,
        keys: Vec<CaseKey>,
    ) -> Result<BatchCaseStatusResponse, SyncError> {
        let url = format!("{}/v2/cases/status:batch", self.base_url);
        info!(url = %url, count = keys.len(), "fetching case statuses");
        let req = self
            .request(Method::POST, &url)
            .json(&BatchCaseStatusRequest { pairs: keys });
        self.send_json(req).await
    }

    /// Append an entry to the case's audit log.
    pub async fn append_log(&self, key: &CaseKey, entry: &CaseLogEntry) -> Result<(), SyncError> {
        let url = self.case_url(key, "/logs");
        info!(url = %url, event_type = %entry.event_type, "appending case log");
        let resp = self.request(Method::POST, &url).json(entry).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn create_feedback(
        &self,
        key: &CaseKey,
        feedback: &AspectFeedbackCreate,
    ) -> Result<AspectFeedback, SyncError> {
        let url = self.case_url(key, "/feedback");
        info!(url = %url, aspect = %feedback.aspect_type, "creating aspect feedback");
        let req = self.request(Method::POST, &url).json(feedback);
        self.send_json(req).await
    }

    pub async fn list_feedback(&self, key: &CaseKey) -> Result<Vec<AspectFeedback>, SyncError> {
        let url = self.case_url(key, "/feedback");
        info!(url = %url, "listing aspect feedback");
        self.send_json(self.request(Method::GET, &url)).await
    }

    /// Create several feedback entries concurrently, then log the save.
    ///
    /// The log entry is only written if every create succeeded.
    pub async fn save_feedbacks(
        &self,
        key: &CaseKey,
        feedbacks: &[AspectFeedbackCreate],
    ) -> Result<Vec<AspectFeedback>, SyncError> {
        if feedbacks.is_empty() {
            return Ok(Vec::new());
        }

        let saved = try_join_all(feedbacks.iter().map(|f| self.create_feedback(key, f))).await?;

        let entry = CaseLogEntry {
            event_type: "aspect_feedback_saved".to_string(),
            payload: Some(json!({
                "feedbacks_count": saved.len(),
                "aspect_types": saved.iter().map(|f| f.aspect_type).collect::<Vec<_>>(),
            })),
        };
        self.append_log(key, &entry).await?;
        info!(count = saved.len(), "saved aspect feedback");
        Ok(saved)
    }

    /// Persist a review: update the case status, then log the action.
    ///
    /// `previous_status` is the status the operator was looking at; it is
    /// logged as `unreviewed` when unknown.
    pub async fn save_review(
        &self,
        key: &CaseKey,
        action: ReviewAction,
        verdict: Option<FinalVerdict>,
        comments: &str,
        previous_status: Option<&str>,
    ) -> Result<CaseStatus, SyncError> {
        let update = review_status_update(action.case_status(), verdict, comments, Utc::now());
        let status = self.update_case_status(key, &update).await?;
        let entry = match action {
            ReviewAction::SaveDraft => draft_saved_entry(verdict, comments, previous_status),
            ReviewAction::Submit => case_submitted_entry(verdict, comments, previous_status),
        };
        self.append_log(key, &entry).await?;
        info!(action = action.case_status(), "saved review");
        Ok(status)
    }

    // ── Helpers ──

    fn case_url(&self, key: &CaseKey, suffix: &str) -> String {
        format!(
            "{}/v2/cases/{}/{}{}",
            self.base_url, key.profile_unique_id, key.dj_profile_id, suffix
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SyncError> {
        let resp = check_status(req.send().await?).await?;
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn check_status(resp: Response) -> Result<Response, SyncError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SyncError::Server {
        status: status.as_u16(),
        body,
    })
}

/// What the operator did with their review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    SaveDraft,
    Submit,
}

impl ReviewAction {
    pub fn case_status(&self) -> &'static str {
        match self {
            Self::SaveDraft => "draft",
            Self::Submit => "submitted",
        }
    }
}

pub fn draft_saved_entry(
    verdict: Option<FinalVerdict>,
    comments: &str,
    previous_status: Option<&str>,
) -> CaseLogEntry {
    review_entry("draft_saved", verdict, comments, previous_status)
}

pub fn case_submitted_entry(
    verdict: Option<FinalVerdict>,
    comments: &str,
    previous_status: Option<&str>,
) -> CaseLogEntry {
    review_entry("case_submitted", verdict, comments, previous_status)
}

fn review_entry(
    event_type: &str,
    verdict: Option<FinalVerdict>,
    comments: &str,
    previous_status: Option<&str>,
) -> CaseLogEntry {
    CaseLogEntry {
        event_type: event_type.to_string(),
        payload: Some(json!({
            "final_verdict": verdict,
            "comments": comments,
            "previous_status": previous_status.unwrap_or("unreviewed"),
        })),
    }
}

/// Build a review status update carrying the draft verdict and comments.
///
/// `submitted_at` is stamped only when `case_status` is `submitted`.
pub fn review_status_update(
    case_status: &str,
    verdict: Option<FinalVerdict>,
    comments: &str,
    now: DateTime<Utc>,
) -> CaseStatusUpdate {
    let stamp = now.to_rfc3339();
    let mut aspects = json!({
        "final_verdict": verdict,
        "comments": comments,
        "updated_at": stamp,
    });
    if case_status == "submitted" {
        aspects["submitted_at"] = json!(stamp);
    }
    CaseStatusUpdate {
        case_status: Some(case_status.to_string()),
        aspects_status: Some(aspects),
    }
}
