//! Sync layer: HTTP client for the screening case API.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{
    CaseFilter, ReviewAction, SyncClient, SyncError, case_submitted_entry, draft_saved_entry,
    review_status_update,
};
