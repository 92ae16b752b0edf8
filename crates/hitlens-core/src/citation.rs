//! Citation extraction from AI analysis output.
//!
//! Analysis text cites record lines with markers of the form
//! `record:<start>:<end>`. The output is either a JSON object
//! (`reasoning`/`explanation` plus a list of `claims`, each with citation
//! marker strings) or free text with markers inline. Extraction never fails:
//! anything that is not a recognised object is scanned as free text, and
//! anything that is not a well-formed marker stays text.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"record:([0-9]+):([0-9]+)").expect("valid citation marker regex")
});

/// A cited `(start, end)` pair, in logical-entry or physical-line numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CitationSpan {
    pub start: u32,
    pub end: u32,
}

impl CitationSpan {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Trigger label, e.g. `lines 3-5`.
    pub fn label(&self) -> String {
        format!("lines {}-{}", self.start, self.end)
    }

    /// Notification payload for this citation.
    pub fn event(&self) -> CitationEvent {
        CitationEvent {
            start_line: self.start,
            end_line: self.end,
        }
    }

    /// Publish this citation. Fire-and-forget: the sink decides whether
    /// anyone is listening.
    pub fn activate<S: CitationSink + ?Sized>(&self, sink: &S) {
        debug!(start = self.start, end = self.end, "citation activated");
        sink.emit(self.event());
    }
}

impl fmt::Display for CitationSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record:{}:{}", self.start, self.end)
    }
}

/// Cross-component citation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationEvent {
    pub start_line: u32,
    pub end_line: u32,
}

/// Anything citation activations can be published to.
pub trait CitationSink {
    fn emit(&self, event: CitationEvent);
}

/// A piece of rendered free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Citation(CitationSpan),
}

/// A claim with its recognised citations, in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimView {
    pub statement: String,
    pub citations: Vec<CitationSpan>,
}

/// Renderable form of one analysis output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisView {
    Structured {
        reasoning: String,
        claims: Vec<ClaimView>,
    },
    Inline(Vec<Segment>),
}

impl AnalysisView {
    /// Every citation in render order.
    pub fn citations(&self) -> Vec<CitationSpan> {
        match self {
            Self::Structured { claims, .. } => claims
                .iter()
                .flat_map(|c| c.citations.iter().copied())
                .collect(),
            Self::Inline(segments) => segments
                .iter()
                .filter_map(|s| match s {
                    Segment::Citation(span) => Some(*span),
                    Segment::Text(_) => None,
                })
                .collect(),
        }
    }
}

// ── Structured output shape ──

#[derive(Deserialize)]
struct StructuredOutput {
    reasoning: Option<String>,
    explanation: Option<String>,
    claims: Option<Vec<Claim>>,
}

#[derive(Deserialize)]
struct Claim {
    #[serde(default)]
    statement: String,
    citations: Option<Vec<String>>,
}

/// Render an analysis output, structured if possible, else as free text.
pub fn extract(raw: &str) -> AnalysisView {
    match serde_json::from_str::<StructuredOutput>(raw) {
        Ok(out) if out.reasoning.is_some() || out.explanation.is_some() || out.claims.is_some() => {
            structured_view(raw, out)
        }
        Ok(_) => {
            debug!("analysis object has no recognised fields, scanning as text");
            AnalysisView::Inline(scan_inline(raw))
        }
        Err(e) => {
            debug!(error = %e, "analysis is not structured, scanning as text");
            AnalysisView::Inline(scan_inline(raw))
        }
    }
}

fn structured_view(raw: &str, out: StructuredOutput) -> AnalysisView {
    let reasoning = [out.reasoning, out.explanation]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| raw.to_string());

    let claims = out
        .claims
        .unwrap_or_default()
        .into_iter()
        .map(|claim| ClaimView {
            statement: claim.statement,
            citations: claim
                .citations
                .unwrap_or_default()
                .iter()
                .filter_map(|c| parse_marker(c))
                .collect(),
        })
        .collect();

    AnalysisView::Structured { reasoning, claims }
}

/// First citation marker in `s`, if any.
pub fn parse_marker(s: &str) -> Option<CitationSpan> {
    MARKER.captures_iter(s).find_map(|caps| span_from(&caps))
}

/// Split free text into text and citation segments, left to right.
///
/// Text between and after markers is kept verbatim. A marker whose numbers do
/// not fit a line number stays part of the surrounding text.
pub fn scan_inline(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pending_start = 0;

    for caps in MARKER.captures_iter(text) {
        let Some(span) = span_from(&caps) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > pending_start {
            segments.push(Segment::Text(text[pending_start..whole.start()].to_string()));
        }
        segments.push(Segment::Citation(span));
        pending_start = whole.end();
    }

    if pending_start < text.len() {
        segments.push(Segment::Text(text[pending_start..].to_string()));
    }
    segments
}

fn span_from(caps: &Captures<'_>) -> Option<CitationSpan> {
    let start = caps[1].parse().ok()?;
    let end = caps[2].parse().ok()?;
    Some(CitationSpan::new(start, end))
}
