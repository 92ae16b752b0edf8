//! Record viewer: one record, its view state, and its highlights.
//!
//! The viewer is single-owner state driven from one task. [`RecordViewer::run`]
//! is its event loop: it waits on the citation bus and on the earliest
//! highlight expiry, and redraws the [`Surface`] after every change.

use std::sync::Arc;

use hitlens_core::{CitationEvent, LineRange, Section, SegmentedRecord};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::bus::CitationSubscription;
use crate::config::ViewerConfig;
use crate::highlight::{Activation, HighlightController, HighlightSet};
use crate::presenter::{Presented, ViewState, present};

/// Everything a surface needs to draw the viewer once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Selectable sections, in declaration order.
    pub tabs: Vec<Section>,
    pub active: Section,
    pub raw: bool,
    pub query: String,
    /// Labels of the active highlights, oldest first.
    pub highlight_labels: Vec<String>,
    pub body: Presented,
    /// Line to centre on, when a citation scroll settled in this frame.
    pub scroll_to: Option<u32>,
}

/// Where frames are drawn.
pub trait Surface {
    fn draw(&mut self, frame: &Frame);
}

pub struct RecordViewer {
    record: Arc<SegmentedRecord>,
    view: ViewState,
    controller: HighlightController,
}

impl RecordViewer {
    pub fn new(record_text: &str, config: ViewerConfig) -> Self {
        Self::from_record(Arc::new(SegmentedRecord::parse(record_text)), config)
    }

    /// Build a viewer over an already segmented record.
    pub fn from_record(record: Arc<SegmentedRecord>, config: ViewerConfig) -> Self {
        Self {
            record,
            view: ViewState::new(config.initial_section),
            controller: HighlightController::new(config.highlight_ttl),
        }
    }

    /// Replace the record. Returns false when `text` is the current record,
    /// in which case the existing indices are kept.
    ///
    /// A new record drops all highlights and any pending scroll; view state
    /// (section, query, raw mode) is kept.
    pub fn load_record(&mut self, text: &str) -> bool {
        if self.record.text() == text {
            return false;
        }
        self.record = Arc::new(SegmentedRecord::parse(text));
        self.controller.reset();
        info!(lines = self.record.line_count(), "loaded hit record");
        true
    }

    pub fn record(&self) -> &Arc<SegmentedRecord> {
        &self.record
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn highlights(&self) -> &HighlightSet {
        self.controller.highlights()
    }

    pub fn select_section(&mut self, section: Section) -> bool {
        self.view.select_section(section)
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.view.set_query(query);
    }

    pub fn set_raw(&mut self, raw: bool) {
        self.view.raw = raw;
    }

    /// Apply one citation notification.
    pub fn on_citation(&mut self, event: CitationEvent, now: Instant) -> Activation {
        self.controller
            .activate(&self.record, &mut self.view, event, now)
    }

    /// Drop highlights that are due at `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<LineRange> {
        self.controller.expire(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.controller.next_deadline()
    }

    /// Present the current state. A pending scroll settles here: the frame
    /// carries the target if it is visible, and the marker is cleared.
    pub fn render(&mut self) -> Frame {
        let body = present(&self.record, &self.view, self.controller.highlights());
        let scroll_to = self.controller.settle_scroll(&body);
        Frame {
            tabs: self.record.available_sections(),
            active: self.view.active,
            raw: self.view.raw,
            query: self.view.query.clone(),
            highlight_labels: self.controller.highlights().labels(),
            body,
            scroll_to,
        }
    }

    /// Drive the viewer from `citations` until the bus closes.
    ///
    /// Draws once on entry, then after every activation and every expiry that
    /// removed a highlight.
    pub async fn run<S: Surface + ?Sized>(
        &mut self,
        citations: &mut CitationSubscription,
        surface: &mut S,
    ) {
        surface.draw(&self.render());

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                event = citations.recv() => {
                    let Some(event) = event else {
                        debug!("citation bus closed, viewer loop ending");
                        break;
                    };
                    self.on_citation(event, Instant::now());
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.expire(Instant::now()).is_empty() {
                        continue;
                    }
                }
            }
            surface.draw(&self.render());
        }
    }
}
