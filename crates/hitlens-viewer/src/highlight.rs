//! Transient line highlights driven by citation activations.
//!
//! A highlight is keyed by its physical range: activating the same range
//! again replaces the entry and restarts its lifetime. Each range has at most
//! one scheduled expiry, identified by an [`ExpiryHandle`]; rescheduling
//! cancels the previous handle, so a stale expiry can never remove a fresh
//! highlight.

use std::collections::HashMap;
use std::time::Duration;

use hitlens_core::{CitationEvent, LineRange, Section, SegmentedRecord};
use tokio::time::Instant;
use tracing::debug;

use crate::presenter::{Presented, ViewState};

/// An active highlight over a physical line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub range: LineRange,
    pub label: String,
}

/// Identifies one scheduled expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpiryHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    handle: ExpiryHandle,
    deadline: Instant,
}

/// Active highlights in activation order, plus their expiry schedule.
#[derive(Debug, Clone)]
pub struct HighlightSet {
    active: Vec<Highlight>,
    schedule: HashMap<LineRange, Scheduled>,
    next_handle: u64,
    ttl: Duration,
}

impl HighlightSet {
    pub fn new(ttl: Duration) -> Self {
        Self {
            active: Vec::new(),
            schedule: HashMap::new(),
            next_handle: 0,
            ttl,
        }
    }

    /// Insert or refresh the highlight for `range`, expiring `ttl` after `now`.
    ///
    /// An identical range is removed and re-appended; its previous expiry is
    /// cancelled.
    pub fn upsert(&mut self, range: LineRange, now: Instant) -> ExpiryHandle {
        self.active.retain(|h| h.range != range);
        self.active.push(Highlight {
            range,
            label: range.label(),
        });

        if let Some(prev) = self.schedule.get(&range).map(|s| s.handle)
            && self.cancel(prev)
        {
            debug!(%range, cancelled = prev.0, "rescheduled highlight expiry");
        }

        let handle = ExpiryHandle(self.next_handle);
        self.next_handle += 1;
        self.schedule.insert(
            range,
            Scheduled {
                handle,
                deadline: now + self.ttl,
            },
        );
        handle
    }

    /// Cancel a scheduled expiry. The highlight itself stays until removed.
    ///
    /// Returns false if the handle was already fired, cancelled, or replaced.
    fn cancel(&mut self, handle: ExpiryHandle) -> bool {
        let range = self
            .schedule
            .iter()
            .find(|(_, s)| s.handle == handle)
            .map(|(range, _)| *range);
        match range {
            Some(range) => self.schedule.remove(&range).is_some(),
            None => false,
        }
    }

    /// Remove the highlight for `range`. Removing an absent range is a no-op.
    pub fn remove(&mut self, range: LineRange) -> bool {
        self.schedule.remove(&range);
        let before = self.active.len();
        self.active.retain(|h| h.range != range);
        self.active.len() != before
    }

    /// Remove every highlight whose expiry is due at `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<LineRange> {
        let due: Vec<LineRange> = self
            .schedule
            .iter()
            .filter(|(_, s)| s.deadline <= now)
            .map(|(range, _)| *range)
            .collect();
        for range in &due {
            self.remove(*range);
        }
        if !due.is_empty() {
            debug!(expired = due.len(), "highlights expired");
        }
        due
    }

    /// Earliest pending expiry.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedule.values().map(|s| s.deadline).min()
    }

    pub fn is_highlighted(&self, line: u32) -> bool {
        self.active.iter().any(|h| h.range.contains(line))
    }

    pub fn contains(&self, range: LineRange) -> bool {
        self.active.iter().any(|h| h.range == range)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.active.iter()
    }

    pub fn labels(&self) -> Vec<String> {
        self.active.iter().map(|h| h.label.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.schedule.clear();
    }
}

/// Scroll side of the controller state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollState {
    #[default]
    Idle,
    /// A highlight was just created; the view has not scrolled to this line.
    Pending(u32),
}

/// What a citation activation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    /// Physical range after logical-entry resolution.
    pub range: LineRange,
    pub section: Section,
    /// Whether the active section changed.
    pub switched: bool,
    pub expiry: ExpiryHandle,
}

/// Turns citation events into highlights, section switches, and scrolls.
#[derive(Debug, Clone)]
pub struct HighlightController {
    highlights: HighlightSet,
    scroll: ScrollState,
}

impl HighlightController {
    pub fn new(ttl: Duration) -> Self {
        Self {
            highlights: HighlightSet::new(ttl),
            scroll: ScrollState::Idle,
        }
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    /// Handle one citation notification against `record`.
    pub fn activate(
        &mut self,
        record: &SegmentedRecord,
        view: &mut ViewState,
        event: CitationEvent,
        now: Instant,
    ) -> Activation {
        let range = record.resolve(event.start_line, event.end_line);
        let section = record.section_for_range(range);
        let switched = view.select_section(section);
        let expiry = self.highlights.upsert(range, now);
        self.scroll = ScrollState::Pending(range.start);

        debug!(
            cited = %format_args!("{}-{}", event.start_line, event.end_line),
            %range,
            %section,
            switched,
            "citation highlighted"
        );

        Activation {
            range,
            section,
            switched,
            expiry,
        }
    }

    /// Drop highlights whose expiry is due.
    pub fn expire(&mut self, now: Instant) -> Vec<LineRange> {
        self.highlights.expire(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.highlights.next_deadline()
    }

    /// Resolve a pending scroll against what was just rendered.
    ///
    /// Returns the line to centre on if it is visible. The pending marker is
    /// cleared either way; a target hidden by the search query is skipped.
    pub fn settle_scroll(&mut self, presented: &Presented) -> Option<u32> {
        let ScrollState::Pending(line) = std::mem::take(&mut self.scroll) else {
            return None;
        };
        if presented.contains_line(line) {
            Some(line)
        } else {
            debug!(line, "scroll target not rendered, skipping");
            None
        }
    }

    /// Forget all highlights and any pending scroll.
    pub fn reset(&mut self) {
        self.highlights.clear();
        self.scroll = ScrollState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::present;

    const TTL: Duration = Duration::from_secs(3);

    fn event(start: u32, end: u32) -> CitationEvent {
        CitationEvent {
            start_line: start,
            end_line: end,
        }
    }

    fn record() -> SegmentedRecord {
        SegmentedRecord::parse(
            "Key Data\n1) Name: John\n2) DOB: 1990\nAliases\n3) Alias: Johnny\n4) Alias: J. Smith",
        )
    }

    #[test]
    fn upsert_replaces_identical_range() {
        let now = Instant::now();
        let mut set = HighlightSet::new(TTL);
        set.upsert(LineRange::new(2, 3), now);
        set.upsert(LineRange::new(5, 5), now);
        set.upsert(LineRange::new(2, 3), now);
        assert_eq!(set.len(), 2);
        assert_eq!(set.labels(), vec!["Lines 5-5", "Lines 2-3"]);
    }

    #[test]
    fn reactivation_extends_lifetime() {
        let t0 = Instant::now();
        let range = LineRange::new(2, 2);
        let mut set = HighlightSet::new(TTL);
        let first = set.upsert(range, t0);
        let second = set.upsert(range, t0 + Duration::from_secs(2));
        assert_ne!(first, second);

        // The first activation's deadline passes without effect.
        assert!(set.expire(t0 + Duration::from_secs(3)).is_empty());
        assert!(set.contains(range));
        assert_eq!(set.len(), 1);

        assert_eq!(set.expire(t0 + Duration::from_secs(5)), vec![range]);
        assert!(set.is_empty());
        assert_eq!(set.next_deadline(), None);
    }

    #[test]
    fn cancel_only_matches_live_handle() {
        let now = Instant::now();
        let range = LineRange::new(1, 1);
        let mut set = HighlightSet::new(TTL);
        let stale = set.upsert(range, now);
        let live = set.upsert(range, now);
        assert!(!set.cancel(stale));
        assert!(set.cancel(live));
        assert!(set.expire(now + TTL).is_empty());
        assert!(set.contains(range));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut set = HighlightSet::new(TTL);
        set.upsert(LineRange::new(4, 6), Instant::now());
        assert!(set.remove(LineRange::new(4, 6)));
        assert!(!set.remove(LineRange::new(4, 6)));
        assert!(!set.remove(LineRange::new(9, 9)));
    }

    #[test]
    fn highlight_covers_inclusive_range() {
        let mut set = HighlightSet::new(TTL);
        set.upsert(LineRange::new(3, 5), Instant::now());
        assert!(!set.is_highlighted(2));
        assert!(set.is_highlighted(3) && set.is_highlighted(5));
        assert!(!set.is_highlighted(6));
    }

    #[test]
    fn activation_resolves_logical_and_switches_section() {
        let record = record();
        let mut view = ViewState::new(Section::KeyData);
        let mut ctl = HighlightController::new(TTL);

        let act = ctl.activate(&record, &mut view, event(3, 4), Instant::now());
        assert_eq!(act.range, LineRange::new(5, 6));
        assert_eq!(act.section, Section::Aliases);
        assert!(act.switched);
        assert_eq!(view.active, Section::Aliases);
        assert_eq!(ctl.scroll_state(), ScrollState::Pending(5));

        let again = ctl.activate(&record, &mut view, event(3, 4), Instant::now());
        assert!(!again.switched);
        assert_eq!(ctl.highlights().len(), 1);
    }

    #[test]
    fn unknown_logical_entries_are_physical() {
        let record = record();
        let mut view = ViewState::new(Section::Aliases);
        let mut ctl = HighlightController::new(TTL);

        let act = ctl.activate(&record, &mut view, event(2, 9), Instant::now());
        assert_eq!(act.range, LineRange::new(2, 9));
        assert_eq!(act.section, Section::KeyData);
        assert_eq!(view.active, Section::KeyData);
    }

    #[test]
    fn scroll_settles_on_visible_line() {
        let record = record();
        let mut view = ViewState::new(Section::KeyData);
        let mut ctl = HighlightController::new(TTL);

        ctl.activate(&record, &mut view, event(1, 1), Instant::now());
        let presented = present(&record, &view, ctl.highlights());
        assert_eq!(ctl.settle_scroll(&presented), Some(2));
        assert_eq!(ctl.scroll_state(), ScrollState::Idle);
        assert_eq!(ctl.settle_scroll(&presented), None);
    }

    #[test]
    fn filtered_scroll_target_is_skipped() {
        let record = record();
        let mut view = ViewState::new(Section::KeyData);
        view.set_query("dob");
        let mut ctl = HighlightController::new(TTL);

        ctl.activate(&record, &mut view, event(1, 1), Instant::now());
        let presented = present(&record, &view, ctl.highlights());
        assert!(!presented.contains_line(2));
        assert_eq!(ctl.settle_scroll(&presented), None);
        assert_eq!(ctl.scroll_state(), ScrollState::Idle);
    }
}
