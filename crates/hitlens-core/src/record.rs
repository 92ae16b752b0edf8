//! Segmentation of a line-oriented World-Check hit record.
//!
//! A record is split into physical lines (1-based for every external caller).
//! Two indices are derived from the text once, at parse time:
//!
//! - **section assignment**: every physical line belongs to exactly one
//!   [`Section`], the one introduced by the most recent header line. A header
//!   line belongs to the section it introduces; lines before any header
//!   belong to [`Section::FIRST`].
//! - **logical entries**: lines starting with an enumeration marker such as
//!   `12) ` are numbered 1..K in document order. Citations in AI output use
//!   this numbering, highlighting uses physical numbering.
//!
//! Parsing is a pure function of the text: the same text always yields the
//! same indices.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::section::Section;

/// Leading logical-entry marker: digits, a closing paren, then whitespace.
static LOGICAL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[0-9]+\)\s+").expect("valid logical marker regex"));

/// An inclusive range of 1-based physical lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn single(line: u32) -> Self {
        Self::new(line, line)
    }

    pub fn contains(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }

    /// Human-readable label, e.g. `Lines 2-4`.
    pub fn label(&self) -> String {
        format!("Lines {}-{}", self.start, self.end)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A display line split on its first colon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyValue {
    pub label: String,
    pub value: String,
}

/// A hit record with its derived section and logical-entry indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedRecord {
    text: String,
    lines: Vec<String>,
    /// physical line - 1 → section
    sections: Vec<Section>,
    /// logical entry - 1 → physical line
    logical: Vec<u32>,
}

impl SegmentedRecord {
    /// Segment a record. Lines are split on `\n`; a trailing `\r` is dropped.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<String> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();

        let mut sections = Vec::with_capacity(lines.len());
        let mut current = Section::FIRST;
        for line in &lines {
            if let Some(section) = Section::match_header(line) {
                current = section;
            }
            sections.push(current);
        }

        let logical: Vec<u32> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| LOGICAL_MARKER.is_match(line))
            .map(|(i, _)| i as u32 + 1)
            .collect();

        debug!(
            lines = lines.len(),
            logical_entries = logical.len(),
            "segmented hit record"
        );

        Self {
            text: text.to_string(),
            lines,
            sections,
            logical,
        }
    }

    /// The text this record was parsed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Raw text of a 1-based physical line.
    pub fn line(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        self.lines.get(idx).map(String::as_str)
    }

    /// Section of a 1-based physical line.
    pub fn section_of(&self, line: u32) -> Option<Section> {
        let idx = (line as usize).checked_sub(1)?;
        self.sections.get(idx).copied()
    }

    /// Full physical line → section assignment.
    pub fn section_map(&self) -> BTreeMap<u32, Section> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, s)| (i as u32 + 1, *s))
            .collect()
    }

    /// Physical line of a 1-based logical entry.
    pub fn physical_of(&self, logical: u32) -> Option<u32> {
        let idx = (logical as usize).checked_sub(1)?;
        self.logical.get(idx).copied()
    }

    /// Full logical entry → physical line mapping.
    pub fn logical_map(&self) -> BTreeMap<u32, u32> {
        self.logical
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32 + 1, *p))
            .collect()
    }

    pub fn logical_count(&self) -> u32 {
        self.logical.len() as u32
    }

    /// Sections that occur in this record, in declaration order.
    pub fn available_sections(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| self.sections.contains(s))
            .collect()
    }

    /// Translate a cited range to physical lines.
    ///
    /// Both ends must be known logical entries for the translation to apply;
    /// otherwise the numbers are taken as physical lines unchanged.
    pub fn resolve(&self, start: u32, end: u32) -> LineRange {
        match (self.physical_of(start), self.physical_of(end)) {
            (Some(s), Some(e)) => LineRange::new(s, e),
            _ => LineRange::new(start, end),
        }
    }

    /// The section that owns a physical range.
    ///
    /// This is the start line's section when every line in the range shares
    /// it. Ranges spanning sections fall back to [`Section::FIRST`]. Lines
    /// outside the record count as [`Section::FIRST`].
    pub fn section_for_range(&self, range: LineRange) -> Section {
        let owner = self.section_of(range.start).unwrap_or(Section::FIRST);
        if range.start > range.end {
            return owner;
        }

        let reaches_outside = range.start == 0 || range.end > self.line_count();
        if reaches_outside && owner != Section::FIRST {
            return Section::FIRST;
        }

        let last = range.end.min(self.line_count());
        let uniform = (range.start.max(1)..=last).all(|n| self.section_of(n) == Some(owner));
        if uniform { owner } else { Section::FIRST }
    }
}

/// Presentation text of a line: the leading logical marker is removed.
pub fn display_text(line: &str) -> Cow<'_, str> {
    LOGICAL_MARKER.replace(line, "")
}

/// Whether a line starts with a logical-entry marker.
pub fn is_logical_entry(line: &str) -> bool {
    LOGICAL_MARKER.is_match(line)
}

/// Split a line's display text on the first colon into label and value.
///
/// A line without a colon yields an empty label and the whole trimmed line as
/// the value.
pub fn split_key_value(line: &str) -> KeyValue {
    let clean = display_text(line);
    let clean = clean.trim();
    match clean.split_once(':') {
        Some((label, value)) => KeyValue {
            label: label.trim().to_string(),
            value: value.trim().to_string(),
        },
        None => KeyValue {
            label: String::new(),
            value: clean.to_string(),
        },
    }
}
