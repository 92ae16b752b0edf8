//! Visible lines of a segmented record, with decoration.
//!
//! Structured mode shows the active section as label/value rows filtered by a
//! case-insensitive search query. Raw mode shows every line with its number.

use std::ops::Range;

use hitlens_core::{Section, SegmentedRecord, split_key_value};

use crate::highlight::HighlightSet;

/// User-controlled view state of one record viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub active: Section,
    pub query: String,
    pub raw: bool,
}

impl ViewState {
    pub fn new(active: Section) -> Self {
        Self {
            active,
            query: String::new(),
            raw: false,
        }
    }

    /// Make `section` active. Returns whether it changed.
    pub fn select_section(&mut self, section: Section) -> bool {
        let changed = self.active != section;
        self.active = section;
        changed
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// The query as matched: surrounding whitespace ignored.
    pub fn effective_query(&self) -> &str {
        self.query.trim()
    }
}

/// One label/value row of the structured view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLine {
    /// 1-based physical line.
    pub line: u32,
    pub label: String,
    pub value: String,
    pub highlighted: bool,
    /// Byte range of the first query occurrence in `value`.
    pub query_match: Option<Range<usize>>,
}

/// One numbered line of the raw view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub line: u32,
    pub text: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presented {
    Structured(Vec<FieldLine>),
    Raw(Vec<RawLine>),
}

impl Presented {
    /// Whether a physical line is among the rendered rows.
    pub fn contains_line(&self, line: u32) -> bool {
        match self {
            Self::Structured(rows) => rows.iter().any(|r| r.line == line),
            Self::Raw(rows) => rows.iter().any(|r| r.line == line),
        }
    }

    pub fn line_numbers(&self) -> Vec<u32> {
        match self {
            Self::Structured(rows) => rows.iter().map(|r| r.line).collect(),
            Self::Raw(rows) => rows.iter().map(|r| r.line).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Structured(rows) => rows.len(),
            Self::Raw(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produce the visible rows for `view`.
pub fn present(record: &SegmentedRecord, view: &ViewState, highlights: &HighlightSet) -> Presented {
    if view.raw {
        return Presented::Raw(
            record
                .lines()
                .iter()
                .zip(1u32..)
                .map(|(text, line)| RawLine {
                    line,
                    text: text.clone(),
                    highlighted: highlights.is_highlighted(line),
                })
                .collect(),
        );
    }

    let query = view.effective_query();
    let rows = record
        .lines()
        .iter()
        .zip(1u32..)
        .filter(|(text, line)| {
            record.section_of(*line) == Some(view.active) && !view.active.is_header(text)
        })
        .filter_map(|(text, line)| {
            let kv = split_key_value(text);
            if !query.is_empty()
                && find_ignore_case(&kv.label, query).is_none()
                && find_ignore_case(&kv.value, query).is_none()
            {
                return None;
            }
            Some(FieldLine {
                line,
                query_match: find_ignore_case(&kv.value, query),
                label: kv.label,
                value: kv.value,
                highlighted: highlights.is_highlighted(line),
            })
        })
        .collect();
    Presented::Structured(rows)
}

/// Byte range of the first case-insensitive occurrence of `needle`.
///
/// Comparison is on Unicode lowercase, and the returned range always falls on
/// `haystack` char boundaries. An empty needle never matches.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    'start: for (start, _) in haystack.char_indices() {
        let mut pos = 0;
        for (offset, ch) in haystack[start..].char_indices() {
            for lower in ch.to_lowercase() {
                if pos == needle.len() || needle[pos] != lower {
                    continue 'start;
                }
                pos += 1;
            }
            if pos == needle.len() {
                return Some(start..start + offset + ch.len_utf8());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitlens_core::LineRange;
    use std::time::Duration;
    use tokio::time::Instant;

    const RECORD: &str = "\
Key Data
1) Name: JOHN SMITH
2) DOB: 1990-01-01
3) Nationality: United Kingdom
Aliases
4) Alias: Johnny Smith
Plain remark without colon";

    fn highlights() -> HighlightSet {
        HighlightSet::new(Duration::from_secs(3))
    }

    fn rows(presented: Presented) -> Vec<FieldLine> {
        match presented {
            Presented::Structured(rows) => rows,
            Presented::Raw(_) => panic!("expected structured rows"),
        }
    }

    #[test]
    fn structured_view_hides_own_header() {
        let record = SegmentedRecord::parse(RECORD);
        let view = ViewState::new(Section::KeyData);
        let rows = rows(present(&record, &view, &highlights()));
        assert_eq!(
            rows.iter().map(|r| r.line).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        assert_eq!(rows[0].label, "Name");
        assert_eq!(rows[0].value, "JOHN SMITH");
    }

    #[test]
    fn line_without_colon_has_empty_label() {
        let record = SegmentedRecord::parse(RECORD);
        let view = ViewState::new(Section::Aliases);
        let rows = rows(present(&record, &view, &highlights()));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].label, "");
        assert_eq!(rows[1].value, "Plain remark without colon");
    }

    #[test]
    fn query_filters_on_label_or_value() {
        let record = SegmentedRecord::parse(RECORD);
        let mut view = ViewState::new(Section::KeyData);

        view.set_query("  dob ");
        let found = rows(present(&record, &view, &highlights()));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 3);
        assert_eq!(found[0].query_match, None);

        view.set_query("kingdom");
        let found = rows(present(&record, &view, &highlights()));
        assert_eq!(found.len(), 1);
        let value = &found[0].value;
        let hit = found[0].query_match.clone().unwrap();
        assert_eq!(&value[hit], "Kingdom");

        view.set_query("   ");
        assert_eq!(present(&record, &view, &highlights()).len(), 3);
    }

    #[test]
    fn raw_view_ignores_section_and_query() {
        let record = SegmentedRecord::parse(RECORD);
        let mut view = ViewState::new(Section::Aliases);
        view.set_query("nothing matches this");
        view.raw = true;
        let mut set = highlights();
        set.upsert(LineRange::new(2, 3), Instant::now());

        match present(&record, &view, &set) {
            Presented::Raw(lines) => {
                assert_eq!(lines.len(), 7);
                assert_eq!(lines[0].text, "Key Data");
                assert_eq!(lines[1].line, 2);
                let lit: Vec<u32> = lines.iter().filter(|l| l.highlighted).map(|l| l.line).collect();
                assert_eq!(lit, vec![2, 3]);
            }
            Presented::Structured(_) => panic!("expected raw lines"),
        }
    }

    #[test]
    fn highlight_decoration_does_not_filter() {
        let record = SegmentedRecord::parse(RECORD);
        let view = ViewState::new(Section::KeyData);
        let mut set = highlights();
        set.upsert(LineRange::new(3, 3), Instant::now());
        set.upsert(LineRange::new(40, 50), Instant::now());
        let rows = rows(present(&record, &view, &set));
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter().map(|r| r.highlighted).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }

    #[test]
    fn find_ignore_case_ranges() {
        assert_eq!(find_ignore_case("Hello World", "WORLD"), Some(6..11));
        assert_eq!(find_ignore_case("Hello", ""), None);
        assert_eq!(find_ignore_case("Hello", "hellos"), None);
        assert_eq!(find_ignore_case("aab", "ab"), Some(1..3));
        let text = "Straße MÜLLER";
        let hit = find_ignore_case(text, "müller").unwrap();
        assert_eq!(&text[hit], "MÜLLER");
    }
}
