//! Named sections of a World-Check hit record.
//!
//! The set is closed and its declaration order is the display order: tabs are
//! always listed as below, regardless of where a header appears in the text.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionError {
    #[error("unknown record section: {0:?}")]
    Unknown(String),
}

/// A record section, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "Key Data")]
    KeyData,
    #[serde(rename = "Further Information")]
    FurtherInformation,
    #[serde(rename = "Aliases")]
    Aliases,
    #[serde(rename = "Keywords")]
    Keywords,
    #[serde(rename = "Connections/Relationships")]
    Connections,
    #[serde(rename = "Sources")]
    Sources,
    #[serde(rename = "Hit Category")]
    HitCategory,
}

// ── Header patterns ──

/// Header regexes in declaration order. Matched against the trimmed line.
static HEADERS: LazyLock<[(Section, Regex); 7]> = LazyLock::new(|| {
    let header = |pattern: &str| {
        Regex::new(&format!(r"(?i)^\s*{pattern}\s*$")).expect("valid section header regex")
    };
    [
        (Section::KeyData, header(r"Key Data")),
        (Section::FurtherInformation, header(r"Further Information")),
        (Section::Aliases, header(r"Aliases")),
        (Section::Keywords, header(r"Keywords")),
        (Section::Connections, header(r"Connections\s*/?\s*Relationships")),
        (Section::Sources, header(r"Sources")),
        (Section::HitCategory, header(r"Hit Category")),
    ]
});

impl Section {
    /// Every section, in declaration order.
    pub const ALL: [Section; 7] = [
        Section::KeyData,
        Section::FurtherInformation,
        Section::Aliases,
        Section::Keywords,
        Section::Connections,
        Section::Sources,
        Section::HitCategory,
    ];

    /// The section lines default to before any header has been seen.
    pub const FIRST: Section = Section::KeyData;

    pub fn label(&self) -> &'static str {
        match self {
            Self::KeyData => "Key Data",
            Self::FurtherInformation => "Further Information",
            Self::Aliases => "Aliases",
            Self::Keywords => "Keywords",
            Self::Connections => "Connections/Relationships",
            Self::Sources => "Sources",
            Self::HitCategory => "Hit Category",
        }
    }

    /// Return the section whose header this line is, if any.
    ///
    /// Patterns are tried in declaration order and the first match wins.
    pub fn match_header(line: &str) -> Option<Section> {
        let trimmed = line.trim();
        HEADERS
            .iter()
            .find(|(_, re)| re.is_match(trimmed))
            .map(|(section, _)| *section)
    }

    /// Whether `line` is this section's own header.
    pub fn is_header(&self, line: &str) -> bool {
        HEADERS
            .iter()
            .any(|(section, re)| section == self && re.is_match(line.trim()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Section {
    type Err = SectionError;

    /// Accepts either a header spelling ("connections / relationships") or a
    /// kebab-case name ("further-information").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(section) = Section::match_header(s) {
            return Ok(section);
        }
        let spaced = s.trim().replace(['-', '_'], " ");
        Section::match_header(&spaced)
            .or_else(|| {
                spaced
                    .eq_ignore_ascii_case("connections")
                    .then_some(Section::Connections)
            })
            .ok_or_else(|| SectionError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_match_case_insensitively() {
        assert_eq!(Section::match_header("KEY DATA"), Some(Section::KeyData));
        assert_eq!(Section::match_header("  aliases  "), Some(Section::Aliases));
        assert_eq!(Section::match_header("hit category"), Some(Section::HitCategory));
    }

    #[test]
    fn connections_header_variants() {
        for line in [
            "Connections/Relationships",
            "Connections / Relationships",
            "connections/ relationships",
            "Connections Relationships",
        ] {
            assert_eq!(Section::match_header(line), Some(Section::Connections), "{line}");
        }
    }

    #[test]
    fn header_must_be_whole_line() {
        assert_eq!(Section::match_header("Key Data: none"), None);
        assert_eq!(Section::match_header("1) Aliases: JOHN"), None);
        assert_eq!(Section::match_header(""), None);
    }

    #[test]
    fn is_header_only_for_own_section() {
        assert!(Section::Sources.is_header(" Sources "));
        assert!(!Section::Keywords.is_header("Sources"));
    }

    #[test]
    fn declaration_order_is_ord() {
        let mut shuffled = vec![Section::HitCategory, Section::KeyData, Section::Aliases];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Section::KeyData, Section::Aliases, Section::HitCategory]
        );
        assert_eq!(Section::ALL[0], Section::FIRST);
    }

    #[test]
    fn parse_from_cli_names() {
        assert_eq!("key-data".parse::<Section>(), Ok(Section::KeyData));
        assert_eq!("Further Information".parse::<Section>(), Ok(Section::FurtherInformation));
        assert_eq!("connections".parse::<Section>(), Ok(Section::Connections));
        assert_eq!(
            "Biography".parse::<Section>(),
            Err(SectionError::Unknown("Biography".into()))
        );
    }

    #[test]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&Section::Connections).unwrap();
        assert_eq!(json, "\"Connections/Relationships\"");
        let back: Section = serde_json::from_str("\"Hit Category\"").unwrap();
        assert_eq!(back, Section::HitCategory);
    }
}
