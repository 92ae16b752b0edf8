//! Terminal rendering for viewer frames and analysis outputs.
//!
//! Everything is formatted into lines first so the layout can be tested
//! without capturing stdout.

use hitlens_core::case::{AspectFeedback, AspectType, FeedbackType, SourceCase};
use hitlens_core::verdict::AspectVerdict;
use hitlens_core::{AnalysisView, CitationSpan, Segment};
use hitlens_viewer::{Activation, FieldLine, Frame, Presented, RawLine, Surface};

/// Prints every frame it is given.
pub struct TerminalSurface;

impl Surface for TerminalSurface {
    fn draw(&mut self, frame: &Frame) {
        for line in format_frame(frame) {
            println!("{line}");
        }
    }
}

// ── Frames ──

pub fn format_frame(frame: &Frame) -> Vec<String> {
    let mut out = Vec::new();

    let tabs: Vec<String> = frame
        .tabs
        .iter()
        .map(|s| {
            if *s == frame.active {
                format!("[{}]", s.label())
            } else {
                s.label().to_string()
            }
        })
        .collect();
    out.push(tabs.join("  "));

    out.push(format!(
        "  {:<26} {}",
        "mode",
        if frame.raw { "raw" } else { "structured" }
    ));
    if !frame.query.trim().is_empty() {
        out.push(format!("  {:<26} {}", "filter", frame.query.trim()));
    }
    if !frame.highlight_labels.is_empty() {
        out.push(format!(
            "  {:<26} {}",
            "highlights",
            frame.highlight_labels.join(", ")
        ));
    }
    if let Some(line) = frame.scroll_to {
        out.push(format!("  {:<26} line {}", "scroll", line));
    }
    out.push(String::new());

    match &frame.body {
        Presented::Structured(rows) if rows.is_empty() => {
            if frame.query.trim().is_empty() {
                out.push("  (no data)".to_string());
            } else {
                out.push("  (no matching fields)".to_string());
            }
        }
        Presented::Structured(rows) => out.extend(rows.iter().map(format_field)),
        Presented::Raw(rows) => out.extend(rows.iter().map(format_raw)),
    }
    out
}

fn format_field(row: &FieldLine) -> String {
    let marker = if row.highlighted { '>' } else { ' ' };
    let value = match &row.query_match {
        Some(m) => format!(
            "{}«{}»{}",
            &row.value[..m.start],
            &row.value[m.clone()],
            &row.value[m.end..]
        ),
        None => row.value.clone(),
    };
    if row.label.is_empty() {
        format!("{marker} {:>3}  {}", row.line, value)
    } else {
        format!("{marker} {:>3}  {:<26} {}", row.line, row.label, value)
    }
}

fn format_raw(row: &RawLine) -> String {
    let marker = if row.highlighted { '>' } else { ' ' };
    format!("{marker} {:02}  {}", row.line, row.text)
}

pub fn print_activation(act: &Activation) {
    let switched = if act.switched { " (switched)" } else { "" };
    println!(
        "  {:<26} {} -> {}{}",
        "activated",
        act.range.label(),
        act.section,
        switched
    );
}

// ── Analyses ──

/// Render an analysis with citation triggers numbered `[1]`, `[2]`, ... in
/// the same order as [`AnalysisView::citations`], followed by a legend.
pub fn format_analysis(view: &AnalysisView) -> Vec<String> {
    let mut out = Vec::new();
    let mut n = 0usize;
    let mut next_marker = || {
        n += 1;
        format!("[{n}]")
    };

    match view {
        AnalysisView::Structured { reasoning, claims } => {
            out.extend(reasoning.lines().map(|l| format!("  {l}")));
            if !claims.is_empty() {
                out.push(String::new());
                out.push("  Claims".to_string());
            }
            for claim in claims {
                let markers: String = claim.citations.iter().map(|_| next_marker()).collect();
                if markers.is_empty() {
                    out.push(format!("    - {}", claim.statement));
                } else {
                    out.push(format!("    - {} {}", claim.statement, markers));
                }
            }
        }
        AnalysisView::Inline(segments) => {
            let text: String = segments
                .iter()
                .map(|s| match s {
                    Segment::Text(t) => t.clone(),
                    Segment::Citation(_) => next_marker(),
                })
                .collect();
            out.extend(text.lines().map(|l| format!("  {l}")));
        }
    }

    let citations = view.citations();
    if !citations.is_empty() {
        out.push(String::new());
        out.extend(citations.iter().zip(1..).map(format_legend));
    }
    out
}

fn format_legend((span, n): (&CitationSpan, usize)) -> String {
    format!("  [{n}] {}", span.label())
}

pub fn print_analysis(view: &AnalysisView) {
    for line in format_analysis(view) {
        println!("{line}");
    }
}

// ── Cases ──

/// Print the case header card.
pub fn print_case_header(case: &SourceCase) {
    let name = case.candidate_name.as_deref().unwrap_or("(unnamed)");
    println!("=== {} ===", name);
    println!("  {:<26} {}", "profile_unique_id", case.profile_unique_id);
    println!("  {:<26} {}", "dj_profile_id", case.dj_profile_id);
    if let Some(reference) = &case.reference_id {
        println!("  {:<26} {}", "reference_id", reference);
    }
    if let Some(score) = case.final_score {
        println!("  {:<26} {:.2}", "final_score", score);
    }
    println!("  {:<26} {}", "created_at", case.created_at);
    println!();
}

/// Aspect title with its verdict badge, plus any feedback already recorded.
pub fn format_aspect_header(
    aspect: AspectType,
    verdict: &AspectVerdict,
    feedback: Option<&AspectFeedback>,
) -> Vec<String> {
    let badge = if verdict.verdict.is_some() {
        format!("[{}: {}]", verdict.status, verdict.badge())
    } else {
        format!("[{}]", verdict.status)
    };
    let mut out = vec![format!("Aspect: {aspect}  {badge}")];
    if let Some(fb) = feedback {
        out.push(format_feedback(fb));
    }
    out
}

pub fn format_feedback(fb: &AspectFeedback) -> String {
    let reaction = match fb.operator_feedback {
        Some(FeedbackType::Agree) => "agree",
        Some(FeedbackType::Disagree) => "disagree",
        Some(FeedbackType::NotRelated) => "not related",
        None => "(none)",
    };
    match fb.operator_comment.as_deref().filter(|c| !c.is_empty()) {
        Some(comment) => format!("  {:<26} {} ({})", "feedback", reaction, comment),
        None => format!("  {:<26} {}", "feedback", reaction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitlens_core::Section;
    use hitlens_core::citation::extract;

    fn frame(body: Presented) -> Frame {
        Frame {
            tabs: vec![Section::KeyData, Section::Aliases],
            active: Section::KeyData,
            raw: false,
            query: String::new(),
            highlight_labels: vec![],
            body,
            scroll_to: None,
        }
    }

    #[test]
    fn tabs_bracket_active_section() {
        let lines = format_frame(&frame(Presented::Structured(vec![])));
        assert_eq!(lines[0], "[Key Data]  Aliases");
        assert!(lines.contains(&"  (no data)".to_string()));
    }

    #[test]
    fn structured_rows_mark_highlight_and_match() {
        let mut f = frame(Presented::Structured(vec![FieldLine {
            line: 2,
            label: "Name".into(),
            value: "John Smith".into(),
            highlighted: true,
            query_match: Some(5..10),
        }]));
        f.query = "smith".into();
        f.highlight_labels = vec!["Lines 2-2".into()];
        f.scroll_to = Some(2);

        let lines = format_frame(&f);
        assert!(
            lines
                .iter()
                .any(|l| l.trim_start().starts_with("filter") && l.ends_with(" smith"))
        );
        assert!(lines.iter().any(|l| l.ends_with("Lines 2-2")));
        assert!(lines.iter().any(|l| l.ends_with("line 2")));
        let row = lines.last().unwrap();
        assert!(row.starts_with(">   2  Name"));
        assert!(row.ends_with("John «Smith»"));
    }

    #[test]
    fn filtered_out_body_says_so() {
        let mut f = frame(Presented::Structured(vec![]));
        f.query = "zzz".into();
        assert_eq!(
            format_frame(&f).last().unwrap(),
            "  (no matching fields)"
        );
    }

    #[test]
    fn raw_rows_are_zero_padded() {
        let mut f = frame(Presented::Raw(vec![RawLine {
            line: 3,
            text: "2) DOB: 1990".into(),
            highlighted: false,
        }]));
        f.raw = true;
        assert_eq!(format_frame(&f).last().unwrap(), "  03  2) DOB: 1990");
    }

    #[test]
    fn inline_analysis_numbers_markers() {
        let lines = format_analysis(&extract("PEP record:2:3 and SIP record:5:5."));
        assert_eq!(lines[0], "  PEP [1] and SIP [2].");
        assert_eq!(lines[2], "  [1] lines 2-3");
        assert_eq!(lines[3], "  [2] lines 5-5");
    }

    #[test]
    fn structured_analysis_lists_claims() {
        let raw = r#"{"reasoning": "Names align.", "claims": [
            {"statement": "Same surname", "citations": ["record:1:1", "record:2:2"]},
            {"statement": "Uncited", "citations": []}
        ]}"#;
        let lines = format_analysis(&extract(raw));
        assert_eq!(lines[0], "  Names align.");
        assert!(lines.contains(&"    - Same surname [1][2]".to_string()));
        assert!(lines.contains(&"    - Uncited".to_string()));
        assert_eq!(lines.last().unwrap(), "  [2] lines 2-2");
    }

    #[test]
    fn aspect_header_shows_verdict_badge() {
        use hitlens_core::verdict::aspect_verdict;

        let matched = aspect_verdict(r#"{"category": {"verdict": "strong_match"}}"#);
        assert_eq!(
            format_aspect_header(AspectType::Name, &matched, None),
            vec!["Aspect: name  [Match: strong_match]"]
        );

        let different = aspect_verdict(r#"{"category": {"verdict": "likely_no_match"}}"#);
        assert_eq!(
            format_aspect_header(AspectType::Age, &different, None)[0],
            "Aspect: age  [Different: likely_no_match]"
        );

        let garbled = aspect_verdict("record:1:2 is not json");
        assert_eq!(
            format_aspect_header(AspectType::Risk, &garbled, None)[0],
            "Aspect: risk  [Unclear]"
        );
    }

    #[test]
    fn aspect_header_lists_recorded_feedback() {
        let fb = AspectFeedback {
            id: 1,
            profile_unique_id: "P-1".into(),
            dj_profile_id: "DJ-2".into(),
            aspect_type: AspectType::Nationality,
            llm_output: None,
            llm_verdict_score: None,
            operator_feedback: Some(FeedbackType::NotRelated),
            operator_comment: Some("dual national".into()),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
            operator_id: 7,
        };
        let verdict = hitlens_core::verdict::aspect_verdict("");
        let lines = format_aspect_header(AspectType::Nationality, &verdict, Some(&fb));
        assert_eq!(lines.len(), 2);
        assert!(lines[1].trim_start().starts_with("feedback"));
        assert!(lines[1].ends_with("not related (dual national)"));
    }
}
