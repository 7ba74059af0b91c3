//! Turns raw analysis results into labels and text blocks.
//!
//! Upstream order is trusted everywhere: candidates, lines and captions are
//! never re-ranked here. Empty inputs are normal outcomes, not errors.

use std::collections::HashMap;

use lensbridge_core::{Candidate, Caption, FaceRegion, IdentifiedFace, TextLine, TextRegion};

pub const UNKNOWN_LABEL: &str = "unknown";

/// `0.87` → `"87.00%"`.
pub fn format_percent(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Label for a face: `"<name> <pct>"` from the first candidate, or `"unknown"`.
/// `names` maps person id → display name; a missing entry shows the id.
pub fn resolve_face_label(candidates: &[Candidate], names: &HashMap<String, String>) -> String {
    match candidates.first() {
        Some(top) => {
            let name = names.get(&top.person_id).unwrap_or(&top.person_id);
            format!("{} {}", name, format_percent(top.confidence))
        }
        None => UNKNOWN_LABEL.to_string(),
    }
}

pub fn identified_face(
    region: FaceRegion,
    candidates: &[Candidate],
    names: &HashMap<String, String>,
) -> IdentifiedFace {
    IdentifiedFace {
        region,
        label: resolve_face_label(candidates, names),
        confidence: candidates.first().map(|c| c.confidence),
    }
}

/// All recognized lines in region-then-line order, plus their texts joined by
/// newlines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrText {
    pub lines: Vec<TextLine>,
    pub text: String,
}

impl OcrText {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub fn collect_ocr_lines(regions: &[TextRegion]) -> OcrText {
    let lines: Vec<TextLine> = regions.iter().flat_map(|r| r.lines.iter().cloned()).collect();
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    OcrText { lines, text }
}

/// One `'<text>' with confidence <pct>` line per caption, each newline-terminated.
pub fn format_descriptions(captions: &[Caption]) -> String {
    captions
        .iter()
        .map(|c| format!("'{}' with confidence {}\n", c.text, format_percent(c.confidence)))
        .collect()
}
