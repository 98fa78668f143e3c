//! Field context extraction.
//!
//! For each non-container field this derives the surrounding text
//! evidence the name engine feeds on: nearby runs, directional neighbors,
//! a probable label, the governing section header, a coarse visual group
//! and a confidence score. Page text runs are cached so cost stays
//! O(fields x runs-per-page).

use crate::content::{extract_text_runs, TextRun};
use crate::document::Document;
use crate::error::Result;
use crate::extract::Field;
use std::collections::HashMap;

/// How far around the field rectangle nearby text is collected, in PDF
/// user-space units per side.
const PROXIMITY_INFLATE: f32 = 100.0;
/// Cap on collected nearby runs.
const MAX_NEARBY_TEXT: usize = 10;
/// Cell size of the visual grouping grid.
const VISUAL_GRID: f32 = 100.0;

/// Words that mark a run as a likely field label.
const LABEL_INDICATORS: [&str; 8] =
    ["name", "address", "phone", "email", "date", "ssn", "amount", "signature"];

/// Suffixes that mark a run as a section header.
const SECTION_SUFFIXES: [&str; 2] = ["Information", "Section"];

/// Context evidence attached to one field.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FieldContext {
    /// Probable label text (possibly empty)
    pub label: String,
    /// Governing section header (possibly empty)
    pub section_header: String,
    /// De-duplicated nearby runs, nearest first
    pub nearby_text: Vec<String>,
    /// Nearest run above the field
    pub text_above: String,
    /// Nearest run below the field
    pub text_below: String,
    /// Nearest run left of the field
    pub text_left: String,
    /// Nearest run right of the field
    pub text_right: String,
    /// Coarse-grid key grouping fields in the same region
    pub visual_group: String,
    /// Extraction confidence in `[0, 1]`
    pub confidence: f64,
}

/// Per-document context extractor with a page-run cache.
pub struct ContextExtractor<'a> {
    doc: &'a Document,
    page_runs: HashMap<u32, Vec<TextRun>>,
}

impl<'a> ContextExtractor<'a> {
    /// New extractor; the cache fills lazily per page.
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            page_runs: HashMap::new(),
        }
    }

    /// Extract context for one field. Containers get an empty context.
    pub fn extract(&mut self, field: &Field) -> Result<FieldContext> {
        let (Some(page), Some(rect)) = (field.page, field.rect) else {
            return Ok(FieldContext::default());
        };
        let runs = self.runs_for_page(page)?;
        let rect = [rect[0] as f32, rect[1] as f32, rect[2] as f32, rect[3] as f32];

        let nearby_text = nearby_text(runs, rect);
        let text_above = directional(runs, rect, Direction::Above);
        let text_below = directional(runs, rect, Direction::Below);
        let text_left = directional(runs, rect, Direction::Left);
        let text_right = directional(runs, rect, Direction::Right);
        let label = detect_label(&nearby_text, &text_left);
        let section_header = section_header(runs, rect);
        let visual_group = visual_group(rect);
        let confidence = confidence(
            &label,
            &nearby_text,
            &section_header,
            &[&text_above, &text_below, &text_left, &text_right],
        );

        Ok(FieldContext {
            label,
            section_header,
            nearby_text,
            text_above,
            text_below,
            text_left,
            text_right,
            visual_group,
            confidence,
        })
    }

    /// Extract contexts for every field, keyed by field id.
    pub fn extract_all(&mut self, fields: &[Field]) -> Result<HashMap<String, FieldContext>> {
        let mut contexts = HashMap::with_capacity(fields.len());
        for field in fields {
            contexts.insert(field.id.clone(), self.extract(field)?);
        }
        Ok(contexts)
    }

    /// Release the per-page cache (worker-local, dropped on completion).
    pub fn clear_cache(&mut self) {
        self.page_runs.clear();
    }

    fn runs_for_page(&mut self, page: u32) -> Result<&[TextRun]> {
        if !self.page_runs.contains_key(&page) {
            let index = page.saturating_sub(1) as usize;
            let runs = match extract_text_runs(self.doc, index) {
                Ok(runs) => runs,
                Err(e) => {
                    log::warn!("text extraction failed on page {}: {}", page, e);
                    Vec::new()
                },
            };
            self.page_runs.insert(page, runs);
        }
        Ok(self.page_runs.get(&page).map(Vec::as_slice).unwrap_or(&[]))
    }
}

fn rect_center(rect: [f32; 4]) -> (f32, f32) {
    ((rect[0] + rect[2]) / 2.0, (rect[1] + rect[3]) / 2.0)
}

/// Runs whose centers fall inside the inflated rectangle, ordered by
/// distance from the field center, de-duplicated, capped.
fn nearby_text(runs: &[TextRun], rect: [f32; 4]) -> Vec<String> {
    let (cx, cy) = rect_center(rect);
    let left = rect[0].min(rect[2]) - PROXIMITY_INFLATE;
    let right = rect[0].max(rect[2]) + PROXIMITY_INFLATE;
    let bottom = rect[1].min(rect[3]) - PROXIMITY_INFLATE;
    let top = rect[1].max(rect[3]) + PROXIMITY_INFLATE;

    let mut candidates: Vec<(f32, &str)> = runs
        .iter()
        .filter_map(|run| {
            let (rx, ry) = run.center();
            if rx >= left && rx <= right && ry >= bottom && ry <= top {
                let distance = (rx - cx).hypot(ry - cy);
                Some((distance, run.text.as_str()))
            } else {
                None
            }
        })
        .collect();
    candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|(_, text)| seen.insert(text.to_string()))
        .take(MAX_NEARBY_TEXT)
        .map(|(_, text)| text.to_string())
        .collect()
}

#[derive(Clone, Copy)]
enum Direction {
    Above,
    Below,
    Left,
    Right,
}

/// Nearest run in the half-plane on the given side that overlaps the
/// field's extent on the perpendicular axis.
fn directional(runs: &[TextRun], rect: [f32; 4], direction: Direction) -> String {
    let left = rect[0].min(rect[2]);
    let right = rect[0].max(rect[2]);
    let bottom = rect[1].min(rect[3]);
    let top = rect[1].max(rect[3]);

    let mut best: Option<(f32, &str)> = None;
    for run in runs {
        let (rx, ry) = run.center();
        let candidate = match direction {
            Direction::Above if ry > top && rx + run.width / 2.0 >= left && rx - run.width / 2.0 <= right => {
                Some(ry - top)
            },
            Direction::Below if ry < bottom && rx + run.width / 2.0 >= left && rx - run.width / 2.0 <= right => {
                Some(bottom - ry)
            },
            Direction::Left if rx < left && ry >= bottom - run.height && ry <= top + run.height => {
                Some(left - rx)
            },
            Direction::Right if rx > right && ry >= bottom - run.height && ry <= top + run.height => {
                Some(rx - right)
            },
            _ => None,
        };
        if let Some(distance) = candidate {
            if best.map(|(d, _)| distance < d).unwrap_or(true) {
                best = Some((distance, run.text.as_str()));
            }
        }
    }
    best.map(|(_, text)| text.to_string()).unwrap_or_default()
}

/// Label heuristic: colon-terminated run, then indicator words, then the
/// left neighbor, then the first nearby run.
fn detect_label(nearby: &[String], text_left: &str) -> String {
    for text in nearby {
        if text.trim_end().ends_with(':') {
            return text.trim_end().trim_end_matches(':').trim().to_string();
        }
    }
    for text in nearby {
        let lower = text.to_lowercase();
        if LABEL_INDICATORS.iter().any(|w| lower.contains(w)) {
            return text.trim().to_string();
        }
    }
    if !text_left.is_empty() {
        return text_left.trim().to_string();
    }
    nearby.first().map(|t| t.trim().to_string()).unwrap_or_default()
}

/// First run above the field that looks like a section header: all-caps
/// or ending in a known suffix. Scoped to the page.
fn section_header(runs: &[TextRun], rect: [f32; 4]) -> String {
    let top = rect[1].max(rect[3]);
    let mut best: Option<(f32, &str)> = None;
    for run in runs {
        let (_, ry) = run.center();
        if ry <= top {
            continue;
        }
        let text = run.text.trim();
        let is_caps = text.len() > 2
            && text.chars().any(|c| c.is_alphabetic())
            && !text.chars().any(|c| c.is_lowercase());
        let has_suffix = SECTION_SUFFIXES.iter().any(|s| text.ends_with(s));
        if is_caps || has_suffix {
            let distance = ry - top;
            if best.map(|(d, _)| distance < d).unwrap_or(true) {
                best = Some((distance, text));
            }
        }
    }
    best.map(|(_, t)| t.to_string()).unwrap_or_default()
}

/// Bucket the field center into a coarse grid.
fn visual_group(rect: [f32; 4]) -> String {
    let (cx, cy) = rect_center(rect);
    format!(
        "r{}c{}",
        (cy / VISUAL_GRID).floor() as i32,
        (cx / VISUAL_GRID).floor() as i32
    )
}

/// Confidence formula: base 0.3, +0.3 for a strong label, +0.2 for three
/// or more nearby runs, +0.1 for a section header, +0.1 for any
/// directional text; clipped to [0, 1].
fn confidence(label: &str, nearby: &[String], section: &str, directional: &[&String; 4]) -> f64 {
    let mut score: f64 = 0.3;
    if !label.is_empty() {
        let lower = label.to_lowercase();
        let strong = nearby.iter().any(|t| t.trim_end().ends_with(':'))
            || LABEL_INDICATORS.iter().any(|w| lower.contains(w));
        if strong {
            score += 0.3;
        }
    }
    if nearby.len() >= 3 {
        score += 0.2;
    }
    if !section.is_empty() {
        score += 0.1;
    }
    if directional.iter().any(|t| !t.is_empty()) {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}
