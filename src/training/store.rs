//! In-memory training index.
//!
//! Built once per process from normalized records and read-only
//! afterwards; workers share it by reference. Provides the two lookups
//! the name engine uses: exact fingerprint matches and weighted
//! similarity search.

use crate::error::{Error, Result};
use crate::naming::BemName;
use crate::training::patterns::{build_patterns, NamingPattern};
use crate::training::records::TrainingRecord;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Assumed page extent for position quantization (US Letter).
const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
/// Coarse position bands per axis.
const BANDS: u8 = 3;
/// Band value when the position is unknown.
const BAND_UNKNOWN: u8 = 9;

/// Similarity weights: text, spatial, kind, section, visual group.
const W_TEXT: f64 = 0.35;
const W_SPATIAL: f64 = 0.20;
const W_KIND: f64 = 0.15;
const W_SECTION: f64 = 0.20;
const W_VISUAL: f64 = 0.10;

/// Coarse, lowercased context identity used for exact lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Lowercased label
    pub label: String,
    /// Lowercased section header
    pub section: String,
    /// Kind token
    pub kind: String,
    /// Horizontal position band
    pub h_band: u8,
    /// Vertical position band
    pub v_band: u8,
}

impl Fingerprint {
    /// Build a fingerprint from context parts.
    pub fn new(
        label: &str,
        section: &str,
        kind: &str,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Self {
        Self {
            label: label.trim().to_lowercase(),
            section: section.trim().to_lowercase(),
            kind: kind.trim().to_lowercase(),
            h_band: band(x, PAGE_WIDTH),
            v_band: band(y, PAGE_HEIGHT),
        }
    }
}

fn band(position: Option<f64>, extent: f64) -> u8 {
    match position {
        Some(p) => (((p / extent) * BANDS as f64).floor() as i64).clamp(0, BANDS as i64 - 1) as u8,
        None => BAND_UNKNOWN,
    }
}

/// A similarity query built from a field's extracted context.
#[derive(Debug, Clone, Default)]
pub struct SimilarityQuery {
    /// Label text
    pub label: String,
    /// Nearby run texts
    pub nearby_text: Vec<String>,
    /// Section header
    pub section: String,
    /// Kind token
    pub kind: String,
    /// Field x position
    pub x: Option<f64>,
    /// Field y position
    pub y: Option<f64>,
}

/// Immutable training index.
#[derive(Debug)]
pub struct TrainingStore {
    records: Vec<TrainingRecord>,
    exact: HashMap<Fingerprint, HashMap<String, u32>>,
    patterns: Vec<NamingPattern>,
}

impl TrainingStore {
    /// Build the index, discarding records whose approved name fails the
    /// grammar.
    pub fn load(records: Vec<TrainingRecord>) -> Result<Self> {
        let total = records.len();
        let records: Vec<TrainingRecord> = records
            .into_iter()
            .filter(|r| {
                let ok = BemName::is_valid(&r.approved_name);
                if !ok {
                    log::debug!("dropping training record with invalid name '{}'", r.approved_name);
                }
                ok
            })
            .collect();
        if total > 0 && records.is_empty() {
            return Err(Error::TrainingCorrupt(
                "no training record carries a grammar-valid approved name".to_string(),
            ));
        }
        log::info!("training store: {} of {} records usable", records.len(), total);

        let mut exact: HashMap<Fingerprint, HashMap<String, u32>> = HashMap::new();
        for record in &records {
            let fingerprint = Fingerprint::new(
                &record.label_key(),
                &record.section_key(),
                &record.kind_key(),
                record.x,
                record.y,
            );
            *exact
                .entry(fingerprint)
                .or_default()
                .entry(record.approved_name.clone())
                .or_insert(0) += 1;
        }

        let patterns = build_patterns(&records);
        Ok(Self {
            records,
            exact,
            patterns,
        })
    }

    /// Load records from a JSON array file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| Error::TrainingCorrupt(format!("{}: {}", path.as_ref().display(), e)))?;
        let records: Vec<TrainingRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::TrainingCorrupt(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::load(records)
    }

    /// Number of usable records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records were loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Names whose training fingerprint equals this one, with support
    /// counts, strongest first.
    pub fn lookup_exact(&self, fingerprint: &Fingerprint) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = self
            .exact
            .get(fingerprint)
            .map(|names| names.iter().map(|(n, s)| (n.clone(), *s)).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Support for one specific name under this fingerprint.
    pub fn support_for(&self, fingerprint: &Fingerprint, name: &str) -> u32 {
        self.exact
            .get(fingerprint)
            .and_then(|names| names.get(name).copied())
            .unwrap_or(0)
    }

    /// Top-k names ranked by weighted context similarity.
    pub fn lookup_similar(&self, query: &SimilarityQuery, top_k: usize) -> Vec<(String, f64)> {
        let query_tokens = text_tokens(&query.label, &query.nearby_text);

        let mut scored: Vec<(f64, u32, &str)> = Vec::new();
        for record in &self.records {
            let score = self.similarity(query, &query_tokens, record);
            if score > 0.0 {
                let fingerprint = Fingerprint::new(
                    &record.label_key(),
                    &record.section_key(),
                    &record.kind_key(),
                    record.x,
                    record.y,
                );
                let support = self.support_for(&fingerprint, &record.approved_name);
                scored.push((score, support, record.approved_name.as_str()));
            }
        }
        // Ties broken by higher support
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.2.cmp(b.2))
        });

        let mut seen = HashSet::new();
        scored
            .into_iter()
            .filter(|(_, _, name)| seen.insert(name.to_string()))
            .take(top_k)
            .map(|(score, _, name)| (name.to_string(), score))
            .collect()
    }

    /// The extracted pattern catalog.
    pub fn patterns(&self) -> &[NamingPattern] {
        &self.patterns
    }

    fn similarity(
        &self,
        query: &SimilarityQuery,
        query_tokens: &HashSet<String>,
        record: &TrainingRecord,
    ) -> f64 {
        let record_tokens = text_tokens(
            record.label.as_deref().unwrap_or(""),
            &record.nearby_text,
        );
        let text = token_overlap(query_tokens, &record_tokens);

        let spatial = match (query.x, query.y, record.x, record.y) {
            (Some(qx), Some(qy), Some(rx), Some(ry)) => {
                let diagonal = (PAGE_WIDTH.powi(2) + PAGE_HEIGHT.powi(2)).sqrt();
                (1.0 - ((qx - rx).hypot(qy - ry) / diagonal)).max(0.0)
            },
            _ => 0.5,
        };

        let kind = kind_similarity(&query.kind, &record.kind_key());

        let query_section = query.section.trim().to_lowercase();
        let record_section = record.section_key();
        let section = if !query_section.is_empty() && query_section == record_section {
            1.0
        } else if !query_section.is_empty() && !record_section.is_empty() {
            token_overlap(
                &query_section.split_whitespace().map(str::to_string).collect(),
                &record_section.split_whitespace().map(str::to_string).collect(),
            )
        } else {
            0.0
        };

        let visual = match (query.x, query.y, record.x, record.y) {
            (Some(qx), Some(qy), Some(rx), Some(ry)) => {
                let same_cell = (qx / 100.0).floor() == (rx / 100.0).floor()
                    && (qy / 100.0).floor() == (ry / 100.0).floor();
                if same_cell {
                    1.0
                } else {
                    0.0
                }
            },
            _ => 0.0,
        };

        W_TEXT * text + W_SPATIAL * spatial + W_KIND * kind + W_SECTION * section + W_VISUAL * visual
    }
}

/// Lowercased word tokens (length >= 3) from a label and nearby runs.
fn text_tokens(label: &str, nearby: &[String]) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut add = |text: &str| {
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.len() >= 3 {
                tokens.insert(word.to_lowercase());
            }
        }
    };
    add(label);
    for text in nearby {
        add(text);
    }
    tokens
}

/// Normalized token-set overlap (Jaccard).
fn token_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

fn kind_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    const BUTTON_FAMILY: [&str; 4] = ["checkbox", "radio_group", "radio_widget", "choice"];
    if BUTTON_FAMILY.contains(&a) && BUTTON_FAMILY.contains(&b) {
        0.8
    } else {
        0.2
    }
}
