//! Naming-pattern catalog.
//!
//! Aggregates the training corpus into per-block patterns: which label
//! tokens trigger a block, which element usually follows, and how often
//! the pattern held across distinct context fingerprints. Built once at
//! load, immutable afterwards.

use crate::naming::BemName;
use crate::training::records::TrainingRecord;
use crate::training::store::Fingerprint;
use std::collections::{HashMap, HashSet};

/// Stop words excluded from trigger tokens.
const STOP_WORDS: [&str; 12] = [
    "the", "and", "for", "with", "this", "that", "your", "please", "enter", "field", "name",
    "form",
];

/// One learned naming pattern.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NamingPattern {
    /// Label tokens that suggest this pattern
    pub trigger_tokens: Vec<String>,
    /// Block segment the pattern produces
    pub block: String,
    /// Most common element under this block, if any
    pub element: Option<String>,
    /// Most common modifier under this block, if any
    pub modifier_hint: Option<String>,
    /// Number of supporting records
    pub support: u32,
    /// `pattern_hits / fingerprints_observed` over the training set
    pub confidence: f64,
}

/// Build the catalog from grammar-valid records.
pub fn build_patterns(records: &[TrainingRecord]) -> Vec<NamingPattern> {
    let mut all_fingerprints: HashSet<Fingerprint> = HashSet::new();
    let mut by_block: HashMap<String, BlockAccumulator> = HashMap::new();

    for record in records {
        let Ok(name) = BemName::parse(&record.approved_name) else {
            continue;
        };
        let fingerprint = Fingerprint::new(
            &record.label_key(),
            &record.section_key(),
            &record.kind_key(),
            record.x,
            record.y,
        );
        all_fingerprints.insert(fingerprint.clone());

        let acc = by_block.entry(name.block.clone()).or_default();
        acc.support += 1;
        acc.fingerprints.insert(fingerprint);
        if let Some(element) = &name.element {
            *acc.elements.entry(element.clone()).or_insert(0) += 1;
        }
        if let Some(modifier) = &name.modifier {
            *acc.modifiers.entry(modifier.clone()).or_insert(0) += 1;
        }
        for token in record.label_key().split_whitespace() {
            if token.len() >= 3 && !STOP_WORDS.contains(&token) {
                *acc.tokens.entry(token.to_string()).or_insert(0) += 1;
            }
        }
    }

    let observed = all_fingerprints.len().max(1) as f64;
    let mut patterns: Vec<NamingPattern> = by_block
        .into_iter()
        .map(|(block, acc)| {
            let mut tokens: Vec<(String, u32)> = acc.tokens.into_iter().collect();
            tokens.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            NamingPattern {
                trigger_tokens: tokens.into_iter().take(5).map(|(t, _)| t).collect(),
                block,
                element: top_entry(acc.elements),
                modifier_hint: top_entry(acc.modifiers),
                support: acc.support,
                confidence: acc.fingerprints.len() as f64 / observed,
            }
        })
        .collect();
    patterns.sort_by(|a, b| b.support.cmp(&a.support).then_with(|| a.block.cmp(&b.block)));
    patterns
}

#[derive(Default)]
struct BlockAccumulator {
    support: u32,
    fingerprints: HashSet<Fingerprint>,
    elements: HashMap<String, u32>,
    modifiers: HashMap<String, u32>,
    tokens: HashMap<String, u32>,
}

fn top_entry(map: HashMap<String, u32>) -> Option<String> {
    map.into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(k, _)| k)
}
