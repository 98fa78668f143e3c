//! Normalized training records.
//!
//! The ingestion file formats live outside the core; whatever loads them
//! hands the store a sequence of these records. Only `approved_name` is
//! mandatory.

use serde::{Deserialize, Serialize};

/// One historical example: field evidence plus the name a human approved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// Label text seen near the field
    #[serde(default)]
    pub label: Option<String>,
    /// Other nearby text runs
    #[serde(default)]
    pub nearby_text: Vec<String>,
    /// Section header governing the field
    #[serde(default)]
    pub section: Option<String>,
    /// Field kind token (`text`, `checkbox`, ...)
    #[serde(default)]
    pub kind: Option<String>,
    /// One-based page number
    #[serde(default)]
    pub page: Option<u32>,
    /// Field x position
    #[serde(default)]
    pub x: Option<f64>,
    /// Field y position
    #[serde(default)]
    pub y: Option<f64>,
    /// Field width
    #[serde(default)]
    pub width: Option<f64>,
    /// Field height
    #[serde(default)]
    pub height: Option<f64>,
    /// The approved BEM name
    pub approved_name: String,
}

impl TrainingRecord {
    /// Record with just a name, for tests and synthetic corpora.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            approved_name: name.into(),
            ..Self::default()
        }
    }

    /// Lowercased, trimmed label.
    pub fn label_key(&self) -> String {
        self.label.as_deref().unwrap_or("").trim().to_lowercase()
    }

    /// Lowercased, trimmed section.
    pub fn section_key(&self) -> String {
        self.section.as_deref().unwrap_or("").trim().to_lowercase()
    }

    /// Lowercased kind token.
    pub fn kind_key(&self) -> String {
        self.kind.as_deref().unwrap_or("").trim().to_lowercase()
    }
}
