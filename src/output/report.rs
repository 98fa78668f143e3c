//! Structured processing report.
//!
//! One JSON document per run: document summary, per-field decision and
//! context evidence, modification status, warnings and the safety score.

use crate::error::{Error, Result};
use crate::extract::{Field, FieldContext, FieldStatistics};
use crate::naming::NameDecision;
use serde::Serialize;
use std::path::Path;

/// Document-level summary.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// Source path as given by the caller
    pub path: String,
    /// PDF header version, e.g. `"1.7"`
    pub version: String,
    /// Page count
    pub page_count: usize,
    /// Flattened field count
    pub field_count: usize,
    /// Whether the source is encrypted
    pub encrypted: bool,
    /// Aggregate field statistics
    pub statistics: FieldStatistics,
}

/// What happened to one field during modification.
#[derive(Debug, Clone, Serialize)]
pub struct ModificationEntry {
    /// `applied`, `unchanged`, or `rolled_back`
    pub status: String,
    /// Fully qualified name the plan expects after application
    pub expected_name: String,
}

/// Per-field report entry.
#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    /// Stable field id
    pub id: String,
    /// Name before processing
    pub original_name: String,
    /// Kind token
    pub kind: String,
    /// One-based page, if placed
    pub page: Option<u32>,
    /// Rectangle, if placed
    pub rect: Option<[f64; 4]>,
    /// The engine's decision
    pub decision: NameDecision,
    /// Context evidence the decision used
    pub context: FieldContext,
    /// Modification outcome
    pub modification: ModificationEntry,
}

/// The full processing report.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    /// Document summary
    pub document: DocumentSummary,
    /// One entry per field, extraction order
    pub fields: Vec<FieldReport>,
    /// All warnings gathered across the pipeline
    pub warnings: Vec<String>,
    /// The plan's safety score
    pub safety_score: f64,
}

impl ProcessingReport {
    /// Assemble the report from pipeline pieces.
    pub fn assemble(
        document: DocumentSummary,
        fields: &[Field],
        contexts: &std::collections::HashMap<String, FieldContext>,
        decisions: &[NameDecision],
        expected_names: &std::collections::HashMap<String, String>,
        warnings: Vec<String>,
        safety_score: f64,
    ) -> Self {
        let decision_of: std::collections::HashMap<&str, &NameDecision> =
            decisions.iter().map(|d| (d.field_id.as_str(), d)).collect();

        let fields = fields
            .iter()
            .map(|field| {
                let decision = decision_of
                    .get(field.id.as_str())
                    .map(|d| (*d).clone())
                    .unwrap_or_else(|| NameDecision {
                        field_id: field.id.clone(),
                        action: crate::naming::NameAction::Preserve,
                        new_name: field.name.clone(),
                        confidence: 0.0,
                        source: crate::naming::DecisionSource::Fallback,
                        rationale: "no decision produced".to_string(),
                        alternatives: Vec::new(),
                    });
                let expected_name = expected_names
                    .get(&field.id)
                    .cloned()
                    .unwrap_or_else(|| field.name.clone());
                let status = if expected_name == field.name {
                    "unchanged"
                } else {
                    "applied"
                };
                FieldReport {
                    id: field.id.clone(),
                    original_name: field.name.clone(),
                    kind: field.kind.as_str().to_string(),
                    page: field.page,
                    rect: field.rect,
                    decision,
                    context: contexts.get(&field.id).cloned().unwrap_or_default(),
                    modification: ModificationEntry {
                        status: status.to_string(),
                        expected_name,
                    },
                }
            })
            .collect();

        Self {
            document,
            fields,
            warnings,
            safety_score,
        }
    }
}

/// Serialize the report as pretty JSON.
pub fn write_report(path: &Path, report: &ProcessingReport) -> Result<()> {
    let json = serde_json::to_vec_pretty(report)
        .map_err(|e| Error::InvalidPdf(format!("report serialization: {}", e)))?;
    std::fs::write(path, json)?;
    log::info!("processing report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_assemble_marks_unchanged() {
        let summary = DocumentSummary {
            path: "x.pdf".to_string(),
            version: "1.7".to_string(),
            page_count: 1,
            field_count: 0,
            encrypted: false,
            statistics: FieldStatistics {
                total: 0,
                by_kind: HashMap::new(),
                pages_with_fields: 0,
                required: 0,
                readonly: 0,
                with_value: 0,
            },
        };
        let report = ProcessingReport::assemble(
            summary,
            &[],
            &HashMap::new(),
            &[],
            &HashMap::new(),
            vec!["warn".to_string()],
            0.9,
        );
        assert!(report.fields.is_empty());
        assert_eq!(report.warnings, vec!["warn".to_string()]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"safety_score\":0.9"));
    }
}
