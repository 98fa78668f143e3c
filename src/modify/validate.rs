//! Post-apply integrity validation.
//!
//! Re-opens the written output, re-extracts the field tree and asserts
//! the plan landed exactly: same field ids, planned names in place,
//! hierarchy edges intact, widget geometry untouched, AcroForm still
//! reachable. Any critical finding triggers rollback in the caller.

use crate::document::Document;
use crate::error::Result;
use crate::extract::{Field, FieldExtractor};
use crate::modify::planner::ModificationPlan;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Overall verdict of the validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    /// Every check passed
    Safe,
    /// Cosmetic differences only
    Warning,
    /// Structural damage; the run must roll back
    Critical,
}

/// Per-check outcome with offending field ids.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IntegrityReport {
    /// Overall verdict
    pub status: IntegrityStatus,
    /// The id set survived unchanged
    pub field_ids_unchanged: bool,
    /// Every planned field carries its planned name
    pub names_match_plan: bool,
    /// Parent/child edges are intact
    pub edges_preserved: bool,
    /// Widget rectangles and pages are intact
    pub geometry_preserved: bool,
    /// The AcroForm tree root is still reachable
    pub acroform_reachable: bool,
    /// Ids implicated in failures
    pub offending_fields: Vec<String>,
    /// Human-readable findings
    pub issues: Vec<String>,
}

impl IntegrityReport {
    fn failure(issue: String) -> Self {
        Self {
            status: IntegrityStatus::Critical,
            field_ids_unchanged: false,
            names_match_plan: false,
            edges_preserved: false,
            geometry_preserved: false,
            acroform_reachable: false,
            offending_fields: Vec::new(),
            issues: vec![issue],
        }
    }
}

/// Validate the output file against the pre-apply extraction and plan.
pub fn validate_output(
    original_fields: &[Field],
    plan: &ModificationPlan,
    out_path: &Path,
    passphrase: Option<&str>,
    large_form_threshold: usize,
) -> Result<IntegrityReport> {
    let doc = match Document::open(out_path, passphrase) {
        Ok(doc) => doc,
        Err(e) => return Ok(IntegrityReport::failure(format!("output unreadable: {}", e))),
    };
    let extraction = match FieldExtractor::new(&doc, large_form_threshold).extract() {
        Ok(extraction) => extraction,
        Err(e) => return Ok(IntegrityReport::failure(format!("re-extraction failed: {}", e))),
    };
    let current: HashMap<&str, &Field> =
        extraction.fields.iter().map(|f| (f.id.as_str(), f)).collect();

    let mut offending: HashSet<String> = HashSet::new();
    let mut issues = Vec::new();

    // (a) id set unchanged
    let before: HashSet<&str> = original_fields.iter().map(|f| f.id.as_str()).collect();
    let after: HashSet<&str> = current.keys().copied().collect();
    let field_ids_unchanged = before == after;
    if !field_ids_unchanged {
        for id in before.symmetric_difference(&after) {
            offending.insert(id.to_string());
        }
        issues.push("field id set changed".to_string());
    }

    // (b) planned names in place
    let mut names_match_plan = true;
    for (id, expected) in &plan.expected_names {
        if let Some(field) = current.get(id.as_str()) {
            if &field.name != expected {
                names_match_plan = false;
                offending.insert(id.clone());
                issues.push(format!("{}: expected name '{}', found '{}'", id, expected, field.name));
            }
        }
    }

    // (c) parent/child edges
    let mut edges_preserved = true;
    for original in original_fields {
        let Some(now) = current.get(original.id.as_str()) else {
            continue;
        };
        if now.parent_id != original.parent_id || now.child_ids != original.child_ids {
            edges_preserved = false;
            offending.insert(original.id.clone());
            issues.push(format!("{}: hierarchy edge changed", original.id));
        }
    }

    // (d) widget rectangles and pages
    let mut geometry_preserved = true;
    for original in original_fields {
        let Some(now) = current.get(original.id.as_str()) else {
            continue;
        };
        if now.rect != original.rect || now.page != original.page {
            geometry_preserved = false;
            offending.insert(original.id.clone());
            issues.push(format!("{}: geometry changed", original.id));
        }
    }

    // (e) the AcroForm root still yields fields
    let acroform_reachable = original_fields.is_empty() || !extraction.fields.is_empty();
    if !acroform_reachable {
        issues.push("AcroForm tree no longer reachable".to_string());
    }

    let status = if field_ids_unchanged && names_match_plan && edges_preserved && acroform_reachable
    {
        if geometry_preserved {
            IntegrityStatus::Safe
        } else {
            IntegrityStatus::Warning
        }
    } else {
        IntegrityStatus::Critical
    };

    let mut offending_fields: Vec<String> = offending.into_iter().collect();
    offending_fields.sort();

    Ok(IntegrityReport {
        status,
        field_ids_unchanged,
        names_match_plan,
        edges_preserved,
        geometry_preserved,
        acroform_reachable,
        offending_fields,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_report_is_critical() {
        let report = IntegrityReport::failure("boom".to_string());
        assert_eq!(report.status, IntegrityStatus::Critical);
        assert!(!report.acroform_reachable);
        assert_eq!(report.issues, vec!["boom".to_string()]);
    }
}
