//! Per-field mapping CSV.
//!
//! The column set and order are bit-exact with the historical training
//! schema; downstream tooling ingests this file without adaptation.
//! UTF-8 with BOM, LF line endings, `TRUE`/`FALSE` booleans, ISO-8601
//! UTC timestamps.

use crate::error::Result;
use crate::extract::{Field, FieldContext};
use crate::naming::NameDecision;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::path::Path;

/// Exact column order of the mapping CSV.
pub const MAPPING_COLUMNS: [&str; 27] = [
    "ID",
    "Created at",
    "Updated at",
    "Label",
    "Description",
    "Form ID",
    "Order",
    "Api name",
    "UUID",
    "Type",
    "Parent ID",
    "Delete Parent ID",
    "Acrofieldlabel",
    "Section ID",
    "Excluded",
    "Partial label",
    "Custom",
    "Show group label",
    "Height",
    "Page",
    "Width",
    "X",
    "Y",
    "Unified field ID",
    "Delete",
    "Hidden",
    "Toggle description",
];

/// Write the mapping CSV for a processed document.
pub fn write_mapping_csv(
    path: &Path,
    fields: &[Field],
    contexts: &HashMap<String, FieldContext>,
    decisions: &[NameDecision],
    created_at: DateTime<Utc>,
) -> Result<()> {
    let decision_of: HashMap<&str, &NameDecision> =
        decisions.iter().map(|d| (d.field_id.as_str(), d)).collect();
    let row_of: HashMap<&str, usize> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id.as_str(), i + 1))
        .collect();

    // Section ids are assigned in first-seen order
    let mut section_ids: HashMap<String, usize> = HashMap::new();
    let mut next_section = 1usize;

    let timestamp = created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut out = String::new();
    out.push('\u{feff}');
    out.push_str(&MAPPING_COLUMNS.join(","));
    out.push('\n');

    for (index, field) in fields.iter().enumerate() {
        let row_id = index + 1;
        let context = contexts.get(&field.id);
        let decision = decision_of.get(field.id.as_str());

        let section = context.map(|c| c.section_header.as_str()).unwrap_or("");
        let section_id = if section.is_empty() {
            String::new()
        } else {
            let id = *section_ids.entry(section.to_string()).or_insert_with(|| {
                let id = next_section;
                next_section += 1;
                id
            });
            id.to_string()
        };
        let parent_row = field
            .parent_id
            .as_deref()
            .and_then(|p| row_of.get(p))
            .map(|r| r.to_string())
            .unwrap_or_default();

        let cells: [String; 27] = [
            row_id.to_string(),
            timestamp.clone(),
            timestamp.clone(),
            context.map(|c| c.label.clone()).unwrap_or_default(),
            field.tooltip.clone().unwrap_or_default(),
            String::new(),
            row_id.to_string(),
            decision.map(|d| d.new_name.clone()).unwrap_or_else(|| field.name.clone()),
            uuid::Uuid::new_v4().to_string(),
            field.kind.as_str().to_string(),
            parent_row,
            bool_cell(false),
            field.name.clone(),
            section_id,
            bool_cell(false),
            field.local_title.clone().unwrap_or_default(),
            bool_cell(false),
            bool_cell(field.is_group_container),
            number_cell(field.height()),
            field.page.map(|p| p.to_string()).unwrap_or_default(),
            number_cell(field.width()),
            field.rect.map(|r| number_cell(r[0])).unwrap_or_default(),
            field.rect.map(|r| number_cell(r[1])).unwrap_or_default(),
            String::new(),
            bool_cell(false),
            bool_cell(false),
            bool_cell(false),
        ];

        let row: Vec<String> = cells.iter().map(|c| escape_cell(c)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    std::fs::write(path, out.as_bytes())?;
    log::info!("mapping CSV with {} row(s) written to {}", fields.len(), path.display());
    Ok(())
}

fn bool_cell(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

fn number_cell(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Quote a cell when it contains commas, quotes or newlines.
fn escape_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
