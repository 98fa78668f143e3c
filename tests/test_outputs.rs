//! Tests for the emitted artifacts: the mapping CSV schema and the JSON
//! processing report.

mod common;

use acroname::api;
use acroname::config::Options;
use acroname::output::MAPPING_COLUMNS;
use acroname::training::TrainingStore;
use common::FormPdf;

const EXPECTED_HEADER: &str = "ID,Created at,Updated at,Label,Description,Form ID,Order,\
Api name,UUID,Type,Parent ID,Delete Parent ID,Acrofieldlabel,Section ID,Excluded,\
Partial label,Custom,Show group label,Height,Page,Width,X,Y,Unified field ID,Delete,\
Hidden,Toggle description";

fn run_process(bytes: Vec<u8>) -> (tempfile::TempDir, api::ApplyResult) {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("form.pdf");
    std::fs::write(&source, bytes).unwrap();
    let store = TrainingStore::load(Vec::new()).unwrap();
    let result = api::process(&source, None, &store, None, &Options::default()).unwrap();
    (dir, result)
}

#[test]
fn test_mapping_csv_schema() {
    let bytes = FormPdf::new()
        .label("Name:", 40, 705)
        .text_field_with_tooltip("FIRST_NAME", [100, 700, 250, 720], "Legal first name")
        .radio_group("choices", &[("a", [100, 500, 115, 515])])
        .build();
    let (_dir, result) = run_process(bytes);

    let raw = std::fs::read(&result.mapping_path).unwrap();
    // UTF-8 BOM, LF newlines only
    assert_eq!(&raw[..3], [0xEF, 0xBB, 0xBF]);
    assert!(!raw.contains(&b'\r'));

    let text = String::from_utf8(raw[3..].to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), EXPECTED_HEADER);
    assert_eq!(EXPECTED_HEADER.split(',').count(), MAPPING_COLUMNS.len());

    // One row per field: text field + radio container + one widget
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 3);

    // First row: the text field
    let cells: Vec<&str> = rows[0].split(',').collect();
    assert_eq!(cells[0], "1");
    assert_eq!(cells[3], "Name");
    assert_eq!(cells[4], "Legal first name");
    assert_eq!(cells[7], "first_name");
    assert_eq!(cells[9], "text");
    assert_eq!(cells[12], "FIRST_NAME");
    assert_eq!(cells[14], "FALSE");
    assert_eq!(cells[19], "1");
    assert_eq!(cells[21], "100");
    assert_eq!(cells[22], "700");
    assert_eq!(cells[24], "FALSE");
    assert_eq!(cells[25], "FALSE");

    // Timestamps are ISO-8601 UTC
    assert!(cells[1].ends_with('Z'), "timestamp: {}", cells[1]);
    assert_eq!(cells[1], cells[2]);

    // Radio container row: group label shown, no geometry page
    let container: Vec<&str> = rows[1].split(',').collect();
    assert_eq!(container[9], "radio_group");
    assert_eq!(container[17], "TRUE");

    // Widget row points at the container row id
    let widget: Vec<&str> = rows[2].split(',').collect();
    assert_eq!(widget[9], "radio_widget");
    assert_eq!(widget[10], "2");
}

#[test]
fn test_mapping_csv_quotes_commas() {
    let bytes = FormPdf::new()
        .label("City; State; and ZIP:", 40, 705)
        .text_field_with_tooltip("addr", [100, 700, 250, 720], "Street, city, state")
        .build();
    let (_dir, result) = run_process(bytes);
    let text = String::from_utf8(std::fs::read(&result.mapping_path).unwrap()[3..].to_vec()).unwrap();
    assert!(text.contains("\"Street, city, state\""));
}

#[test]
fn test_report_structure() {
    let bytes = FormPdf::new()
        .label("Email:", 40, 705)
        .text_field("EMAIL", [100, 700, 250, 720])
        .build();
    let (_dir, result) = run_process(bytes);

    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&result.report_path).unwrap()).unwrap();

    assert_eq!(report["document"]["field_count"], 1);
    assert_eq!(report["document"]["page_count"], 1);
    assert_eq!(report["document"]["encrypted"], false);

    let fields = report["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    let field = &fields[0];
    assert_eq!(field["original_name"], "EMAIL");
    assert_eq!(field["decision"]["new_name"], "email");
    assert_eq!(field["decision"]["action"], "improve");
    assert!(field["decision"]["confidence"].as_f64().unwrap() >= 0.6);
    assert_eq!(field["context"]["label"], "Email");
    assert_eq!(field["modification"]["status"], "applied");
    assert_eq!(field["modification"]["expected_name"], "email");

    assert!(report["safety_score"].as_f64().unwrap() >= 0.5);
    assert!(report["warnings"].is_array());
}

#[test]
fn test_artifacts_live_next_to_input() {
    let bytes = FormPdf::new().text_field("a", [0, 0, 10, 10]).build();
    let (dir, result) = run_process(bytes);
    assert_eq!(result.modified_path, dir.path().join("form_parsed.pdf"));
    assert_eq!(result.mapping_path, dir.path().join("form_mapping.csv"));
    assert_eq!(result.report_path, dir.path().join("form_report.json"));
    assert!(dir.path().join("form_backup.pdf").exists());
    assert!(dir.path().join("form_backup.json").exists());
}

#[test]
fn test_artifacts_in_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let source = dir.path().join("form.pdf");
    std::fs::write(&source, FormPdf::new().text_field("a", [0, 0, 10, 10]).build()).unwrap();

    let store = TrainingStore::load(Vec::new()).unwrap();
    let result = api::process(&source, None, &store, Some(&out), &Options::default()).unwrap();
    assert_eq!(result.modified_path, out.join("form_parsed.pdf"));
    assert!(out.join("form_backup.pdf").exists());
    assert!(out.join("form_mapping.csv").exists());
}
