//! Integration tests for the name-decision pipeline over real
//! (synthetic) documents: preservation, normalization, collision
//! resolution, grammar and uniqueness guarantees.

mod common;

use acroname::api;
use acroname::config::Options;
use acroname::naming::{BemName, NameAction};
use acroname::training::{TrainingRecord, TrainingStore};
use common::FormPdf;
use std::collections::HashSet;

fn analyze(bytes: Vec<u8>) -> api::Analysis {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("form.pdf");
    std::fs::write(&path, bytes).unwrap();
    api::analyze(&path, None, &Options::default()).unwrap()
}

#[test]
fn test_preserve_all_when_names_are_good() {
    let bytes = FormPdf::new()
        .text_field("personal-information_first-name", [100, 700, 250, 720])
        .text_field("personal-information_last-name", [100, 660, 250, 680])
        .text_field("sign-here_date", [100, 620, 250, 640])
        .build();
    let analysis = analyze(bytes);

    let store = TrainingStore::load(Vec::new()).unwrap();
    let options = Options::default();
    let (decisions, warnings) = api::decide(&analysis, &store, &options);

    assert!(warnings.is_empty());
    assert_eq!(decisions.len(), 3);
    for decision in &decisions {
        assert_eq!(decision.action, NameAction::Preserve);
        let field = analysis.fields.iter().find(|f| f.id == decision.field_id).unwrap();
        assert_eq!(decision.new_name, field.name);
    }
}

#[test]
fn test_all_caps_names_are_improved() {
    let bytes = FormPdf::new()
        .text_field("FIRST_NAME", [100, 700, 250, 720])
        .text_field("LAST_NAME", [100, 660, 250, 680])
        .text_field("SSN", [100, 620, 250, 640])
        .text_field("EMAIL", [100, 580, 250, 600])
        .build();
    let analysis = analyze(bytes);

    let store = TrainingStore::load(Vec::new()).unwrap();
    let options = Options::default();
    let (decisions, _) = api::decide(&analysis, &store, &options);

    let names: Vec<&str> = decisions.iter().map(|d| d.new_name.as_str()).collect();
    assert_eq!(names, vec!["first_name", "last_name", "ssn", "email"]);
    for decision in &decisions {
        assert_eq!(decision.action, NameAction::Improve);
        assert!(decision.confidence >= 0.6);
        assert!(BemName::is_valid(&decision.new_name));
    }
}

#[test]
fn test_amount_collision_uses_sections() {
    let bytes = FormPdf::new()
        .label("GROSS", 100, 740)
        .label("Amount:", 40, 705)
        .text_field("", [100, 700, 250, 720])
        .label("NET", 100, 640)
        .label("Amount:", 40, 605)
        .text_field("", [100, 600, 250, 620])
        .label("FEES", 100, 540)
        .label("Amount:", 40, 505)
        .text_field("", [100, 500, 250, 520])
        .build();
    let analysis = analyze(bytes);

    let store = TrainingStore::load(Vec::new()).unwrap();
    let options = Options::default();
    let (decisions, _) = api::decide(&analysis, &store, &options);

    let names: HashSet<&str> = decisions.iter().map(|d| d.new_name.as_str()).collect();
    assert_eq!(names.len(), 3, "no duplicates: {:?}", names);
    assert!(names.contains("payment_amount__gross"), "got {:?}", names);
    assert!(names.contains("payment_amount__net"));
    assert!(names.contains("payment_amount__fees"));
    for decision in &decisions {
        assert!(
            decision.rationale.contains("collision"),
            "rationale records resolution: {}",
            decision.rationale
        );
    }
}

#[test]
fn test_radio_widget_prefix_invariant() {
    let bytes = FormPdf::new()
        .radio_group(
            "transaction--group",
            &[
                ("one-time", [100, 500, 115, 515]),
                ("recurring", [100, 480, 115, 495]),
                ("rmd", [100, 460, 115, 475]),
                ("terminate", [100, 440, 115, 455]),
            ],
        )
        .build();
    let analysis = analyze(bytes);
    assert_eq!(analysis.fields.len(), 5);

    let store = TrainingStore::load(Vec::new()).unwrap();
    let options = Options::default();
    let (decisions, _) = api::decide(&analysis, &store, &options);

    let group = &decisions[0];
    assert_eq!(group.new_name, "transaction_group");

    let expected_tails = ["one-time", "recurring", "rmd", "terminate"];
    for (decision, tail) in decisions[1..].iter().zip(expected_tails) {
        assert_eq!(decision.new_name, format!("transaction_group__{}", tail));
        assert!(decision.new_name.starts_with(&format!("{}__", group.new_name)));
    }
}

#[test]
fn test_training_exact_match_wins() {
    let bytes = FormPdf::new()
        .label("Premium Amount:", 40, 705)
        .text_field("", [100, 700, 250, 720])
        .build();
    let analysis = analyze(bytes);
    let field = &analysis.fields[0];
    let context = &analysis.contexts[&field.id];

    // Two supporting records with the same fingerprint as the field
    let record = TrainingRecord {
        label: Some(context.label.clone()),
        section: Some(context.section_header.clone()),
        kind: Some("text".to_string()),
        x: field.rect.map(|r| r[0]),
        y: field.rect.map(|r| r[1]),
        ..TrainingRecord::named("payment_amount__premium")
    };
    let store = TrainingStore::load(vec![record.clone(), record]).unwrap();
    let options = Options::default();
    let (decisions, _) = api::decide(&analysis, &store, &options);

    assert_eq!(decisions[0].new_name, "payment_amount__premium");
    assert!(decisions[0].confidence >= 0.9);
}

#[test]
fn test_grammar_and_uniqueness_hold_globally() {
    let mut form = FormPdf::new()
        .radio_group("choices", &[("a", [0, 0, 10, 10]), ("b", [0, 20, 10, 30])])
        .signature("sig", [0, 40, 100, 80])
        .checkbox("CB ONE", [0, 100, 10, 110], "Yes");
    for i in 0..6 {
        form = form.text_field(&format!("Field {}", i), [0, 200 + i * 20, 100, 215 + i * 20]);
    }
    let analysis = analyze(form.build());

    let store = TrainingStore::load(Vec::new()).unwrap();
    let options = Options::default();
    let (decisions, _) = api::decide(&analysis, &store, &options);

    assert_eq!(decisions.len(), analysis.fields.len());
    let mut seen = HashSet::new();
    for decision in &decisions {
        assert!(
            BemName::is_valid(&decision.new_name),
            "grammar violation: {}",
            decision.new_name
        );
        assert!(decision.new_name.len() <= 50);
        assert!(seen.insert(decision.new_name.clone()), "duplicate: {}", decision.new_name);
    }
}
