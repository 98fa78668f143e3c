//! Rule-based name generation.
//!
//! The fixed fallback table used when training evidence is too thin:
//! semantic keyword rules over the label and nearby text, keyed by field
//! kind. Kept deliberately small; the interesting names come from
//! training.

use crate::extract::{Field, FieldContext, FieldKind};
use crate::naming::grammar::{sanitize_token, BemName};

/// Keyword rules for text fields, first hit wins.
const TEXT_RULES: [(&str, &str); 8] = [
    ("name", "owner-information_name"),
    ("address", "owner-information_address"),
    ("phone", "contact_phone-number"),
    ("email", "contact_email"),
    ("ssn", "identification_ssn"),
    ("amount", "payment_amount"),
    ("city", "contact_address__city"),
    ("state", "contact_address__state"),
];

/// Words that mark a checkbox as an agreement acknowledgment.
const AGREEMENT_WORDS: [&str; 5] = ["agree", "consent", "accept", "acknowledge", "authorize"];

/// Apply the semantic rule table. Returns a grammar-valid name or `None`.
pub fn rule_based_name(field: &Field, context: &FieldContext) -> Option<String> {
    let haystack = format!(
        "{} {} {}",
        context.label,
        context.nearby_text.join(" "),
        context.section_header
    )
    .to_lowercase();

    let candidate = match field.kind {
        FieldKind::Signature => Some("signatures_owner".to_string()),
        FieldKind::RadioGroup => {
            let topic = [context.label.as_str(), context.section_header.as_str(), field.name.as_str()]
                .iter()
                .map(|s| sanitize_token(s))
                .find(|t| !t.is_empty())
                .unwrap_or_else(|| "choice".to_string());
            Some(format!("selection_{}", topic))
        },
        FieldKind::Checkbox => {
            if AGREEMENT_WORDS.iter().any(|w| haystack.contains(w)) {
                Some("acknowledgment_agreement".to_string())
            } else {
                None
            }
        },
        FieldKind::Text => {
            if haystack.contains("date") {
                Some("general_date".to_string())
            } else {
                TEXT_RULES
                    .iter()
                    .find(|(keyword, _)| haystack.contains(keyword))
                    .map(|(_, name)| name.to_string())
            }
        },
        _ => None,
    };

    candidate.filter(|name| BemName::is_valid(name))
}
