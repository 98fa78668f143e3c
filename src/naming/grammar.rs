//! The BEM name grammar.
//!
//! Canonical machine names have the shape `block`, `block_element`,
//! `block__modifier` or `block_element__modifier`, where every segment
//! matches `[a-z][a-z0-9]*(-[a-z0-9]+)*`. Total length is capped and a
//! handful of generic tokens are banned as leading block.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

/// Maximum total length of a name.
pub const MAX_NAME_LENGTH: usize = 50;

/// Tokens that may not be used as the leading block.
pub const RESERVED_BLOCKS: [&str; 6] = ["group", "custom", "temp", "field", "form", "pdf"];

lazy_static! {
    static ref BEM_RE: Regex = Regex::new(
        r"^[a-z][a-z0-9]*(-[a-z0-9]+)*(_[a-z][a-z0-9]*(-[a-z0-9]+)*)?(__[a-z][a-z0-9]*(-[a-z0-9]+)*)?$"
    )
    .expect("BEM grammar regex");
    static ref SEGMENT_RE: Regex =
        Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("segment regex");
}

/// A parsed BEM name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BemName {
    /// Leading block segment
    pub block: String,
    /// Optional element segment (after `_`)
    pub element: Option<String>,
    /// Optional modifier segment (after `__`)
    pub modifier: Option<String>,
}

impl BemName {
    /// Parse and validate a name against the grammar.
    pub fn parse(name: &str) -> Result<Self> {
        if name.len() > MAX_NAME_LENGTH {
            return Err(Error::NameGrammar {
                name: name.to_string(),
                reason: format!("longer than {} characters", MAX_NAME_LENGTH),
            });
        }
        if !BEM_RE.is_match(name) {
            return Err(Error::NameGrammar {
                name: name.to_string(),
                reason: "does not match block(_element)?(__modifier)?".to_string(),
            });
        }

        let (base, modifier) = match name.split_once("__") {
            Some((base, modifier)) => (base, Some(modifier.to_string())),
            None => (name, None),
        };
        let (block, element) = match base.split_once('_') {
            Some((block, element)) => (block.to_string(), Some(element.to_string())),
            None => (base.to_string(), None),
        };

        if RESERVED_BLOCKS.contains(&block.as_str()) {
            return Err(Error::NameGrammar {
                name: name.to_string(),
                reason: format!("'{}' is reserved as a leading block", block),
            });
        }

        Ok(Self {
            block,
            element,
            modifier,
        })
    }

    /// Quick check without constructing the parts.
    pub fn is_valid(name: &str) -> bool {
        Self::parse(name).is_ok()
    }

    /// Same name with the modifier replaced.
    pub fn with_modifier(&self, modifier: impl Into<String>) -> Self {
        Self {
            modifier: Some(modifier.into()),
            ..self.clone()
        }
    }

    /// Same name with the element replaced.
    pub fn with_element(&self, element: impl Into<String>) -> Self {
        Self {
            element: Some(element.into()),
            ..self.clone()
        }
    }
}

impl std::fmt::Display for BemName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.block)?;
        if let Some(element) = &self.element {
            write!(f, "_{}", element)?;
        }
        if let Some(modifier) = &self.modifier {
            write!(f, "__{}", modifier)?;
        }
        Ok(())
    }
}

/// Reduce arbitrary text to a grammar-clean segment token.
///
/// Lowercases, maps non-alphanumeric runs to single hyphens, strips
/// leading characters until a letter starts the token. Returns an empty
/// string when nothing usable remains.
pub fn sanitize_token(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.trim().chars() {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(lower);
        } else {
            pending_hyphen = true;
        }
    }
    // A segment must start with a letter
    while out.chars().next().map(|c| !c.is_ascii_alphabetic()).unwrap_or(false) {
        out.remove(0);
        if out.starts_with('-') {
            out.remove(0);
        }
    }
    out
}

/// Repair casing and separator style without changing the name's meaning.
///
/// Handles the common legacy shapes: all-caps (`FIRST_NAME`), double-hyphen
/// element separators (`transaction--group`), spaces, and stray
/// characters. Returns `None` when no grammar-valid reading exists.
pub fn normalize_loose(name: &str) -> Option<String> {
    let lowered = name.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    // Split into up to three segments: prefer explicit __ modifier, then
    // legacy -- separators, then single underscores
    let (block, element, modifier) = if let Some((base, modifier)) = lowered.split_once("__") {
        let (block, element) = split_base(base);
        (block, element, Some(modifier.to_string()))
    } else if lowered.contains("--") {
        let parts: Vec<&str> = lowered.splitn(3, "--").collect();
        match parts.as_slice() {
            [block, element] => (block.to_string(), Some(element.to_string()), None),
            [block, element, modifier] => {
                (block.to_string(), Some(element.to_string()), Some(modifier.to_string()))
            },
            _ => (lowered.clone(), None, None),
        }
    } else {
        let (block, element) = split_base(&lowered);
        (block, element, None)
    };

    let block = sanitize_token(&block);
    if block.is_empty() || RESERVED_BLOCKS.contains(&block.as_str()) {
        return None;
    }
    let element = element.map(|e| sanitize_token(&e)).filter(|e| !e.is_empty());
    let modifier = modifier.map(|m| sanitize_token(&m)).filter(|m| !m.is_empty());

    let mut out = block;
    if let Some(element) = element {
        out.push('_');
        out.push_str(&element);
    }
    if let Some(modifier) = modifier {
        out.push_str("__");
        out.push_str(&modifier);
    }
    if out.len() > MAX_NAME_LENGTH {
        out.truncate(MAX_NAME_LENGTH);
        while out.ends_with('-') || out.ends_with('_') {
            out.pop();
        }
    }
    BemName::is_valid(&out).then_some(out)
}

/// Split `block_element` on the first underscore.
fn split_base(base: &str) -> (String, Option<String>) {
    match base.split_once('_') {
        Some((block, element)) => {
            // Collapse any further underscores in the element into hyphens
            (block.to_string(), Some(element.replace('_', "-")))
        },
        None => (base.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_shapes() {
        assert!(BemName::is_valid("owner-information"));
        assert!(BemName::is_valid("owner-information_name"));
        assert!(BemName::is_valid("owner-information_name__first"));
        assert!(BemName::is_valid("payment_amount__gross"));
        assert!(BemName::is_valid("a1_b2__c3"));
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(!BemName::is_valid(""));
        assert!(!BemName::is_valid("Owner_Name"));
        assert!(!BemName::is_valid("1owner_name"));
        assert!(!BemName::is_valid("owner__name__extra"));
        assert!(!BemName::is_valid("owner_name_extra"));
        assert!(!BemName::is_valid("owner--name"));
        assert!(!BemName::is_valid("-owner"));
    }

    #[test]
    fn test_reserved_blocks() {
        assert!(!BemName::is_valid("form_field"));
        assert!(!BemName::is_valid("group_selection"));
        // Reserved words are fine in later segments
        assert!(BemName::is_valid("selection_group"));
        // And as part of a hyphenated block
        assert!(BemName::is_valid("form-one_field-a"));
    }

    #[test]
    fn test_length_cap() {
        let long = format!("a_{}", "b".repeat(60));
        assert!(!BemName::is_valid(&long));
    }

    #[test]
    fn test_parse_components() {
        let name = BemName::parse("payment_amount__gross").unwrap();
        assert_eq!(name.block, "payment");
        assert_eq!(name.element.as_deref(), Some("amount"));
        assert_eq!(name.modifier.as_deref(), Some("gross"));
        assert_eq!(name.to_string(), "payment_amount__gross");

        let name = BemName::parse("signatures").unwrap();
        assert!(name.element.is_none());
        assert!(name.modifier.is_none());
    }

    #[test]
    fn test_with_modifier() {
        let name = BemName::parse("payment_amount").unwrap();
        assert_eq!(name.with_modifier("net").to_string(), "payment_amount__net");
    }

    #[test]
    fn test_sanitize_token() {
        assert_eq!(sanitize_token("First Name"), "first-name");
        assert_eq!(sanitize_token("  SSN #: "), "ssn");
        assert_eq!(sanitize_token("123abc"), "abc");
        assert_eq!(sanitize_token("one-time"), "one-time");
        assert_eq!(sanitize_token("***"), "");
    }

    #[test]
    fn test_normalize_all_caps() {
        assert_eq!(normalize_loose("FIRST_NAME").as_deref(), Some("first_name"));
        assert_eq!(normalize_loose("SSN").as_deref(), Some("ssn"));
        assert_eq!(normalize_loose("EMAIL").as_deref(), Some("email"));
    }

    #[test]
    fn test_normalize_double_hyphen() {
        assert_eq!(normalize_loose("transaction--group").as_deref(), Some("transaction_group"));
    }

    #[test]
    fn test_normalize_spaces() {
        assert_eq!(normalize_loose("Owner Name_Street Address").as_deref(), Some("owner-name_street-address"));
    }

    #[test]
    fn test_normalize_rejects_reserved() {
        assert_eq!(normalize_loose("FORM_NAME"), None);
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_loose("###"), None);
        assert_eq!(normalize_loose(""), None);
    }
}
