//! AcroForm field extraction.
//!
//! Walks the field tree under the catalog's `/AcroForm` dictionary
//! (ISO 32000-1:2008, Section 12.7) and flattens it into [`Field`]
//! records covering both logical fields and widget annotations. Radio
//! groups keep their dual shape: one container entry plus one entry per
//! visible widget.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::{Dict, ObjRef, Object};
use std::collections::{HashMap, HashSet};

/// Field flag bits from the `/Ff` word (PDF Tables 221, 226, 228, 230).
pub mod field_flags {
    /// Field is read-only (bit 1)
    pub const READ_ONLY: u32 = 1;
    /// Field is required (bit 2)
    pub const REQUIRED: u32 = 1 << 1;
    /// Text field spans multiple lines (bit 13)
    pub const MULTILINE: u32 = 1 << 12;
    /// Text field hides its input (bit 14)
    pub const PASSWORD: u32 = 1 << 13;
    /// Button is a push button (bit 17)
    pub const PUSH_BUTTON: u32 = 1 << 16;
    /// Button belongs to a radio group (bit 16)
    pub const RADIO: u32 = 1 << 15;
    /// Choice renders as a combo box (bit 18)
    pub const COMBO: u32 = 1 << 17;
}

/// Resolved flag set carried on each flattened field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct FieldFlags {
    /// Field must be filled before export
    pub required: bool,
    /// Field value cannot be changed interactively
    pub readonly: bool,
    /// Multi-line text entry
    pub multiline: bool,
    /// Password-style entry
    pub password: bool,
    /// Radio-group membership
    pub radio: bool,
    /// Push button (no persistent value)
    pub pushbutton: bool,
    /// Combo-box style choice
    pub combo: bool,
}

impl FieldFlags {
    /// Decode the `/Ff` flags word.
    pub fn from_bits(bits: u32) -> Self {
        Self {
            required: bits & field_flags::REQUIRED != 0,
            readonly: bits & field_flags::READ_ONLY != 0,
            multiline: bits & field_flags::MULTILINE != 0,
            password: bits & field_flags::PASSWORD != 0,
            radio: bits & field_flags::RADIO != 0,
            pushbutton: bits & field_flags::PUSH_BUTTON != 0,
            combo: bits & field_flags::COMBO != 0,
        }
    }
}

/// Kind of a flattened field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Text entry
    Text,
    /// Standalone on/off button
    Checkbox,
    /// Logical radio group container
    RadioGroup,
    /// Visible widget of a radio group
    RadioWidget,
    /// List or combo box
    Choice,
    /// Signature field
    Signature,
    /// Anything unclassifiable (including push buttons)
    Unknown,
}

impl FieldKind {
    /// Lowercase token used in fingerprints, reports and the mapping CSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Checkbox => "checkbox",
            FieldKind::RadioGroup => "radio_group",
            FieldKind::RadioWidget => "radio_widget",
            FieldKind::Choice => "choice",
            FieldKind::Signature => "signature",
            FieldKind::Unknown => "unknown",
        }
    }
}

/// One flattened form field (logical field or widget annotation).
#[derive(Debug, Clone)]
pub struct Field {
    /// Stable internally assigned id (`field_000002`, `field_000002_1`, ...)
    pub id: String,
    /// Fully qualified name as PDF consumers see it
    pub name: String,
    /// Classified kind after inheritance resolution
    pub kind: FieldKind,
    /// One-based page number; `None` for container-only fields
    pub page: Option<u32>,
    /// `[x1, y1, x2, y2]` in user space; `None` for containers
    pub rect: Option<[f64; 4]>,
    /// Current value, stringified
    pub value: Option<String>,
    /// Resolved flags
    pub flags: FieldFlags,
    /// Id of the parent field, if nested
    pub parent_id: Option<String>,
    /// Ids of children, in document order
    pub child_ids: Vec<String>,
    /// Export value for radio/checkbox widgets
    pub export_value: Option<String>,
    /// Back-reference to the object holding this field
    pub object_ref: Option<ObjRef>,
    /// True for nodes that only group children
    pub is_group_container: bool,
    /// Local `/T` title as stored in the object, if any
    pub local_title: Option<String>,
    /// Tooltip from `/TU`
    pub tooltip: Option<String>,
    /// Mapping name from `/TM`
    pub mapping_name: Option<String>,
    /// Maximum text length from `/MaxLen`
    pub max_len: Option<u32>,
    /// Choice options from `/Opt`
    pub options: Vec<String>,
    /// Default appearance string, resolved through the ancestor chain
    pub default_appearance: Option<String>,
}

impl Field {
    /// Width of the field box, zero for containers.
    pub fn width(&self) -> f64 {
        self.rect.map(|r| (r[2] - r[0]).abs()).unwrap_or(0.0)
    }

    /// Height of the field box, zero for containers.
    pub fn height(&self) -> f64 {
        self.rect.map(|r| (r[3] - r[1]).abs()).unwrap_or(0.0)
    }
}

/// Non-fatal findings collected during extraction.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    /// A field node pointed back into the already-visited tree
    CircularField {
        /// Object that closed the cycle
        object: String,
    },
    /// `/Rect` was missing or malformed; zeros were substituted
    BadRect {
        /// Affected field id
        field_id: String,
    },
    /// The form exceeds the configured field-count threshold
    LargeForm {
        /// Number of extracted fields
        count: usize,
    },
    /// A field failed to parse and was omitted
    FieldSkipped {
        /// Id or index of the skipped node
        at: String,
        /// Why it was skipped
        reason: String,
    },
    /// Two fields share the same fully qualified name
    DuplicateName {
        /// The duplicated name
        name: String,
    },
}

/// Result of a full extraction pass.
#[derive(Debug)]
pub struct Extraction {
    /// All flattened fields, containers before their children
    pub fields: Vec<Field>,
    /// Non-fatal findings
    pub warnings: Vec<ExtractionWarning>,
}

impl Extraction {
    /// Summary statistics over the extracted set.
    pub fn statistics(&self) -> FieldStatistics {
        let mut by_kind: HashMap<&'static str, usize> = HashMap::new();
        let mut pages = HashSet::new();
        let mut required = 0usize;
        let mut readonly = 0usize;
        let mut with_value = 0usize;
        for field in &self.fields {
            *by_kind.entry(field.kind.as_str()).or_insert(0) += 1;
            if let Some(page) = field.page {
                pages.insert(page);
            }
            if field.flags.required {
                required += 1;
            }
            if field.flags.readonly {
                readonly += 1;
            }
            if field.value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false) {
                with_value += 1;
            }
        }
        FieldStatistics {
            total: self.fields.len(),
            by_kind: by_kind.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            pages_with_fields: pages.len(),
            required,
            readonly,
            with_value,
        }
    }
}

/// Aggregate counts over an extraction.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldStatistics {
    /// Total flattened fields
    pub total: usize,
    /// Count per kind token
    pub by_kind: HashMap<String, usize>,
    /// Distinct pages carrying at least one field
    pub pages_with_fields: usize,
    /// Required fields
    pub required: usize,
    /// Read-only fields
    pub readonly: usize,
    /// Fields with a non-empty value
    pub with_value: usize,
}

/// Attributes inherited down the field tree (resolved during the walk,
/// never modeled as object inheritance).
#[derive(Debug, Clone, Default)]
struct Inherited {
    field_type: Option<String>,
    flags: Option<u32>,
    value: Option<Object>,
    default_appearance: Option<String>,
}

/// AcroForm tree walker.
pub struct FieldExtractor<'a> {
    doc: &'a Document,
    large_form_threshold: usize,
    widget_pages: HashMap<ObjRef, u32>,
    visited: HashSet<ObjRef>,
    warnings: Vec<ExtractionWarning>,
}

impl<'a> FieldExtractor<'a> {
    /// New extractor over an open document.
    pub fn new(doc: &'a Document, large_form_threshold: usize) -> Self {
        Self {
            doc,
            large_form_threshold,
            widget_pages: HashMap::new(),
            visited: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Extract every logical field and widget annotation.
    pub fn extract(mut self) -> Result<Extraction> {
        let catalog = self.doc.catalog()?;
        let Some(acroform_entry) = catalog.get("AcroForm") else {
            return Ok(Extraction {
                fields: Vec::new(),
                warnings: Vec::new(),
            });
        };
        let acroform = match self.doc.resolve(acroform_entry)? {
            Object::Dictionary(d) => d,
            other => {
                return Err(Error::InvalidObjectType {
                    expected: "AcroForm dictionary".to_string(),
                    found: other.type_name().to_string(),
                })
            },
        };

        let fields_array = match acroform.get("Fields") {
            Some(entry) => match self.doc.resolve(entry)? {
                Object::Array(items) => items,
                other => {
                    return Err(Error::InvalidObjectType {
                        expected: "Fields array".to_string(),
                        found: other.type_name().to_string(),
                    })
                },
            },
            None => Vec::new(),
        };

        if fields_array.is_empty() {
            if acroform.contains_key("XFA") {
                return Err(Error::Unsupported(
                    "form is defined only by an XFA template".to_string(),
                ));
            }
            return Ok(Extraction {
                fields: Vec::new(),
                warnings: Vec::new(),
            });
        }

        // Inheritable defaults declared on the AcroForm dictionary itself
        let defaults = Inherited {
            default_appearance: acroform
                .get("DA")
                .and_then(|o| self.doc.resolve(o).ok())
                .and_then(|o| o.as_text()),
            ..Inherited::default()
        };

        self.index_widget_pages()?;

        let mut fields = Vec::new();
        for (index, entry) in fields_array.iter().enumerate() {
            let id = format!("field_{:06}", index);
            if let Err(e) = self.visit(entry, &id, None, None, &defaults, &mut fields) {
                log::warn!("skipping top-level field {}: {}", index, e);
                self.warnings.push(ExtractionWarning::FieldSkipped {
                    at: id,
                    reason: e.to_string(),
                });
            }
        }

        if fields.len() > self.large_form_threshold {
            log::warn!("large form: {} fields", fields.len());
            self.warnings.push(ExtractionWarning::LargeForm { count: fields.len() });
        }
        self.check_duplicates(&fields);

        Ok(Extraction {
            fields,
            warnings: self.warnings,
        })
    }

    /// Map widget object refs to one-based page numbers via `/Annots`.
    fn index_widget_pages(&mut self) -> Result<()> {
        for (i, page_ref) in self.doc.page_refs()?.iter().enumerate() {
            let page = match self.doc.load(*page_ref)? {
                Object::Dictionary(d) => d,
                _ => continue,
            };
            let Some(annots) = page.get("Annots") else { continue };
            if let Object::Array(items) = self.doc.resolve(annots)? {
                for item in items {
                    if let Some(annot_ref) = item.as_reference() {
                        self.widget_pages.entry(annot_ref).or_insert(i as u32 + 1);
                    }
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &mut self,
        node: &Object,
        id: &str,
        parent_id: Option<&str>,
        parent_name: Option<&str>,
        inherited: &Inherited,
        out: &mut Vec<Field>,
    ) -> Result<()> {
        let object_ref = node.as_reference();
        if let Some(r) = object_ref {
            if !self.visited.insert(r) {
                log::warn!("circular field reference at {}", r);
                self.warnings.push(ExtractionWarning::CircularField {
                    object: r.to_string(),
                });
                return Ok(());
            }
        }

        let dict = match self.doc.resolve(node)? {
            Object::Dictionary(d) => d,
            other => {
                self.warnings.push(ExtractionWarning::FieldSkipped {
                    at: id.to_string(),
                    reason: format!("field node is {}", other.type_name()),
                });
                return Ok(());
            },
        };

        // Resolve inheritance: the nearest ancestor supplying an attribute
        // wins, and this node may supply it for its own children
        let own = Inherited {
            field_type: dict.get("FT").and_then(|o| self.doc.resolve(o).ok()).and_then(|o| o.as_name().map(str::to_string)),
            flags: dict
                .get("Ff")
                .and_then(|o| self.doc.resolve(o).ok())
                .and_then(|o| o.as_integer())
                .map(|v| v as u32),
            value: dict.get("V").map(|o| self.doc.resolve(o)).transpose()?,
            default_appearance: dict
                .get("DA")
                .and_then(|o| self.doc.resolve(o).ok())
                .and_then(|o| o.as_text()),
        };
        let resolved = Inherited {
            field_type: own.field_type.clone().or_else(|| inherited.field_type.clone()),
            flags: own.flags.or(inherited.flags),
            value: own.value.clone().or_else(|| inherited.value.clone()),
            default_appearance: own
                .default_appearance
                .clone()
                .or_else(|| inherited.default_appearance.clone()),
        };

        let flags = FieldFlags::from_bits(resolved.flags.unwrap_or(0));
        let local_title = dict
            .get("T")
            .and_then(|o| self.doc.resolve(o).ok())
            .and_then(|o| o.as_text());

        let kids: Vec<Object> = match dict.get("Kids") {
            Some(entry) => match self.doc.resolve(entry)? {
                Object::Array(items) => items,
                _ => Vec::new(),
            },
            None => Vec::new(),
        };
        let has_widget_kids = self.kids_have_widgets(&kids);

        let kind = classify(
            &resolved,
            &flags,
            &dict,
            !kids.is_empty() && has_widget_kids,
            parent_name.is_some(),
        );
        let export_value = extract_export_value(&dict);

        // Fully qualified name (invariant: parent.name + "." + local title)
        let name = qualified_name(parent_name, local_title.as_deref(), export_value.as_deref(), kind);

        if !kids.is_empty() {
            // Container entry first, then the children
            let container_index = out.len();
            out.push(self.build_field(
                id,
                name.clone(),
                kind,
                None,
                None,
                &dict,
                &resolved,
                flags,
                parent_id,
                Vec::new(),
                export_value.clone(),
                object_ref,
                true,
                local_title.clone(),
            ));

            let mut child_ids = Vec::new();
            for (child_index, kid) in kids.iter().enumerate() {
                let child_id = format!("{}_{}", id, child_index);
                let child_inherited = Inherited {
                    // Radio kids inherit the group kind through the flags
                    field_type: resolved.field_type.clone(),
                    flags: resolved.flags,
                    value: resolved.value.clone(),
                    default_appearance: resolved.default_appearance.clone(),
                };
                let emitted_before = out.len();
                match self.visit(kid, &child_id, Some(id), Some(&name), &child_inherited, out) {
                    Ok(()) => {
                        // Cycles and skipped nodes emit nothing; only real
                        // children become edges
                        if out.len() > emitted_before {
                            child_ids.push(child_id);
                        }
                    },
                    Err(e) => {
                        log::warn!("skipping child {} of {}: {}", child_index, id, e);
                        self.warnings.push(ExtractionWarning::FieldSkipped {
                            at: child_id,
                            reason: e.to_string(),
                        });
                    },
                }
            }
            out[container_index].child_ids = child_ids;
            return Ok(());
        }

        // Leaf: terminal field or widget annotation
        let (rect, page) = self.leaf_geometry(id, &dict, object_ref);
        out.push(self.build_field(
            id,
            name,
            kind,
            page,
            Some(rect),
            &dict,
            &resolved,
            flags,
            parent_id,
            Vec::new(),
            export_value,
            object_ref,
            false,
            local_title,
        ));
        Ok(())
    }

    /// Do any of these kids carry widget annotations (a `/Rect` or an
    /// explicit widget subtype)?
    fn kids_have_widgets(&self, kids: &[Object]) -> bool {
        kids.iter().any(|kid| {
            self.doc
                .resolve(kid)
                .ok()
                .and_then(|o| match o {
                    Object::Dictionary(d) => Some(
                        d.contains_key("Rect")
                            || d.get("Subtype").and_then(|s| s.as_name().map(|n| n == "Widget")).unwrap_or(false),
                    ),
                    _ => None,
                })
                .unwrap_or(false)
        })
    }

    fn leaf_geometry(&mut self, id: &str, dict: &Dict, object_ref: Option<ObjRef>) -> ([f64; 4], Option<u32>) {
        let rect = dict
            .get("Rect")
            .and_then(|o| self.doc.resolve(o).ok())
            .and_then(|o| {
                let items = o.as_array()?;
                if items.len() != 4 {
                    return None;
                }
                let mut coords = [0.0f64; 4];
                for (i, item) in items.iter().enumerate() {
                    coords[i] = item.as_number()?;
                }
                Some(coords)
            });
        let rect = match rect {
            Some(r) => r,
            None => {
                self.warnings.push(ExtractionWarning::BadRect {
                    field_id: id.to_string(),
                });
                [0.0; 4]
            },
        };

        let page = dict
            .get("P")
            .and_then(Object::as_reference)
            .and_then(|p| self.doc.page_number_of(p).ok().flatten())
            .or_else(|| object_ref.and_then(|r| self.widget_pages.get(&r).copied()))
            .or(Some(1));
        (rect, page)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_field(
        &self,
        id: &str,
        name: String,
        kind: FieldKind,
        page: Option<u32>,
        rect: Option<[f64; 4]>,
        dict: &Dict,
        resolved: &Inherited,
        flags: FieldFlags,
        parent_id: Option<&str>,
        child_ids: Vec<String>,
        export_value: Option<String>,
        object_ref: Option<ObjRef>,
        is_group_container: bool,
        local_title: Option<String>,
    ) -> Field {
        let value = resolved.value.as_ref().and_then(stringify_value);
        let tooltip = dict
            .get("TU")
            .and_then(|o| self.doc.resolve(o).ok())
            .and_then(|o| o.as_text());
        let mapping_name = dict
            .get("TM")
            .and_then(|o| self.doc.resolve(o).ok())
            .and_then(|o| o.as_text());
        let max_len = dict
            .get("MaxLen")
            .and_then(|o| self.doc.resolve(o).ok())
            .and_then(|o| o.as_integer())
            .map(|v| v.max(0) as u32);
        let options = dict
            .get("Opt")
            .and_then(|o| self.doc.resolve(o).ok())
            .and_then(|o| o.as_array().map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Object::String(_) => item.as_text(),
                        Object::Name(n) => Some(n.clone()),
                        Object::Array(pair) => pair.get(1).or_else(|| pair.first()).and_then(Object::as_text),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
            }))
            .unwrap_or_default();

        Field {
            id: id.to_string(),
            name,
            kind,
            page,
            rect,
            value,
            flags,
            parent_id: parent_id.map(str::to_string),
            child_ids,
            export_value,
            object_ref,
            is_group_container,
            local_title,
            tooltip,
            mapping_name,
            max_len,
            options,
            default_appearance: resolved.default_appearance.clone(),
        }
    }

    fn check_duplicates(&mut self, fields: &[Field]) {
        let mut seen = HashSet::new();
        for field in fields {
            if !field.name.is_empty() && !seen.insert(field.name.as_str()) {
                self.warnings.push(ExtractionWarning::DuplicateName {
                    name: field.name.clone(),
                });
            }
        }
    }
}

/// Classify a node from its resolved field type and flags.
fn classify(
    resolved: &Inherited,
    flags: &FieldFlags,
    dict: &Dict,
    has_widget_kids: bool,
    has_parent: bool,
) -> FieldKind {
    match resolved.field_type.as_deref() {
        Some("Tx") => FieldKind::Text,
        Some("Ch") => FieldKind::Choice,
        Some("Sig") => FieldKind::Signature,
        Some("Btn") => {
            if flags.pushbutton {
                FieldKind::Unknown
            } else if flags.radio {
                if has_widget_kids {
                    FieldKind::RadioGroup
                } else if has_parent {
                    FieldKind::RadioWidget
                } else {
                    FieldKind::Checkbox
                }
            } else {
                FieldKind::Checkbox
            }
        },
        Some(_) => FieldKind::Unknown,
        None => {
            // Widget annotation without its own /FT: appearance states with
            // an off-state mark a selectable widget
            let is_widget = dict
                .get("Subtype")
                .and_then(Object::as_name)
                .map(|n| n == "Widget")
                .unwrap_or(false);
            if is_widget && has_parent {
                FieldKind::RadioWidget
            } else {
                FieldKind::Unknown
            }
        },
    }
}

/// Export value from the appearance state or the normal appearance map.
fn extract_export_value(dict: &Dict) -> Option<String> {
    const OFF_STATES: [&str; 2] = ["Off", "No"];

    if let Some(state) = dict.get("AS").and_then(Object::as_name) {
        if !OFF_STATES.contains(&state) {
            return Some(state.to_string());
        }
    }
    let normal = dict
        .get("AP")
        .and_then(Object::as_dict)
        .and_then(|ap| ap.get("N"))
        .and_then(Object::as_dict)?;
    let mut keys: Vec<&String> = normal
        .keys()
        .filter(|k| !OFF_STATES.contains(&k.as_str()))
        .collect();
    keys.sort();
    keys.first().map(|k| k.to_string())
}

/// Build the fully qualified field name (invariant I4).
fn qualified_name(
    parent_name: Option<&str>,
    local_title: Option<&str>,
    export_value: Option<&str>,
    kind: FieldKind,
) -> String {
    match (parent_name, local_title) {
        (None, Some(title)) => title.to_string(),
        (Some(parent), Some(title)) if !title.is_empty() => format!("{}.{}", parent, title),
        (Some(parent), _) => {
            // Radio widgets take their name from the export value
            if kind == FieldKind::RadioWidget {
                match export_value {
                    Some(export) => format!("{}__{}", parent, export),
                    None => parent.to_string(),
                }
            } else {
                parent.to_string()
            }
        },
        (None, None) => String::new(),
    }
}

fn stringify_value(value: &Object) -> Option<String> {
    match value {
        Object::String(_) => value.as_text(),
        Object::Name(n) => Some(n.clone()),
        Object::Boolean(b) => Some(b.to_string()),
        Object::Integer(i) => Some(i.to_string()),
        Object::Real(r) => Some(r.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_from_bits() {
        let flags = FieldFlags::from_bits(field_flags::REQUIRED | field_flags::RADIO);
        assert!(flags.required);
        assert!(flags.radio);
        assert!(!flags.readonly);
        assert!(!flags.pushbutton);
    }

    #[test]
    fn test_kind_tokens() {
        assert_eq!(FieldKind::RadioGroup.as_str(), "radio_group");
        assert_eq!(FieldKind::Text.as_str(), "text");
    }

    #[test]
    fn test_qualified_name_shapes() {
        assert_eq!(qualified_name(None, Some("form1"), None, FieldKind::Text), "form1");
        assert_eq!(
            qualified_name(Some("form1"), Some("owner"), None, FieldKind::Text),
            "form1.owner"
        );
        assert_eq!(
            qualified_name(Some("txn"), None, Some("one-time"), FieldKind::RadioWidget),
            "txn__one-time"
        );
        assert_eq!(qualified_name(Some("txn"), None, None, FieldKind::RadioWidget), "txn");
    }

    #[test]
    fn test_export_value_from_as() {
        let mut dict = Dict::new();
        dict.insert("AS".to_string(), Object::name("recurring"));
        assert_eq!(extract_export_value(&dict).as_deref(), Some("recurring"));

        dict.insert("AS".to_string(), Object::name("Off"));
        assert_eq!(extract_export_value(&dict), None);
    }

    #[test]
    fn test_export_value_from_appearance_map() {
        let mut normal = Dict::new();
        normal.insert("Off".to_string(), Object::Null);
        normal.insert("rmd".to_string(), Object::Null);
        let mut ap = Dict::new();
        ap.insert("N".to_string(), Object::Dictionary(normal));
        let mut dict = Dict::new();
        dict.insert("AP".to_string(), Object::Dictionary(ap));
        dict.insert("AS".to_string(), Object::name("Off"));
        assert_eq!(extract_export_value(&dict).as_deref(), Some("rmd"));
    }

    #[test]
    fn test_classify_radio_variants() {
        let resolved = Inherited {
            field_type: Some("Btn".to_string()),
            ..Inherited::default()
        };
        let radio = FieldFlags::from_bits(field_flags::RADIO);
        let dict = Dict::new();
        assert_eq!(classify(&resolved, &radio, &dict, true, false), FieldKind::RadioGroup);
        assert_eq!(classify(&resolved, &radio, &dict, false, true), FieldKind::RadioWidget);
        assert_eq!(
            classify(&resolved, &FieldFlags::default(), &dict, false, false),
            FieldKind::Checkbox
        );
        let push = FieldFlags::from_bits(field_flags::PUSH_BUTTON);
        assert_eq!(classify(&resolved, &push, &dict, false, false), FieldKind::Unknown);
    }
}
