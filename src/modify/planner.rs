//! Modification planning.
//!
//! Translates name decisions into an ordered, conflict-checked list of
//! object-graph edits. The plan is purely descriptive; nothing is mutated
//! until the safe modifier applies it.

use crate::config::Options;
use crate::document::Document;
use crate::error::Result;
use crate::extract::{Field, FieldKind};
use crate::naming::{sanitize_token, NameDecision};
use crate::object::{ObjRef, Object};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A reference elsewhere in the document that mentions a renamed field by
/// its fully qualified name and must be rewritten with it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DependentRef {
    /// Object holding the reference
    pub object_ref: ObjRef,
    /// Dictionary entry holding the text (`JS`)
    pub entry: String,
    /// Text before rewriting
    pub old_text: String,
    /// Text after rewriting
    pub new_text: String,
}

/// One planned edit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldEdit {
    /// Field this edit renames
    pub field_id: String,
    /// Object whose `/T` entry is rewritten, if the name is stored
    pub object_ref: Option<ObjRef>,
    /// Fully qualified name before the rename
    pub old_name: String,
    /// Fully qualified name the field will carry afterwards
    pub new_name: String,
    /// New local title to write into `/T`; `None` when the name is
    /// derived (radio widgets)
    pub new_local_title: Option<String>,
    /// Dependent references rewritten together with this edit
    pub dependent_refs: Vec<DependentRef>,
}

/// The ordered plan with its conflict report and safety score.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModificationPlan {
    /// Edits in application order (parents before children)
    pub edits: Vec<FieldEdit>,
    /// Detected issues that do not block application
    pub conflicts: Vec<String>,
    /// Issues that forbid application
    pub blockers: Vec<String>,
    /// Pre-application risk summary in `[0, 1]`
    pub safety_score: f64,
    /// Post-apply fully qualified name expected for every field id
    pub expected_names: HashMap<String, String>,
}

impl ModificationPlan {
    /// True when nothing would change.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Stable digest over the edit list, recorded in the backup.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for edit in &self.edits {
            hasher.update(edit.field_id.as_bytes());
            hasher.update(b"\x1f");
            hasher.update(edit.old_name.as_bytes());
            hasher.update(b"\x1f");
            hasher.update(edit.new_name.as_bytes());
            hasher.update(b"\x1e");
        }
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Build a plan from the decision set.
pub fn plan_modifications(
    doc: &Document,
    fields: &[Field],
    decisions: &[NameDecision],
    options: &Options,
) -> Result<ModificationPlan> {
    let field_of: HashMap<&str, &Field> = fields.iter().map(|f| (f.id.as_str(), f)).collect();
    let decision_of: HashMap<&str, &NameDecision> =
        decisions.iter().map(|d| (d.field_id.as_str(), d)).collect();

    // Expected post-apply fully qualified names, parents resolved first
    let mut expected: HashMap<String, String> = HashMap::new();
    let mut titles: HashMap<String, Option<String>> = HashMap::new();
    for field in fields {
        resolve_expected(field, &field_of, &decision_of, &mut expected, &mut titles);
    }

    // Edits: objects whose stored local title changes
    let mut edits = Vec::new();
    for field in fields {
        let Some(old_title) = field.local_title.as_deref() else {
            continue;
        };
        let new_title = titles.get(&field.id).cloned().flatten();
        let Some(new_title) = new_title else { continue };
        if new_title == old_title {
            continue;
        }
        edits.push(FieldEdit {
            field_id: field.id.clone(),
            object_ref: field.object_ref,
            old_name: field.name.clone(),
            new_name: expected.get(&field.id).cloned().unwrap_or_default(),
            new_local_title: Some(new_title),
            dependent_refs: Vec::new(),
        });
    }

    // Parents are renamed before their children
    let depth_of = |id: &str| -> usize {
        let mut depth = 0;
        let mut current = field_of.get(id).and_then(|f| f.parent_id.as_deref());
        while let Some(parent) = current {
            depth += 1;
            current = field_of.get(parent).and_then(|f| f.parent_id.as_deref());
        }
        depth
    };
    edits.sort_by(|a, b| {
        depth_of(&a.field_id)
            .cmp(&depth_of(&b.field_id))
            .then_with(|| a.field_id.cmp(&b.field_id))
    });

    let mut conflicts = Vec::new();
    let mut blockers = Vec::new();

    // Sibling collisions: new local titles must stay distinct per parent
    let mut siblings: HashMap<Option<&str>, HashMap<&str, &str>> = HashMap::new();
    for field in fields {
        let Some(title) = titles.get(&field.id).and_then(|t| t.as_deref()).or(field.local_title.as_deref())
        else {
            continue;
        };
        let scope = siblings.entry(field.parent_id.as_deref()).or_default();
        if let Some(other) = scope.insert(title, field.id.as_str()) {
            let message = format!(
                "sibling title collision: '{}' used by {} and {}",
                title, other, field.id
            );
            conflicts.push(message.clone());
            blockers.push(message);
        }
    }

    // Duplicate expected names are a conflict even across subtrees
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (id, name) in &expected {
        if name.is_empty() {
            continue;
        }
        if let Some(other) = seen.insert(name.as_str(), id.as_str()) {
            conflicts.push(format!("fields {} and {} both map to '{}'", other, id, name));
        }
    }

    // Dependent references in JavaScript action strings
    if !edits.is_empty() {
        let renames: Vec<(String, String)> = edits
            .iter()
            .filter(|e| !e.old_name.is_empty() && e.old_name != e.new_name)
            .map(|e| (e.old_name.clone(), e.new_name.clone()))
            .collect();
        let dependents = scan_dependent_refs(doc, &renames, &mut blockers);
        for edit in &mut edits {
            if let Some(refs) = dependents.get(&edit.old_name) {
                edit.dependent_refs = refs.clone();
            }
        }
    }

    let safety_score = safety_score(&edits, &blockers, fields, &field_of);
    let _ = options;

    Ok(ModificationPlan {
        edits,
        conflicts,
        blockers,
        safety_score,
        expected_names: expected,
    })
}

/// Compute the fully qualified name a field will carry after the plan is
/// applied, together with the local title to store.
fn resolve_expected(
    field: &Field,
    field_of: &HashMap<&str, &Field>,
    decision_of: &HashMap<&str, &NameDecision>,
    expected: &mut HashMap<String, String>,
    titles: &mut HashMap<String, Option<String>>,
) -> String {
    if let Some(done) = expected.get(&field.id) {
        return done.clone();
    }

    let parent_expected = field
        .parent_id
        .as_deref()
        .and_then(|p| field_of.get(p))
        .map(|parent| resolve_expected(parent, field_of, decision_of, expected, titles));

    let decision = decision_of.get(field.id.as_str());
    let (name, title) = match (&parent_expected, field.local_title.as_deref()) {
        (None, _) => {
            // Top level: the decision is the name and the title
            let name = decision
                .map(|d| d.new_name.clone())
                .unwrap_or_else(|| field.name.clone());
            (name.clone(), Some(name))
        },
        (Some(parent), Some(_)) => {
            // Titled child: the decision's name becomes the local title,
            // stripped of the parent prefix when it already carries it
            let decided = decision
                .map(|d| d.new_name.clone())
                .unwrap_or_else(|| field.local_title.clone().unwrap_or_default());
            let local = decided
                .strip_prefix(&format!("{}.", parent))
                .map(str::to_string)
                .unwrap_or(decided);
            (format!("{}.{}", parent, local), Some(local))
        },
        (Some(parent), None) => {
            // Untitled child: radio widgets derive from the export value,
            // other widgets share the parent's name
            if field.kind == FieldKind::RadioWidget {
                match field.export_value.as_deref() {
                    Some(export) => {
                        let tail = {
                            let t = sanitize_token(export);
                            if t.is_empty() {
                                export.to_string()
                            } else {
                                t
                            }
                        };
                        (format!("{}__{}", parent, tail), None)
                    },
                    None => (parent.clone(), None),
                }
            } else {
                (parent.clone(), None)
            }
        },
    };

    expected.insert(field.id.clone(), name.clone());
    titles.insert(field.id.clone(), title);
    name
}

/// Find `JS` action strings that reference renamed fields. Exact quoted
/// occurrences are rewritten; anything else blocks the plan.
fn scan_dependent_refs(
    doc: &Document,
    renames: &[(String, String)],
    blockers: &mut Vec<String>,
) -> HashMap<String, Vec<DependentRef>> {
    let mut out: HashMap<String, Vec<DependentRef>> = HashMap::new();
    if renames.is_empty() {
        return out;
    }

    for number in doc.object_numbers() {
        let obj_ref = ObjRef::new(number, 0);
        let Ok(object) = doc.load(obj_ref) else { continue };
        collect_js(&object, obj_ref, renames, &mut out, blockers);
    }
    out
}

fn collect_js(
    object: &Object,
    obj_ref: ObjRef,
    renames: &[(String, String)],
    out: &mut HashMap<String, Vec<DependentRef>>,
    blockers: &mut Vec<String>,
) {
    match object {
        Object::Dictionary(dict) | Object::Stream { dict, .. } => {
            for (key, value) in dict {
                if key == "JS" {
                    if let Some(script) = value.as_text() {
                        inspect_script(&script, obj_ref, renames, out, blockers);
                    }
                } else {
                    collect_js(value, obj_ref, renames, out, blockers);
                }
            }
        },
        Object::Array(items) => {
            for item in items {
                collect_js(item, obj_ref, renames, out, blockers);
            }
        },
        _ => {},
    }
}

fn inspect_script(
    script: &str,
    obj_ref: ObjRef,
    renames: &[(String, String)],
    out: &mut HashMap<String, Vec<DependentRef>>,
    blockers: &mut Vec<String>,
) {
    for (old, new) in renames {
        if !script.contains(old.as_str()) {
            continue;
        }
        let single = format!("'{}'", old);
        let double = format!("\"{}\"", old);
        let quoted_occurrences =
            script.matches(&single).count() + script.matches(&double).count();
        let total_occurrences = script.matches(old.as_str()).count();

        if quoted_occurrences == total_occurrences && quoted_occurrences > 0 {
            let rewritten = script
                .replace(&single, &format!("'{}'", new))
                .replace(&double, &format!("\"{}\"", new));
            out.entry(old.clone()).or_default().push(DependentRef {
                object_ref: obj_ref,
                entry: "JS".to_string(),
                old_text: script.to_string(),
                new_text: rewritten,
            });
        } else {
            blockers.push(format!(
                "JavaScript action in {} references '{}' outside a quoted string",
                obj_ref, old
            ));
        }
    }
}

/// `1 - blockers/edits`, penalized for oversized plans and widget export
/// tails the transliteration changed.
fn safety_score(
    edits: &[FieldEdit],
    blockers: &[String],
    fields: &[Field],
    field_of: &HashMap<&str, &Field>,
) -> f64 {
    if edits.is_empty() && blockers.is_empty() {
        return 1.0;
    }
    let mut score = 1.0 - blockers.len() as f64 / edits.len().max(1) as f64;
    if edits.len() > 500 {
        score -= 0.1;
    }

    let export_changes = fields
        .iter()
        .filter(|f| {
            f.kind == FieldKind::RadioWidget
                && f.parent_id.as_deref().and_then(|p| field_of.get(p)).is_some()
                && f.export_value
                    .as_deref()
                    .map(|e| sanitize_token(e) != e)
                    .unwrap_or(false)
        })
        .count();
    score -= (export_changes as f64 * 0.02).min(0.2);

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldFlags;
    use crate::naming::{DecisionSource, NameAction};

    fn field(id: &str, name: &str, title: Option<&str>, parent: Option<&str>) -> Field {
        Field {
            id: id.to_string(),
            name: name.to_string(),
            kind: FieldKind::Text,
            page: Some(1),
            rect: Some([0.0, 0.0, 10.0, 10.0]),
            value: None,
            flags: FieldFlags::default(),
            parent_id: parent.map(str::to_string),
            child_ids: Vec::new(),
            export_value: None,
            object_ref: Some(ObjRef::new(10, 0)),
            is_group_container: false,
            local_title: title.map(str::to_string),
            tooltip: None,
            mapping_name: None,
            max_len: None,
            options: Vec::new(),
            default_appearance: None,
        }
    }

    fn decision(id: &str, name: &str) -> NameDecision {
        NameDecision {
            field_id: id.to_string(),
            action: NameAction::Restructure,
            new_name: name.to_string(),
            confidence: 0.6,
            source: DecisionSource::Rule,
            rationale: String::new(),
            alternatives: Vec::new(),
        }
    }

    #[test]
    fn test_expected_names_flat() {
        let fields = vec![field("a", "OLD", Some("OLD"), None)];
        let decisions = vec![decision("a", "owner_name")];
        let field_of: HashMap<&str, &Field> = fields.iter().map(|f| (f.id.as_str(), f)).collect();
        let decision_of: HashMap<&str, &NameDecision> =
            decisions.iter().map(|d| (d.field_id.as_str(), d)).collect();
        let mut expected = HashMap::new();
        let mut titles = HashMap::new();
        resolve_expected(&fields[0], &field_of, &decision_of, &mut expected, &mut titles);
        assert_eq!(expected.get("a").map(String::as_str), Some("owner_name"));
        assert_eq!(titles.get("a").cloned().flatten().as_deref(), Some("owner_name"));
    }

    #[test]
    fn test_expected_names_nested() {
        let fields = vec![
            field("p", "form1", Some("form1"), None),
            field("p_0", "form1.first", Some("first"), Some("p")),
        ];
        let decisions = vec![decision("p_0", "first_name")];
        let field_of: HashMap<&str, &Field> = fields.iter().map(|f| (f.id.as_str(), f)).collect();
        let decision_of: HashMap<&str, &NameDecision> =
            decisions.iter().map(|d| (d.field_id.as_str(), d)).collect();
        let mut expected = HashMap::new();
        let mut titles = HashMap::new();
        for f in &fields {
            resolve_expected(f, &field_of, &decision_of, &mut expected, &mut titles);
        }
        assert_eq!(expected.get("p_0").map(String::as_str), Some("form1.first_name"));
        assert_eq!(titles.get("p_0").cloned().flatten().as_deref(), Some("first_name"));
    }

    #[test]
    fn test_digest_is_stable() {
        let plan = ModificationPlan {
            edits: vec![FieldEdit {
                field_id: "a".to_string(),
                object_ref: None,
                old_name: "x".to_string(),
                new_name: "y".to_string(),
                new_local_title: Some("y".to_string()),
                dependent_refs: Vec::new(),
            }],
            conflicts: Vec::new(),
            blockers: Vec::new(),
            safety_score: 1.0,
            expected_names: HashMap::new(),
        };
        assert_eq!(plan.digest(), plan.digest());
        assert_eq!(plan.digest().len(), 64);
    }

    #[test]
    fn test_inspect_script_quoted_rewrites() {
        let mut out = HashMap::new();
        let mut blockers = Vec::new();
        inspect_script(
            "this.getField('OLD_NAME').value",
            ObjRef::new(5, 0),
            &[("OLD_NAME".to_string(), "new_name".to_string())],
            &mut out,
            &mut blockers,
        );
        assert!(blockers.is_empty());
        let refs = out.get("OLD_NAME").unwrap();
        assert_eq!(refs[0].new_text, "this.getField('new_name').value");
    }

    #[test]
    fn test_inspect_script_unquoted_blocks() {
        let mut out = HashMap::new();
        let mut blockers = Vec::new();
        inspect_script(
            "var OLD_NAME = 1;",
            ObjRef::new(5, 0),
            &[("OLD_NAME".to_string(), "new_name".to_string())],
            &mut out,
            &mut blockers,
        );
        assert!(out.is_empty());
        assert_eq!(blockers.len(), 1);
    }

    #[test]
    fn test_safety_score_no_edits() {
        let fields: Vec<Field> = Vec::new();
        let field_of = HashMap::new();
        assert_eq!(safety_score(&[], &[], &fields, &field_of), 1.0);
    }
}
