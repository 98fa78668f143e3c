//! Name-decision engine.
//!
//! Turns `(Field, FieldContext)` pairs into [`NameDecision`]s. Every field
//! gets a decision; preservation analysis runs first, then the four-stage
//! generation pipeline (exact training match, similarity adaptation,
//! semantic rules, fallback), then validation and uniqueness resolution.
//! Radio groups are decided before their widgets so the group-prefix
//! invariant can be enforced on widget names.

use crate::config::Options;
use crate::extract::{Field, FieldContext, FieldKind};
use crate::naming::grammar::{normalize_loose, sanitize_token, BemName, MAX_NAME_LENGTH};
use crate::naming::rules::rule_based_name;
use crate::training::{Fingerprint, SimilarityQuery, TrainingStore};
use std::collections::{HashMap, HashSet};

/// Bounded retries while resolving validation failures and collisions.
const MAX_RETRIES: usize = 5;
/// Similarity floor below which stage 2 does not adopt a candidate.
const SIMILARITY_FLOOR: f64 = 0.2;
/// Radio group names stay short enough to carry widget suffixes.
const GROUP_NAME_BUDGET: usize = 40;

/// What the engine decided to do with a field's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameAction {
    /// Keep the current name
    Preserve,
    /// Minor repair of the current name
    Improve,
    /// Replace the name wholesale
    Restructure,
}

/// Which pipeline stage produced the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Exact training fingerprint match
    ExactMatch,
    /// Similar training context, adapted
    AdaptedPattern,
    /// Semantic rule table
    Rule,
    /// Deterministic fallback
    Fallback,
}

/// The engine's verdict for one field.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NameDecision {
    /// Field this decision belongs to
    pub field_id: String,
    /// Preserve, improve or restructure
    pub action: NameAction,
    /// Final validated name
    pub new_name: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Producing stage
    pub source: DecisionSource,
    /// Short human-readable explanation
    pub rationale: String,
    /// Runner-up candidates, best first
    pub alternatives: Vec<String>,
}

/// Non-fatal engine finding.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NamingWarning {
    /// Affected field
    pub field_id: String,
    /// What happened
    pub message: String,
}

/// One generated candidate with its provenance.
#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    confidence: f64,
    source: DecisionSource,
    rationale: String,
    alternatives: Vec<String>,
}

/// The engine. Holds only shared read-only state.
pub struct NameEngine<'a> {
    store: &'a TrainingStore,
    options: &'a Options,
}

impl<'a> NameEngine<'a> {
    /// New engine over a loaded training store.
    pub fn new(store: &'a TrainingStore, options: &'a Options) -> Self {
        Self { store, options }
    }

    /// Decide names for every field. `fields` must list containers before
    /// their children, which is how the extractor emits them.
    pub fn decide_all(
        &self,
        fields: &[Field],
        contexts: &HashMap<String, FieldContext>,
    ) -> (Vec<NameDecision>, Vec<NamingWarning>) {
        let mut warnings = Vec::new();
        let empty_context = FieldContext::default();
        let kind_of: HashMap<&str, FieldKind> =
            fields.iter().map(|f| (f.id.as_str(), f.kind)).collect();

        // Phase 1: provisional decisions, no uniqueness yet
        let mut provisional: Vec<Option<(NameDecision, Vec<Candidate>)>> =
            Vec::with_capacity(fields.len());
        for field in fields {
            if is_radio_widget(field, &kind_of) {
                provisional.push(None);
                continue;
            }
            let context = contexts.get(&field.id).unwrap_or(&empty_context);
            provisional.push(Some(self.preserve_or_generate(field, context)));
        }

        // Restructured names that several fields would share get qualified
        // on every member, not just the collisions after the first
        let mut base_counts: HashMap<String, usize> = HashMap::new();
        for slot in provisional.iter().flatten() {
            if slot.0.action == NameAction::Restructure {
                *base_counts.entry(slot.0.new_name.clone()).or_insert(0) += 1;
            }
        }
        let shared: HashSet<String> = base_counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name)
            .collect();

        // Phase 2: finalize in order, enforcing grammar, uniqueness and
        // the radio group prefix
        let mut decisions: Vec<NameDecision> = Vec::with_capacity(fields.len());
        let mut assigned: HashSet<String> = HashSet::new();
        let mut group_names: HashMap<String, String> = HashMap::new();

        for (index, field) in fields.iter().enumerate() {
            if is_radio_widget(field, &kind_of) {
                let decision =
                    self.finalize_widget(field, &group_names, &mut assigned, &mut warnings);
                decisions.push(decision);
                continue;
            }

            let Some((mut decision, candidates)) = provisional[index].take() else {
                continue;
            };
            let context = contexts.get(&field.id).unwrap_or(&empty_context);

            let force_qualifier =
                decision.action == NameAction::Restructure && shared.contains(&decision.new_name);
            let final_name = self.finalize_name(
                field,
                context,
                &mut decision,
                &candidates,
                force_qualifier,
                &assigned,
                &mut warnings,
            );

            if decision.action == NameAction::Preserve && final_name != field.name {
                decision.action = NameAction::Improve;
            }
            decision.new_name = final_name.clone();
            assigned.insert(final_name.clone());
            if field.kind == FieldKind::RadioGroup || field.is_group_container {
                group_names.insert(field.id.clone(), final_name);
            }
            decisions.push(decision);
        }

        (decisions, warnings)
    }

    /// Preservation analysis, falling through to generation.
    fn preserve_or_generate(
        &self,
        field: &Field,
        context: &FieldContext,
    ) -> (NameDecision, Vec<Candidate>) {
        if self.options.preservation_mode && !field.name.is_empty() {
            let fingerprint = fingerprint_of(field, context);
            if BemName::is_valid(&field.name) {
                let support = self.store.support_for(&fingerprint, &field.name);
                let (confidence, source, rationale) = if support >= 1 {
                    (
                        0.9,
                        DecisionSource::ExactMatch,
                        format!("current name has training support {}", support),
                    )
                } else {
                    (
                        0.6,
                        DecisionSource::Rule,
                        "current name already satisfies the grammar".to_string(),
                    )
                };
                return (
                    NameDecision {
                        field_id: field.id.clone(),
                        action: NameAction::Preserve,
                        new_name: field.name.clone(),
                        confidence,
                        source,
                        rationale,
                        alternatives: Vec::new(),
                    },
                    self.generate(field, context),
                );
            }
            if let Some(normalized) = normalize_loose(&field.name) {
                return (
                    NameDecision {
                        field_id: field.id.clone(),
                        action: NameAction::Improve,
                        new_name: normalized,
                        confidence: 0.6,
                        source: DecisionSource::Rule,
                        rationale: format!("normalized casing and separators of '{}'", field.name),
                        alternatives: Vec::new(),
                    },
                    self.generate(field, context),
                );
            }
        }

        let candidates = self.generate(field, context);
        let primary = candidates.first().cloned().unwrap_or_else(|| self.fallback(field, context));
        (
            NameDecision {
                field_id: field.id.clone(),
                action: NameAction::Restructure,
                new_name: primary.name,
                confidence: primary.confidence,
                source: primary.source,
                rationale: primary.rationale,
                alternatives: primary.alternatives,
            },
            candidates,
        )
    }

    /// The four-stage generation pipeline, all stages materialized so the
    /// retry loop can fall through without recomputation.
    fn generate(&self, field: &Field, context: &FieldContext) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let fingerprint = fingerprint_of(field, context);

        // Stage 1: exact pattern match with dominance check
        let exact = self.store.lookup_exact(&fingerprint);
        if let Some((name, support)) = exact.first() {
            let dominates = exact.get(1).map(|(_, next)| *support >= 2 * next).unwrap_or(true);
            if *support >= self.options.exact_match_min_support && dominates {
                candidates.push(Candidate {
                    name: name.clone(),
                    confidence: 0.9,
                    source: DecisionSource::ExactMatch,
                    rationale: format!("exact context match, support {}", support),
                    alternatives: exact.iter().skip(1).take(3).map(|(n, _)| n.clone()).collect(),
                });
            }
        }

        // Stage 2: similarity adaptation
        let query = SimilarityQuery {
            label: context.label.clone(),
            nearby_text: context.nearby_text.clone(),
            section: context.section_header.clone(),
            kind: field.kind.as_str().to_string(),
            x: field.rect.map(|r| r[0]),
            y: field.rect.map(|r| r[1]),
        };
        let similar = self.store.lookup_similar(&query, 5);
        if let Some((name, score)) = similar.first() {
            if *score >= SIMILARITY_FLOOR && BemName::is_valid(name) {
                candidates.push(Candidate {
                    name: name.clone(),
                    confidence: 0.7,
                    source: DecisionSource::AdaptedPattern,
                    rationale: format!("adapted from similar training context ({:.2})", score),
                    alternatives: similar.iter().skip(1).map(|(n, _)| n.clone()).collect(),
                });
            }
        }

        // Stage 3: learned patterns, then the fixed semantic rules
        if let Some((name, trigger)) = self.pattern_candidate(context) {
            candidates.push(Candidate {
                name,
                confidence: 0.6,
                source: DecisionSource::Rule,
                rationale: format!("trained pattern triggered by '{}'", trigger),
                alternatives: Vec::new(),
            });
        }
        if let Some(name) = rule_based_name(field, context) {
            candidates.push(Candidate {
                name,
                confidence: 0.6,
                source: DecisionSource::Rule,
                rationale: "semantic rule over label and nearby text".to_string(),
                alternatives: Vec::new(),
            });
        }

        // Stage 4: fallback always exists
        candidates.push(self.fallback(field, context));
        candidates
    }

    /// A name from the trained pattern catalog whose trigger tokens show
    /// up in the field's label.
    fn pattern_candidate(&self, context: &FieldContext) -> Option<(String, String)> {
        let label = context.label.to_lowercase();
        if label.is_empty() {
            return None;
        }
        for pattern in self.store.patterns() {
            if pattern.support < 2 {
                continue;
            }
            if let Some(trigger) = pattern.trigger_tokens.iter().find(|t| label.contains(t.as_str())) {
                let name = match &pattern.element {
                    Some(element) => format!("{}_{}", pattern.block, element),
                    None => pattern.block.clone(),
                };
                if BemName::is_valid(&name) {
                    return Some((name, trigger.clone()));
                }
            }
        }
        None
    }

    /// Deterministic last-resort name.
    fn fallback(&self, field: &Field, context: &FieldContext) -> Candidate {
        let kind_token = field.kind.as_str().replace('_', "-");
        let tail = {
            let from_label = sanitize_token(&context.label);
            if from_label.is_empty() {
                sanitize_token(&field.id)
            } else {
                from_label
            }
        };
        let mut name = format!("form-{}__{}", kind_token, tail);
        truncate_name(&mut name);
        Candidate {
            name,
            confidence: 0.4,
            source: DecisionSource::Fallback,
            rationale: "fallback from field kind and label".to_string(),
            alternatives: Vec::new(),
        }
    }

    /// Validation and uniqueness with a bounded retry loop.
    #[allow(clippy::too_many_arguments)]
    fn finalize_name(
        &self,
        field: &Field,
        context: &FieldContext,
        decision: &mut NameDecision,
        candidates: &[Candidate],
        force_qualifier: bool,
        assigned: &HashSet<String>,
        warnings: &mut Vec<NamingWarning>,
    ) -> String {
        let budget = if field.kind == FieldKind::RadioGroup {
            GROUP_NAME_BUDGET
        } else {
            MAX_NAME_LENGTH
        };

        let mut attempts = 0usize;
        let mut queue: Vec<String> = Vec::new();
        queue.push(decision.new_name.clone());
        for candidate in candidates {
            if candidate.name != decision.new_name {
                queue.push(candidate.name.clone());
            }
        }

        for name in queue {
            if attempts >= MAX_RETRIES {
                break;
            }
            attempts += 1;

            let mut name = name;
            if name.len() > budget {
                truncate_to(&mut name, budget);
            }
            if !BemName::is_valid(&name) {
                continue;
            }
            if !force_qualifier && !assigned.contains(&name) {
                return name;
            }
            // Collision: qualify with section, label, then numbers
            if let Some(resolved) =
                self.qualify(&name, context, assigned, budget, &mut decision.rationale)
            {
                return resolved;
            }
        }

        // Retry exhaustion: suffix the fallback until unique
        warnings.push(NamingWarning {
            field_id: field.id.clone(),
            message: "name generation retries exhausted, using suffixed fallback".to_string(),
        });
        let mut base = self.fallback(field, context).name;
        truncate_to(&mut base, budget.saturating_sub(4));
        let mut n = 2usize;
        let mut name = base.clone();
        while assigned.contains(&name) || !BemName::is_valid(&name) {
            name = format!("{}-{}", base, n);
            n += 1;
        }
        decision.rationale.push_str("; fallback suffix applied after retry exhaustion");
        name
    }

    /// Produce a unique variant by extending the modifier segment.
    fn qualify(
        &self,
        name: &str,
        context: &FieldContext,
        assigned: &HashSet<String>,
        budget: usize,
        rationale: &mut String,
    ) -> Option<String> {
        let parsed = BemName::parse(name).ok()?;

        let mut tokens: Vec<String> = Vec::new();
        let section = sanitize_token(&context.section_header);
        if !section.is_empty() {
            tokens.push(section);
        }
        let label = sanitize_token(&context.label);
        if !label.is_empty() {
            tokens.push(label);
        }
        for n in 2..=MAX_RETRIES + 2 {
            tokens.push(n.to_string());
        }

        for token in tokens {
            // A numeric token cannot start a segment; fold it into the
            // existing modifier or give it a letter prefix
            let candidate = match (&parsed.modifier, token.chars().next().map(|c| c.is_ascii_digit())) {
                (Some(modifier), _) => parsed.with_modifier(format!("{}-{}", modifier, token)),
                (None, Some(true)) => parsed.with_modifier(format!("v{}", token)),
                (None, _) => parsed.with_modifier(token.clone()),
            };
            let mut text = candidate.to_string();
            if text.len() > budget {
                truncate_to(&mut text, budget);
            }
            if BemName::is_valid(&text) && !assigned.contains(&text) && text != name {
                rationale.push_str(&format!("; collision on '{}' resolved as '{}'", name, text));
                return Some(text);
            }
        }
        None
    }

    /// Widgets inherit the group's final name plus an export-derived tail.
    fn finalize_widget(
        &self,
        field: &Field,
        group_names: &HashMap<String, String>,
        assigned: &mut HashSet<String>,
        warnings: &mut Vec<NamingWarning>,
    ) -> NameDecision {
        let group = field
            .parent_id
            .as_ref()
            .and_then(|p| group_names.get(p))
            .cloned()
            .unwrap_or_else(|| {
                warnings.push(NamingWarning {
                    field_id: field.id.clone(),
                    message: "radio widget has no named group, using fallback block".to_string(),
                });
                "selection_orphan".to_string()
            });

        // Export values outside the grammar alphabet are transliterated;
        // an empty result falls back to the widget's index
        let tail = field
            .export_value
            .as_deref()
            .map(sanitize_token)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| {
                let index = field
                    .id
                    .rsplit('_')
                    .next()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(0);
                format!("option-{}", index)
            });

        let mut name = format!("{}__{}", group, tail);
        truncate_name(&mut name);
        let mut n = 2usize;
        while assigned.contains(&name) {
            name = format!("{}__{}-{}", group, tail, n);
            truncate_name(&mut name);
            n += 1;
        }
        assigned.insert(name.clone());

        let action = if name == field.name {
            NameAction::Preserve
        } else {
            NameAction::Restructure
        };
        NameDecision {
            field_id: field.id.clone(),
            action,
            new_name: name,
            confidence: 0.8,
            source: DecisionSource::Rule,
            rationale: "widget name follows its group prefix and export value".to_string(),
            alternatives: Vec::new(),
        }
    }
}

fn is_radio_widget(field: &Field, kind_of: &HashMap<&str, FieldKind>) -> bool {
    field.kind == FieldKind::RadioWidget
        && field
            .parent_id
            .as_deref()
            .map(|p| kind_of.get(p) == Some(&FieldKind::RadioGroup))
            .unwrap_or(false)
}

fn fingerprint_of(field: &Field, context: &FieldContext) -> Fingerprint {
    Fingerprint::new(
        &context.label,
        &context.section_header,
        field.kind.as_str(),
        field.rect.map(|r| r[0]),
        field.rect.map(|r| r[1]),
    )
}

fn truncate_name(name: &mut String) {
    truncate_to(name, MAX_NAME_LENGTH);
}

fn truncate_to(name: &mut String, budget: usize) {
    if name.len() > budget {
        name.truncate(budget);
        while name.ends_with('-') || name.ends_with('_') {
            name.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldFlags;
    use crate::training::TrainingRecord;

    fn field(id: &str, name: &str, kind: FieldKind) -> Field {
        Field {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            page: Some(1),
            rect: Some([100.0, 500.0, 200.0, 520.0]),
            value: None,
            flags: FieldFlags::default(),
            parent_id: None,
            child_ids: Vec::new(),
            export_value: None,
            object_ref: None,
            is_group_container: false,
            local_title: Some(name.to_string()),
            tooltip: None,
            mapping_name: None,
            max_len: None,
            options: Vec::new(),
            default_appearance: None,
        }
    }

    fn context(label: &str, section: &str) -> FieldContext {
        FieldContext {
            label: label.to_string(),
            section_header: section.to_string(),
            ..FieldContext::default()
        }
    }

    fn store_with(records: Vec<TrainingRecord>) -> TrainingStore {
        TrainingStore::load(records).unwrap()
    }

    #[test]
    fn test_preserve_trained_name() {
        let record = TrainingRecord {
            label: Some("First Name".to_string()),
            section: Some("Owner".to_string()),
            kind: Some("text".to_string()),
            x: Some(100.0),
            y: Some(500.0),
            ..TrainingRecord::named("owner-information_name__first")
        };
        let store = store_with(vec![record]);
        let options = Options::default();
        let engine = NameEngine::new(&store, &options);

        let f = field("field_000000", "owner-information_name__first", FieldKind::Text);
        let mut contexts = HashMap::new();
        contexts.insert(f.id.clone(), context("First Name", "Owner"));

        let (decisions, warnings) = engine.decide_all(&[f], &contexts);
        assert!(warnings.is_empty());
        assert_eq!(decisions[0].action, NameAction::Preserve);
        assert_eq!(decisions[0].new_name, "owner-information_name__first");
        assert!(decisions[0].confidence >= 0.9);
    }

    #[test]
    fn test_improve_all_caps() {
        let store = store_with(Vec::new());
        let options = Options::default();
        let engine = NameEngine::new(&store, &options);

        let fields = vec![
            field("field_000000", "FIRST_NAME", FieldKind::Text),
            field("field_000001", "SSN", FieldKind::Text),
        ];
        let contexts = HashMap::new();
        let (decisions, _) = engine.decide_all(&fields, &contexts);

        assert_eq!(decisions[0].action, NameAction::Improve);
        assert_eq!(decisions[0].new_name, "first_name");
        assert!(decisions[0].confidence >= 0.6);
        assert_eq!(decisions[1].new_name, "ssn");
        for d in &decisions {
            assert!(BemName::is_valid(&d.new_name));
        }
    }

    #[test]
    fn test_collision_resolved_with_sections() {
        let store = store_with(Vec::new());
        let options = Options::default();
        let engine = NameEngine::new(&store, &options);

        let fields = vec![
            field("field_000000", "", FieldKind::Text),
            field("field_000001", "", FieldKind::Text),
            field("field_000002", "", FieldKind::Text),
        ];
        let mut contexts = HashMap::new();
        contexts.insert("field_000000".to_string(), context("Amount", "Gross"));
        contexts.insert("field_000001".to_string(), context("Amount", "Net"));
        contexts.insert("field_000002".to_string(), context("Amount", "Fees"));

        let (decisions, _) = engine.decide_all(&fields, &contexts);
        let names: Vec<&str> = decisions.iter().map(|d| d.new_name.as_str()).collect();
        assert_eq!(names, vec!["payment_amount__gross", "payment_amount__net", "payment_amount__fees"]);
        for d in &decisions {
            assert!(d.rationale.contains("collision"), "rationale: {}", d.rationale);
        }
    }

    #[test]
    fn test_radio_group_prefix() {
        let store = store_with(Vec::new());
        let options = Options::default();
        let engine = NameEngine::new(&store, &options);

        let mut group = field("field_000000", "transaction--group", FieldKind::RadioGroup);
        group.is_group_container = true;
        group.child_ids = vec!["field_000000_0".to_string(), "field_000000_1".to_string()];
        group.rect = None;
        group.page = None;

        let mut w1 = field("field_000000_0", "transaction--group__one-time", FieldKind::RadioWidget);
        w1.parent_id = Some("field_000000".to_string());
        w1.export_value = Some("one-time".to_string());
        let mut w2 = field("field_000000_1", "transaction--group__recurring", FieldKind::RadioWidget);
        w2.parent_id = Some("field_000000".to_string());
        w2.export_value = Some("recurring".to_string());

        let contexts = HashMap::new();
        let (decisions, warnings) = engine.decide_all(&[group, w1, w2], &contexts);
        assert!(warnings.is_empty());

        assert_eq!(decisions[0].new_name, "transaction_group");
        assert_eq!(decisions[1].new_name, "transaction_group__one-time");
        assert_eq!(decisions[2].new_name, "transaction_group__recurring");
        for widget in &decisions[1..] {
            assert!(widget.new_name.starts_with("transaction_group__"));
        }
    }

    #[test]
    fn test_widget_without_export_uses_index() {
        let store = store_with(Vec::new());
        let options = Options::default();
        let engine = NameEngine::new(&store, &options);

        let mut group = field("field_000000", "choices", FieldKind::RadioGroup);
        group.is_group_container = true;
        let mut w = field("field_000000_1", "", FieldKind::RadioWidget);
        w.parent_id = Some("field_000000".to_string());
        w.export_value = None;

        let (decisions, _) = engine.decide_all(&[group, w], &HashMap::new());
        assert_eq!(decisions[1].new_name, "choices__option-1");
    }

    #[test]
    fn test_fallback_for_bare_field() {
        let store = store_with(Vec::new());
        let options = Options::default();
        let engine = NameEngine::new(&store, &options);

        let f = field("field_000007", "", FieldKind::Unknown);
        let (decisions, _) = engine.decide_all(&[f], &HashMap::new());
        assert_eq!(decisions[0].source, DecisionSource::Fallback);
        assert_eq!(decisions[0].new_name, "form-unknown__field-000007");
        assert!(BemName::is_valid(&decisions[0].new_name));
    }

    #[test]
    fn test_exact_match_requires_dominance() {
        let make = |name: &str| TrainingRecord {
            label: Some("Amount".to_string()),
            section: Some("Payment".to_string()),
            kind: Some("text".to_string()),
            x: Some(100.0),
            y: Some(500.0),
            ..TrainingRecord::named(name)
        };
        // Two candidates with equal support: no dominance, stage 1 skipped
        let store = store_with(vec![
            make("payment_amount"),
            make("payment_amount"),
            make("payment_total"),
            make("payment_total"),
        ]);
        let options = Options::default();
        let engine = NameEngine::new(&store, &options);

        let f = field("field_000000", "", FieldKind::Text);
        let mut contexts = HashMap::new();
        contexts.insert(f.id.clone(), context("Amount", "Payment"));
        let (decisions, _) = engine.decide_all(&[f], &contexts);
        assert_ne!(decisions[0].source, DecisionSource::ExactMatch);
    }

    #[test]
    fn test_all_names_unique_and_valid() {
        let store = store_with(Vec::new());
        let options = Options::default();
        let engine = NameEngine::new(&store, &options);

        let mut fields = Vec::new();
        let mut contexts = HashMap::new();
        for i in 0..8 {
            let f = field(&format!("field_{:06}", i), "", FieldKind::Text);
            contexts.insert(f.id.clone(), context("Amount", ""));
            fields.push(f);
        }
        let (decisions, _) = engine.decide_all(&fields, &contexts);
        let names: HashSet<&str> = decisions.iter().map(|d| d.new_name.as_str()).collect();
        assert_eq!(names.len(), decisions.len());
        for d in &decisions {
            assert!(BemName::is_valid(&d.new_name), "invalid: {}", d.new_name);
        }
    }
}
