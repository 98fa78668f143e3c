//! High-level invocation surface for external collaborators.
//!
//! Five entry points: [`analyze`], [`decide`], [`plan`], [`apply`] and
//! the bundling [`process`]. CLI wrappers map [`Error::exit_code`] to
//! their exit status; the core itself never parses arguments or reads
//! configuration files.

use crate::config::Options;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::extract::{ContextExtractor, ExtractionWarning, Field, FieldContext, FieldExtractor};
use crate::modify::{self, ModificationPlan};
use crate::naming::{NameDecision, NameEngine, NamingWarning};
use crate::output::{self, DocumentSummary, ProcessingReport};
use crate::training::TrainingStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Everything extracted from a document before any decision is made.
#[derive(Debug)]
pub struct Analysis {
    /// Document summary
    pub metadata: DocumentSummary,
    /// Flattened fields, containers before children
    pub fields: Vec<Field>,
    /// Context evidence keyed by field id
    pub contexts: HashMap<String, FieldContext>,
    /// Extraction warnings
    pub warnings: Vec<ExtractionWarning>,
}

/// Artifact paths of a completed apply.
#[derive(Debug)]
pub struct ApplyResult {
    /// The modified PDF (incremental update)
    pub modified_path: PathBuf,
    /// The per-field mapping CSV
    pub mapping_path: PathBuf,
    /// The JSON processing report
    pub report_path: PathBuf,
    /// Id of the pre-mutation backup
    pub backup_id: String,
}

/// Parse a document and extract fields plus context evidence.
pub fn analyze(path: &Path, passphrase: Option<&str>, options: &Options) -> Result<Analysis> {
    let doc = Document::open(path, passphrase)?;
    let extraction = FieldExtractor::new(&doc, options.large_form_threshold).extract()?;
    let mut context_extractor = ContextExtractor::new(&doc);
    let contexts = context_extractor.extract_all(&extraction.fields)?;
    context_extractor.clear_cache();

    let (major, minor) = doc.version();
    let metadata = DocumentSummary {
        path: path.to_string_lossy().into_owned(),
        version: format!("{}.{}", major, minor),
        page_count: doc.page_count()?,
        field_count: extraction.fields.len(),
        encrypted: doc.is_encrypted(),
        statistics: extraction.statistics(),
    };

    Ok(Analysis {
        metadata,
        fields: extraction.fields,
        contexts,
        warnings: extraction.warnings,
    })
}

/// Run the name engine over an analysis.
pub fn decide(
    analysis: &Analysis,
    store: &TrainingStore,
    options: &Options,
) -> (Vec<NameDecision>, Vec<NamingWarning>) {
    NameEngine::new(store, options).decide_all(&analysis.fields, &analysis.contexts)
}

/// Translate decisions into an ordered, conflict-checked plan.
pub fn plan(
    path: &Path,
    passphrase: Option<&str>,
    decisions: &[NameDecision],
    options: &Options,
) -> Result<ModificationPlan> {
    let doc = Document::open(path, passphrase)?;
    let extraction = FieldExtractor::new(&doc, options.large_form_threshold).extract()?;
    modify::plan_modifications(&doc, &extraction.fields, decisions, options)
}

/// Apply a plan and emit the three artifacts.
pub fn apply(
    path: &Path,
    passphrase: Option<&str>,
    analysis: &Analysis,
    decisions: &[NameDecision],
    plan: &ModificationPlan,
    out_dir: Option<&Path>,
    options: &Options,
) -> Result<ApplyResult> {
    apply_with_deadline(path, passphrase, analysis, decisions, plan, out_dir, options, None, &[])
}

#[allow(clippy::too_many_arguments)]
fn apply_with_deadline(
    path: &Path,
    passphrase: Option<&str>,
    analysis: &Analysis,
    decisions: &[NameDecision],
    plan: &ModificationPlan,
    out_dir: Option<&Path>,
    options: &Options,
    deadline: Option<Instant>,
    extra_warnings: &[String],
) -> Result<ApplyResult> {
    let outcome = modify::apply_plan(
        path,
        &analysis.fields,
        plan,
        out_dir,
        passphrase,
        options,
        deadline,
    )?;

    let out_dir = outcome
        .modified_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let mapping_path = out_dir.join(format!("{}_mapping.csv", stem));
    let report_path = out_dir.join(format!("{}_report.json", stem));

    let created_at = chrono::Utc::now();
    output::write_mapping_csv(&mapping_path, &analysis.fields, &analysis.contexts, decisions, created_at)?;

    let mut warnings: Vec<String> = analysis
        .warnings
        .iter()
        .map(|w| serde_json::to_string(w).unwrap_or_else(|_| format!("{:?}", w)))
        .collect();
    warnings.extend(extra_warnings.iter().cloned());
    warnings.extend(plan.conflicts.iter().cloned());
    warnings.extend(outcome.integrity.issues.iter().cloned());

    let report = ProcessingReport::assemble(
        analysis.metadata.clone(),
        &analysis.fields,
        &analysis.contexts,
        decisions,
        &plan.expected_names,
        warnings,
        plan.safety_score,
    );
    output::write_report(&report_path, &report)?;

    Ok(ApplyResult {
        modified_path: outcome.modified_path,
        mapping_path,
        report_path,
        backup_id: outcome.backup.backup_id,
    })
}

/// Restore a previous run from its backup id.
pub fn rollback(dir: &Path, backup_id: &str) -> Result<PathBuf> {
    modify::rollback(dir, backup_id)
}

/// Bundle analyze, decide, plan and apply under the time budget.
pub fn process(
    path: &Path,
    passphrase: Option<&str>,
    store: &TrainingStore,
    out_dir: Option<&Path>,
    options: &Options,
) -> Result<ApplyResult> {
    let deadline = Instant::now() + Duration::from_secs(options.time_budget_seconds);

    let analysis = analyze(path, passphrase, options)?;
    check_budget(deadline, options)?;

    let (decisions, naming_warnings) = decide(&analysis, store, options);
    check_budget(deadline, options)?;

    let doc = Document::open(path, passphrase)?;
    let plan = modify::plan_modifications(&doc, &analysis.fields, &decisions, options)?;
    drop(doc);
    check_budget(deadline, options)?;

    let extra: Vec<String> = naming_warnings
        .iter()
        .map(|w| format!("{}: {}", w.field_id, w.message))
        .collect();
    apply_with_deadline(
        path,
        passphrase,
        &analysis,
        &decisions,
        &plan,
        out_dir,
        options,
        Some(deadline),
        &extra,
    )
}

fn check_budget(deadline: Instant, options: &Options) -> Result<()> {
    if Instant::now() >= deadline {
        return Err(Error::Timeout(options.time_budget_seconds));
    }
    Ok(())
}
