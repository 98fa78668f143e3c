//! Safe plan application.
//!
//! The protocol is fixed: exclusive lock, committed backup, incremental
//! write, re-validation, rollback on any critical finding. The source
//! file's bytes are never modified; the output is a sibling file and a
//! failed run removes it.

use crate::config::Options;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::extract::Field;
use crate::modify::backup::{self, BackupRecord};
use crate::modify::planner::ModificationPlan;
use crate::modify::validate::{validate_output, IntegrityReport, IntegrityStatus};
use crate::object::Object;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of a successful apply.
#[derive(Debug)]
pub struct ApplyOutcome {
    /// Path of the modified document
    pub modified_path: PathBuf,
    /// Backup taken before mutation
    pub backup: BackupRecord,
    /// Validation findings (safe or warning)
    pub integrity: IntegrityReport,
    /// Number of object edits applied
    pub applied_edits: usize,
}

/// Exclusive lock on the source path, released on every exit path.
struct SourceLock {
    file: File,
}

impl SourceLock {
    fn acquire(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        file.try_lock_exclusive()
            .map_err(|_| Error::SourceLocked(path.display().to_string()))?;
        Ok(Self { file })
    }
}

impl Drop for SourceLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            log::warn!("failed to release source lock: {}", e);
        }
    }
}

/// Apply a plan to `source`, producing `<stem>_parsed.pdf` in `out_dir`
/// (defaults to the source's directory).
///
/// `deadline` is the per-document time budget; once mutation has begun,
/// exceeding it still rolls the run back before returning.
pub fn apply_plan(
    source: &Path,
    original_fields: &[Field],
    plan: &ModificationPlan,
    out_dir: Option<&Path>,
    passphrase: Option<&str>,
    options: &Options,
    deadline: Option<Instant>,
) -> Result<ApplyOutcome> {
    // Safety gate: blockers and the score threshold stop the run before
    // any file is touched
    if let Some(blocker) = plan.blockers.first() {
        return Err(Error::PlanBlocked(blocker.clone()));
    }
    if plan.safety_score < options.safety_threshold {
        return Err(Error::PlanBlocked(format!(
            "safety score {:.2} below threshold {:.2}",
            plan.safety_score, options.safety_threshold
        )));
    }

    let parent = source.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let out_dir = out_dir.unwrap_or_else(|| parent.as_path());
    std::fs::create_dir_all(out_dir)?;
    let out_path = out_dir.join(format!("{}_parsed.pdf", backup::stem_of(source)));

    let _lock = SourceLock::acquire(source)?;
    let backup = backup::create_backup(source, out_dir, &plan.digest())?;

    check_deadline(deadline, options)?;

    let doc = Document::open(source, passphrase)?;
    let updates = build_updates(&doc, plan)?;
    let applied_edits = plan.edits.len();

    crate::writer::write_incremental(&doc, &updates, &out_path)?;

    // Budget exceeded after mutation began: roll back, then surface
    if deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
        discard_output(&out_path, &backup);
        return Err(Error::Timeout(options.time_budget_seconds));
    }

    let integrity = validate_output(
        original_fields,
        plan,
        &out_path,
        passphrase,
        options.large_form_threshold,
    )?;
    if integrity.status == IntegrityStatus::Critical {
        log::error!(
            "validation failed with {} issue(s), rolling back",
            integrity.issues.len()
        );
        discard_output(&out_path, &backup);
        return Err(Error::ValidationFailed(integrity.issues.len()));
    }

    Ok(ApplyOutcome {
        modified_path: out_path,
        backup,
        integrity,
        applied_edits,
    })
}

/// Restore a prior run from its backup id. Records are searched in `dir`.
pub fn rollback(dir: &Path, backup_id: &str) -> Result<PathBuf> {
    let record = backup::find_record(dir, backup_id)?;
    backup::restore(&record)
}

fn check_deadline(deadline: Option<Instant>, options: &Options) -> Result<()> {
    if deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
        return Err(Error::Timeout(options.time_budget_seconds));
    }
    Ok(())
}

/// Remove the failed output and restore the source from backup.
fn discard_output(out_path: &Path, backup: &BackupRecord) {
    if let Err(e) = std::fs::remove_file(out_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("could not remove {}: {}", out_path.display(), e);
        }
    }
    if let Err(e) = backup::restore(backup) {
        log::error!("rollback restore failed: {}", e);
    }
}

/// Materialize the plan as updated objects, in plan order.
fn build_updates(
    doc: &Document,
    plan: &ModificationPlan,
) -> Result<BTreeMap<u32, (u16, Object)>> {
    let mut updates: BTreeMap<u32, (u16, Object)> = BTreeMap::new();

    for edit in &plan.edits {
        if let (Some(obj_ref), Some(title)) = (edit.object_ref, edit.new_local_title.as_ref()) {
            let entry = updates
                .entry(obj_ref.number)
                .or_insert_with(|| (obj_ref.generation, Object::Null));
            if entry.1.is_null() {
                entry.1 = doc.load(obj_ref)?;
            }
            match entry.1.as_dict_mut() {
                Some(dict) => {
                    dict.insert("T".to_string(), Object::text(title));
                },
                None => {
                    return Err(Error::InvalidObjectType {
                        expected: "field dictionary".to_string(),
                        found: entry.1.type_name().to_string(),
                    })
                },
            }
        }

        for dependent in &edit.dependent_refs {
            let entry = updates
                .entry(dependent.object_ref.number)
                .or_insert_with(|| (dependent.object_ref.generation, Object::Null));
            if entry.1.is_null() {
                entry.1 = doc.load(dependent.object_ref)?;
            }
            rewrite_js(&mut entry.1, &dependent.old_text, &dependent.new_text);
        }
    }
    Ok(updates)
}

/// Replace matching `JS` strings anywhere inside the object.
fn rewrite_js(object: &mut Object, old_text: &str, new_text: &str) {
    match object {
        Object::Dictionary(dict) | Object::Stream { dict, .. } => {
            for (key, value) in dict.iter_mut() {
                if key == "JS" {
                    if value.as_text().as_deref() == Some(old_text) {
                        *value = Object::text(new_text);
                    }
                } else {
                    rewrite_js(value, old_text, new_text);
                }
            }
        },
        Object::Array(items) => {
            for item in items {
                rewrite_js(item, old_text, new_text);
            }
        },
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dict;

    #[test]
    fn test_rewrite_js_replaces_exact_match() {
        let mut inner = Dict::new();
        inner.insert("JS".to_string(), Object::text("getField('a')"));
        let mut outer = Dict::new();
        outer.insert("AA".to_string(), Object::Dictionary(inner));
        let mut object = Object::Dictionary(outer);

        rewrite_js(&mut object, "getField('a')", "getField('b')");
        let dict = object.as_dict().unwrap();
        let js = dict.get("AA").unwrap().as_dict().unwrap().get("JS").unwrap();
        assert_eq!(js.as_text().as_deref(), Some("getField('b')"));
    }

    #[test]
    fn test_rewrite_js_ignores_other_strings() {
        let mut dict = Dict::new();
        dict.insert("T".to_string(), Object::text("getField('a')"));
        let mut object = Object::Dictionary(dict);
        rewrite_js(&mut object, "getField('a')", "x");
        assert_eq!(
            object.as_dict().unwrap().get("T").unwrap().as_text().as_deref(),
            Some("getField('a')")
        );
    }

    #[test]
    fn test_lock_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.pdf");
        std::fs::write(&path, b"x").unwrap();

        let first = SourceLock::acquire(&path).unwrap();
        assert!(matches!(SourceLock::acquire(&path), Err(Error::SourceLocked(_))));
        drop(first);
        assert!(SourceLock::acquire(&path).is_ok());
    }
}
