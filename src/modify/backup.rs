//! Backup and restore.
//!
//! A timestamped copy of the source plus a JSON [`BackupRecord`] is
//! written before any mutation; rollback is a file copy back. Records are
//! discoverable by id so external collaborators can restore later runs.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Durable description of one backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Unique id of this backup
    pub backup_id: String,
    /// Path of the file that was backed up
    pub original_path: String,
    /// Where the copy lives
    pub backup_path: String,
    /// When the backup was taken
    pub created_at: DateTime<Utc>,
    /// Digest of the plan the backup protects against
    pub plan_digest: String,
}

/// File stem of the source, for deriving sibling artifact names.
pub(crate) fn stem_of(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Copy `source` into `out_dir` and persist the record beside it.
///
/// Any failure here is fatal for the run; mutation must not begin
/// without a committed backup.
pub fn create_backup(source: &Path, out_dir: &Path, plan_digest: &str) -> Result<BackupRecord> {
    let stem = stem_of(source);
    let backup_path = out_dir.join(format!("{}_backup.pdf", stem));
    let record_path = out_dir.join(format!("{}_backup.json", stem));

    std::fs::copy(source, &backup_path)
        .map_err(|e| Error::BackupFailed(format!("copy to {}: {}", backup_path.display(), e)))?;

    let record = BackupRecord {
        backup_id: uuid::Uuid::new_v4().to_string(),
        original_path: source.to_string_lossy().into_owned(),
        backup_path: backup_path.to_string_lossy().into_owned(),
        created_at: Utc::now(),
        plan_digest: plan_digest.to_string(),
    };
    let json = serde_json::to_vec_pretty(&record)
        .map_err(|e| Error::BackupFailed(format!("serialize record: {}", e)))?;
    std::fs::write(&record_path, json)
        .map_err(|e| Error::BackupFailed(format!("write {}: {}", record_path.display(), e)))?;

    log::info!("backup {} written to {}", record.backup_id, backup_path.display());
    Ok(record)
}

/// Find a record by id among the `*_backup.json` files in `dir`.
pub fn find_record(dir: &Path, backup_id: &str) -> Result<BackupRecord> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with("_backup.json") {
            continue;
        }
        let Ok(bytes) = std::fs::read(&path) else { continue };
        let Ok(record) = serde_json::from_slice::<BackupRecord>(&bytes) else {
            continue;
        };
        if record.backup_id == backup_id {
            return Ok(record);
        }
    }
    Err(Error::InvalidPdf(format!("no backup record with id {}", backup_id)))
}

/// Restore the original file from its backup copy.
pub fn restore(record: &BackupRecord) -> Result<PathBuf> {
    let original = PathBuf::from(&record.original_path);
    std::fs::copy(&record.backup_path, &original)?;
    log::info!("restored {} from backup {}", original.display(), record.backup_id);
    Ok(original)
}
