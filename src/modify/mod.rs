//! Planning and safe application of field renames.

mod backup;
mod modifier;
mod planner;
mod validate;

pub use backup::{create_backup, find_record, restore, BackupRecord};
pub use modifier::{apply_plan, rollback, ApplyOutcome};
pub use planner::{plan_modifications, DependentRef, FieldEdit, ModificationPlan};
pub use validate::{validate_output, IntegrityReport, IntegrityStatus};
