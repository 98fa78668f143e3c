//! Output artifacts: the per-field mapping CSV and the processing report.

mod mapping;
mod report;

pub use mapping::{write_mapping_csv, MAPPING_COLUMNS};
pub use report::{
    DocumentSummary, FieldReport, ModificationEntry, ProcessingReport, write_report,
};
