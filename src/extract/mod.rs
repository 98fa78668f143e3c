//! Form field and context extraction.

mod context;
mod fields;

pub use context::{ContextExtractor, FieldContext};
pub use fields::{
    field_flags, Extraction, ExtractionWarning, Field, FieldExtractor, FieldFlags, FieldKind,
    FieldStatistics,
};
