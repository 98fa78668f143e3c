//! Training evidence: historical `(context -> approved name)` examples.

mod patterns;
mod records;
mod store;

pub use patterns::NamingPattern;
pub use records::TrainingRecord;
pub use store::{Fingerprint, SimilarityQuery, TrainingStore};
