//! Error types for the field renaming library.
//!
//! One crate-wide error enum covers the full pipeline: PDF parsing,
//! field extraction, name generation, planning and safe modification.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while processing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid PDF header (expected '%PDF-')
    #[error("Invalid PDF header: expected '%PDF-', found '{0}'")]
    InvalidHeader(String),

    /// Malformed or missing cross-reference table
    #[error("Invalid cross-reference table: {0}")]
    InvalidXref(String),

    /// Parse error at a specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where the error occurred
        offset: usize,
        /// Reason for the parse failure
        reason: String,
    },

    /// Referenced object not found in the cross-reference table
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Object has the wrong type for the requested operation
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Generic structural problem with the document
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Unsupported feature (XFA-only forms, AES-256 revisions, ...)
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Circular reference detected in the object graph
    #[error("Circular reference detected: object {0}")]
    CircularReference(crate::object::ObjRef),

    /// Document is encrypted and the supplied passphrase does not unlock it
    #[error("Cannot decrypt document: {0}")]
    Encrypted(String),

    /// The training store could not be loaded
    #[error("Training data corrupt: {0}")]
    TrainingCorrupt(String),

    /// A generated name violates the BEM grammar
    #[error("Name grammar violation: {name}: {reason}")]
    NameGrammar {
        /// The offending name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Planning found a blocker; no mutation was attempted
    #[error("Modification plan blocked: {0}")]
    PlanBlocked(String),

    /// Post-apply validation failed and the run was rolled back
    #[error("Validation failed after modification ({0} issue(s)); changes rolled back")]
    ValidationFailed(usize),

    /// Backup could not be written; no mutation was attempted
    #[error("Backup failed: {0}")]
    BackupFailed(String),

    /// Another process holds the lock on the source file
    #[error("Source file is locked by another process: {0}")]
    SourceLocked(String),

    /// The per-document time budget was exceeded
    #[error("Time budget of {0} s exceeded")]
    Timeout(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error
    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl Error {
    /// Map an error to the process exit code contract for CLI wrappers.
    ///
    /// `0` success, `2` invalid input, `3` encryption failure, `4` planning
    /// blocker, `5` rolled back, `6` timeout, `1` anything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidHeader(_)
            | Error::InvalidXref(_)
            | Error::ParseError { .. }
            | Error::InvalidPdf(_)
            | Error::Unsupported(_) => 2,
            Error::Encrypted(_) => 3,
            Error::PlanBlocked(_) => 4,
            Error::ValidationFailed(_) => 5,
            Error::Timeout(_) => 6,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = Error::ParseError {
            offset: 77,
            reason: "bad token".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("77"));
        assert!(msg.contains("bad token"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::InvalidHeader("x".into()).exit_code(), 2);
        assert_eq!(Error::Encrypted("bad password".into()).exit_code(), 3);
        assert_eq!(Error::PlanBlocked("collision".into()).exit_code(), 4);
        assert_eq!(Error::ValidationFailed(2).exit_code(), 5);
        assert_eq!(Error::Timeout(120).exit_code(), 6);
        assert_eq!(Error::TrainingCorrupt("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
