// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::match_like_matches_macro)]
#![cfg_attr(test, allow(dead_code))]

//! # acroname
//!
//! Renames interactive form fields inside existing PDF documents from
//! arbitrary legacy identifiers to a strict semantic naming convention
//! (BEM: `block_element__modifier`), and emits a machine-consumable
//! description of every change.
//!
//! ## Subsystems
//!
//! - **Extraction** — a from-scratch PDF object reader (xref tables and
//!   streams, object streams, Flate/ASCIIHex/RunLength filters, RC4 and
//!   AES-128 standard security) feeding an AcroForm walker that recovers
//!   the complete logical+widget field tree, including the dual shape of
//!   radio groups, with inherited attributes resolved.
//! - **Naming** — a training store of historical `(context, approved
//!   name)` examples plus a four-stage decision pipeline that preserves,
//!   improves or restructures each field's name and guarantees grammar
//!   validity and uniqueness.
//! - **Modification** — an ordered, conflict-checked plan applied through
//!   incremental updates (original bytes are never rewritten), guarded by
//!   an exclusive lock, a mandatory backup, post-apply re-validation and
//!   rollback.
//!
//! ## Quick start
//!
//! ```no_run
//! use acroname::{api, config::Options, training::TrainingStore};
//! use std::path::Path;
//!
//! # fn main() -> acroname::error::Result<()> {
//! let store = TrainingStore::load_json("training.json")?;
//! let options = Options::default();
//! let result = api::process(Path::new("form.pdf"), None, &store, None, &options)?;
//! println!("modified: {}", result.modified_path.display());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod document;
pub mod lexer;
pub mod object;
pub mod objstm;
pub mod parser;
pub mod xref;

// Stream decoders
pub mod decoders;

// Encryption support
pub mod encryption;

// Incremental writing
pub mod writer;

// Page text runs
pub mod content;

// Field and context extraction
pub mod extract;

// Training evidence
pub mod training;

// Name grammar and decision engine
pub mod naming;

// Planning and safe modification
pub mod modify;

// Output artifacts
pub mod output;

// Configuration and the invocation surface
pub mod api;
pub mod config;

// Re-exports
pub use config::Options;
pub use document::Document;
pub use error::{Error, Result};
pub use extract::{Field, FieldContext, FieldKind};
pub use naming::{BemName, NameDecision};
pub use training::TrainingStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
