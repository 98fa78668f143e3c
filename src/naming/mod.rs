//! BEM name grammar, semantic rules and the name-decision engine.

mod engine;
mod grammar;
mod rules;

pub use engine::{DecisionSource, NameAction, NameDecision, NameEngine, NamingWarning};
pub use grammar::{normalize_loose, sanitize_token, BemName, MAX_NAME_LENGTH, RESERVED_BLOCKS};
pub use rules::rule_based_name;
