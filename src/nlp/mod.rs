//! Command interpretation
//!
//! Turns a free-text utterance into an `(action, object)` pair:
//! utterance -> normalize -> salutation / synonym / verb matching -> ParseResult

pub mod normalizer;
pub mod parser;
pub mod rules;

pub use normalizer::{normalize, tokenize, NormalizedPhrase};
pub use parser::{IntentParser, ParseResult, SALUTATION_ACTION};
pub use rules::{RuleTables, Synonym};
