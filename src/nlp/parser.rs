//! Resolve an utterance into an `(action, object)` pair
//!
//! Precedence, first match wins:
//! 1. the whole phrase is a salutation
//! 2. a synonym fragment is contained in the phrase (table order)
//! 3. the first token that is a known verb
//!
//! For verb commands the object is every remaining token that is neither a
//! stopword nor the matched verb. Every occurrence of the verb token is
//! removed, not only the one that selected the action.

use serde::Serialize;

use crate::nlp::normalizer::{normalize, tokenize};
use crate::nlp::rules::RuleTables;

/// Action emitted when the whole phrase is a greeting
pub const SALUTATION_ACTION: &str = "salutation";

/// Structured result of interpreting one utterance
///
/// Either both fields are absent (nothing recognized) or the action is set
/// and the object is a string, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    action: Option<String>,
    object: Option<String>,
}

impl ParseResult {
    /// No command recognized
    pub fn unrecognized() -> Self {
        Self::default()
    }

    /// A recognized action with its payload (empty when there is none)
    pub fn command(action: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            object: Some(object.into()),
        }
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    pub fn is_recognized(&self) -> bool {
        self.action.is_some()
    }
}

/// Stateless interpreter over a fixed set of rule tables
///
/// Safe to share between threads: parsing only reads the tables.
#[derive(Debug, Clone)]
pub struct IntentParser {
    rules: RuleTables,
}

impl IntentParser {
    pub fn new(rules: RuleTables) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    /// Interpret an utterance. Never fails.
    pub fn parse(&self, utterance: &str) -> ParseResult {
        let phrase = normalize(utterance);

        if self.rules.is_salutation(phrase.as_str()) {
            tracing::debug!(phrase = %phrase, "matched salutation");
            return ParseResult::command(SALUTATION_ACTION, "");
        }

        if let Some(action) = self.rules.synonym_for(phrase.as_str()) {
            tracing::debug!(phrase = %phrase, action, "matched synonym");
            return ParseResult::command(action, "");
        }

        let tokens = tokenize(&phrase);
        let Some((verb, action)) = tokens.iter().find_map(|&token| {
            self.rules
                .verb_action(token)
                .map(|action| (token, action))
        }) else {
            tracing::debug!(phrase = %phrase, "no command recognized");
            return ParseResult::unrecognized();
        };

        let object = tokens
            .iter()
            .copied()
            .filter(|&token| token != verb && !self.rules.is_stopword(token))
            .collect::<Vec<_>>()
            .join(" ");

        tracing::debug!(phrase = %phrase, verb, action, object = %object, "matched verb");
        ParseResult::command(action, object)
    }
}
