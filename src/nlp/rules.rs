//! Rule tables driving command interpretation
//!
//! The tables are read from TOML once, validated, and never mutated
//! afterwards. The built-in French vocabulary is embedded from
//! `data/rules.toml`; a replacement file can be loaded at startup.

use ahash::{AHashMap, AHashSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::error::{GigiError, Result};
use crate::nlp::normalizer::{normalize, split_words};

const BUILTIN_RULES: &str = include_str!("../../data/rules.toml");

/// A multi-word fragment that selects an action when contained in a phrase
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Synonym {
    pub phrase: String,
    pub action: String,
}

/// Immutable vocabulary used by the intent parser
#[derive(Debug, Clone)]
pub struct RuleTables {
    salutations: AHashSet<String>,
    /// Ordered: the first fragment found in the phrase wins
    synonyms: Vec<Synonym>,
    /// Verb token -> action identifier
    verbs: AHashMap<String, String>,
    stopwords: AHashSet<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    #[serde(default)]
    salutations: Vec<String>,
    #[serde(default)]
    synonyms: Vec<Synonym>,
    verbs: VerbsSection,
    #[serde(default)]
    stopwords: StopwordsSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VerbsSection {
    actions: Vec<String>,
    /// Extra token -> existing verb action
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StopwordsSection {
    #[serde(default)]
    language: Vec<String>,
    #[serde(default)]
    domain: Vec<String>,
}

impl RuleTables {
    /// The French vocabulary shipped with the assistant
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    /// Parse and validate rule tables from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RulesFile = toml::from_str(content)?;
        let errors = file.validate();
        if !errors.is_empty() {
            return Err(GigiError::InvalidRules(errors.join("; ")));
        }
        Ok(file.into_tables())
    }

    /// Load rule tables from a TOML file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let tables = Self::from_toml_str(&content)
            .map_err(|e| GigiError::InvalidRules(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            "Loaded rule tables from {} ({} synonyms, {} verbs, {} stopwords)",
            path.display(),
            tables.synonyms.len(),
            tables.verbs.len(),
            tables.stopwords.len()
        );
        Ok(tables)
    }

    /// Whether the whole phrase is a greeting
    pub fn is_salutation(&self, phrase: &str) -> bool {
        self.salutations.contains(phrase)
    }

    /// Action of the first synonym fragment contained in the phrase
    pub fn synonym_for(&self, phrase: &str) -> Option<&str> {
        self.synonyms
            .iter()
            .find(|s| phrase.contains(s.phrase.as_str()))
            .map(|s| s.action.as_str())
    }

    /// Action named by a verb token
    pub fn verb_action(&self, token: &str) -> Option<&str> {
        self.verbs.get(token).map(String::as_str)
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn synonyms(&self) -> &[Synonym] {
        &self.synonyms
    }

    pub fn stopwords(&self) -> impl Iterator<Item = &str> {
        self.stopwords.iter().map(String::as_str)
    }

    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.verbs.keys().map(String::as_str)
    }
}

impl RulesFile {
    /// Collect every problem instead of stopping at the first one
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for salutation in &self.salutations {
            check_normalized("salutation", salutation, &mut errors);
        }

        for (i, synonym) in self.synonyms.iter().enumerate() {
            check_normalized("synonym", &synonym.phrase, &mut errors);
            if synonym.action.trim().is_empty() {
                errors.push(format!("synonym {:?} has an empty action", synonym.phrase));
            }

            for earlier in &self.synonyms[..i] {
                if earlier.phrase == synonym.phrase {
                    errors.push(format!("duplicate synonym {:?}", synonym.phrase));
                } else if !earlier.phrase.is_empty() && synonym.phrase.contains(&earlier.phrase) {
                    errors.push(format!(
                        "synonym {:?} is shadowed by earlier {:?}",
                        synonym.phrase, earlier.phrase
                    ));
                }
            }
        }

        if self.verbs.actions.is_empty() {
            errors.push("at least one verb is required".into());
        }
        for verb in &self.verbs.actions {
            check_token("verb", verb, &mut errors);
        }
        for (alias, action) in &self.verbs.aliases {
            check_token("verb alias", alias, &mut errors);
            if self.verbs.actions.contains(alias) {
                errors.push(format!("alias {:?} is already a verb", alias));
            }
            if !self.verbs.actions.contains(action) {
                errors.push(format!("alias {:?} targets unknown verb {:?}", alias, action));
            }
        }

        for stopword in self.stopwords.language.iter().chain(&self.stopwords.domain) {
            check_token("stopword", stopword, &mut errors);
        }

        errors
    }

    fn into_tables(self) -> RuleTables {
        let mut verbs: AHashMap<String, String> = self
            .verbs
            .actions
            .into_iter()
            .map(|verb| (verb.clone(), verb))
            .collect();
        verbs.extend(self.verbs.aliases);

        RuleTables {
            salutations: self.salutations.into_iter().collect(),
            synonyms: self.synonyms,
            verbs,
            stopwords: self
                .stopwords
                .language
                .into_iter()
                .chain(self.stopwords.domain)
                .collect(),
        }
    }
}

/// Entries are matched against normalized phrases, so anything else could never match
fn check_normalized(kind: &str, entry: &str, errors: &mut Vec<String>) {
    if entry.is_empty() {
        errors.push(format!("empty {}", kind));
    } else if normalize(entry).as_str() != entry {
        errors.push(format!("{} {:?} is not normalized (lower case, trimmed, NFC)", kind, entry));
    }
}

fn check_token(kind: &str, entry: &str, errors: &mut Vec<String>) {
    check_normalized(kind, entry, errors);
    if !entry.is_empty() && split_words(entry) != [entry] {
        errors.push(format!("{} {:?} is not a single token", kind, entry));
    }
}
