//! Phrase normalization and tokenization
//!
//! Normalization lowercases, trims and composes the phrase to NFC, so a
//! decomposed "e" + U+0301 compares equal to the "é" written in rule tables.
//!
//! Tokenization rule: a token is a maximal run of grapheme clusters whose
//! base character is alphanumeric (Unicode aware, so accented letters and any
//! combining marks belong to words). The ASCII apostrophe and hyphen stay
//! inside a token when they sit between two word graphemes, so "s'il",
//! "l'album" and "peux-tu" are single tokens. Every other grapheme is a
//! boundary and is dropped, including the typographic apostrophe: "s’il"
//! yields "s" and "il".

use std::fmt;

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Lowercased, trimmed form of a raw utterance
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedPhrase(String);

impl NormalizedPhrase {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for NormalizedPhrase {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase the whole utterance, trim surrounding whitespace and compose to NFC
pub fn normalize(utterance: &str) -> NormalizedPhrase {
    NormalizedPhrase(utterance.to_lowercase().trim().nfc().collect())
}

/// Split a normalized phrase into word tokens, left to right
pub fn tokenize(phrase: &NormalizedPhrase) -> Vec<&str> {
    split_words(phrase.as_str())
}

fn is_joiner(grapheme: &str) -> bool {
    grapheme == "'" || grapheme == "-"
}

/// Combining marks ride along with their base character
fn is_word(grapheme: &str) -> bool {
    grapheme.chars().next().is_some_and(char::is_alphanumeric)
}

pub(crate) fn split_words(text: &str) -> Vec<&str> {
    let graphemes: Vec<(usize, &str)> = text.grapheme_indices(true).collect();
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &(pos, g)) in graphemes.iter().enumerate() {
        // A joiner only continues a token already open and followed by a word grapheme
        let in_word = is_word(g)
            || (is_joiner(g)
                && start.is_some()
                && graphemes.get(i + 1).is_some_and(|&(_, next)| is_word(next)));

        match (in_word, start) {
            (true, None) => start = Some(pos),
            (false, Some(s)) => {
                tokens.push(&text[s..pos]);
                start = None;
            }
            _ => {}
        }
    }

    if let Some(s) = start {
        tokens.push(&text[s..]);
    }

    tokens
}
