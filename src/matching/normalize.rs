// src/matching/normalize.rs
// Text normalization shared by the classifier, the exclusion gate and the lexical scorer.

use std::collections::HashSet;

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;

const MIN_TOKEN_LENGTH: usize = 2;

pub const STOPWORDS: [&str; 6] = ["the", "with", "and", "for", "pack", "of"];

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid non-alphanumeric regex"));

/// A product name or listing title reduced to comparable tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText {
    /// Surviving tokens joined by single spaces, in their original order.
    pub cleaned: String,
    pub tokens: HashSet<String>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in original order, duplicates included.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.cleaned.split_whitespace()
    }

    pub fn contains_keyword(&self, keyword: &Keyword) -> bool {
        match keyword.words.as_slice() {
            [] => false,
            [single] => self.tokens.iter().any(|t| matches_word(t, single)),
            phrase => {
                let words: Vec<&str> = self.words().collect();
                words.windows(phrase.len()).any(|window| {
                    window
                        .iter()
                        .zip(phrase.iter())
                        .enumerate()
                        .all(|(i, (token, expected))| {
                            if i + 1 == phrase.len() {
                                matches_word(token, expected)
                            } else {
                                *token == expected.as_str()
                            }
                        })
                })
            }
        }
    }
}

/// A trigger keyword or exclusion term, normalized the same way as the text it is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub raw: String,
    words: Vec<String>,
}

impl Keyword {
    /// `None` when nothing survives normalization (e.g. "of" or "-").
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            words: normalized.words().map(str::to_string).collect(),
        })
    }

    pub fn is_phrase(&self) -> bool {
        self.words.len() > 1
    }
}

/// Parses a keyword list, silently dropping entries that normalize to nothing.
pub fn parse_keywords<S: AsRef<str>>(raw: &[S]) -> Vec<Keyword> {
    raw.iter().filter_map(|k| Keyword::parse(k.as_ref())).collect()
}

// Plain plural forms only: "sunglass" matches "sunglasses", "mug" matches "mugs".
fn matches_word(token: &str, keyword: &str) -> bool {
    match token.strip_prefix(keyword) {
        Some(rest) => rest.is_empty() || rest == "s" || rest == "es",
        None => false,
    }
}

pub fn normalize(text: &str) -> NormalizedText {
    let ascii = deunicode(text).to_lowercase();
    let spaced = NON_ALPHANUMERIC.replace_all(&ascii, " ");

    let words: Vec<&str> = spaced
        .split_whitespace()
        .filter(|w| w.len() >= MIN_TOKEN_LENGTH && !STOPWORDS.contains(w))
        .collect();

    NormalizedText {
        cleaned: words.join(" "),
        tokens: words.iter().map(|w| w.to_string()).collect(),
    }
}
