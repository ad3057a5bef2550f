//! Word list and postal code extraction for auxiliary scoring signals.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").unwrap());
static POSTAL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]{5}\b").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    pub words: Vec<String>,
    pub postal_code: Option<String>,
}

/// Tokens longer than two characters, lowercased, with punctuation removed.
///
/// Length is checked before stripping, so a run of punctuation such as
/// `"..."` survives as an empty word. District scoring counts it.
pub fn words(address: &str) -> Vec<String> {
    WORD_SPLIT
        .split(address)
        .filter(|t| t.chars().count() > 2)
        .map(|t| {
            t.to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
                .collect::<String>()
        })
        .collect()
}

/// First standalone five-digit number, if any.
pub fn postal_code(address: &str) -> Option<String> {
    POSTAL_CODE.find(address).map(|m| m.as_str().to_string())
}

pub fn tokenize(address: &str) -> Tokens {
    Tokens {
        words: words(address),
        postal_code: postal_code(address),
    }
}
