//! Text normalization and tokenization
//!
//! Every text, at training and at inference time, goes through
//! [`normalize`] before it reaches the vectorizer. The steps run in a fixed
//! order:
//!
//! 1. lowercase
//! 2. `\r` and `\n` become spaces
//! 3. URLs (`http://`, `https://`, `www.` followed by non-whitespace) are removed
//! 4. ASCII punctuation is removed without replacement, so `"free!money"`
//!    becomes `"freemoney"`
//! 5. whitespace runs collapse to a single space and the ends are trimmed

pub mod stopwords;

pub use self::stopwords::{is_stop_word, ENGLISH_STOP_WORDS};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref URL_PATTERN: Regex = Regex::new(r"https?://\S+|www\.\S+").unwrap();
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

/// Map raw text to its canonical form
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let single_line = lowered.replace(['\r', '\n'], " ");
    let without_urls = URL_PATTERN.replace_all(&single_line, "");
    let without_punctuation: String = without_urls
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    without_punctuation
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split normalized text into terms of at least two word characters
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    TOKEN_PATTERN.find_iter(text).map(|m| m.as_str())
}
