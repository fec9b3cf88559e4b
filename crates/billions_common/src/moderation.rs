//! Community chat filtering.
//!
//! Flags blocked words and links, and produces a sanitized copy of a message.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const BAD_WORDS: &[&str] = &[
    "badword1",
    "badword2",
    "offensive1",
    "inappropriate",
    "spam",
    "hate",
    "abuse",
    "violence",
    "explicit",
];

pub const VIOLATION_BAD_WORD: &str = "bad_word";
pub const VIOLATION_LINK: &str = "link_detected";

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://\S+|www\.\S+").expect("link pattern is valid")
});

static BAD_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = BAD_WORDS
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("word list pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationReport {
    pub is_clean: bool,
    pub violations: Vec<&'static str>,
}

/// Substring match for blocked words (reported once), plus link detection
pub fn check_message_content(message: &str) -> ModerationReport {
    let mut violations = Vec::new();
    let lower = message.to_lowercase();

    if BAD_WORDS.iter().any(|word| lower.contains(word)) {
        violations.push(VIOLATION_BAD_WORD);
    }
    if LINK_RE.is_match(message) {
        violations.push(VIOLATION_LINK);
    }

    ModerationReport {
        is_clean: violations.is_empty(),
        violations,
    }
}

/// Replace links with a marker and whole blocked words with asterisks
pub fn sanitize_message(message: &str) -> String {
    let without_links = LINK_RE.replace_all(message, "[link removed]");
    BAD_WORD_RE
        .replace_all(&without_links, |caps: &regex::Captures<'_>| {
            "*".repeat(caps[0].chars().count())
        })
        .into_owned()
}
