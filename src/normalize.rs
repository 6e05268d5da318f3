//! Transcript normalization
//!
//! Pure text transforms applied to recognizer output before matching.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const NUMBER_WORDS: [(&str, &str); 21] = [
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
    ("thirteen", "13"),
    ("fourteen", "14"),
    ("fifteen", "15"),
    ("sixteen", "16"),
    ("seventeen", "17"),
    ("eighteen", "18"),
    ("nineteen", "19"),
    ("twenty", "20"),
];

static NUMBER_WORD: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<&str> = NUMBER_WORDS.iter().map(|(word, _)| *word).collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).expect("number word regex")
});

static SPOKEN_AT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+at\s+").expect("spoken at regex"));

static SPOKEN_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+dot\s+").expect("spoken dot regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Lower-case `text` and replace whole-word number names 0..=20 with numerals.
///
/// Words that merely contain a number name ("someone", "often") are left
/// alone.
pub fn normalize_spoken_numbers(text: &str) -> String {
    let lowered = text.to_lowercase();
    NUMBER_WORD
        .replace_all(&lowered, |caps: &Captures| {
            let word = &caps[0];
            NUMBER_WORDS
                .iter()
                .find(|(name, _)| *name == word)
                .map(|(_, digits)| (*digits).to_string())
                .unwrap_or_else(|| word.to_string())
        })
        .into_owned()
}

/// Turn a dictated address ("john dot doe at gmail dot com") into email syntax.
///
/// Only applied by actions that expect an address, never before matching.
pub fn normalize_spoken_email(text: &str) -> String {
    let lowered = text.to_lowercase();
    let with_at = SPOKEN_AT.replace_all(&lowered, "@");
    let with_dot = SPOKEN_DOT.replace_all(&with_at, ".");
    WHITESPACE.replace_all(&with_dot, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_replaced_as_whole_words() {
        assert_eq!(normalize_spoken_numbers("read email thirteen"), "read email 13");
        assert_eq!(normalize_spoken_numbers("Open Email Three"), "open email 3");
        assert_eq!(normalize_spoken_numbers("zero one twenty"), "0 1 20");
    }

    #[test]
    fn test_numbers_inside_words_untouched() {
        assert_eq!(normalize_spoken_numbers("someone called"), "someone called");
        assert_eq!(normalize_spoken_numbers("often tone"), "often tone");
        assert_eq!(normalize_spoken_numbers("network"), "network");
    }

    #[test]
    fn test_numbers_idempotent() {
        for input in [
            "read email thirteen",
            "someone sent two messages",
            "Twenty ONE",
            "",
            "already 12 normal",
        ] {
            let once = normalize_spoken_numbers(input);
            assert_eq!(normalize_spoken_numbers(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_email_address() {
        assert_eq!(
            normalize_spoken_email("John dot Doe at Gmail dot com"),
            "john.doe@gmail.com"
        );
        assert_eq!(normalize_spoken_email("  alice at example dot org "), "alice@example.org");
    }

    #[test]
    fn test_email_keeps_embedded_words() {
        // "at" and "dot" inside a word are not separators
        assert_eq!(normalize_spoken_email("kat at dotty dot io"), "kat@dotty.io");
    }

    #[test]
    fn test_email_idempotent() {
        let once = normalize_spoken_email("bob smith at mail dot example dot com");
        assert_eq!(once, "bobsmith@mail.example.com");
        assert_eq!(normalize_spoken_email(&once), once);
    }
}
