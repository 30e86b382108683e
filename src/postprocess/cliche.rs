//! Stage 1: AI-cliché remover (spec §4.5) — pattern-based deletion of
//! fixed openers, transitions, and fillers.

use crate::validators::tables::BANNED_PHRASES;
use once_cell::sync::Lazy;
use regex::Regex;

static FILLER_OPENERS: &[&str] = &[
    "In conclusion, ",
    "In summary, ",
    "It is worth noting that ",
    "Needless to say, ",
    "As we all know, ",
];

static BANNED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    BANNED_PHRASES
        .iter()
        .map(|phrase| Regex::new(&format!(r"(?i){}", regex::escape(phrase))).unwrap())
        .collect()
});

/// Deletes banned AI-telltale phrases and filler openers, collapsing
/// the whitespace left behind. Returns the cleaned text and a count of
/// removals for telemetry.
pub fn remove(text: &str) -> (String, usize) {
    let mut out = text.to_string();
    let mut count = 0;

    for opener in FILLER_OPENERS {
        while let Some(pos) = out.find(opener) {
            out.replace_range(pos..pos + opener.len(), "");
            count += 1;
        }
    }

    for pattern in BANNED_PATTERNS.iter() {
        let replaced = pattern.replace_all(&out, "");
        if replaced != out {
            count += pattern.find_iter(&out).count();
            out = replaced.into_owned();
        }
    }

    let collapsed: String = out.split_whitespace().collect::<Vec<_>>().join(" ");
    (collapsed, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_banned_phrase() {
        let (cleaned, count) = remove("It was a testament to her will that she kept walking.");
        assert!(!cleaned.to_lowercase().contains("a testament to"));
        assert_eq!(count, 1);
    }

    #[test]
    fn strips_filler_opener() {
        let (cleaned, count) = remove("In conclusion, the house stood empty.");
        assert_eq!(cleaned, "the house stood empty.");
        assert_eq!(count, 1);
    }

    #[test]
    fn leaves_clean_text_untouched() {
        let (cleaned, count) = remove("She walked into the quiet kitchen and poured the tea.");
        assert_eq!(count, 0);
        assert_eq!(cleaned, "She walked into the quiet kitchen and poured the tea.");
    }
}
