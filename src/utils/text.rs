//! Shared text primitives used by the validators and post-processing
//! pipeline: sentence splitting, word counting, stopword filtering.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Splits `text` into sentences on `.!?`, trimming whitespace and
/// dropping empties. Does not attempt to handle abbreviations specially
/// — matching spec §4.4's plain description of the metric.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

pub fn words(sentence: &str) -> Vec<&str> {
    sentence.split_whitespace().collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn first_word(sentence: &str) -> Option<String> {
    sentence
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
}

/// Population standard deviation of sentence word-counts (the
/// Gary-Provost rhythm metric, spec §4.4).
pub fn sentence_length_stddev(sentences: &[String]) -> f64 {
    if sentences.is_empty() {
        return 0.0;
    }
    let lengths: Vec<f64> = sentences.iter().map(|s| words(s).len() as f64).collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    variance.sqrt()
}

pub fn mean_sentence_length(sentences: &[String]) -> f64 {
    if sentences.is_empty() {
        return 0.0;
    }
    let lengths: Vec<f64> = sentences.iter().map(|s| words(s).len() as f64).collect();
    lengths.iter().sum::<f64>() / lengths.len() as f64
}

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "that", "with", "from", "this", "have", "were", "they", "there", "their",
        "which", "would", "could", "about", "into", "your", "them", "then", "than", "been",
        "when", "what", "will", "just", "like", "over", "again", "once", "only", "very", "some",
        "such", "being", "here", "more", "most", "after", "before", "while", "each", "other",
    ]
    .into_iter()
    .collect()
});

/// Significant keyword set for loop detection (spec §4.4): lowercase
/// words, length ≥ 4, stop-words removed.
pub fn significant_keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() >= 4 && !STOP_WORDS.contains(w.as_str()))
        .collect()
}

/// Jaccard similarity between two keyword sets (spec §4.4).
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Counts whole-word, case-insensitive occurrences of `needle` in `text`.
pub fn whole_word_count(text: &str, needle: &str) -> usize {
    let needle_lower = needle.to_lowercase();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.to_lowercase() == needle_lower)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_sentences_on_terminators() {
        let sentences = split_sentences("The door creaked. She paused! Who was there?");
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn stddev_is_zero_for_uniform_lengths() {
        let sentences = vec!["one two three".to_string(), "four five six".to_string()];
        assert_eq!(sentence_length_stddev(&sentences), 0.0);
    }

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let a: HashSet<String> = ["alpha".to_string(), "bravo".to_string()].into_iter().collect();
        assert_eq!(jaccard_similarity(&a, &a), 1.0);
    }

    #[test]
    fn significant_keywords_drops_short_and_stop_words() {
        let kws = significant_keywords("The cat sat on the mat and then the dog barked loudly");
        assert!(!kws.contains("the"));
        assert!(!kws.contains("cat")); // length 3, dropped
        assert!(kws.contains("barked"));
    }
}
