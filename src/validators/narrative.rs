//! The shared "narrative validator" math primitives (spec §4.4), used by
//! every format-specific validator instead of each reimplementing the
//! same metrics.

use super::tables::{BANNED_PHRASES, SENSORY_WORDS};
use crate::utils::text::{
    first_word, jaccard_similarity, mean_sentence_length, sentence_length_stddev,
    significant_keywords, split_sentences, whole_word_count, word_count, words,
};

/// One named metric check: did it pass, what number did it produce, and
/// (if it failed) the human-readable correction to paste verbatim into
/// the retry prompt (spec §4.4 "surgical feedback").
pub struct MetricCheck {
    pub name: &'static str,
    pub passed: bool,
    pub value: f64,
    pub correction: Option<String>,
}

fn check(name: &'static str, passed: bool, value: f64, correction: impl Into<String>) -> MetricCheck {
    MetricCheck {
        name,
        passed,
        value,
        correction: if passed { None } else { Some(correction.into()) },
    }
}

/// Gary-Provost rhythm: require stdDev ≥ `min_variance`.
pub fn sentence_variance(text: &str, min_variance: f64) -> MetricCheck {
    let sentences = split_sentences(text);
    let stddev = sentence_length_stddev(&sentences);
    check(
        "RHYTHM",
        stddev >= min_variance,
        stddev,
        format!(
            "Sentence variance {:.1} < {:.1}: vary sentence lengths more, combine or split sentences for rhythm.",
            stddev, min_variance
        ),
    )
}

/// Name density = (matches / words) × 100, capped at `max_density`.
pub fn name_density(text: &str, character_names: &[&str], max_density: f64) -> MetricCheck {
    let total_words = word_count(text).max(1);
    let matches: usize = character_names
        .iter()
        .map(|name| whole_word_count(text, name))
        .sum();
    let density = (matches as f64 / total_words as f64) * 100.0;
    check(
        "NAME OVERUSE",
        density <= max_density,
        density,
        format!(
            "Name density {:.1} > {:.1}: replace repeated character names with pronouns or epithets.",
            density, max_density
        ),
    )
}

/// Fraction of sentences with 5–12 words; flag if > 0.6.
pub fn staccato_ratio(text: &str) -> MetricCheck {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return check("STACCATO", true, 0.0, "");
    }
    let staccato = sentences
        .iter()
        .filter(|s| {
            let n = words(s).len();
            (5..=12).contains(&n)
        })
        .count();
    let ratio = staccato as f64 / sentences.len() as f64;
    check(
        "STACCATO",
        ratio <= 0.6,
        ratio,
        format!(
            "Staccato ratio {:.2} > 0.60: combine some short sentences into longer, flowing ones.",
            ratio
        ),
    )
}

/// Jaccard similarity of significant keyword sets between `text` and
/// `previous_text`; flag if > 0.4.
pub fn loop_detection(text: &str, previous_text: &str) -> MetricCheck {
    let current = significant_keywords(text);
    let previous = significant_keywords(previous_text);
    let similarity = jaccard_similarity(&current, &previous);
    check(
        "REPETITION",
        similarity <= 0.4,
        similarity,
        format!(
            "Loop similarity {:.2} > 0.40: this beat repeats too much of the prior content, introduce new material.",
            similarity
        ),
    )
}

/// Case-insensitive substring match over the banned-phrase table; flag
/// if more than 2 hits.
pub fn banned_phrases(text: &str) -> MetricCheck {
    let lower = text.to_lowercase();
    let hits: Vec<&str> = BANNED_PHRASES.iter().filter(|p| lower.contains(**p)).copied().collect();
    check(
        "AI TELLTALE",
        hits.len() <= 2,
        hits.len() as f64,
        format!(
            "{} banned phrase(s) found ({}): remove AI-telltale phrasing.",
            hits.len(),
            hits.join(", ")
        ),
    )
}

/// Longest run of sentences sharing an identical first word; flag > 2.
pub fn consecutive_same_starter(text: &str) -> MetricCheck {
    let sentences = split_sentences(text);
    let mut longest = 0usize;
    let mut current = 0usize;
    let mut last: Option<String> = None;
    for sentence in &sentences {
        let starter = first_word(sentence);
        if starter.is_some() && starter == last {
            current += 1;
        } else {
            current = 1;
        }
        longest = longest.max(current);
        last = starter;
    }
    check(
        "REPEATED STARTER",
        longest <= 2,
        longest as f64,
        format!(
            "{} consecutive sentences share the same opening word: vary sentence openers.",
            longest
        ),
    )
}

/// 4+1 rule: require at least one non-visual sensory word per ~300
/// words of beat text.
pub fn sensory_grounding(text: &str) -> MetricCheck {
    let total_words = word_count(text).max(1);
    let required = (total_words / 300).max(1);
    let lower = text.to_lowercase();
    let hits = SENSORY_WORDS.iter().filter(|w| lower.contains(*w)).count();
    check(
        "SENSORY GROUNDING",
        hits >= required,
        hits as f64,
        format!(
            "Only {} sensory-grounding word(s) found, need ≥{}: add a non-visual sensory detail (smell, touch, temperature, or sound).",
            hits, required
        ),
    )
}

/// Mean sentence length, a convenience used by the burstiness
/// post-processing stage as well as narrative reports.
pub fn mean_length(text: &str) -> f64 {
    mean_sentence_length(&split_sentences(text))
}
