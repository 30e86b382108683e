//! Format extension for prose books (novel/children): dialogue ratio,
//! fancy-tag ratio, paragraph-length distribution, paragraph-starter
//! repetition (spec §4.4 "Book").

use super::narrative::MetricCheck;
use super::tables::FANCY_ATTRIBUTION_VERBS;
use crate::utils::text::{first_word, word_count};

fn check(name: &'static str, passed: bool, value: f64, correction: impl Into<String>) -> MetricCheck {
    MetricCheck {
        name,
        passed,
        value,
        correction: if passed { None } else { Some(correction.into()) },
    }
}

fn paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// Fraction of dialogue lines (containing a quotation mark) among
/// paragraphs; only evaluated when dialogue is present at all.
pub fn dialogue_ratio(text: &str) -> MetricCheck {
    let paras = paragraphs(text);
    if paras.is_empty() {
        return check("DIALOGUE RATIO", true, 0.0, "");
    }
    let dialogue_count = paras.iter().filter(|p| p.contains('"') || p.contains('\u{201c}')).count();
    if dialogue_count == 0 {
        return check("DIALOGUE RATIO", true, 0.0, "");
    }
    let ratio = dialogue_count as f64 / paras.len() as f64;
    check(
        "DIALOGUE RATIO",
        (0.1..=0.7).contains(&ratio),
        ratio,
        format!(
            "Dialogue ratio {:.2} is outside 0.10-0.70: rebalance dialogue against narration.",
            ratio
        ),
    )
}

/// Cap on fancy attribution verbs ("exclaimed", "interjected", ...) per
/// 1000 words.
pub fn fancy_tag_ratio(text: &str) -> MetricCheck {
    let lower = text.to_lowercase();
    let hits = FANCY_ATTRIBUTION_VERBS.iter().filter(|v| lower.contains(**v)).count();
    let per_thousand = hits as f64 / (word_count(text).max(1) as f64 / 1000.0);
    check(
        "FANCY TAGS",
        per_thousand <= 3.0,
        per_thousand,
        format!(
            "{:.1} fancy attribution verbs per 1000 words: use \"said\" or an action beat instead.",
            per_thousand
        ),
    )
}

/// Reject if more than half of paragraphs exceed 150 words.
pub fn paragraph_length_distribution(text: &str) -> MetricCheck {
    let paras = paragraphs(text);
    if paras.is_empty() {
        return check("PARAGRAPH LENGTH", true, 0.0, "");
    }
    let long_count = paras.iter().filter(|p| word_count(p) > 150).count();
    let ratio = long_count as f64 / paras.len() as f64;
    check(
        "PARAGRAPH LENGTH",
        ratio <= 0.5,
        ratio,
        format!(
            "{:.0}% of paragraphs exceed 150 words: break up long paragraphs.",
            ratio * 100.0
        ),
    )
}

/// Longest run of paragraphs sharing the same opening word.
pub fn paragraph_starter_repetition(text: &str) -> MetricCheck {
    let paras = paragraphs(text);
    let mut longest = 0usize;
    let mut current = 0usize;
    let mut last: Option<String> = None;
    for para in &paras {
        let starter = first_word(para);
        if starter.is_some() && starter == last {
            current += 1;
        } else {
            current = 1;
        }
        longest = longest.max(current);
        last = starter;
    }
    check(
        "PARAGRAPH STARTER",
        longest <= 2,
        longest as f64,
        format!(
            "{} consecutive paragraphs open with the same word: vary paragraph openers.",
            longest
        ),
    )
}

pub fn checks(text: &str) -> Vec<MetricCheck> {
    vec![
        dialogue_ratio(text),
        fancy_tag_ratio(text),
        paragraph_length_distribution(text),
        paragraph_starter_repetition(text),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_paragraphs_that_are_mostly_too_long() {
        let long_para = "word ".repeat(160);
        let text = format!("{long_para}\n\n{long_para}\n\nShort one.");
        let result = paragraph_length_distribution(&text);
        assert!(!result.passed);
    }

    #[test]
    fn dialogue_ratio_passes_with_no_dialogue_present() {
        let result = dialogue_ratio("Narration only, no quotes anywhere in this paragraph.");
        assert!(result.passed);
    }
}
