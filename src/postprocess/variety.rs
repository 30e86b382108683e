//! Stage 2: sentence-variety (spec §4.5 step 2) — detects runs of >2
//! consecutive same-first-word sentences and breaks them up using one
//! of three techniques (prepositional opener, combining short
//! sentences, splitting a medium sentence), then separately reduces the
//! pronoun-start ratio if it sits above threshold. Per DESIGN.md's Open
//! Question 3, only the neutral-opener table is used; the source's
//! clichéd fallback openers ("With a sigh,") are deliberately not
//! carried into the rewrite.

use crate::utils::text::first_word;
use crate::validators::tables::{NEUTRAL_OPENERS, PRONOUN_STARTERS, VARIETY_SPLIT_CONNECTORS};

const SHORT_MAX_WORDS: usize = 6;
const MEDIUM_MIN_WORDS: usize = 12;
const PRONOUN_RATIO_TARGET: f64 = 0.35;

fn split_with_terminators(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            out.push(current.trim().to_string());
            current.clear();
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn word_count(sentence: &str) -> usize {
    sentence.split_whitespace().count()
}

fn starts_with_pronoun(sentence: &str) -> bool {
    first_word(sentence).map(|w| PRONOUN_STARTERS.contains(&w.as_str())).unwrap_or(false)
}

/// Combines two consecutive short sentences sharing a subject into one,
/// eliding the repeated subject ("She ran. She jumped." → "She ran, and
/// jumped.").
fn combine_same_subject(prev: &str, current: &str) -> Option<String> {
    if word_count(prev) > SHORT_MAX_WORDS || word_count(current) > SHORT_MAX_WORDS {
        return None;
    }
    let prev_trimmed = prev.trim_end_matches(['.', '!', '?']);
    let mut parts = current.splitn(2, char::is_whitespace);
    parts.next()?;
    let rest = parts.next()?.trim();
    if rest.is_empty() {
        return None;
    }
    Some(format!("{prev_trimmed}, and {rest}"))
}

/// Splits a medium-length sentence at a connector into two shorter ones.
fn split_medium_sentence(sentence: &str) -> Option<(String, String)> {
    if word_count(sentence) < MEDIUM_MIN_WORDS {
        return None;
    }
    let terminator = sentence.chars().last().unwrap_or('.');
    for connector in VARIETY_SPLIT_CONNECTORS {
        if let Some(pos) = sentence.find(connector) {
            let first = sentence[..pos].trim();
            let rest = sentence[pos + connector.len()..].trim_end_matches(['.', '!', '?']).trim();
            if first.is_empty() || rest.is_empty() {
                continue;
            }
            let mut chars = rest.chars();
            let capped = match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => continue,
            };
            return Some((format!("{first}{terminator}"), format!("{capped}{terminator}")));
        }
    }
    None
}

/// Breaks up runs of more than 2 sentences sharing an opening word,
/// trying combine/split/prefix in rotation and falling back to the
/// prefix technique (which always applies) when the preferred one
/// doesn't fit the sentence at hand.
fn break_runs(sentences: Vec<String>) -> (Vec<String>, usize) {
    let mut out: Vec<String> = Vec::with_capacity(sentences.len());
    let mut last_starter: Option<String> = None;
    let mut run = 0usize;
    let mut edits = 0usize;
    let mut opener_idx = 0usize;
    let mut technique_idx = 0usize;

    for sentence in sentences {
        let starter = first_word(&sentence);
        if starter.is_some() && starter == last_starter {
            run += 1;
        } else {
            run = 1;
        }

        if run > 2 {
            let preferred = technique_idx % 3;
            technique_idx += 1;

            if preferred == 0 {
                if let Some(prev) = out.last() {
                    if let Some(combined) = combine_same_subject(prev, &sentence) {
                        *out.last_mut().unwrap() = combined;
                        edits += 1;
                        last_starter = starter;
                        run = 1;
                        continue;
                    }
                }
            } else if preferred == 1 {
                if let Some((first, second)) = split_medium_sentence(&sentence) {
                    out.push(first);
                    out.push(second);
                    edits += 1;
                    last_starter = first_word(&second);
                    run = 1;
                    continue;
                }
            }

            let opener = NEUTRAL_OPENERS[opener_idx % NEUTRAL_OPENERS.len()];
            opener_idx += 1;
            out.push(format!("{opener} {}", lowercase_first(&sentence)));
            edits += 1;
            last_starter = first_word(opener);
            run = 1;
        } else {
            last_starter = starter;
            out.push(sentence);
        }
    }

    (out, edits)
}

/// Reduces the pronoun-start ratio below `PRONOUN_RATIO_TARGET` by
/// prefixing a rotating neutral opener onto pronoun-starting sentences,
/// one at a time, until the ratio clears the threshold (spec §4.5 step
/// 2's "reduce pronoun-start ratio below a threshold").
fn reduce_pronoun_ratio(mut sentences: Vec<String>) -> (Vec<String>, usize) {
    let mut edits = 0usize;
    let mut opener_idx = 0usize;
    loop {
        let total = sentences.len();
        if total == 0 {
            break;
        }
        let pronoun_count = sentences.iter().filter(|s| starts_with_pronoun(s)).count();
        if (pronoun_count as f64 / total as f64) <= PRONOUN_RATIO_TARGET {
            break;
        }
        let Some(idx) = sentences.iter().position(|s| starts_with_pronoun(s)) else {
            break;
        };
        let opener = NEUTRAL_OPENERS[opener_idx % NEUTRAL_OPENERS.len()];
        opener_idx += 1;
        sentences[idx] = format!("{opener} {}", lowercase_first(&sentences[idx]));
        edits += 1;
    }
    (sentences, edits)
}

pub fn fix(text: &str) -> (String, usize) {
    let sentences = split_with_terminators(text);
    if sentences.len() < 3 {
        return (text.to_string(), 0);
    }

    let (sentences, run_edits) = break_runs(sentences);
    let (sentences, ratio_edits) = reduce_pronoun_ratio(sentences);

    (sentences.join(" "), run_edits + ratio_edits)
}
