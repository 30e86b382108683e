//! Stage 3: burstiness (spec §4.5 step 3) — stdDev/mean of sentence
//! lengths. If below target (too uniform), split a medium sentence at
//! its connector to inject a short, punchy follow-up clause. If above
//! an upper bound (too choppy, all short sentences), combine
//! consecutive same-subject mediums into one longer flowing sentence
//! via shared-subject elision, the inverse of the low-burstiness fix.

use crate::utils::text::first_word;

const TARGET_BURSTINESS: f64 = 0.4;
const CHOPPY_BURSTINESS: f64 = 1.4;
const SHORT_MAX_WORDS: usize = 8;
const CONNECTORS: &[&str] = &[", and ", ", but ", ", while ", ", as "];
const COMBINE_CONNECTORS: &[&str] = &["; ", ", and ", ", while ", ", before ", ", as "];

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

fn split_at_connector(sentence: &str) -> Option<(String, String)> {
    let terminator = sentence.chars().last().unwrap_or('.');
    for connector in CONNECTORS {
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

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn measure_burstiness(sentences: &[String]) -> Option<f64> {
    let lengths: Vec<f64> = sentences.iter().map(|s| s.split_whitespace().count() as f64).collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    if mean == 0.0 {
        return None;
    }
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    Some(variance.sqrt() / mean)
}

/// Combines the first adjacent pair of short sentences that share a
/// subject (same opening word), eliding the repeated subject on the
/// first available connector. Tries the semicolon join (no elision,
/// subject kept) before the elided "and/while/before/as" forms.
fn combine_same_subject_pair(prev: &str, current: &str) -> Option<String> {
    if prev.split_whitespace().count() > SHORT_MAX_WORDS || current.split_whitespace().count() > SHORT_MAX_WORDS {
        return None;
    }
    if first_word(prev) != first_word(current) || first_word(prev).is_none() {
        return None;
    }
    let prev_trimmed = prev.trim_end_matches(['.', '!', '?']);
    for connector in COMBINE_CONNECTORS {
        if *connector == "; " {
            return Some(format!("{prev_trimmed}{connector}{}", lowercase_first(current)));
        }
        let mut parts = current.splitn(2, char::is_whitespace);
        parts.next();
        let rest = parts.next()?.trim();
        if rest.is_empty() {
            continue;
        }
        return Some(format!("{prev_trimmed}{connector}{rest}"));
    }
    None
}

/// Splits at most one medium sentence per call when burstiness falls
/// below target (too uniform), or combines at most one same-subject
/// pair when it rises above `CHOPPY_BURSTINESS` (too choppy) — bounded,
/// line-level, deterministic, and the two are each other's inverse.
pub fn inject(text: &str) -> (String, usize) {
    let sentences = split_with_terminators(text);
    if sentences.len() < 2 {
        return (text.to_string(), 0);
    }

    let Some(burstiness) = measure_burstiness(&sentences) else {
        return (text.to_string(), 0);
    };

    if burstiness < TARGET_BURSTINESS {
        let mut out = Vec::with_capacity(sentences.len() + 1);
        let mut edits = 0;
        let mut done = false;
        for sentence in sentences {
            if !done {
                if let Some((first, second)) = split_at_connector(&sentence) {
                    out.push(first);
                    out.push(second);
                    edits += 1;
                    done = true;
                    continue;
                }
            }
            out.push(sentence);
        }
        return (out.join(" "), edits);
    }

    if burstiness > CHOPPY_BURSTINESS {
        let mut out: Vec<String> = Vec::with_capacity(sentences.len());
        let mut edits = 0;
        for sentence in sentences {
            if edits == 0 {
                if let Some(prev) = out.last() {
                    if let Some(combined) = combine_same_subject_pair(prev, &sentence) {
                        *out.last_mut().unwrap() = combined;
                        edits += 1;
                        continue;
                    }
                }
            }
            out.push(sentence);
        }
        return (out.join(" "), edits);
    }

    (text.to_string(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_a_connector_sentence_when_burstiness_is_low() {
        let text = "She walked in. She sat down. She opened the book, and she began to read quietly.";
        let (out, edits) = inject(text);
        assert_eq!(edits, 1);
        assert_ne!(out, text);
    }

    #[test]
    fn leaves_already_bursty_text_untouched() {
        let text = "Rain. The old house groaned under decades of silence and neglect, creaking with every gust.";
        let (_out, edits) = inject(text);
        assert_eq!(edits, 0);
    }

    #[test]
    fn combines_choppy_same_subject_sentences_when_burstiness_is_high() {
        let text = "He ran. He hid. He froze. The old garden stretched long beyond the fence past fields \
                     and hills where birds once sang each morning under bright skies while rivers ran \
                     quietly through valleys full of flowers that bloomed each spring before the frost \
                     arrived and stayed until the following thaw every single year without fail for \
                     decades and decades.";
        let (out, edits) = inject(text);
        assert_eq!(edits, 1);
        assert!(out.contains("He ran; he hid."));
    }
}
