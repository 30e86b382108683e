//! Stage 5: name-frequency enforcer (spec §4.5 step 5) — runs last
//! because it needs stable text. Text is segmented on scene breaks
//! first; within each segment the first mention of a name always stays,
//! and later mentions closer than `TARGET_SEPARATION` words are swapped
//! for a pronoun, except inside dialogue or in attribution position.
//! Pronoun choice consults the character's gender (spec: "honoring
//! same-gender disambiguation") — when two or more characters in the
//! cast share a gender, that gender's pronoun is ambiguous, so those
//! characters fall back to the neutral "they"/"them" instead.

use crate::utils::text::word_count;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const TARGET_SEPARATION: usize = 25;

/// A scene break is either an explicit marker line (`***`, `* * *`,
/// `---`) or a run of two or more blank lines — more than the single
/// blank line that separates ordinary paragraphs.
static SCENE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\n[ \t]*\n[ \t]*\n+|\n[ \t]*(?:\*\s*\*\s*\*+|-{3,})[ \t]*\n").unwrap());

/// A name/gender pair, as known to the per-book character state (spec
/// §4.3's `CharacterFact.gender`).
#[derive(Debug, Clone, Copy)]
pub struct CharacterRef<'a> {
    pub name: &'a str,
    pub gender: Option<&'a str>,
}

fn normalize_gender(gender: Option<&str>) -> Option<&'static str> {
    match gender.map(str::to_lowercase).as_deref() {
        Some("male") | Some("man") | Some("m") => Some("male"),
        Some("female") | Some("woman") | Some("f") => Some("female"),
        _ => None,
    }
}

fn gendered_pronoun(key: &str, capitalized: bool) -> &'static str {
    match (key, capitalized) {
        ("male", true) => "He",
        ("male", false) => "he",
        ("female", true) => "She",
        ("female", false) => "she",
        (_, true) => "They",
        (_, false) => "they",
    }
}

fn is_inside_quote(text: &str, pos: usize) -> bool {
    text[..pos].matches('"').count() % 2 == 1
}

fn is_attribution_position(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end();
    before.ends_with('"') || before.ends_with(',')
}

/// Splits `text` into scene segments, pairing each with the separator
/// text that followed it (empty for the last segment) so the original
/// spacing/markers can be reassembled unchanged.
fn split_scene_segments(text: &str) -> Vec<(String, String)> {
    let mut segments = Vec::new();
    let mut last_end = 0;
    for m in SCENE_BREAK.find_iter(text) {
        segments.push((text[last_end..m.start()].to_string(), m.as_str().to_string()));
        last_end = m.end();
    }
    segments.push((text[last_end..].to_string(), String::new()));
    segments
}

/// Enforces name-frequency within a single scene segment. The first
/// mention in the segment is always kept as-is (spec: "first mention in
/// a segment is always the name").
fn enforce_name_in_segment(segment: &mut String, name: &str, pronoun_key: Option<&str>) -> usize {
    let pattern = match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name))) {
        Ok(p) => p,
        Err(_) => return 0,
    };
    let matches: Vec<(usize, usize)> = pattern.find_iter(segment).map(|m| (m.start(), m.end())).collect();
    if matches.len() < 2 {
        return 0;
    }

    let mut last_kept_end = matches[0].1;
    let mut edits = Vec::new();

    for &(start, end) in matches.iter().skip(1) {
        if is_inside_quote(segment, start) || is_attribution_position(segment, start) {
            last_kept_end = end;
            continue;
        }
        let gap_words = word_count(&segment[last_kept_end..start]);
        if gap_words < TARGET_SEPARATION {
            edits.push((start, end));
        } else {
            last_kept_end = end;
        }
    }

    let replaced = edits.len();
    for (start, end) in edits.into_iter().rev() {
        let capitalized = segment[start..start + 1].chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
        let pronoun = gendered_pronoun(pronoun_key.unwrap_or("unknown"), capitalized);
        segment.replace_range(start..end, pronoun);
    }
    replaced
}

/// Runs the enforcer once per character against each scene segment of
/// the (already scene-stable) chapter text.
pub fn enforce_frequency(text: &str, characters: &[CharacterRef]) -> (String, usize) {
    if characters.is_empty() {
        return (text.to_string(), 0);
    }

    let mut gender_counts: HashMap<&'static str, u32> = HashMap::new();
    for character in characters {
        if let Some(key) = normalize_gender(character.gender) {
            *gender_counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut total = 0;
    let mut rebuilt = String::new();
    for (mut segment, separator) in split_scene_segments(text) {
        for character in characters {
            let pronoun_key = match normalize_gender(character.gender) {
                Some(key) if gender_counts.get(key).copied().unwrap_or(0) == 1 => Some(key),
                _ => None,
            };
            total += enforce_name_in_segment(&mut segment, character.name, pronoun_key);
        }
        rebuilt.push_str(&segment);
        rebuilt.push_str(&separator);
    }
    (rebuilt, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nora() -> CharacterRef<'static> {
        CharacterRef { name: "Nora", gender: Some("female") }
    }

    #[test]
    fn replaces_close_repeated_mention_with_gendered_pronoun() {
        let text = "Nora opened the door. Nora stepped inside.";
        let (out, count) = enforce_frequency(text, &[nora()]);
        assert_eq!(count, 1);
        assert!(out.contains("She stepped inside"));
    }

    #[test]
    fn falls_back_to_they_when_gender_unknown() {
        let text = "Robin opened the door. Robin stepped inside.";
        let characters = [CharacterRef { name: "Robin", gender: None }];
        let (out, _count) = enforce_frequency(text, &characters);
        assert!(out.contains("They stepped inside"));
    }

    #[test]
    fn falls_back_to_they_when_gender_is_ambiguous_across_cast() {
        let text = "Nora opened the door. Nora stepped inside. Wren watched Nora carefully.";
        let characters = [nora(), CharacterRef { name: "Wren", gender: Some("female") }];
        let (out, _count) = enforce_frequency(text, &characters);
        assert!(out.contains("They stepped inside"));
        assert!(!out.contains("She stepped inside"));
    }

    #[test]
    fn leaves_dialogue_mentions_untouched() {
        let text = "Nora said, \"Nora is coming too.\"";
        let (out, count) = enforce_frequency(text, &[nora()]);
        assert_eq!(count, 0);
        assert_eq!(out, text);
    }

    #[test]
    fn keeps_name_when_separation_is_wide_enough() {
        let filler = "word ".repeat(30);
        let text = format!("Nora opened the door. {filler}Nora stepped inside.");
        let (_out, count) = enforce_frequency(&text, &[nora()]);
        assert_eq!(count, 0);
    }

    #[test]
    fn scene_break_resets_first_mention() {
        let text = "Nora opened the door.\n\n***\n\nNora stepped inside the other house.";
        let (out, count) = enforce_frequency(text, &[nora()]);
        assert_eq!(count, 0);
        assert!(out.contains("Nora stepped inside the other house"));
    }
}
