//! Genre-aware validation (spec §4.4 "Genre-aware"): additional regex
//! rules per genre, plus consultation of C3 state (tension, secret,
//! voice profile) to produce structured warnings.

use super::narrative::MetricCheck;
use super::tables::GENRE_RULES;
use crate::state::{BookState, VocabTier};
use crate::utils::text::word_count;

fn check(name: &'static str, passed: bool, value: f64, correction: impl Into<String>) -> MetricCheck {
    MetricCheck {
        name,
        passed,
        value,
        correction: if passed { None } else { Some(correction.into()) },
    }
}

/// Regex rules scoped to `genre` (case-insensitive match on `genre`
/// against the table's genre key).
pub fn genre_rules(genre: &str, text: &str) -> MetricCheck {
    let genre_lower = genre.to_lowercase();
    let lower = text.to_lowercase();
    let hits: Vec<&str> = GENRE_RULES
        .iter()
        .filter(|(g, pattern, _)| genre_lower.contains(g) && lower.contains(pattern))
        .map(|(_, _, hint)| *hint)
        .collect();
    check(
        "GENRE RULE",
        hits.is_empty(),
        hits.len() as f64,
        hits.join("; "),
    )
}

/// Consults C3's in-memory record for `book_id` and produces prose
/// warnings (not pass/fail corrections — these are advisory, per spec
/// §7's "state-store conflict" handling: rules are advisory at the
/// prompt layer, enforced only in state transitions).
pub fn consult_state(state: &BookState, character: &str, dialogue_text: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(profile) = state.voice_profiles.get(character) {
        let longest_line = dialogue_text
            .split('"')
            .nth(1)
            .map(word_count)
            .unwrap_or(0);
        if longest_line as u32 > profile.max_dialogue_words {
            warnings.push(format!(
                "{character}'s dialogue line ({longest_line} words) exceeds their voice profile cap of {}.",
                profile.max_dialogue_words
            ));
        }
        if profile.vocab_tier == VocabTier::Simple
            && dialogue_text.split_whitespace().any(|w| w.len() > 10)
        {
            warnings.push(format!("{character} uses elevated vocabulary above their simple vocab tier."));
        }
    }

    for arc in state.tension_arcs.values() {
        if arc.participants.iter().any(|p| p == character) && arc.current_level == 0 {
            warnings.push(format!(
                "Tension arc {} involving {character} has not been established yet; intimacy/conflict vocabulary requires a minimum level.",
                arc.id
            ));
        }
    }

    for secret in state.secrets.values() {
        if secret.held_by.iter().any(|h| h == character) && !secret.is_revealed {
            if dialogue_text.to_lowercase().contains(&secret.truth_summary.to_lowercase()) {
                warnings.push(format!(
                    "{character} appears to reveal secret {} before it has met its reveal conditions.",
                    secret.id
                ));
            }
        }
    }

    warnings
}

pub fn checks(genre: &str, text: &str) -> Vec<MetricCheck> {
    vec![genre_rules(genre, text)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CharacterFact, TensionArc, TensionType, VoiceProfile};

    #[test]
    fn flags_anachronism_for_genre() {
        let result = genre_rules("historical romance", "She said okay and walked off.");
        assert!(!result.passed);
    }

    #[test]
    fn passes_when_genre_does_not_match_rule() {
        let result = genre_rules("crime thriller", "She said okay and walked off.");
        assert!(result.passed);
    }

    #[test]
    fn consult_state_flags_dialogue_over_voice_cap() {
        let mut state = BookState::default();
        let mut profile = VoiceProfile::new("Nora");
        profile.max_dialogue_words = 3;
        state.voice_profiles.insert("Nora".to_string(), profile);
        state.characters.insert("Nora".to_string(), CharacterFact::new("Nora"));

        let warnings = consult_state(&state, "Nora", "Nora said: \"This is far too many words for her.\"");
        assert!(!warnings.is_empty());
    }

    #[test]
    fn consult_state_flags_zero_level_tension_arc() {
        let mut state = BookState::default();
        let arc = TensionArc::new("t1", TensionType::Romantic, vec!["Nora".to_string()], 8);
        state.tension_arcs.insert(arc.id.clone(), arc);

        let warnings = consult_state(&state, "Nora", "Nora said: \"hi\"");
        assert!(!warnings.is_empty());
    }
}
