//! Format extension for screenplays (spec §4.4 "Screenplay"): slugline
//! format, forbidden camera/narration phrasing, action-block and
//! speech-length caps, on-the-nose dialogue, parenthetical caps.

use super::narrative::MetricCheck;
use super::tables::{ON_THE_NOSE_PATTERNS, SCREEN_DIRECTION_PATTERNS};
use crate::utils::text::{split_sentences, word_count};
use once_cell::sync::Lazy;
use regex::Regex;

static SLUGLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(INT\.|EXT\.|INT\./EXT\.)\s+.+-\s*(DAY|NIGHT|DAWN|DUSK|CONTINUOUS)").unwrap());

fn check(name: &'static str, passed: bool, value: f64, correction: impl Into<String>) -> MetricCheck {
    MetricCheck {
        name,
        passed,
        value,
        correction: if passed { None } else { Some(correction.into()) },
    }
}

/// Every slugline (a line starting `INT.`/`EXT.`) must match
/// `INT./EXT. LOCATION - DAY|NIGHT|...`.
pub fn slugline_format(text: &str) -> MetricCheck {
    let candidate_lines: Vec<&str> = text
        .lines()
        .filter(|l| l.trim_start().starts_with("INT.") || l.trim_start().starts_with("EXT."))
        .collect();
    let malformed = candidate_lines.iter().filter(|l| !SLUGLINE.is_match(l)).count();
    check(
        "SLUGLINE FORMAT",
        malformed == 0,
        malformed as f64,
        format!(
            "{} slugline(s) malformed: use \"INT./EXT. LOCATION - DAY|NIGHT\" format.",
            malformed
        ),
    )
}

/// Action lines must never narrate the camera ("we see", "fade to", ...).
pub fn no_screen_direction(text: &str) -> MetricCheck {
    let lower = text.to_lowercase();
    let hits = SCREEN_DIRECTION_PATTERNS.iter().filter(|p| lower.contains(**p)).count();
    check(
        "SCREEN DIRECTION",
        hits == 0,
        hits as f64,
        "Remove camera/narration phrasing such as \"we see\" or \"fade to\" from action lines.",
    )
}

/// Action blocks (paragraphs that are not ALL CAPS character cues) must
/// be ≤3 sentences.
pub fn action_block_length(text: &str) -> MetricCheck {
    let blocks: Vec<&str> = text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()).collect();
    let overlong = blocks
        .iter()
        .filter(|b| !b.chars().all(|c| c.is_uppercase() || !c.is_alphabetic()))
        .filter(|b| split_sentences(b).len() > 3)
        .count();
    check(
        "ACTION BLOCK LENGTH",
        overlong == 0,
        overlong as f64,
        format!("{overlong} action block(s) exceed 3 sentences: tighten the action description."),
    )
}

/// Estimated speech length ≤4 lines (≈ 40 words at screenplay pacing).
pub fn speech_length(text: &str) -> MetricCheck {
    let blocks: Vec<&str> = text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()).collect();
    let overlong = blocks.iter().filter(|b| word_count(b) > 40).count();
    check(
        "SPEECH LENGTH",
        overlong == 0,
        overlong as f64,
        format!("{overlong} speech(es) run past an estimated 4 lines: trim dialogue."),
    )
}

/// Reject "as you know"-style exposition dumps.
pub fn on_the_nose(text: &str) -> MetricCheck {
    let lower = text.to_lowercase();
    let hits = ON_THE_NOSE_PATTERNS.iter().filter(|p| lower.contains(**p)).count();
    check(
        "ON THE NOSE",
        hits == 0,
        hits as f64,
        "Remove on-the-nose dialogue that states the theme or plan outright.",
    )
}

/// At most 2 parentheticals per estimated page (~250 words).
pub fn parenthetical_cap(text: &str) -> MetricCheck {
    let hits = text.matches('(').count();
    let pages = (word_count(text).max(1) as f64 / 250.0).max(1.0);
    let per_page = hits as f64 / pages;
    check(
        "PARENTHETICAL CAP",
        per_page <= 2.0,
        per_page,
        format!("{per_page:.1} parentheticals per page exceed the cap of 2: cut stage direction."),
    )
}

pub fn checks(text: &str) -> Vec<MetricCheck> {
    vec![
        slugline_format(text),
        no_screen_direction(text),
        action_block_length(text),
        speech_length(text),
        on_the_nose(text),
        parenthetical_cap(text),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_slugline() {
        let text = "INT. DINER - NIGHT\n\nShe orders coffee.";
        assert!(slugline_format(text).passed);
    }

    #[test]
    fn rejects_malformed_slugline() {
        let text = "INT. DINER\n\nShe orders coffee.";
        assert!(!slugline_format(text).passed);
    }

    #[test]
    fn flags_camera_direction_language() {
        let text = "We see the detective enter the room.";
        assert!(!no_screen_direction(text).passed);
    }
}
