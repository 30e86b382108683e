//! Format extension for comics/graphic novels (spec §4.4 "Comic"):
//! panel count, bubble caps, internal-monologue rejection, visual-tic
//! overuse, direct-emotion dialogue.

use super::narrative::MetricCheck;
use super::tables::{DIRECT_EMOTION_PATTERNS, INTERNAL_MONOLOGUE_MARKERS, VISUAL_TICS};
use crate::state::BookState;
use crate::utils::text::word_count;
use once_cell::sync::Lazy;
use regex::Regex;

static PANEL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^PANEL\s+\d+").unwrap());
static BUBBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^\s*[A-Z][A-Za-z0-9 ]*:\s*"(.*)"\s*$"#).unwrap());

const PER_BOOK_VISUAL_TIC_CAP: usize = 20;

fn check(name: &'static str, passed: bool, value: f64, correction: impl Into<String>) -> MetricCheck {
    MetricCheck {
        name,
        passed,
        value,
        correction: if passed { None } else { Some(correction.into()) },
    }
}

fn panels(text: &str) -> Vec<&str> {
    let markers: Vec<_> = PANEL_MARKER.find_iter(text).map(|m| m.start()).collect();
    if markers.is_empty() {
        return vec![text];
    }
    let mut out = Vec::new();
    for window in markers.windows(2) {
        out.push(&text[window[0]..window[1]]);
    }
    out.push(&text[*markers.last().unwrap()..]);
    out
}

pub fn panel_count(text: &str) -> MetricCheck {
    let count = panels(text).len();
    check(
        "PANEL COUNT",
        (3..=7).contains(&count),
        count as f64,
        format!("{count} panels is outside the 3-7 range for a page: add or merge panels."),
    )
}

pub fn bubble_limits(text: &str) -> MetricCheck {
    let mut overlong = 0usize;
    let mut overcrowded_panels = 0usize;
    for panel in panels(text) {
        let bubbles: Vec<_> = BUBBLE.captures_iter(panel).collect();
        if bubbles.len() > 2 {
            overcrowded_panels += 1;
        }
        for bubble in &bubbles {
            if word_count(&bubble[1]) > 25 {
                overlong += 1;
            }
        }
    }
    let violations = overlong + overcrowded_panels;
    check(
        "BUBBLE LIMITS",
        violations == 0,
        violations as f64,
        format!(
            "{overlong} bubble(s) exceed 25 words and {overcrowded_panels} panel(s) exceed 2 bubbles: trim dialogue."
        ),
    )
}

pub fn no_internal_monologue(text: &str) -> MetricCheck {
    let lower = text.to_lowercase();
    let hits = INTERNAL_MONOLOGUE_MARKERS.iter().filter(|m| lower.contains(**m)).count();
    check(
        "INTERNAL MONOLOGUE",
        hits == 0,
        hits as f64,
        "Remove internal-monologue markers; comics dramatize externally.",
    )
}

/// Counts visual-tic phrase occurrences against a per-page cap and
/// accumulates them into `state.visual_tic_total` for a per-book cap
/// (spec §4.4 "Comic": "with per-page AND per-book caps").
pub fn visual_tic_overuse(text: &str, per_page_cap: usize, per_book_cap: usize, state: &mut BookState) -> MetricCheck {
    let lower = text.to_lowercase();
    let hits: usize = VISUAL_TICS.iter().map(|tic| lower.matches(*tic).count()).sum();
    state.visual_tic_total += hits as u32;
    let book_total = state.visual_tic_total as usize;
    let passed = hits <= per_page_cap && book_total <= per_book_cap;
    check(
        "VISUAL TIC OVERUSE",
        passed,
        hits as f64,
        format!(
            "{hits} visual-tic phrase(s) this page (cap {per_page_cap}) and {book_total} across the \
             book so far (cap {per_book_cap}): vary body language instead of repeating tics."
        ),
    )
}

pub fn no_direct_emotion(text: &str) -> MetricCheck {
    let lower = text.to_lowercase();
    let hits = DIRECT_EMOTION_PATTERNS.iter().filter(|p| lower.contains(**p)).count();
    check(
        "DIRECT EMOTION",
        hits < 2,
        hits as f64,
        format!("{hits} lines state emotion directly: dramatize feeling through action or subtext instead."),
    )
}

pub fn checks(text: &str, state: &mut BookState) -> Vec<MetricCheck> {
    vec![
        panel_count(text),
        bubble_limits(text),
        no_internal_monologue(text),
        visual_tic_overuse(text, 2, PER_BOOK_VISUAL_TIC_CAP, state),
        no_direct_emotion(text),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few_panels() {
        let text = "PANEL 1\nSomething happens.\n\nPANEL 2\nSomething else.";
        assert!(!panel_count(text).passed);
    }

    #[test]
    fn flags_overlong_bubble() {
        let long_line = "word ".repeat(30);
        let text = format!("PANEL 1\nHERO: \"{long_line}\"");
        assert!(!bubble_limits(&text).passed);
    }

    #[test]
    fn passes_under_both_caps() {
        let mut state = BookState::default();
        let result = visual_tic_overuse("She crossed arms once.", 2, PER_BOOK_VISUAL_TIC_CAP, &mut state);
        assert!(result.passed);
        assert_eq!(state.visual_tic_total, 1);
    }

    #[test]
    fn fails_per_book_cap_even_when_per_page_cap_is_met() {
        let mut state = BookState::default();
        state.visual_tic_total = PER_BOOK_VISUAL_TIC_CAP as u32;
        let result = visual_tic_overuse("She crossed arms.", 2, PER_BOOK_VISUAL_TIC_CAP, &mut state);
        assert!(!result.passed);
    }
}
