//! Math-based quality validators (spec §4.4, C4). Every validator takes
//! `(text, character names, previous content, thresholds)` and returns a
//! `ValidationReport`; the `corrections` field is prose meant to be
//! pasted verbatim into a beat's retry prompt (spec §4.6 "surgical
//! feedback").

pub mod book;
pub mod comic;
pub mod genre;
pub mod narrative;
pub mod screenplay;
pub mod tables;

use crate::format::{BookFormat, FormatConfig};
use crate::state::BookState;
use narrative::MetricCheck;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub corrections: Vec<String>,
    pub metrics: HashMap<String, f64>,
    /// Advisory C3-state warnings (spec §4.4 "Genre-aware": "consults
    /// C3 ... produces structured warnings/violations"). Never affects
    /// `is_valid` — these are logged, not enforced, per spec §7's
    /// state-conflict handling.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn from_checks(checks: Vec<MetricCheck>) -> Self {
        let mut corrections = Vec::new();
        let mut metrics = HashMap::new();
        for check in checks {
            metrics.insert(check.name.to_string(), check.value);
            if let Some(correction) = check.correction {
                corrections.push(correction);
            }
        }
        Self {
            is_valid: corrections.is_empty(),
            corrections,
            metrics,
            warnings: Vec::new(),
        }
    }

    /// Lowest correction count "best attempt" comparison used by C6's
    /// beat retry loop when every attempt fails (spec §4.6d).
    pub fn correction_count(&self) -> usize {
        self.corrections.len()
    }
}

fn narrative_checks(text: &str, character_names: &[&str], previous_text: &str, config: &FormatConfig) -> Vec<MetricCheck> {
    vec![
        narrative::sentence_variance(text, config.min_sentence_variance),
        narrative::name_density(text, character_names, config.max_name_density),
        narrative::staccato_ratio(text),
        narrative::loop_detection(text, previous_text),
        narrative::banned_phrases(text),
        narrative::consecutive_same_starter(text),
        narrative::sensory_grounding(text),
    ]
}

/// Runs the shared narrative checks plus the format-specific extension
/// for `config.format`, merging into one report (spec §4.4). Also
/// consults C3 state per character (spec §4.4 "Genre-aware") and
/// attaches the resulting advisory warnings, logging each one.
pub fn validate(
    text: &str,
    character_names: &[&str],
    previous_text: &str,
    genre: &str,
    config: &FormatConfig,
    state: &mut BookState,
) -> ValidationReport {
    let mut checks = narrative_checks(text, character_names, previous_text, config);
    checks.extend(genre::checks(genre, text));

    match config.format {
        BookFormat::Novel | BookFormat::Children => checks.extend(book::checks(text)),
        BookFormat::Screenplay => checks.extend(screenplay::checks(text)),
        BookFormat::Comic | BookFormat::AdultComic | BookFormat::PictureBook => {
            checks.extend(comic::checks(text, state))
        }
    }

    let mut report = ValidationReport::from_checks(checks);
    for character in character_names {
        for warning in genre::consult_state(state, character, text) {
            tracing::warn!(character = *character, %warning, "genre-aware state consultation flagged a warning");
            report.warnings.push(warning);
        }
    }
    report
}

/// Hot-path variant: returns only the first failing metric instead of
/// running every check to completion (spec §4.4 "A `quickCheck` variant
/// exists for hot paths"). Public per DESIGN.md's Open Question 2
/// resolution (the source calls it through a private-method bracket
/// access; here it is a first-class function).
pub fn quick_check(text: &str, character_names: &[&str], previous_text: &str, config: &FormatConfig) -> Option<MetricCheck> {
    narrative_checks(text, character_names, previous_text, config)
        .into_iter()
        .find(|c| !c.passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BookFormat;

    #[test]
    fn validate_merges_narrative_and_format_checks() {
        let config = BookFormat::Novel.config();
        let mut state = BookState::default();
        let report = validate(
            "It was dark. It was cold. It was quiet.",
            &["Nora"],
            "",
            "mystery",
            &config,
            &mut state,
        );
        assert!(!report.is_valid);
        assert!(report.metrics.contains_key("RHYTHM"));
    }

    #[test]
    fn validate_surfaces_genre_state_warnings() {
        use crate::state::{TensionArc, TensionType};

        let config = BookFormat::Novel.config();
        let mut state = BookState::default();
        state.tension_arcs.insert(
            "t1".to_string(),
            TensionArc::new("t1", TensionType::Romantic, vec!["Nora".to_string()], 8),
        );
        let report = validate("Nora smiled at the window.", &["Nora"], "", "mystery", &config, &mut state);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn quick_check_returns_first_failure_only() {
        let config = BookFormat::Novel.config();
        let failure = quick_check("It was dark. It was cold. It was quiet.", &["Nora"], "", &config);
        assert!(failure.is_some());
    }
}
