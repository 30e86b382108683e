//! Atomic Beat Engine (spec §4.6, C6): splits a chapter plan into beats,
//! builds per-beat context, and runs the call→validate→retry loop that
//! produces the chapter's prose.

use crate::config::Config;
use crate::format::{ContentRating, FormatConfig};
use crate::heat::{self, ContentType};
use crate::llm::{Gateway, GenerationConfig, ModelRole, SafetySettings};
use crate::error::{EngineError, Result};
use crate::state::{BookState, PerBookStore};
use crate::utils::prompts::Prompts;
use crate::utils::text::{significant_keywords, jaccard_similarity, split_sentences};
use crate::validators::{self, ValidationReport};
use langchain_rust::prompt::PromptFromatter;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Momentum {
    Escalate,
    Complicate,
    Resolve,
    Reveal,
}

impl Momentum {
    fn label(self) -> &'static str {
        match self {
            Momentum::Escalate => "escalate",
            Momentum::Complicate => "complicate",
            Momentum::Resolve => "resolve",
            Momentum::Reveal => "reveal",
        }
    }

    /// Position-based assignment (spec §4.6.1): the opening beat
    /// escalates, the closing beat resolves, the beat right before it
    /// reveals, everything in between complicates.
    fn for_position(index: u32, total: u32) -> Momentum {
        if index == 0 {
            Momentum::Escalate
        } else if index == total - 1 {
            Momentum::Resolve
        } else if index == total - 2 {
            Momentum::Reveal
        } else {
            Momentum::Complicate
        }
    }
}

/// One beat's plan slice: a contiguous sentence group from the chapter
/// plan plus its target word count and momentum label.
#[derive(Debug, Clone)]
pub struct BeatPlan {
    pub index: u32,
    pub total: u32,
    pub momentum: Momentum,
    pub source_text: String,
    pub target_words: u32,
}

/// Beat count = max(3, ceil(target / format.beatSize)); the chapter
/// plan's sentences are split into that many contiguous groups (spec
/// §4.6.1). The last beat absorbs the word-count remainder.
pub fn plan_beats(chapter_plan: &str, target_words: u32, format: &FormatConfig) -> Vec<BeatPlan> {
    let beat_count = ((target_words as f64 / format.beat_size as f64).ceil() as u32).max(3);

    let sentences = split_sentences(chapter_plan);
    let groups = chunk_sentences(&sentences, beat_count as usize);

    let base_words = target_words / beat_count;
    let remainder = target_words - base_words * beat_count;

    groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            let index = i as u32;
            let target = if index == beat_count - 1 {
                base_words + remainder
            } else {
                base_words
            };
            BeatPlan {
                index,
                total: beat_count,
                momentum: Momentum::for_position(index, beat_count),
                source_text: group.join(". "),
                target_words: target.max(1),
            }
        })
        .collect()
}

/// Splits `sentences` into `groups` contiguous, near-equal chunks. If
/// there are fewer sentences than groups, trailing groups reuse the
/// chapter plan's tail rather than going empty.
fn chunk_sentences(sentences: &[String], groups: usize) -> Vec<Vec<String>> {
    if sentences.is_empty() {
        return vec![Vec::new(); groups];
    }
    let per = (sentences.len() as f64 / groups as f64).ceil() as usize;
    let mut out: Vec<Vec<String>> = sentences
        .chunks(per.max(1))
        .map(|chunk| chunk.to_vec())
        .collect();
    while out.len() < groups {
        let filler = out.last().cloned().unwrap_or_default();
        out.push(filler);
    }
    out.truncate(groups);
    out
}

/// Result of one accepted (or best-of-3) beat.
#[derive(Debug, Clone, Serialize)]
pub struct BeatOutcome {
    pub index: u32,
    pub momentum: Momentum,
    pub text: String,
    pub attempts: u32,
    pub passed_first_try: bool,
    pub correction_count: usize,
    pub variance: f64,
    pub name_density: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateMetrics {
    pub pass_on_first_try: usize,
    pub total_retries: u32,
    pub average_variance: f64,
    pub average_name_density: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterBeatsResult {
    pub text: String,
    pub beats: Vec<BeatOutcome>,
    pub metrics: AggregateMetrics,
}

/// Everything §4.6's "one chapter" algorithm takes as input.
pub struct ChapterBeatInputs<'a> {
    pub book_id: &'a str,
    pub chapter_number: u32,
    pub chapter_plan: &'a str,
    pub target_words: u32,
    pub format: &'a FormatConfig,
    pub genre: &'a str,
    pub anchor: &'a str,
    pub character_names: &'a [&'a str],
    pub rating: ContentRating,
    pub content_type: ContentType,
}

const CHAOS_SEEDS: &[&str] = &[
    "a draft under the door",
    "the smell of woodsmoke from next door",
    "a phone buzzing unanswered in another room",
    "rain starting against the window",
    "the hum of a refrigerator cutting out",
];

const FRICTION_EVENTS: &[&str] = &[
    "a zipper catching halfway",
    "a dropped set of keys",
    "a door that needs two tries to latch",
    "a spilled drink soaking into a sleeve",
    "a phone screen cracking against the floor",
];

fn character_fact_sheet(state: &BookState, character_names: &[&str]) -> String {
    let mut lines = Vec::new();
    for name in character_names {
        if let Some(fact) = state.characters.get(*name) {
            lines.push(format!(
                "{} ({}): at {}, last did: {}.",
                fact.canonical_name,
                fact.status,
                if fact.location.is_empty() { "unspecified" } else { &fact.location },
                if fact.last_action.is_empty() { "nothing yet" } else { &fact.last_action }
            ));
        } else {
            lines.push(format!("{name}: no established facts yet."));
        }
    }
    lines.join(" ")
}

/// "Therefore/But" connector synthesized from the previous beat's
/// ending (spec §4.6.2a, Glossary "Logic bridge"): `Therefore` when the
/// loop-detection check passed (the story is moving forward cleanly),
/// `But` when it flagged heavy overlap (signal the text to pivot).
fn logic_bridge(previous_text: &str, loop_check_passed: bool) -> String {
    if previous_text.trim().is_empty() {
        return String::new();
    }
    let tail: String = previous_text.chars().rev().take(1000).collect::<Vec<_>>().into_iter().rev().collect();
    let connector = if loop_check_passed { "Therefore" } else { "But" };
    format!("{connector}, continuing from: \"...{}\"", tail.trim())
}

fn recent_history(last_two: &[String]) -> String {
    last_two
        .iter()
        .map(|text| {
            let snippet: String = text.chars().take(200).collect();
            format!("- {snippet}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Beat-level semantic-rewind check (spec §4.6, last paragraph): flags
/// a beat whose first and last sentence share the same entity+action
/// keywords, approximated here as significant-keyword Jaccard overlap.
fn beat_level_rewind(text: &str) -> bool {
    let sentences = split_sentences(text);
    if sentences.len() < 2 {
        return false;
    }
    let first = significant_keywords(&sentences[0]);
    let last = significant_keywords(sentences.last().unwrap());
    jaccard_similarity(&first, &last) > 0.5
}

fn apply_beat_level_checks(text: &str, report: &mut ValidationReport) {
    if beat_level_rewind(text) {
        report.is_valid = false;
        report.corrections.push(
            "Beat opens and closes on the same entity and action (semantic rewind): rewrite the \
             ending so it advances the scene instead of restating the opening."
                .to_string(),
        );
    }
}

/// Runs the beat loop for one chapter (spec §4.6): sequential beats,
/// each built from the evolving context, validated, retried up to
/// `config.max_beat_attempts` times, then assembled with aggregate
/// metrics. State updates (C3) are the orchestrator's job (C8), not
/// this function's.
pub async fn generate_chapter(
    gateway: &Gateway,
    store: &PerBookStore,
    config: &Config,
    inputs: &ChapterBeatInputs<'_>,
) -> Result<ChapterBeatsResult> {
    let beat_plans = plan_beats(inputs.chapter_plan, inputs.target_words, inputs.format);

    store.with_book(inputs.book_id, |state| state.chaos.start_chapter());

    let content_guidelines = heat::content_guideline_preamble(inputs.rating, inputs.content_type);

    let mut assembled = String::new();
    let mut history: Vec<String> = Vec::new();
    let mut outcomes: Vec<BeatOutcome> = Vec::new();
    let mut last_loop_check_passed = true;

    for plan in &beat_plans {
        let fact_sheet = store.with_book(inputs.book_id, |state| character_fact_sheet(state, inputs.character_names));
        let bridge = logic_bridge(&assembled, last_loop_check_passed);
        let history_text = recent_history(&history);

        let (chaos_prompt, friction_prompt) = store.with_book(inputs.book_id, |state| {
            let chaos = state
                .chaos
                .pick_chaos_seed(CHAOS_SEEDS, inputs.format.chaos_cap_per_chapter)
                .map(|seed| format!("Weave in this sensory detail naturally: {seed}."))
                .unwrap_or_default();
            let friction = state
                .chaos
                .pick_friction_event(FRICTION_EVENTS, inputs.format.chaos_cap_per_chapter)
                .map(|event| format!("Include this small physical friction: {event}."))
                .unwrap_or_default();
            (chaos, friction)
        });

        let mut surgical_feedback = String::new();
        let mut best: Option<(String, ValidationReport)> = None;
        let mut attempts: u32 = 0;
        let mut safety_blocked_ever = false;

        loop {
            attempts += 1;
            let mut heat_prompt = String::new();
            if safety_blocked_ever {
                heat_prompt = heat::heat_reduction_prompt(inputs.content_type);
            }

            let prompt = Prompts::beat().format(langchain_rust::prompt_args! {
                "beat_number" => (plan.index + 1).to_string(),
                "beat_total" => plan.total.to_string(),
                "momentum" => plan.momentum.label().to_string(),
                "target_words" => plan.target_words.to_string(),
                "content_guidelines" => content_guidelines.clone(),
                "chapter_summary" => plan.source_text.clone(),
                "anchor" => inputs.anchor.to_string(),
                "logic_bridge" => bridge.clone(),
                "recent_history" => history_text.clone(),
                "character_facts" => fact_sheet.clone(),
                "chaos_prompt" => chaos_prompt.clone(),
                "friction_prompt" => friction_prompt.clone(),
                "heat_prompt" => heat_prompt,
                "surgical_feedback" => surgical_feedback.clone(),
            })?;

            let gen_config = GenerationConfig::for_role(ModelRole::Pro, config);
            let outcome = gateway
                .generate(ModelRole::Pro, &prompt, &gen_config, &SafetySettings::default())
                .await;

            match outcome {
                Err(EngineError::SafetyBlocked) => {
                    safety_blocked_ever = true;
                    warn!(
                        book_id = inputs.book_id,
                        chapter = inputs.chapter_number,
                        beat = plan.index,
                        attempts,
                        "beat generation safety-blocked, retrying"
                    );
                    if attempts >= config.max_beat_attempts {
                        break;
                    }
                    continue;
                }
                Err(other) => return Err(other),
                Ok(text) => {
                    let mut report = store.with_book(inputs.book_id, |state| {
                        validators::validate(&text, inputs.character_names, &assembled, inputs.genre, inputs.format, state)
                    });
                    apply_beat_level_checks(&text, &mut report);
                    last_loop_check_passed = !report
                        .corrections
                        .iter()
                        .any(|c| c.starts_with("Loop similarity") || c.contains("REPETITION"));

                    let is_valid = report.is_valid;
                    let replace_best = match &best {
                        None => true,
                        Some((_, existing)) => report.correction_count() < existing.correction_count(),
                    };
                    if replace_best {
                        best = Some((text.clone(), report));
                    }
                    if is_valid {
                        break;
                    }
                    if attempts >= config.max_beat_attempts {
                        warn!(
                            book_id = inputs.book_id,
                            chapter = inputs.chapter_number,
                            beat = plan.index,
                            attempts,
                            "beat exhausted retry attempts, accepting best partial"
                        );
                        break;
                    }
                    let latest = &best.as_ref().unwrap().1;
                    warn!(
                        book_id = inputs.book_id,
                        chapter = inputs.chapter_number,
                        beat = plan.index,
                        attempts,
                        corrections = latest.correction_count(),
                        "beat validation failed, retrying with surgical feedback"
                    );
                    surgical_feedback = format!("Fix the following before writing: {}", latest.corrections.join(" "));
                }
            }
        }

        let (text, report) = match best {
            Some(pair) => pair,
            None => {
                let mut fallback_report = ValidationReport {
                    is_valid: false,
                    corrections: vec!["content restrictions".to_string()],
                    metrics: Default::default(),
                };
                apply_beat_level_checks("", &mut fallback_report);
                (String::new(), fallback_report)
            }
        };

        let variance = *report.metrics.get("RHYTHM").unwrap_or(&0.0);
        let name_density = *report.metrics.get("NAME OVERUSE").unwrap_or(&0.0);
        let passed_first_try = attempts == 1 && report.is_valid;

        outcomes.push(BeatOutcome {
            index: plan.index,
            momentum: plan.momentum,
            text: text.clone(),
            attempts,
            passed_first_try,
            correction_count: report.correction_count(),
            variance,
            name_density,
        });

        if !assembled.is_empty() {
            assembled.push_str("\n\n");
        }
        assembled.push_str(&text);

        history.push(text);
        if history.len() > 2 {
            history.remove(0);
        }
    }

    let pass_on_first_try = outcomes.iter().filter(|b| b.passed_first_try).count();
    let total_retries: u32 = outcomes.iter().map(|b| b.attempts.saturating_sub(1)).sum();
    let count = outcomes.len().max(1) as f64;
    let average_variance = outcomes.iter().map(|b| b.variance).sum::<f64>() / count;
    let average_name_density = outcomes.iter().map(|b| b.name_density).sum::<f64>() / count;

    Ok(ChapterBeatsResult {
        text: assembled,
        beats: outcomes,
        metrics: AggregateMetrics {
            pass_on_first_try,
            total_retries,
            average_variance,
            average_name_density,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BookFormat;

    #[test]
    fn beat_count_is_at_least_three() {
        let format = BookFormat::Novel.config();
        let plans = plan_beats("One sentence only.", 200, &format);
        assert_eq!(plans.len(), 3);
    }

    #[test]
    fn last_beat_absorbs_word_remainder() {
        let format = BookFormat::Novel.config();
        let plans = plan_beats("A. B. C. D. E. F.", 1000, &format);
        let total: u32 = plans.iter().map(|p| p.target_words).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn momentum_escalates_then_resolves() {
        let format = BookFormat::Novel.config();
        let plans = plan_beats("A. B. C. D.", 800, &format);
        assert_eq!(plans.first().unwrap().momentum, Momentum::Escalate);
        assert_eq!(plans.last().unwrap().momentum, Momentum::Resolve);
    }

    #[test]
    fn beat_level_rewind_flags_repeated_entity_action() {
        let text = "Nora slammed the door shut. She walked down the hall. Nora slammed the door shut.";
        assert!(beat_level_rewind(text));
    }

    #[test]
    fn beat_level_rewind_passes_distinct_sentences() {
        let text = "Nora opened the window. Cold air rushed into the quiet room.";
        assert!(!beat_level_rewind(text));
    }

    #[tokio::test]
    async fn generate_chapter_falls_back_to_best_partial_on_total_safety_block() {
        use crate::llm::testutil::FakeProvider;
        use crate::llm::{FailureKind, ProviderCallError, ProviderResponse};
        use std::sync::Arc;

        let format = BookFormat::Novel.config();
        let plans = plan_beats("Nora arrives home. She senses something is wrong. She investigates.", 300, &format);
        let max_attempts = 3u32;

        // Every attempt for every beat is safety-blocked, exercising the
        // spec §4.6d / §7 "returns the best partial" fallback path.
        let total_calls = plans.len() as u32 * max_attempts;
        let responses: Vec<std::result::Result<ProviderResponse, ProviderCallError>> = (0..total_calls)
            .map(|_| {
                Err(ProviderCallError {
                    kind: FailureKind::SafetyBlock,
                    message: "blocked".to_string(),
                })
            })
            .collect();

        let provider = Arc::new(FakeProvider::new(responses));
        let mut config = Config::default();
        config.provider_keys = vec!["A".into()];
        config.max_beat_attempts = max_attempts;
        let gateway = Gateway::new(provider, config.clone());
        let store = PerBookStore::new();

        let inputs = ChapterBeatInputs {
            book_id: "book-1",
            chapter_number: 1,
            chapter_plan: "Nora arrives home. She senses something is wrong. She investigates the noise.",
            target_words: 300,
            format: &format,
            genre: "mystery",
            anchor: "Nora moved into the old house last spring.",
            character_names: &["Nora"],
            rating: ContentRating::General,
            content_type: ContentType::General,
        };

        let result = generate_chapter(&gateway, &store, &config, &inputs).await.unwrap();
        assert_eq!(result.beats.len(), plans.len());
        for beat in &result.beats {
            assert!(beat.text.is_empty());
            assert_eq!(beat.attempts, max_attempts);
            assert_eq!(beat.correction_count, 1);
        }
    }
}
