//! Outline & Plan Builder, idea→plan half (spec §4.7, C7): expands a
//! one-sentence idea into a structured plan record, retrying through a
//! 4-attempt sanitization ladder on a safety block.

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::json;
use crate::llm::{Gateway, GenerationConfig, ModelRole, SafetySettings};
use crate::utils::names_safety;
use crate::utils::prompts::Prompts;
use crate::utils::text::significant_keywords;
use langchain_rust::prompt::PromptFromatter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookTypeKind {
    Fiction,
    NonFiction,
}

impl BookTypeKind {
    fn as_prompt_str(self) -> &'static str {
        match self {
            BookTypeKind::Fiction => "fiction",
            BookTypeKind::NonFiction => "non-fiction",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCharacter {
    pub name: String,
    pub description: String,
    pub visual_hints: String,
}

/// Idea→Plan's output record (spec §4.7). `beginning`/`middle`/`ending`
/// are reinterpreted downstream as hook/topics/takeaways for non-fiction
/// outlines — the JSON shape the model returns is identical either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub title: String,
    pub genre: String,
    pub book_type: BookTypeKind,
    pub premise: String,
    pub characters: Vec<PlanCharacter>,
    pub beginning: String,
    pub middle: String,
    pub ending: String,
    pub writing_style: String,
    pub target_words: u32,
    pub target_chapters: u32,
    /// Preserved unsanitized, truncated to 1000 words (spec §4.7), even
    /// if a later rung of the ladder was what actually produced the plan.
    pub original_idea: String,
}

const SENSITIVE_TERMS: &[&str] = &[
    "kill", "murder", "suicide", "rape", "drug", "terrorist", "bomb", "abuse", "gore", "torture",
];

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    SENSITIVE_TERMS
        .iter()
        .map(|term| Regex::new(&format!(r"(?i)\b{}\w*\b", regex::escape(term))).unwrap())
        .collect()
});

pub(crate) fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace().take(max_words).collect::<Vec<_>>().join(" ")
}

/// Ladder rung 2: strip words from the sensitive-term table.
pub(crate) fn strip_sensitive_words(idea: &str) -> String {
    let mut out = idea.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        out = pattern.replace_all(&out, "[omitted]").into_owned();
    }
    out
}

/// Ladder rung 3: core 150 characters, prefixed with a neutral framing.
fn neutral_core(idea: &str) -> String {
    let core: String = idea.chars().take(150).collect();
    format!("Write a gentle, family-friendly story inspired by the theme of: {core}")
}

/// Ladder rung 4: long-enough noun/verb tokens, reframed as an explicit
/// family-friendly request.
fn token_extraction(idea: &str) -> String {
    let mut tokens: Vec<String> = significant_keywords(idea).into_iter().collect();
    tokens.sort();
    format!(
        "Write a wholesome, family-friendly story that only touches on these themes: {}",
        tokens.join(", ")
    )
}

fn sanitization_ladder(idea: &str) -> [String; 4] {
    [
        idea.to_string(),
        strip_sensitive_words(idea),
        neutral_core(idea),
        token_extraction(idea),
    ]
}

fn get_str(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn get_u32(value: &Value, key: &str, default: u32) -> u32 {
    value
        .get(key)
        .and_then(Value::as_u64)
        .map(|n| n as u32)
        .unwrap_or(default)
}

fn parse_characters(value: &Value) -> Vec<PlanCharacter> {
    value
        .get("characters")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|c| PlanCharacter {
                    name: get_str(c, "name"),
                    description: get_str(c, "description"),
                    visual_hints: get_str(c, "visualHints"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_plan(value: Value, book_type: BookTypeKind, original_idea: &str) -> Result<Plan> {
    let title = get_str(&value, "title");
    if title.is_empty() {
        return Err(EngineError::SerializationError("plan JSON missing title".to_string()));
    }

    Ok(Plan {
        title,
        genre: get_str(&value, "genre"),
        book_type,
        premise: get_str(&value, "premise"),
        characters: parse_characters(&value),
        beginning: get_str(&value, "beginning"),
        middle: get_str(&value, "middle"),
        ending: get_str(&value, "ending"),
        writing_style: get_str(&value, "writingStyle"),
        target_words: get_u32(&value, "targetWords", 30_000),
        target_chapters: get_u32(&value, "targetChapters", 20),
        original_idea: original_idea.to_string(),
    })
}

/// Renames any character (and narrative mention) matching the
/// trademarked-name table (spec §4.7's copyright name-safety pass).
fn apply_name_safety(plan: &mut Plan) {
    plan.title = names_safety::sanitize(&plan.title);
    plan.premise = names_safety::sanitize(&plan.premise);
    plan.beginning = names_safety::sanitize(&plan.beginning);
    plan.middle = names_safety::sanitize(&plan.middle);
    plan.ending = names_safety::sanitize(&plan.ending);
    for character in &mut plan.characters {
        character.name = names_safety::sanitize(&character.name);
        character.description = names_safety::sanitize(&character.description);
    }
}

/// Idea→Plan (spec §4.7): runs the JSON-generation call through the
/// 4-rung sanitization ladder, stopping at the first rung that doesn't
/// hit a safety block.
pub async fn generate_plan(gateway: &Gateway, config: &Config, idea: &str, book_type: BookTypeKind) -> Result<Plan> {
    let original_idea = truncate_words(idea, 1000);
    let ladder = sanitization_ladder(idea);
    let gen_config = GenerationConfig::for_role(ModelRole::Flash, config);

    let mut last_block = None;
    for (rung_idx, rung) in ladder.iter().enumerate() {
        let prompt = Prompts::plan().format(langchain_rust::prompt_args! {
            "book_type" => book_type.as_prompt_str().to_string(),
            "idea" => rung.clone(),
        })?;

        match gateway.generate(ModelRole::Flash, &prompt, &gen_config, &SafetySettings::default()).await {
            Ok(raw) => {
                if rung_idx > 0 {
                    info!(rung = rung_idx, "plan generated after sanitization ladder escalation");
                }
                let value = json::parse(&raw)?;
                let mut plan = parse_plan(value, book_type, &original_idea)?;
                apply_name_safety(&mut plan);
                return Ok(plan);
            }
            Err(EngineError::SafetyBlocked) => {
                warn!(rung = rung_idx, "idea blocked on safety, escalating to next sanitization rung");
                last_block = Some(EngineError::SafetyBlocked);
                continue;
            }
            Err(other) => return Err(other),
        }
    }

    warn!("idea exhausted every sanitization ladder rung without clearing safety");
    Err(last_block.unwrap_or(EngineError::SafetyBlocked))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_sensitive_words_masks_and_its_variants() {
        let out = strip_sensitive_words("A story about a murderer on the run.");
        assert!(!out.to_lowercase().contains("murder"));
        assert!(out.contains("[omitted]"));
    }

    #[test]
    fn neutral_core_keeps_only_first_150_chars() {
        let idea = "x".repeat(300);
        let out = neutral_core(&idea);
        assert!(out.len() < idea.len());
    }

    #[test]
    fn truncate_words_caps_at_max() {
        let idea = (0..2000).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let out = truncate_words(&idea, 1000);
        assert_eq!(out.split_whitespace().count(), 1000);
    }

    #[test]
    fn parse_plan_rejects_missing_title() {
        let value = serde_json::json!({ "genre": "mystery" });
        let result = parse_plan(value, BookTypeKind::Fiction, "an idea");
        assert!(result.is_err());
    }

    #[test]
    fn parse_plan_reads_characters_array() {
        let value = serde_json::json!({
            "title": "The Lighthouse",
            "characters": [{"name": "Nora", "description": "a keeper", "visualHints": "red coat"}],
        });
        let plan = parse_plan(value, BookTypeKind::Fiction, "an idea").unwrap();
        assert_eq!(plan.characters.len(), 1);
        assert_eq!(plan.characters[0].name, "Nora");
    }

    #[tokio::test]
    async fn generate_plan_escalates_ladder_on_repeated_safety_block() {
        use crate::llm::testutil::FakeProvider;
        use crate::llm::{FailureKind, ProviderCallError, ProviderResponse};
        use std::sync::Arc;

        fn blocked() -> std::result::Result<ProviderResponse, ProviderCallError> {
            Err(ProviderCallError {
                kind: FailureKind::SafetyBlock,
                message: "blocked".to_string(),
            })
        }
        let responses = vec![
            blocked(),
            blocked(),
            Ok(ProviderResponse {
                text: r#"{"title": "Safe Harbor", "genre": "drama", "premise": "p", "characters": [], "beginning": "b", "middle": "m", "ending": "e", "writingStyle": "warm", "targetWords": 1000, "targetChapters": 5}"#.to_string(),
                prompt_tokens: 5,
                completion_tokens: 5,
            }),
        ];
        let provider = Arc::new(FakeProvider::new(responses));
        let mut config = Config::default();
        config.provider_keys = vec!["A".into()];
        let gateway = Gateway::new(provider, config.clone());

        let plan = generate_plan(&gateway, &config, "a dangerous idea", BookTypeKind::Fiction)
            .await
            .unwrap();
        assert_eq!(plan.title, "Safe Harbor");
        assert_eq!(plan.original_idea, "a dangerous idea");
    }
}
