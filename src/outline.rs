//! Outline & Plan Builder, outline half (spec §4.7, C7): one-shot
//! fiction/non-fiction chapter outlines, and the two-step illustrated
//! story→pages pipeline.

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::format::FormatConfig;
use crate::json;
use crate::llm::{Gateway, GenerationConfig, ModelRole, SafetySettings};
use crate::plan::{self, Plan};
use crate::utils::names_safety;
use crate::utils::prompts::Prompts;
use langchain_rust::prompt::PromptFromatter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterOutline {
    pub number: u32,
    pub title: String,
    pub summary: String,
    pub pov: Option<String>,
    pub target_words: u32,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueLine {
    pub character: String,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageScene {
    pub location: String,
    pub description: String,
    pub characters: Vec<String>,
    pub character_actions: Vec<String>,
    pub background: String,
    pub mood: String,
    pub camera_angle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageOutline {
    pub number: u32,
    pub text: Option<String>,
    pub dialogue: Vec<DialogueLine>,
    pub panel_layout: Option<String>,
    pub scene: Option<PageScene>,
}

fn get_str(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn get_opt_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn get_u32(value: &Value, key: &str, default: u32) -> u32 {
    value.get(key).and_then(Value::as_u64).map(|n| n as u32).unwrap_or(default)
}

fn get_str_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Runs `prompts` in order, returning the first one that doesn't hit a
/// safety block (spec §4.7's per-pipeline sanitization retry).
async fn generate_with_retry(gateway: &Gateway, config: &Config, role: ModelRole, prompts: &[String]) -> Result<String> {
    let gen_config = GenerationConfig::for_role(role, config);
    let mut last_block = None;
    for prompt in prompts {
        match gateway.generate(role, prompt, &gen_config, &SafetySettings::default()).await {
            Ok(text) => return Ok(text),
            Err(EngineError::SafetyBlocked) => {
                last_block = Some(EngineError::SafetyBlocked);
                continue;
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_block.unwrap_or(EngineError::SafetyBlocked))
}

fn parse_chapters(raw: &str) -> Result<Vec<ChapterOutline>> {
    let value = json::parse(raw)?;
    let array = value
        .as_array()
        .ok_or_else(|| EngineError::SerializationError("outline response is not a JSON array".to_string()))?;
    Ok(array
        .iter()
        .map(|c| ChapterOutline {
            number: get_u32(c, "number", 0),
            title: get_str(c, "title"),
            summary: get_str(c, "summary"),
            pov: get_opt_str(c, "pov"),
            target_words: get_u32(c, "targetWords", 0),
            key_points: get_str_array(c, "keyPoints"),
        })
        .collect())
}

/// Fiction outline (spec §4.7): one-shot, per-chapter target words
/// distributed evenly, structural JSON check only (no narrative
/// validator runs against an outline).
pub async fn generate_fiction_outline(gateway: &Gateway, config: &Config, plan: &Plan) -> Result<Vec<ChapterOutline>> {
    let words_per_chapter = plan.target_words / plan.target_chapters.max(1);
    let characters_text = plan
        .characters
        .iter()
        .map(|c| format!("{}: {}", c.name, c.description))
        .collect::<Vec<_>>()
        .join("; ");

    let build = |beginning: &str, middle: &str, ending: &str| -> Result<String> {
        Ok(Prompts::fiction_outline().format(langchain_rust::prompt_args! {
            "target_chapters" => plan.target_chapters.to_string(),
            "title" => plan.title.clone(),
            "genre" => plan.genre.clone(),
            "premise" => plan.premise.clone(),
            "beginning" => beginning.to_string(),
            "middle" => middle.to_string(),
            "ending" => ending.to_string(),
            "characters" => characters_text.clone(),
            "words_per_chapter" => words_per_chapter.to_string(),
        })?)
    };

    let prompts = vec![
        build(&plan.beginning, &plan.middle, &plan.ending)?,
        build(
            &plan::strip_sensitive_words(&plan.beginning),
            &plan::strip_sensitive_words(&plan.middle),
            &plan::strip_sensitive_words(&plan.ending),
        )?,
    ];

    let raw = generate_with_retry(gateway, config, ModelRole::Flash, &prompts).await?;
    let mut chapters = parse_chapters(&raw)?;
    for chapter in &mut chapters {
        chapter.title = names_safety::sanitize(&chapter.title);
        chapter.summary = names_safety::sanitize(&chapter.summary);
    }
    Ok(chapters)
}

/// Non-fiction outline (spec §4.7): introduction, one body chapter per
/// comma-separated topic, conclusion.
pub async fn generate_nonfiction_outline(gateway: &Gateway, config: &Config, plan: &Plan) -> Result<Vec<ChapterOutline>> {
    let topics: Vec<&str> = plan.middle.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
    let target_chapters = (topics.len() as u32) + 2; // introduction + topics + conclusion

    let build = |hook: &str, topics_text: &str, takeaways: &str| -> Result<String> {
        Ok(Prompts::nonfiction_outline().format(langchain_rust::prompt_args! {
            "target_chapters" => target_chapters.to_string(),
            "title" => plan.title.clone(),
            "hook" => hook.to_string(),
            "topics" => topics_text.to_string(),
            "takeaways" => takeaways.to_string(),
        })?)
    };

    let topics_text = topics.join(", ");
    let prompts = vec![
        build(&plan.beginning, &topics_text, &plan.ending)?,
        build(
            &plan::strip_sensitive_words(&plan.beginning),
            &plan::strip_sensitive_words(&topics_text),
            &plan::strip_sensitive_words(&plan.ending),
        )?,
    ];

    let raw = generate_with_retry(gateway, config, ModelRole::Flash, &prompts).await?;
    let mut chapters = parse_chapters(&raw)?;
    for chapter in &mut chapters {
        chapter.title = names_safety::sanitize(&chapter.title);
        chapter.summary = names_safety::sanitize(&chapter.summary);
    }
    Ok(chapters)
}

fn parse_pages(raw: &str) -> Result<Vec<PageOutline>> {
    let value = json::parse(raw)?;
    let array = value
        .as_array()
        .ok_or_else(|| EngineError::SerializationError("page outline response is not a JSON array".to_string()))?;
    Ok(array
        .iter()
        .map(|p| {
            let scene = p.get("scene").map(|s| PageScene {
                location: get_str(s, "location"),
                description: get_str(s, "description"),
                characters: get_str_array(s, "characters"),
                character_actions: get_str_array(s, "characterActions"),
                background: get_str(s, "background"),
                mood: get_str(s, "mood"),
                camera_angle: get_str(s, "cameraAngle"),
            });
            let dialogue = p
                .get("dialogue")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .map(|d| DialogueLine {
                            character: get_str(d, "character"),
                            line: get_str(d, "line"),
                        })
                        .collect()
                })
                .unwrap_or_default();
            PageOutline {
                number: get_u32(p, "number", 0),
                text: get_opt_str(p, "text"),
                dialogue,
                panel_layout: get_opt_str(p, "panelLayout"),
                scene,
            }
        })
        .collect())
}

const MAX_PAGE_COUNT_ATTEMPTS: u32 = 3;

/// Illustrated outline (spec §4.7): step 1 writes the complete story,
/// step 2 breaks it into exactly `target_pages` page records with
/// strict exact-count enforcement, retrying with a corrective note on
/// mismatch before falling back to a deterministic pad/truncate.
pub async fn generate_illustrated_outline(
    gateway: &Gateway,
    config: &Config,
    plan: &Plan,
    format: &FormatConfig,
) -> Result<Vec<PageOutline>> {
    let target_pages = plan.target_chapters;
    let words_per_page = plan.target_words / target_pages.max(1);
    let target_words = words_per_page * target_pages;
    let characters_text = plan
        .characters
        .iter()
        .map(|c| format!("{}: {}", c.name, c.description))
        .collect::<Vec<_>>()
        .join("; ");

    let build_story = |beginning: &str, middle: &str, ending: &str, words: u32| -> Result<String> {
        Ok(Prompts::illustrated_story().format(langchain_rust::prompt_args! {
            "target_words" => words.to_string(),
            "title" => plan.title.clone(),
            "beginning" => beginning.to_string(),
            "middle" => middle.to_string(),
            "ending" => ending.to_string(),
            "characters" => characters_text.clone(),
        })?)
    };

    // Retry ladder: original, sanitized fields, then an aggressive
    // shortening mode (half the target length) on top of sanitization.
    let story_prompts = vec![
        build_story(&plan.beginning, &plan.middle, &plan.ending, target_words)?,
        build_story(
            &plan::strip_sensitive_words(&plan.beginning),
            &plan::strip_sensitive_words(&plan.middle),
            &plan::strip_sensitive_words(&plan.ending),
            target_words,
        )?,
        build_story(
            &plan::strip_sensitive_words(&plan.beginning),
            &plan::strip_sensitive_words(&plan.middle),
            &plan::strip_sensitive_words(&plan.ending),
            (target_words / 2).max(1),
        )?,
    ];
    let story = generate_with_retry(gateway, config, ModelRole::Pro, &story_prompts).await?;
    let story = names_safety::sanitize(&story);

    let mut correction = String::new();
    let mut pages: Vec<PageOutline> = Vec::new();
    for attempt in 1..=MAX_PAGE_COUNT_ATTEMPTS {
        let prompt = Prompts::illustrated_pages().format(langchain_rust::prompt_args! {
            "target_pages" => target_pages.to_string(),
            "story" => format!("{story}\n\n{correction}"),
        })?;
        let gen_config = GenerationConfig::for_role(ModelRole::Flash, config);
        let raw = gateway
            .generate(ModelRole::Flash, &prompt, &gen_config, &SafetySettings::default())
            .await?;
        pages = parse_pages(&raw)?;
        if pages.len() as u32 == target_pages {
            break;
        }
        correction = format!(
            "Your previous response returned {} pages; it must be EXACTLY {} pages, no more, no fewer.",
            pages.len(),
            target_pages
        );
        if attempt == MAX_PAGE_COUNT_ATTEMPTS {
            enforce_exact_count(&mut pages, target_pages as usize);
        }
    }

    for page in &mut pages {
        if let Some(text) = &mut page.text {
            *text = names_safety::sanitize(text);
        }
        for line in &mut page.dialogue {
            line.line = names_safety::sanitize(&line.line);
        }
    }

    Ok(pages)
}

/// Deterministic fallback when the model never returns the exact page
/// count after every retry: truncate the overshoot, or pad by repeating
/// the final page (renumbered) for the shortfall.
fn enforce_exact_count(pages: &mut Vec<PageOutline>, target: usize) {
    if pages.len() > target {
        pages.truncate(target);
    } else {
        while pages.len() < target {
            let filler = pages.last().cloned().unwrap_or(PageOutline {
                number: 0,
                text: Some(String::new()),
                dialogue: Vec::new(),
                panel_layout: None,
                scene: None,
            });
            pages.push(filler);
        }
    }
    for (i, page) in pages.iter_mut().enumerate() {
        page.number = i as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanCharacter;

    fn sample_plan() -> Plan {
        Plan {
            title: "The Quiet House".to_string(),
            genre: "mystery".to_string(),
            book_type: crate::plan::BookTypeKind::Fiction,
            premise: "A family moves into a house with secrets.".to_string(),
            characters: vec![PlanCharacter {
                name: "Nora".to_string(),
                description: "the new homeowner".to_string(),
                visual_hints: "red coat".to_string(),
            }],
            beginning: "They arrive.".to_string(),
            middle: "They investigate.".to_string(),
            ending: "They uncover the truth.".to_string(),
            writing_style: "atmospheric".to_string(),
            target_words: 6000,
            target_chapters: 6,
            original_idea: "a family moves into a haunted house".to_string(),
        }
    }

    #[test]
    fn parse_chapters_reads_number_and_title() {
        let raw = r#"[{"number": 1, "title": "Arrival", "summary": "s", "targetWords": 1000}]"#;
        let chapters = parse_chapters(raw).unwrap();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Arrival");
    }

    #[test]
    fn enforce_exact_count_truncates_overshoot() {
        let mut pages = vec![
            PageOutline { number: 1, text: Some("a".into()), dialogue: vec![], panel_layout: None, scene: None },
            PageOutline { number: 2, text: Some("b".into()), dialogue: vec![], panel_layout: None, scene: None },
            PageOutline { number: 3, text: Some("c".into()), dialogue: vec![], panel_layout: None, scene: None },
        ];
        enforce_exact_count(&mut pages, 2);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].number, 2);
    }

    #[test]
    fn enforce_exact_count_pads_shortfall() {
        let mut pages = vec![PageOutline { number: 1, text: Some("a".into()), dialogue: vec![], panel_layout: None, scene: None }];
        enforce_exact_count(&mut pages, 3);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].number, 3);
    }

    #[tokio::test]
    async fn generate_fiction_outline_parses_exact_chapter_count() {
        use crate::llm::testutil::FakeProvider;
        use crate::llm::ProviderResponse;
        use std::sync::Arc;

        let plan = sample_plan();
        let json = serde_json::json!([
            {"number": 1, "title": "Arrival", "summary": "They move in.", "targetWords": 1000},
            {"number": 2, "title": "Unease", "summary": "Strange sounds.", "targetWords": 1000},
            {"number": 3, "title": "Discovery", "summary": "A hidden room.", "targetWords": 1000},
            {"number": 4, "title": "Confrontation", "summary": "The truth surfaces.", "targetWords": 1000},
            {"number": 5, "title": "Reckoning", "summary": "They decide what to do.", "targetWords": 1000},
            {"number": 6, "title": "After", "summary": "Life resumes, changed.", "targetWords": 1000},
        ])
        .to_string();

        let provider = Arc::new(FakeProvider::new(vec![Ok(ProviderResponse {
            text: json,
            prompt_tokens: 5,
            completion_tokens: 5,
        })]));
        let mut config = Config::default();
        config.provider_keys = vec!["A".into()];
        let gateway = Gateway::new(provider, config.clone());

        let chapters = generate_fiction_outline(&gateway, &config, &plan).await.unwrap();
        assert_eq!(chapters.len(), 6);
    }
}
