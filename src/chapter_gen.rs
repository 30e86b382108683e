//! Chapter Generation Orchestrator (spec §4.8, C8): drives beats→chapter
//! assembly, runs post-processing, summarizes the chapter and updates
//! character state on the review key path, and applies the header rule.

use crate::beats::{self, BeatOutcome, ChapterBeatInputs};
use crate::config::Config;
use crate::error::Result;
use crate::format::{ContentRating, FormatConfig};
use crate::heat::ContentType;
use crate::json;
use crate::llm::{Gateway, GenerationConfig, ModelRole, SafetySettings};
use crate::postprocess::{self, CharacterRef, StageCounts};
use crate::state::{CharacterFactUpdate, PerBookStore};
use crate::utils::prompts::Prompts;
use langchain_rust::prompt::PromptFromatter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

/// Header format rule imposed programmatically by the book's format
/// (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    Numbers,
    Titles,
    Both,
    Pov,
}

fn render_header(style: HeaderStyle, number: u32, title: &str, pov: Option<&str>) -> String {
    match style {
        HeaderStyle::Numbers => format!("Chapter {number}"),
        HeaderStyle::Titles => title.to_string(),
        HeaderStyle::Both => format!("Chapter {number}: {title}"),
        HeaderStyle::Pov => match pov {
            Some(pov) => format!("Chapter {number} — {pov}"),
            None => format!("Chapter {number}"),
        },
    }
}

static END_MARKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\n*\s*(the\s+end|fin|epilogue)\.?\s*$").unwrap());
static DASH_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[–—]").unwrap());

/// Strips any end-of-book marker the model appended and replaces en/em
/// dashes with commas (spec §4.8: "remove end-of-book markers and dash
/// characters"), independent of C5's own euphemism-reversal pass.
fn strip_markers_and_dashes(text: &str, keep_closing_marker: bool) -> String {
    let stripped = if keep_closing_marker {
        text.to_string()
    } else {
        END_MARKER_PATTERN.replace(text, "").into_owned()
    };
    DASH_PATTERN.replace_all(&stripped, ",").into_owned()
}

pub struct ChapterGenInputs<'a> {
    pub book_id: &'a str,
    pub chapter_number: u32,
    pub chapter_title: &'a str,
    pub pov: Option<&'a str>,
    pub chapter_plan: &'a str,
    pub target_words: u32,
    pub format: &'a FormatConfig,
    pub genre: &'a str,
    pub anchor: &'a str,
    pub character_names: &'a [&'a str],
    pub rating: ContentRating,
    pub content_type: ContentType,
    pub header_style: HeaderStyle,
    pub is_last_chapter: bool,
    pub closing_marker_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterGenResult {
    pub header: String,
    pub text: String,
    pub summary: String,
    pub beats: Vec<BeatOutcome>,
    pub postprocess: StageCounts,
}

fn get_str(value: &Value, key: &str) -> String {
    value.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn get_bool(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn get_str_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn parse_character_update(entry: &Value) -> CharacterFactUpdate {
    CharacterFactUpdate {
        age: entry.get("newAge").and_then(Value::as_u64).map(|n| n as u32),
        time_jump: get_bool(entry, "timeJump"),
        location: entry.get("newLocation").and_then(Value::as_str).map(str::to_string),
        transit_narrated: get_bool(entry, "transitNarrated"),
        last_action: entry.get("lastAction").and_then(Value::as_str).map(str::to_string),
        new_knows: get_str_array(entry, "newKnows"),
        new_wounds: get_str_array(entry, "newWounds"),
        new_conditions: get_str_array(entry, "newConditions"),
    }
}

/// Summarizes the chapter on the review key path (spec §4.8).
async fn summarize_chapter(gateway: &Gateway, config: &Config, chapter_text: &str) -> Result<String> {
    let prompt = Prompts::chapter_summary().format(langchain_rust::prompt_args! {
        "chapter_text" => chapter_text.to_string(),
    })?;
    let gen_config = GenerationConfig::for_role(ModelRole::Flash, config);
    gateway
        .generate_review(ModelRole::Flash, &prompt, &gen_config, &SafetySettings::default())
        .await
}

/// Extracts per-character updates on the review key path and applies
/// them to C3. A rejected update (age regression, unnarrated transit) is
/// logged and otherwise ignored — advisory only (spec §7).
async fn update_character_state(
    gateway: &Gateway,
    store: &PerBookStore,
    config: &Config,
    book_id: &str,
    character_names: &[&str],
    chapter_text: &str,
) -> Result<()> {
    if character_names.is_empty() {
        return Ok(());
    }
    let prompt = Prompts::character_state_update().format(langchain_rust::prompt_args! {
        "character_names" => character_names.join(", "),
        "chapter_text" => chapter_text.to_string(),
    })?;
    let gen_config = GenerationConfig::for_role(ModelRole::Flash, config);
    let raw = gateway
        .generate_review(ModelRole::Flash, &prompt, &gen_config, &SafetySettings::default())
        .await?;
    let value = json::parse(&raw)?;
    let Some(entries) = value.as_array() else {
        return Ok(());
    };
    for entry in entries {
        let character = get_str(entry, "character");
        if character.is_empty() {
            continue;
        }
        let update = parse_character_update(entry);
        let accepted = store.update_character_facts(book_id, &character, &update);
        if !accepted {
            tracing::warn!(book_id, character, "character state update rejected (advisory conflict)");
        }
    }
    Ok(())
}

/// Runs one chapter end to end (spec §4.8): C6 for beats, C5 for
/// post-processing, marker/dash cleanup, then the two review-lane
/// calls. Chapter i's state-update call completing is what the driver
/// (C9) waits on before starting chapter i+1 (spec §4.9's ordering
/// guarantee).
pub async fn generate_chapter(
    gateway: &Gateway,
    store: &PerBookStore,
    config: &Config,
    inputs: &ChapterGenInputs<'_>,
) -> Result<ChapterGenResult> {
    let beat_inputs = ChapterBeatInputs {
        book_id: inputs.book_id,
        chapter_number: inputs.chapter_number,
        chapter_plan: inputs.chapter_plan,
        target_words: inputs.target_words,
        format: inputs.format,
        genre: inputs.genre,
        anchor: inputs.anchor,
        character_names: inputs.character_names,
        rating: inputs.rating,
        content_type: inputs.content_type,
    };
    let beats_result = beats::generate_chapter(gateway, store, config, &beat_inputs).await?;

    let genders: Vec<Option<String>> = store.with_book(inputs.book_id, |state| {
        inputs
            .character_names
            .iter()
            .map(|name| state.characters.get(*name).and_then(|fact| fact.gender.clone()))
            .collect()
    });
    let characters: Vec<CharacterRef> = inputs
        .character_names
        .iter()
        .zip(genders.iter())
        .map(|(name, gender)| CharacterRef { name, gender: gender.as_deref() })
        .collect();
    let (processed, postprocess_counts) = postprocess::run(&beats_result.text, &characters);
    let keep_closing_marker = inputs.is_last_chapter && inputs.closing_marker_enabled;
    let text = strip_markers_and_dashes(&processed, keep_closing_marker);

    let header = render_header(inputs.header_style, inputs.chapter_number, inputs.chapter_title, inputs.pov);

    let summary = summarize_chapter(gateway, config, &text).await?;
    update_character_state(gateway, store, config, inputs.book_id, inputs.character_names, &text).await?;

    Ok(ChapterGenResult {
        header,
        text,
        summary,
        beats: beats_result.beats,
        postprocess: postprocess_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_both_combines_number_and_title() {
        let header = render_header(HeaderStyle::Both, 3, "The Quiet House", None);
        assert_eq!(header, "Chapter 3: The Quiet House");
    }

    #[test]
    fn header_pov_falls_back_without_pov() {
        let header = render_header(HeaderStyle::Pov, 1, "Arrival", None);
        assert_eq!(header, "Chapter 1");
    }

    #[test]
    fn strip_markers_removes_the_end_unless_kept() {
        let text = "They walked into the dark.\n\nThe End.";
        assert!(!strip_markers_and_dashes(text, false).to_lowercase().contains("the end"));
        assert!(strip_markers_and_dashes(text, true).to_lowercase().contains("the end"));
    }

    #[test]
    fn strip_markers_replaces_dashes() {
        let text = "It was late\u{2014}too late to turn back.";
        let out = strip_markers_and_dashes(text, false);
        assert!(!out.contains('\u{2014}'));
        assert!(out.contains(','));
    }
}
