//! Illustration service client (spec §6, external interface): HTTP POST
//! to `/api/generate-illustration`, progressive-sanitization retry, and
//! the deterministic `buildIllustrationPromptFromScene`-equivalent
//! prompt builder. Grounded in the teacher's `utils/api_verification.rs`
//! reqwest-with-timeout client shape.

use crate::error::{EngineError, Result};
use crate::outline::PageScene;
use crate::plan::strip_sensitive_words;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
struct IllustrationRequest {
    scene: String,
    #[serde(rename = "artStyle")]
    art_style: String,
    characters: Option<Vec<String>>,
    setting: Option<String>,
    #[serde(rename = "bookTitle")]
    book_title: Option<String>,
    #[serde(rename = "characterVisualGuide")]
    character_visual_guide: Option<String>,
    #[serde(rename = "visualStyleGuide")]
    visual_style_guide: Option<String>,
    #[serde(rename = "bookFormat")]
    book_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImagePayload {
    base64: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
struct IllustrationResponse {
    image: Option<ImagePayload>,
    #[serde(rename = "altText")]
    alt_text: Option<String>,
    blocked: Option<bool>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Illustration {
    pub base64: String,
    pub mime_type: String,
    pub alt_text: Option<String>,
}

/// Deterministic scene→prompt builder (spec §4.8's
/// `buildIllustrationPromptFromScene`): integrates the style guide,
/// panel-layout instructions, and per-character action phrases into one
/// prompt string, without any LLM call.
pub fn build_illustration_prompt_from_scene(
    scene: &PageScene,
    visual_style_guide: &str,
    character_visual_guide: &str,
    panel_layout: Option<&str>,
) -> String {
    let mut parts = vec![format!("{}: {}", scene.location, scene.description)];
    if !scene.characters.is_empty() {
        let actions: Vec<String> = scene
            .characters
            .iter()
            .zip(scene.character_actions.iter().chain(std::iter::repeat(&String::new())))
            .map(|(name, action)| {
                if action.is_empty() {
                    name.clone()
                } else {
                    format!("{name} {action}")
                }
            })
            .collect();
        parts.push(format!("Characters: {}", actions.join(", ")));
    }
    if !scene.background.is_empty() {
        parts.push(format!("Background: {}", scene.background));
    }
    if !scene.mood.is_empty() {
        parts.push(format!("Mood: {}", scene.mood));
    }
    if !scene.camera_angle.is_empty() {
        parts.push(format!("Camera angle: {}", scene.camera_angle));
    }
    if let Some(layout) = panel_layout {
        parts.push(format!("Panel layout: {layout}"));
    }
    if !visual_style_guide.is_empty() {
        parts.push(format!("Style guide: {visual_style_guide}"));
    }
    if !character_visual_guide.is_empty() {
        parts.push(format!("Character appearances: {character_visual_guide}"));
    }
    parts.join(". ")
}

/// Word-list-then-atmospheric-refocus sanitization used on retry 2
/// (spec §6): strip sensitive terms, then keep only the location/mood.
fn atmospheric_refocus(scene_prompt: &str, scene: &PageScene) -> String {
    let sanitized = strip_sensitive_words(scene_prompt);
    if !scene.mood.is_empty() || !scene.location.is_empty() {
        format!("A quiet, atmospheric depiction of {}. Mood: {}.", scene.location, scene.mood)
    } else {
        sanitized
    }
}

/// A completely safe fallback scene derived from the chapter title and
/// setting, used on the final retry attempt (spec §6).
fn safe_fallback_prompt(chapter_title: &str, setting: &str) -> String {
    format!("A calm establishing illustration evoking \"{chapter_title}\", set in {setting}. No characters, no action, gentle lighting.")
}

pub struct IllustrationClient {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
}

impl IllustrationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, max_attempts: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builder should not fail with only a timeout set");
        Self {
            client,
            base_url: base_url.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    async fn request(&self, scene_prompt: &str, art_style: &str, book_title: Option<&str>) -> Result<Illustration> {
        let body = IllustrationRequest {
            scene: scene_prompt.to_string(),
            art_style: art_style.to_string(),
            characters: None,
            setting: None,
            book_title: book_title.map(str::to_string),
            character_visual_guide: None,
            visual_style_guide: None,
            book_format: None,
        };
        let url = format!("{}/api/generate-illustration", self.base_url);
        let response = self.client.post(&url).json(&body).send().await?;
        let parsed: IllustrationResponse = response.json().await?;
        if parsed.blocked.unwrap_or(false) {
            return Err(EngineError::Illustration(parsed.error.unwrap_or_else(|| "blocked".to_string())));
        }
        match parsed.image {
            Some(image) => Ok(Illustration {
                base64: image.base64,
                mime_type: image.mime_type,
                alt_text: parsed.alt_text,
            }),
            None => Err(EngineError::Illustration(parsed.error.unwrap_or_else(|| "no image returned".to_string()))),
        }
    }

    /// A cover is a single description, not a scene — no sanitization
    /// ladder, since by the time a book completes its prose has already
    /// passed every prior content check. Failure is non-fatal (spec §7).
    pub async fn illustrate_cover(&self, description: &str, art_style: &str, book_title: &str) -> Result<Illustration> {
        self.request(description, art_style, Some(book_title)).await
    }

    /// Generates one page's illustration, retrying up to
    /// `max_attempts` times with progressively safer prompts (spec §6).
    /// Illustration failure is never fatal to the caller — the page is
    /// persisted with text only (spec §7); callers should treat a final
    /// `Err` here that way.
    pub async fn illustrate_scene(
        &self,
        scene: &PageScene,
        visual_style_guide: &str,
        character_visual_guide: &str,
        panel_layout: Option<&str>,
        art_style: &str,
        book_title: &str,
        chapter_title: &str,
    ) -> Result<Illustration> {
        let original = build_illustration_prompt_from_scene(scene, visual_style_guide, character_visual_guide, panel_layout);

        let mut last_err = None;
        for attempt in 1..=self.max_attempts {
            let prompt = if attempt == 1 {
                original.clone()
            } else if attempt < self.max_attempts {
                atmospheric_refocus(&original, scene)
            } else {
                safe_fallback_prompt(chapter_title, &scene.location)
            };

            match self.request(&prompt, art_style, Some(book_title)).await {
                Ok(illustration) => return Ok(illustration),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or(EngineError::Illustration("exhausted illustration attempts".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_scene() -> PageScene {
        PageScene {
            location: "a quiet kitchen".to_string(),
            description: "morning light through the window".to_string(),
            characters: vec!["Nora".to_string()],
            character_actions: vec!["pouring coffee".to_string()],
            background: "steam rising from the pot".to_string(),
            mood: "calm".to_string(),
            camera_angle: "eye level".to_string(),
        }
    }

    #[test]
    fn prompt_builder_includes_all_scene_fields() {
        let prompt = build_illustration_prompt_from_scene(&sample_scene(), "watercolor", "Nora: red coat", Some("splash"));
        assert!(prompt.contains("quiet kitchen"));
        assert!(prompt.contains("Nora pouring coffee"));
        assert!(prompt.contains("splash"));
        assert!(prompt.contains("watercolor"));
    }

    #[test]
    fn safe_fallback_never_mentions_characters() {
        let prompt = safe_fallback_prompt("The Quiet House", "a kitchen");
        assert!(!prompt.to_lowercase().contains("nora"));
    }
}
