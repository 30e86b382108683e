//! The top-level `Engine` object (Design Notes §9): holds the gateway,
//! config, per-book runtime state, illustration client, and persistence
//! handle, and drives one book through the Book Driver state machine
//! (spec §4.9, C9). Grounded in the teacher's `utils/api_verification.rs`
//! pattern of a single process-wide object owning shared state, adapted
//! here to an explicit struct instead of `Lazy` statics since every
//! dependency (gateway, persistence) is already constructed once by the
//! caller and handed in.

use crate::book::{Book, BookStatus, BookType, Outline};
use crate::chapter_gen::{self, ChapterGenInputs, HeaderStyle};
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::format::{BookFormat, FormatConfig};
use crate::heat::ContentType;
use crate::illustration::IllustrationClient;
use crate::json;
use crate::llm::{Gateway, GenerationConfig, ModelRole, SafetySettings};
use crate::outline::{self, PageOutline};
use crate::persistence::{Persistence, StatusSnapshot};
use crate::plan;
use crate::state::PerBookStore;
use crate::utils::prompts::Prompts;
use langchain_rust::prompt::PromptFromatter;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Engine {
    gateway: Gateway,
    config: Config,
    store: PerBookStore,
    persistence: Arc<dyn Persistence>,
    illustration: IllustrationClient,
}

fn header_style_for(format: BookFormat) -> HeaderStyle {
    match format {
        BookFormat::Screenplay => HeaderStyle::Titles,
        _ => HeaderStyle::Both,
    }
}

fn default_content_type(genre: &str) -> ContentType {
    let lower = genre.to_lowercase();
    if lower.contains("horror") {
        ContentType::Horror
    } else if lower.contains("romance") {
        ContentType::Romance
    } else if lower.contains("thriller") || lower.contains("action") || lower.contains("war") {
        ContentType::Violence
    } else {
        ContentType::General
    }
}

impl Engine {
    pub fn new(gateway: Gateway, config: Config, persistence: Arc<dyn Persistence>) -> Self {
        let illustration = IllustrationClient::new(
            config.illustration_base_url.clone(),
            config.illustration_timeout,
            config.max_illustration_attempts,
        );
        Self {
            gateway,
            config,
            store: PerBookStore::new(),
            persistence,
            illustration,
        }
    }

    async fn persist_status(&self, book: &Book) -> Result<()> {
        info!(book_id = %book.id, status = ?book.status, "book status transition");
        self.persistence.save_book(book).await?;
        self.persistence
            .save_status(&StatusSnapshot {
                id: book.id.clone(),
                status: book.status,
                current_chapter: book.current_chapter,
                total_chapters: book.target_chapters,
                total_words: book.total_words,
                book_format: format!("{:?}", book.format),
                dialogue_style: format!("{:?}", book.dialogue_style),
                book_preset: "none".to_string(),
            })
            .await
    }

    /// Returns `true` once an external actor has flipped the book's
    /// persisted status to `Failed` (spec §5 cancellation: "polled
    /// before each chapter and between beats"; this engine polls at the
    /// chapter granularity, since that's the checkpoint it controls).
    async fn is_cancelled(&self, book_id: &str) -> Result<bool> {
        Ok(self
            .persistence
            .load_status(book_id)
            .await?
            .map(|s| s.status == BookStatus::Failed)
            .unwrap_or(false))
    }

    /// Drives a book from `pending` through to `completed`/`failed`
    /// (spec §4.9). `book` must be freshly constructed (status pending).
    pub async fn start_book(&self, book: &mut Book, idea: &str) -> Result<()> {
        if !book.transition_to(BookStatus::Outlining) {
            return Err(EngineError::StateConflict("book is not in pending status".to_string()));
        }
        self.persist_status(book).await?;

        let plan = match plan::generate_plan(&self.gateway, &self.config, idea, book.book_type).await {
            Ok(plan) => plan,
            Err(err) => {
                warn!(book_id = %book.id, %err, "idea expansion failed, failing book");
                book.fail(format!("idea expansion failed: {err}"));
                self.persist_status(book).await?;
                return Err(err);
            }
        };
        book.title = plan.title.clone();
        book.genre = plan.genre.clone();
        book.target_words = plan.target_words;
        book.plan_snapshot = Some(plan.clone());

        let format_config = book.format.config();
        let outline_result = self.generate_outline(&plan, &format_config, book.book_type).await;
        let outline = match outline_result {
            Ok(outline) => outline,
            Err(err) => {
                warn!(book_id = %book.id, %err, "outline generation failed, failing book");
                book.fail(format!("outline generation failed: {err}"));
                self.persist_status(book).await?;
                return Err(err);
            }
        };
        book.target_chapters = outline.chapter_count();
        book.outline = Some(outline);
        self.persist_status(book).await?;

        if !book.transition_to(BookStatus::Generating) {
            return Err(EngineError::StateConflict("outline did not persist before generating".to_string()));
        }

        if format_config.is_visual {
            if let Err(err) = self.generate_visual_guides(book).await {
                warn!(book_id = %book.id, %err, "visual guide generation failed, failing book");
                book.fail(format!("visual guide generation failed: {err}"));
                self.persist_status(book).await?;
                return Err(err);
            }
        }
        self.persist_status(book).await?;

        let run_result = self.run_chapters(book, &format_config).await;
        match run_result {
            Ok(()) => {
                book.transition_to(BookStatus::Completed);
                info!(book_id = %book.id, "book completed");
                self.persist_status(book).await?;
                self.schedule_cover(book).await;
                Ok(())
            }
            Err(err) => {
                warn!(book_id = %book.id, %err, "chapter generation failed, failing book");
                book.fail(format!("chapter generation failed: {err}"));
                self.persist_status(book).await?;
                Err(err)
            }
        }
    }

    async fn generate_outline(&self, plan: &plan::Plan, format_config: &FormatConfig, book_type: BookType) -> Result<Outline> {
        if format_config.is_visual {
            let pages = outline::generate_illustrated_outline(&self.gateway, &self.config, plan, format_config).await?;
            return Ok(Outline::Illustrated(pages));
        }
        match book_type {
            BookType::Fiction => {
                let chapters = outline::generate_fiction_outline(&self.gateway, &self.config, plan).await?;
                Ok(Outline::Fiction(chapters))
            }
            BookType::NonFiction => {
                let chapters = outline::generate_nonfiction_outline(&self.gateway, &self.config, plan).await?;
                Ok(Outline::NonFiction(chapters))
            }
        }
    }

    /// Two JSON flash calls for visual books before chapters begin
    /// (spec §4.9).
    async fn generate_visual_guides(&self, book: &mut Book) -> Result<()> {
        let plan = book.plan_snapshot.clone().expect("plan set before outline");
        let gen_config = GenerationConfig::for_role(ModelRole::Flash, &self.config);

        let style_prompt = Prompts::visual_style_guide().format(langchain_rust::prompt_args! {
            "title" => book.title.clone(),
            "genre" => book.genre.clone(),
        })?;
        let style_raw = self
            .gateway
            .generate(ModelRole::Flash, &style_prompt, &gen_config, &SafetySettings::default())
            .await?;
        json::parse(&style_raw)?; // structural validation only
        book.visual_style_guide = Some(style_raw);

        let characters_text = plan
            .characters
            .iter()
            .map(|c| format!("{}: {}", c.name, c.description))
            .collect::<Vec<_>>()
            .join("; ");
        let character_prompt = Prompts::character_visual_guide().format(langchain_rust::prompt_args! {
            "characters" => characters_text,
        })?;
        let character_raw = self
            .gateway
            .generate(ModelRole::Flash, &character_prompt, &gen_config, &SafetySettings::default())
            .await?;
        json::parse(&character_raw)?;
        book.character_visual_guide = Some(character_raw);

        Ok(())
    }

    async fn run_chapters(&self, book: &mut Book, format_config: &FormatConfig) -> Result<()> {
        let outline = book.outline.clone().expect("outline set before generating");
        match outline {
            Outline::Fiction(chapters) | Outline::NonFiction(chapters) => {
                self.run_prose_chapters(book, format_config, &chapters).await
            }
            Outline::Illustrated(pages) => self.run_illustrated_pages(book, &pages).await,
        }
    }

    async fn run_prose_chapters(
        &self,
        book: &mut Book,
        format_config: &FormatConfig,
        chapters: &[crate::outline::ChapterOutline],
    ) -> Result<()> {
        let plan = book.plan_snapshot.clone().expect("plan set before generating");
        let character_names: Vec<&str> = plan.characters.iter().map(|c| c.name.as_str()).collect();
        let content_type = default_content_type(&book.genre);
        let header_style = header_style_for(book.format);
        let total = chapters.len() as u32;
        let mut anchor = String::new();

        for chapter in chapters {
            if self.is_cancelled(&book.id).await? {
                warn!(book_id = %book.id, chapter = chapter.number, "book cancelled externally, stopping chapter generation");
                return Err(EngineError::StateConflict("book cancelled externally".to_string()));
            }

            let inputs = ChapterGenInputs {
                book_id: &book.id,
                chapter_number: chapter.number,
                chapter_title: &chapter.title,
                pov: chapter.pov.as_deref(),
                chapter_plan: &chapter.summary,
                target_words: chapter.target_words.max(1),
                format: format_config,
                genre: &book.genre,
                anchor: &anchor,
                character_names: &character_names,
                rating: book.content_rating,
                content_type,
                header_style,
                is_last_chapter: chapter.number == total,
                closing_marker_enabled: true,
            };

            let result = chapter_gen::generate_chapter(&self.gateway, &self.store, &self.config, &inputs).await?;
            if chapter.number == 1 {
                anchor = result.summary.clone();
            }

            let full_text = format!("{}\n\n{}", result.header, result.text);
            self.persistence.save_chapter(&book.id, chapter.number, &full_text).await?;

            let word_count = result.text.split_whitespace().count() as u32;
            info!(book_id = %book.id, chapter = chapter.number, word_count, "chapter accepted");
            book.record_chapter(chapter.number, word_count);
            self.persist_status(book).await?;
        }
        Ok(())
    }

    async fn run_illustrated_pages(&self, book: &mut Book, pages: &[PageOutline]) -> Result<()> {
        for page in pages {
            if self.is_cancelled(&book.id).await? {
                warn!(book_id = %book.id, page = page.number, "book cancelled externally, stopping page generation");
                return Err(EngineError::StateConflict("book cancelled externally".to_string()));
            }

            let text = page
                .text
                .clone()
                .unwrap_or_else(|| page.dialogue.iter().map(|d| format!("{}: {}", d.character, d.line)).collect::<Vec<_>>().join("\n"));
            self.persistence.save_chapter(&book.id, page.number, &text).await?;

            if let Some(scene) = &page.scene {
                let style_guide = book.visual_style_guide.clone().unwrap_or_default();
                let character_guide = book.character_visual_guide.clone().unwrap_or_default();
                // Illustration failure is non-fatal (spec §7): the page
                // is persisted with text only.
                if let Err(err) = self
                    .illustration
                    .illustrate_scene(
                        scene,
                        &style_guide,
                        &character_guide,
                        page.panel_layout.as_deref(),
                        &book.genre,
                        &book.title,
                        &book.title,
                    )
                    .await
                {
                    warn!(book_id = %book.id, page = page.number, %err, "illustration failed, keeping text-only page");
                }
            }

            let word_count = text.split_whitespace().count() as u32;
            info!(book_id = %book.id, page = page.number, word_count, "page accepted");
            book.record_chapter(page.number, word_count);
            self.persist_status(book).await?;
        }
        Ok(())
    }

    /// Schedules the cover-prompt + cover-image calls (spec §4.9).
    /// Absence of a cover must never block completion, so every failure
    /// here is swallowed after being attempted once.
    async fn schedule_cover(&self, book: &Book) {
        let Some(plan) = &book.plan_snapshot else { return };
        let gen_config = GenerationConfig::for_role(ModelRole::Pro, &self.config);
        let Ok(prompt) = Prompts::cover_prompt().format(langchain_rust::prompt_args! {
            "title" => book.title.clone(),
            "genre" => book.genre.clone(),
            "synopsis" => plan.premise.clone(),
        }) else {
            return;
        };
        let description = match self
            .gateway
            .generate(ModelRole::Pro, &prompt, &gen_config, &SafetySettings::default())
            .await
        {
            Ok(description) => description,
            Err(err) => {
                warn!(book_id = %book.id, %err, "cover description generation failed, skipping cover");
                return;
            }
        };
        if let Err(err) = self.illustration.illustrate_cover(&description, &book.genre, &book.title).await {
            warn!(book_id = %book.id, %err, "cover illustration failed, skipping cover");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ContentRating, DialogueStyle};
    use crate::llm::testutil::FakeProvider;
    use crate::llm::ProviderResponse;
    use crate::persistence::InMemoryPersistence;

    fn resp(text: &str) -> std::result::Result<ProviderResponse, crate::llm::ProviderCallError> {
        Ok(ProviderResponse {
            text: text.to_string(),
            prompt_tokens: 5,
            completion_tokens: 5,
        })
    }

    #[test]
    fn header_style_is_titles_only_for_screenplay() {
        assert_eq!(header_style_for(BookFormat::Screenplay), HeaderStyle::Titles);
        assert_eq!(header_style_for(BookFormat::Novel), HeaderStyle::Both);
    }

    #[test]
    fn content_type_detection_flags_horror_genre() {
        assert_eq!(default_content_type("cozy horror"), ContentType::Horror);
        assert_eq!(default_content_type("literary fiction"), ContentType::General);
    }

    #[tokio::test]
    async fn start_book_marks_failed_when_idea_expansion_exhausts_every_rung() {
        use crate::llm::FailureKind;
        use crate::llm::ProviderCallError;

        fn blocked() -> std::result::Result<ProviderResponse, ProviderCallError> {
            Err(ProviderCallError {
                kind: FailureKind::SafetyBlock,
                message: "blocked".to_string(),
            })
        }
        let responses = vec![blocked(), blocked(), blocked(), blocked()];
        let provider = Arc::new(FakeProvider::new(responses));
        let mut config = Config::default();
        config.provider_keys = vec!["A".to_string()];
        let gateway = Gateway::new(provider, config.clone());
        let persistence = Arc::new(InMemoryPersistence::new());
        let engine = Engine::new(gateway, config, persistence);

        let mut book = Book::new(
            "book-1",
            "untitled",
            "",
            BookType::Fiction,
            BookFormat::Novel,
            DialogueStyle::Prose,
            ContentRating::General,
            10_000,
            5,
            "a dangerous idea",
        );

        let result = engine.start_book(&mut book, "a dangerous idea").await;
        assert!(result.is_err());
        assert_eq!(book.status, BookStatus::Failed);
    }

    /// Drives a minimal illustrated (picture-book) flow to completion.
    /// This path deliberately avoids the beat engine's narrative
    /// validators entirely (its page text is the outline's own already-
    /// written content), which keeps the fixture deterministic.
    #[tokio::test]
    async fn start_book_runs_a_minimal_illustrated_book_to_completion() {
        let plan_json = serde_json::json!({
            "title": "Safe Harbor", "genre": "drama", "premise": "p",
            "characters": [{"name": "Nora", "description": "d", "visualHints": "h"}],
            "beginning": "b", "middle": "m", "ending": "e",
            "writingStyle": "warm", "targetWords": 200, "targetChapters": 1
        })
        .to_string();
        let story_text = "Nora arrived quietly and set her bag down in the hall.";
        let pages_json = serde_json::json!([
            {
                "number": 1,
                "text": "Nora arrived quietly.",
                "dialogue": [],
                "scene": {
                    "location": "a hallway", "description": "dim evening light",
                    "characters": ["Nora"], "characterActions": ["walking in"],
                    "background": "dust motes", "mood": "calm", "cameraAngle": "wide"
                }
            }
        ])
        .to_string();

        let responses = vec![
            resp(&plan_json),
            resp(story_text),
            resp(&pages_json),
            resp(r#"{"palette": "muted", "lineStyle": "soft", "mood": "calm", "influences": "watercolor"}"#),
            resp(r#"[{"name": "Nora", "appearance": "a", "outfit": "b", "distinguishingFeatures": "c"}]"#),
            resp("A cover description."),
        ];
        let provider = Arc::new(FakeProvider::new(responses));
        let mut config = Config::default();
        config.provider_keys = vec!["A".to_string()];
        config.illustration_timeout = std::time::Duration::from_millis(50);
        let gateway = Gateway::new(provider, config.clone());
        let persistence = Arc::new(InMemoryPersistence::new());
        let engine = Engine::new(gateway, config, persistence);

        let mut book = Book::new(
            "book-1",
            "untitled",
            "",
            BookType::Fiction,
            BookFormat::PictureBook,
            DialogueStyle::Prose,
            ContentRating::Childrens,
            200,
            1,
            "a family moves into a house",
        );

        let result = engine.start_book(&mut book, "a family moves into a house").await;
        assert!(result.is_ok());
        assert_eq!(book.status, BookStatus::Completed);
        assert_eq!(book.current_chapter, 1);
    }
}
