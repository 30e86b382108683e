//! Prompt templates for every stage of the pipeline (teacher's
//! `Prompts` struct pattern, generalized from a single-shot novel
//! generator into the plan/outline/beat/summary prompts this engine
//! actually issues).

use langchain_rust::prompt::{PromptTemplate, TemplateFormat};

pub struct Prompts;

impl Prompts {
    /// Idea → Plan (spec §4.7). The `book_type` variable lets the same
    /// template serve both the fiction and non-fiction variant.
    pub fn plan() -> PromptTemplate {
        PromptTemplate::new(
            "You are outlining a {book_type} book from a one-sentence idea.\n\nIdea: {idea}\n\n\
             Respond with a single JSON object with these exact fields: title, genre, bookType, premise \
             (<=300 words), characters (2-3 objects with name, description, visualHints; empty array for \
             non-fiction), beginning, middle, ending (for non-fiction: hook, topics as a comma-separated \
             list of at least 4, takeaways), writingStyle, targetWords, targetChapters.\n\n\
             Return ONLY the JSON object, no prose before or after.\n\nJSON:"
                .to_string(),
            vec!["book_type".to_string(), "idea".to_string()],
            TemplateFormat::FString,
        )
    }

    pub fn fiction_outline() -> PromptTemplate {
        PromptTemplate::new(
            "Generate a chapter-by-chapter outline for this book as a JSON array of exactly {target_chapters} \
             chapter objects, each with: number, title, summary, pov (optional), targetWords.\n\n\
             Title: {title}\nGenre: {genre}\nPremise: {premise}\nBeginning: {beginning}\nMiddle: {middle}\n\
             Ending: {ending}\nCharacters: {characters}\nTarget words per chapter: {words_per_chapter}\n\n\
             Return ONLY the JSON array.\n\nJSON:"
                .to_string(),
            vec![
                "target_chapters".to_string(),
                "title".to_string(),
                "genre".to_string(),
                "premise".to_string(),
                "beginning".to_string(),
                "middle".to_string(),
                "ending".to_string(),
                "characters".to_string(),
                "words_per_chapter".to_string(),
            ],
            TemplateFormat::FString,
        )
    }

    pub fn nonfiction_outline() -> PromptTemplate {
        PromptTemplate::new(
            "Generate a topic-structured outline as a JSON array of exactly {target_chapters} chapter objects: \
             an introduction chapter, body chapters (one per topic below), and a conclusion chapter. Each \
             object has: number, title, summary, keyPoints (3-5 strings).\n\n\
             Title: {title}\nHook: {hook}\nTopics: {topics}\nTakeaways: {takeaways}\n\n\
             Return ONLY the JSON array.\n\nJSON:"
                .to_string(),
            vec![
                "target_chapters".to_string(),
                "title".to_string(),
                "hook".to_string(),
                "topics".to_string(),
                "takeaways".to_string(),
            ],
            TemplateFormat::FString,
        )
    }

    /// Illustrated outline step 1: the full narrative story, before it
    /// is broken into exactly `targetChapters` pages (spec §4.7).
    pub fn illustrated_story() -> PromptTemplate {
        PromptTemplate::new(
            "Write a complete short story of approximately {target_words} words constrained by the beginning, \
             middle, and ending below, featuring these characters, with distinct scenes and real dialogue.\n\n\
             Title: {title}\nBeginning: {beginning}\nMiddle: {middle}\nEnding: {ending}\nCharacters: {characters}\n\n\
             Story:"
                .to_string(),
            vec![
                "target_words".to_string(),
                "title".to_string(),
                "beginning".to_string(),
                "middle".to_string(),
                "ending".to_string(),
                "characters".to_string(),
            ],
            TemplateFormat::FString,
        )
    }

    /// Illustrated outline step 2: breaks the step-1 story into exactly
    /// `target_pages` page records.
    pub fn illustrated_pages() -> PromptTemplate {
        PromptTemplate::new(
            "Break the following story into exactly {target_pages} pages as a JSON array. Each page object has: \
             number, text (prose) or dialogue (array of {{character, line}} for bubble dialogue), panelLayout \
             (splash|two_panel|three_panel|four_panel, comics only), and scene: {{location, description, \
             characters, characterActions, background, mood, cameraAngle}}.\n\n\
             Story: {story}\n\nReturn a JSON array of EXACTLY {target_pages} elements, no more, no fewer.\n\nJSON:"
                .to_string(),
            vec!["target_pages".to_string(), "story".to_string()],
            TemplateFormat::FString,
        )
    }

    /// A single beat's generation prompt (spec §4.6b). `surgical_feedback`
    /// is empty on the first attempt.
    pub fn beat() -> PromptTemplate {
        PromptTemplate::new(
            "Write beat {beat_number} of {beat_total} ({momentum}) for this chapter, targeting approximately \
             {target_words} words.\n\n\
             Content guidelines: {content_guidelines}\n\
             Chapter summary: {chapter_summary}\nAnchor: {anchor}\nLogic bridge: {logic_bridge}\n\
             Recent history: {recent_history}\nCharacter facts: {character_facts}\n\
             {chaos_prompt}\n{friction_prompt}\n{heat_prompt}\n\n\
             {surgical_feedback}\n\nWrite only the prose for this beat, no headers or commentary:"
                .to_string(),
            vec![
                "beat_number".to_string(),
                "beat_total".to_string(),
                "momentum".to_string(),
                "target_words".to_string(),
                "content_guidelines".to_string(),
                "chapter_summary".to_string(),
                "anchor".to_string(),
                "logic_bridge".to_string(),
                "recent_history".to_string(),
                "character_facts".to_string(),
                "chaos_prompt".to_string(),
                "friction_prompt".to_string(),
                "heat_prompt".to_string(),
                "surgical_feedback".to_string(),
            ],
            TemplateFormat::FString,
        )
    }

    /// ~150-word chapter summary call (flash model, review key path).
    pub fn chapter_summary() -> PromptTemplate {
        PromptTemplate::new(
            "Summarize this chapter in about 150 words, focused on plot developments and character changes \
             a later chapter would need to reference.\n\nChapter:\n{chapter_text}\n\nSummary:"
                .to_string(),
            vec!["chapter_text".to_string()],
            TemplateFormat::FString,
        )
    }

    /// Character-state-update extraction call (flash model, review key
    /// path): asks the model to report what changed for the given
    /// characters so C3 can be updated.
    pub fn character_state_update() -> PromptTemplate {
        PromptTemplate::new(
            "Given this chapter text, report what changed for each of these characters: {character_names}.\n\n\
             Chapter:\n{chapter_text}\n\n\
             Respond with a JSON array of objects: {{character, newKnows, newWounds, newConditions, \
             lastAction, ageChanged (bool), newAge (optional), timeJump (bool), locationChanged (bool), \
             newLocation (optional), transitNarrated (bool)}}.\n\nJSON:"
                .to_string(),
            vec!["character_names".to_string(), "chapter_text".to_string()],
            TemplateFormat::FString,
        )
    }

    /// Cover-prompt call (pro model), whose output becomes the `image`
    /// role's scene description (DESIGN.md Open Question 4).
    pub fn cover_prompt() -> PromptTemplate {
        PromptTemplate::new(
            "Describe a cover illustration for \"{title}\" ({genre}) as a single vivid paragraph a visual \
             artist could work from directly, evoking the book's tone without depicting on-the-nose plot \
             spoilers.\n\nSynopsis: {synopsis}\n\nCover description:"
                .to_string(),
            vec!["title".to_string(), "genre".to_string(), "synopsis".to_string()],
            TemplateFormat::FString,
        )
    }

    /// Visual/character style guide calls issued once before chapter
    /// generation for visual books (spec §4.9 outlining→generating).
    pub fn visual_style_guide() -> PromptTemplate {
        PromptTemplate::new(
            "Describe a consistent visual art style for this book as a short JSON object with fields: \
             palette, lineStyle, mood, influences.\n\nTitle: {title}\nGenre: {genre}\n\nJSON:".to_string(),
            vec!["title".to_string(), "genre".to_string()],
            TemplateFormat::FString,
        )
    }

    pub fn character_visual_guide() -> PromptTemplate {
        PromptTemplate::new(
            "Describe consistent visual appearances for these characters as a JSON array of objects: \
             {{name, appearance, outfit, distinguishingFeatures}}.\n\nCharacters: {characters}\n\nJSON:"
                .to_string(),
            vec!["characters".to_string()],
            TemplateFormat::FString,
        )
    }
}
