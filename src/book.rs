//! Book entity and status state machine (spec §4.9, C9 data half). The
//! driving loop that actually walks this state machine lives in
//! [`crate::engine`]; this module owns the record and the legal
//! transitions over it.

use crate::format::{BookFormat, ContentRating, DialogueStyle};
use crate::outline::{ChapterOutline, PageOutline};
use crate::plan::{BookTypeKind, Plan};
use serde::{Deserialize, Serialize};

pub use crate::plan::BookTypeKind as BookType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookStatus {
    Pending,
    Outlining,
    Generating,
    Completed,
    Failed,
}

impl BookStatus {
    /// The transition diagram (spec §4.9): any non-terminal state may
    /// move to `Failed`; otherwise only the forward edge is legal.
    pub fn can_transition_to(self, next: BookStatus) -> bool {
        use BookStatus::*;
        match (self, next) {
            (Pending, Outlining) => true,
            (Outlining, Generating) => true,
            (Generating, Completed) => true,
            (_, Failed) if self != Completed && self != Failed => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Outline {
    Fiction(Vec<ChapterOutline>),
    NonFiction(Vec<ChapterOutline>),
    Illustrated(Vec<PageOutline>),
}

impl Outline {
    pub fn chapter_count(&self) -> u32 {
        match self {
            Outline::Fiction(chapters) | Outline::NonFiction(chapters) => chapters.len() as u32,
            Outline::Illustrated(pages) => pages.len() as u32,
        }
    }
}

/// The Book entity (spec §3). Lifecycle: created by the driver before
/// outlining; mutated only by C8/C9; terminal when completed or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub genre: String,
    pub book_type: BookType,
    pub format: BookFormat,
    pub dialogue_style: DialogueStyle,
    pub content_rating: ContentRating,
    pub target_words: u32,
    pub target_chapters: u32,
    pub status: BookStatus,
    pub current_chapter: u32,
    pub total_words: u32,
    /// Capped at 1000 words (spec §3), matching `plan::truncate_words`.
    pub original_idea: String,
    pub plan_snapshot: Option<Plan>,
    pub outline: Option<Outline>,
    pub visual_style_guide: Option<String>,
    pub character_visual_guide: Option<String>,
    pub failure_reason: Option<String>,
}

impl Book {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        genre: impl Into<String>,
        book_type: BookType,
        format: BookFormat,
        dialogue_style: DialogueStyle,
        content_rating: ContentRating,
        target_words: u32,
        target_chapters: u32,
        original_idea: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            genre: genre.into(),
            book_type,
            format,
            dialogue_style,
            content_rating,
            target_words,
            target_chapters,
            status: BookStatus::Pending,
            current_chapter: 0,
            total_words: 0,
            original_idea: original_idea.into(),
            plan_snapshot: None,
            outline: None,
            visual_style_guide: None,
            character_visual_guide: None,
            failure_reason: None,
        }
    }

    /// Applies a status transition, rejecting illegal edges (spec §4.9's
    /// diagram). Returns `false`, state unchanged, on an illegal edge.
    pub fn transition_to(&mut self, next: BookStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        true
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = BookStatus::Failed;
        self.failure_reason = Some(reason.into());
    }

    pub fn record_chapter(&mut self, chapter_number: u32, word_count: u32) {
        self.current_chapter = chapter_number;
        self.total_words += word_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        Book::new(
            "book-1",
            "The Quiet House",
            "mystery",
            BookTypeKind::Fiction,
            BookFormat::Novel,
            DialogueStyle::Prose,
            ContentRating::General,
            60_000,
            20,
            "a family moves into a haunted house",
        )
    }

    #[test]
    fn pending_can_only_move_to_outlining_or_failed() {
        assert!(BookStatus::Pending.can_transition_to(BookStatus::Outlining));
        assert!(BookStatus::Pending.can_transition_to(BookStatus::Failed));
        assert!(!BookStatus::Pending.can_transition_to(BookStatus::Generating));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(!BookStatus::Completed.can_transition_to(BookStatus::Failed));
        assert!(!BookStatus::Completed.can_transition_to(BookStatus::Generating));
    }

    #[test]
    fn illegal_transition_leaves_book_unchanged() {
        let mut book = sample();
        assert!(!book.transition_to(BookStatus::Generating));
        assert_eq!(book.status, BookStatus::Pending);
    }

    #[test]
    fn record_chapter_bumps_counters() {
        let mut book = sample();
        book.record_chapter(1, 1000);
        book.record_chapter(2, 1200);
        assert_eq!(book.current_chapter, 2);
        assert_eq!(book.total_words, 2200);
    }
}
