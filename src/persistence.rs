//! Persistence layer (spec §6, external collaborator): opaque key-value
//! operations over {Book, Chapter text, StatusSnapshot}. The driver (C9)
//! writes after each accepted chapter; this module defines the trait
//! boundary plus an in-memory reference implementation for tests.

use crate::book::{Book, BookStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// The status-polling snapshot the UI reads (spec §6: `GET
/// /api/books/:id/status`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub id: String,
    pub status: BookStatus,
    pub current_chapter: u32,
    pub total_chapters: u32,
    pub total_words: u32,
    pub book_format: String,
    pub dialogue_style: String,
    pub book_preset: String,
}

#[async_trait]
pub trait Persistence: Send + Sync {
    async fn save_book(&self, book: &Book) -> crate::error::Result<()>;
    async fn load_book(&self, id: &str) -> crate::error::Result<Option<Book>>;
    async fn save_chapter(&self, book_id: &str, chapter_number: u32, text: &str) -> crate::error::Result<()>;
    async fn load_chapter(&self, book_id: &str, chapter_number: u32) -> crate::error::Result<Option<String>>;
    async fn save_status(&self, snapshot: &StatusSnapshot) -> crate::error::Result<()>;
    async fn load_status(&self, id: &str) -> crate::error::Result<Option<StatusSnapshot>>;
}

/// In-memory reference implementation, used by tests and as a stand-in
/// when no external store is wired up.
#[derive(Default)]
pub struct InMemoryPersistence {
    books: Mutex<HashMap<String, Book>>,
    chapters: Mutex<HashMap<(String, u32), String>>,
    statuses: Mutex<HashMap<String, StatusSnapshot>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn save_book(&self, book: &Book) -> crate::error::Result<()> {
        self.books.lock().unwrap().insert(book.id.clone(), book.clone());
        Ok(())
    }

    async fn load_book(&self, id: &str) -> crate::error::Result<Option<Book>> {
        Ok(self.books.lock().unwrap().get(id).cloned())
    }

    async fn save_chapter(&self, book_id: &str, chapter_number: u32, text: &str) -> crate::error::Result<()> {
        self.chapters
            .lock()
            .unwrap()
            .insert((book_id.to_string(), chapter_number), text.to_string());
        Ok(())
    }

    async fn load_chapter(&self, book_id: &str, chapter_number: u32) -> crate::error::Result<Option<String>> {
        Ok(self
            .chapters
            .lock()
            .unwrap()
            .get(&(book_id.to_string(), chapter_number))
            .cloned())
    }

    async fn save_status(&self, snapshot: &StatusSnapshot) -> crate::error::Result<()> {
        self.statuses.lock().unwrap().insert(snapshot.id.clone(), snapshot.clone());
        Ok(())
    }

    async fn load_status(&self, id: &str) -> crate::error::Result<Option<StatusSnapshot>> {
        Ok(self.statuses.lock().unwrap().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::BookType;
    use crate::format::{BookFormat, ContentRating, DialogueStyle};

    #[tokio::test]
    async fn round_trips_a_chapter() {
        let store = InMemoryPersistence::new();
        store.save_chapter("book-1", 1, "Once upon a time.").await.unwrap();
        let loaded = store.load_chapter("book-1", 1).await.unwrap();
        assert_eq!(loaded, Some("Once upon a time.".to_string()));
    }

    #[tokio::test]
    async fn round_trips_a_book() {
        let store = InMemoryPersistence::new();
        let book = Book::new(
            "book-1",
            "The Quiet House",
            "mystery",
            BookType::Fiction,
            BookFormat::Novel,
            DialogueStyle::Prose,
            ContentRating::General,
            60_000,
            20,
            "a family moves into a haunted house",
        );
        store.save_book(&book).await.unwrap();
        let loaded = store.load_book("book-1").await.unwrap().unwrap();
        assert_eq!(loaded.title, "The Quiet House");
    }
}
