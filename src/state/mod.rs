//! Per-Book State Store (spec §4.3, C3): character facts, tension arcs,
//! secret manifest, chaos/friction history, voice profiles, keyed by
//! book id. Cross-book isolation is absolute — every operation takes a
//! book id and only ever touches that book's record.

pub mod chaos;
pub mod character;
pub mod secret;
pub mod tension;
pub mod voice;

pub use chaos::ChaosFrictionHistory;
pub use character::{CharacterFact, CharacterFactUpdate};
pub use secret::{Breadcrumb, Secret};
pub use tension::{TensionArc, TensionType};
pub use voice::VoiceProfile;

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// Everything C3 owns for one book.
#[derive(Debug, Default)]
pub struct BookState {
    pub characters: HashMap<String, CharacterFact>,
    pub tension_arcs: HashMap<String, TensionArc>,
    pub secrets: HashMap<String, Secret>,
    pub voice_profiles: HashMap<String, VoiceProfile>,
    pub chaos: ChaosFrictionHistory,
    /// Running count of visual-tic phrase hits across every chapter
    /// written so far, for the comic validator's per-book cap (spec
    /// §4.4 "Comic"). Never reset — unlike `chaos`, this is book-wide.
    pub visual_tic_total: u32,
}

/// The keyed in-process table (spec §4.3). Single-writer per book id:
/// each record is behind its own mutex, so contention on one book never
/// blocks another.
#[derive(Default)]
pub struct PerBookStore {
    books: RwLock<HashMap<String, Mutex<BookState>>>,
}

impl PerBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&self, book_id: &str) {
        if !self.books.read().unwrap().contains_key(book_id) {
            self.books
                .write()
                .unwrap()
                .entry(book_id.to_string())
                .or_insert_with(|| Mutex::new(BookState::default()));
        }
    }

    /// Runs `f` with exclusive access to `book_id`'s record, creating it
    /// first if necessary (get-or-create, spec §4.3).
    pub fn with_book<R>(&self, book_id: &str, f: impl FnOnce(&mut BookState) -> R) -> R {
        self.ensure(book_id);
        let books = self.books.read().unwrap();
        let mut state = books.get(book_id).expect("ensured above").lock().unwrap();
        f(&mut state)
    }

    pub fn register_arc(&self, book_id: &str, arc: TensionArc) {
        self.with_book(book_id, |state| {
            state.tension_arcs.insert(arc.id.clone(), arc);
        });
    }

    pub fn update_tension_level(
        &self,
        book_id: &str,
        arc_id: &str,
        chapter: u32,
        new_level: u8,
        reason: &str,
        anchors: Vec<String>,
        cap: u8,
    ) -> bool {
        self.with_book(book_id, |state| match state.tension_arcs.get_mut(arc_id) {
            Some(arc) => arc.update_level(chapter, new_level, reason, anchors, cap),
            None => false,
        })
    }

    pub fn register_secret(&self, book_id: &str, secret: Secret) {
        self.with_book(book_id, |state| {
            state.secrets.insert(secret.id.clone(), secret);
        });
    }

    pub fn add_breadcrumb(&self, book_id: &str, secret_id: &str, breadcrumb: Breadcrumb) -> bool {
        self.with_book(book_id, |state| match state.secrets.get_mut(secret_id) {
            Some(secret) => {
                secret.add_breadcrumb(breadcrumb);
                true
            }
            None => false,
        })
    }

    pub fn reveal_secret(
        &self,
        book_id: &str,
        secret_id: &str,
        chapter: u32,
        method: &str,
        min_breadcrumbs: usize,
    ) -> bool {
        self.with_book(book_id, |state| match state.secrets.get_mut(secret_id) {
            Some(secret) => secret.reveal(chapter, method, min_breadcrumbs),
            None => false,
        })
    }

    pub fn update_character_facts(
        &self,
        book_id: &str,
        character: &str,
        update: &CharacterFactUpdate,
    ) -> bool {
        self.with_book(book_id, |state| {
            let fact = state
                .characters
                .entry(character.to_string())
                .or_insert_with(|| CharacterFact::new(character));
            fact.apply_update(update)
        })
    }

    pub fn register_voice_profile(&self, book_id: &str, profile: VoiceProfile) {
        self.with_book(book_id, |state| {
            state.voice_profiles.insert(profile.character.clone(), profile);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn books_are_isolated_from_each_other() {
        let store = PerBookStore::new();
        store.update_character_facts(
            "book-a",
            "Nora",
            &CharacterFactUpdate {
                age: Some(30),
                ..Default::default()
            },
        );
        store.update_character_facts(
            "book-b",
            "Nora",
            &CharacterFactUpdate {
                age: Some(12),
                ..Default::default()
            },
        );

        let age_a = store.with_book("book-a", |s| s.characters["Nora"].age);
        let age_b = store.with_book("book-b", |s| s.characters["Nora"].age);
        assert_eq!(age_a, Some(30));
        assert_eq!(age_b, Some(12));
    }

    #[test]
    fn reveal_secret_is_rejected_without_enough_breadcrumbs() {
        let store = PerBookStore::new();
        store.register_secret("book-a", Secret::new("s1", "parentage", 1));
        assert!(!store.reveal_secret("book-a", "s1", 2, "confession", 3));
    }
}
