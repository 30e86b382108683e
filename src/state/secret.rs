use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Obviousness {
    Subtle,
    Moderate,
    Obvious,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub chapter: u32,
    pub kind: String,
    pub obviousness: Obviousness,
    pub connected_to: Option<String>,
}

/// A secret withheld from (some) characters, revealed only once enough
/// breadcrumbs of sufficient diversity have been planted (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub id: String,
    pub kind: String,
    pub description: String,
    pub truth_summary: String,
    pub held_by: Vec<String>,
    pub hidden_from: Vec<String>,
    pub stakes: String,
    pub setup_chapter: u32,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub reveal_chapter: Option<u32>,
    pub reveal_method: Option<String>,
    pub is_revealed: bool,
}

impl Secret {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, setup_chapter: u32) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            description: String::new(),
            truth_summary: String::new(),
            held_by: Vec::new(),
            hidden_from: Vec::new(),
            stakes: String::new(),
            setup_chapter,
            breadcrumbs: Vec::new(),
            reveal_chapter: None,
            reveal_method: None,
            is_revealed: false,
        }
    }

    pub fn add_breadcrumb(&mut self, breadcrumb: Breadcrumb) {
        self.breadcrumbs.push(breadcrumb);
    }

    /// Checks (without mutating) whether `chapter` is a valid reveal
    /// point: at least `min_breadcrumbs` planted, at least 2 distinct
    /// breadcrumb types, and at least one breadcrumb within the last
    /// few chapters (spec §3, §8: `revealChapter - bc.chapter <= 3`).
    pub fn can_reveal_at(&self, chapter: u32, min_breadcrumbs: usize) -> bool {
        if self.breadcrumbs.len() < min_breadcrumbs {
            return false;
        }
        let distinct_types: HashSet<&str> = self.breadcrumbs.iter().map(|b| b.kind.as_str()).collect();
        if distinct_types.len() < 2 {
            return false;
        }
        self.breadcrumbs
            .iter()
            .any(|b| chapter.saturating_sub(b.chapter) <= 3)
    }

    /// Reveals the secret at `chapter` if `can_reveal_at` passes.
    /// Returns `false` (state unchanged) otherwise.
    pub fn reveal(&mut self, chapter: u32, method: impl Into<String>, min_breadcrumbs: usize) -> bool {
        if !self.can_reveal_at(chapter, min_breadcrumbs) {
            return false;
        }
        self.is_revealed = true;
        self.reveal_chapter = Some(chapter);
        self.reveal_method = Some(method.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crumb(chapter: u32, kind: &str) -> Breadcrumb {
        Breadcrumb {
            chapter,
            kind: kind.to_string(),
            obviousness: Obviousness::Moderate,
            connected_to: None,
        }
    }

    #[test]
    fn reveal_fails_with_too_few_breadcrumbs() {
        let mut secret = Secret::new("s1", "parentage", 1);
        secret.add_breadcrumb(crumb(2, "dialogue"));
        assert!(!secret.reveal(5, "confession", 3));
        assert!(!secret.is_revealed);
    }

    #[test]
    fn reveal_fails_without_type_diversity() {
        let mut secret = Secret::new("s1", "parentage", 1);
        secret.add_breadcrumb(crumb(2, "dialogue"));
        secret.add_breadcrumb(crumb(3, "dialogue"));
        secret.add_breadcrumb(crumb(4, "dialogue"));
        assert!(!secret.reveal(5, "confession", 3));
    }

    #[test]
    fn reveal_fails_if_last_breadcrumb_too_far_back() {
        let mut secret = Secret::new("s1", "parentage", 1);
        secret.add_breadcrumb(crumb(1, "dialogue"));
        secret.add_breadcrumb(crumb(1, "object"));
        secret.add_breadcrumb(crumb(1, "overheard"));
        assert!(!secret.reveal(10, "confession", 3));
    }

    #[test]
    fn reveal_succeeds_with_enough_diverse_recent_breadcrumbs() {
        let mut secret = Secret::new("s1", "parentage", 1);
        secret.add_breadcrumb(crumb(2, "dialogue"));
        secret.add_breadcrumb(crumb(5, "object"));
        secret.add_breadcrumb(crumb(7, "overheard"));
        assert!(secret.reveal(8, "confession", 3));
        assert_eq!(secret.reveal_chapter, Some(8));
    }
}
