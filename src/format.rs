//! Format polymorphism (Design Notes §9): every format-dependent number
//! or behavior (beat size, tension cap, breadcrumb minimums, which
//! validator runs) lives on a `FormatConfig` selected by tag, rather
//! than a class hierarchy.

use serde::{Deserialize, Serialize};

/// The single canonical format enumeration (DESIGN.md Open Question 1 —
/// unifies the source's duplicated `picture_book`/`children` split).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookFormat {
    Novel,
    Children,
    PictureBook,
    Comic,
    AdultComic,
    Screenplay,
}

/// Orthogonal to `BookFormat` (DESIGN.md Open Question 5): whether
/// character speech renders as prose or as bubbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueStyle {
    Prose,
    Bubbles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentRating {
    Childrens,
    General,
    Mature,
}

/// A named shortcut the UI offers; only used to derive the "is this a
/// visual book" predicate in the status contract (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookPreset {
    None,
    ComicStory,
    ChildrensPicture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelLayout {
    Splash,
    TwoPanel,
    ThreePanel,
    FourPanel,
}

/// The per-format knobs every other component reads instead of
/// branching on `BookFormat` directly.
#[derive(Debug, Clone, Copy)]
pub struct FormatConfig {
    pub format: BookFormat,
    /// Target words per beat, used to compute beat count (spec §4.6).
    pub beat_size: u32,
    /// Max `|level(n) - level(n-1)|` for a tension arc (spec §3).
    pub tension_cap: u8,
    /// Minimum breadcrumbs before a secret may be revealed (spec §3).
    pub min_breadcrumbs: usize,
    /// Chaos-seed / friction-event cap per chapter (spec §4.6).
    pub chaos_cap_per_chapter: u32,
    /// Sentence-length stdDev floor for the narrative validator (spec §4.4).
    pub min_sentence_variance: f64,
    /// Name-density cap, matches per hundred words (spec §4.4).
    pub max_name_density: f64,
    /// Is this a visual (illustrated) format?
    pub is_visual: bool,
}

impl BookFormat {
    pub fn config(self) -> FormatConfig {
        match self {
            BookFormat::Novel => FormatConfig {
                format: self,
                beat_size: 400,
                tension_cap: 1,
                min_breadcrumbs: 3,
                chaos_cap_per_chapter: 2,
                min_sentence_variance: 4.2,
                max_name_density: 2.5,
                is_visual: false,
            },
            BookFormat::Children => FormatConfig {
                format: self,
                beat_size: 150,
                tension_cap: 1,
                min_breadcrumbs: 3,
                chaos_cap_per_chapter: 1,
                min_sentence_variance: 3.0,
                max_name_density: 3.5,
                is_visual: false,
            },
            BookFormat::PictureBook => FormatConfig {
                format: self,
                beat_size: 60,
                tension_cap: 2,
                min_breadcrumbs: 2,
                chaos_cap_per_chapter: 1,
                min_sentence_variance: 2.0,
                max_name_density: 4.0,
                is_visual: true,
            },
            BookFormat::Comic | BookFormat::AdultComic => FormatConfig {
                format: self,
                beat_size: 120,
                tension_cap: 2,
                min_breadcrumbs: 2,
                chaos_cap_per_chapter: 2,
                min_sentence_variance: 3.0,
                max_name_density: 4.0,
                is_visual: true,
            },
            BookFormat::Screenplay => FormatConfig {
                format: self,
                beat_size: 250,
                tension_cap: 2,
                min_breadcrumbs: 2,
                chaos_cap_per_chapter: 2,
                min_sentence_variance: 4.0,
                max_name_density: 3.0,
                is_visual: false,
            },
        }
    }
}

/// The UI status contract's "is this a visual book" predicate (spec §6):
/// `bookFormat=picture_book`, `dialogueStyle=bubbles`, or
/// `bookPreset` in `{comic_story, childrens_picture}`.
pub fn is_visual_book(format: BookFormat, dialogue_style: DialogueStyle, preset: BookPreset) -> bool {
    matches!(format, BookFormat::PictureBook)
        || matches!(dialogue_style, DialogueStyle::Bubbles)
        || matches!(preset, BookPreset::ComicStory | BookPreset::ChildrensPicture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_predicate_triggers_on_any_of_three_signals() {
        assert!(is_visual_book(
            BookFormat::PictureBook,
            DialogueStyle::Prose,
            BookPreset::None
        ));
        assert!(is_visual_book(BookFormat::Novel, DialogueStyle::Bubbles, BookPreset::None));
        assert!(is_visual_book(
            BookFormat::Novel,
            DialogueStyle::Prose,
            BookPreset::ComicStory
        ));
        assert!(!is_visual_book(BookFormat::Novel, DialogueStyle::Prose, BookPreset::None));
    }

    #[test]
    fn screenplay_caps_differ_from_novel() {
        let novel = BookFormat::Novel.config();
        let screenplay = BookFormat::Screenplay.config();
        assert_eq!(novel.tension_cap, 1);
        assert_eq!(screenplay.tension_cap, 2);
    }
}
