//! Content-Rating & Heat Scale (spec §4.10, C10): builds content-guideline
//! preambles, heat-reduction retry prompts, and the lexical sanitizer used
//! on safety-blocked retries. The reciprocal "restore grit" table lives in
//! [`crate::validators::tables::GRIT_RESTORE_MAP`] and is applied by
//! [`crate::postprocess::grit`].

use crate::format::ContentRating;
use crate::validators::tables::HEAT_SANITIZE_MAP;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Violence,
    Romance,
    Horror,
    Trauma,
    General,
}

/// Per-content-type focus/avoid guidance used in both the preamble and
/// the heat-reduction retry prompt.
fn focus_areas(content_type: ContentType) -> (&'static [&'static str], &'static [&'static str]) {
    match content_type {
        ContentType::Violence => (
            &["psychological tension", "consequence", "aftermath"],
            &["gratuitous gore", "weapon mechanics in clinical detail"],
        ),
        ContentType::Romance => (
            &["emotional intimacy", "tension", "yearning"],
            &["explicit physical description"],
        ),
        ContentType::Horror => (
            &["dread", "sensory atmosphere", "implication"],
            &["graphic body horror"],
        ),
        ContentType::Trauma => (
            &["internal processing", "consequence"],
            &["exploitative detail"],
        ),
        ContentType::General => (&["characters' interiority"], &[]),
    }
}

/// The content-guideline preamble injected into every prose prompt
/// (spec §4.10).
pub fn content_guideline_preamble(rating: ContentRating, content_type: ContentType) -> String {
    let rating_text = match rating {
        ContentRating::Childrens => "Write for a children's audience: no violence, romance, or frightening content beyond mild peril.",
        ContentRating::General => "Write for a general audience: moderate tension is fine, avoid explicit content.",
        ContentRating::Mature => "Write for a mature audience: explicit themes are permitted but must serve the story.",
    };
    let (focus, avoid) = focus_areas(content_type);
    let mut preamble = rating_text.to_string();
    if !focus.is_empty() {
        preamble.push_str(&format!(" Favor: {}.", focus.join(", ")));
    }
    if !avoid.is_empty() {
        preamble.push_str(&format!(" Avoid: {}.", avoid.join(", ")));
    }
    preamble
}

/// Heat-reduction retry prompt used after a safety block (spec §4.10):
/// trades explicit description for psychological tension and consequence.
pub fn heat_reduction_prompt(content_type: ContentType) -> String {
    let (focus, avoid) = focus_areas(content_type);
    format!(
        "The previous attempt was blocked for content policy reasons. Rewrite with the same narrative \
         beats but trade explicit description for {}. Avoid {}.",
        if focus.is_empty() { "restraint".to_string() } else { focus.join(", ") },
        if avoid.is_empty() { "explicit description".to_string() } else { avoid.join(", ") }
    )
}

static SANITIZE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    HEAT_SANITIZE_MAP
        .iter()
        .map(|(explicit, euphemism)| {
            (Regex::new(&format!(r"(?i)\b{}\b", regex::escape(explicit))).unwrap(), *euphemism)
        })
        .collect()
});

/// Converts explicit terms to euphemisms, used when retrying a blocked
/// generation (spec §4.10). The reciprocal reversal happens later in
/// [`crate::postprocess::grit::restore`] on the accepted text.
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, euphemism) in SANITIZE_PATTERNS.iter() {
        out = pattern.replace_all(&out, *euphemism).into_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_differs_by_rating() {
        let childrens = content_guideline_preamble(ContentRating::Childrens, ContentType::General);
        let mature = content_guideline_preamble(ContentRating::Mature, ContentType::General);
        assert_ne!(childrens, mature);
    }

    #[test]
    fn sanitizer_converts_explicit_term() {
        let out = sanitize("The gun was loaded.");
        assert!(out.contains("weapon"));
        assert!(!out.to_lowercase().contains("gun"));
    }

    #[test]
    fn heat_reduction_prompt_mentions_psychological_tension_for_violence() {
        let prompt = heat_reduction_prompt(ContentType::Violence);
        assert!(prompt.contains("psychological tension"));
    }
}
