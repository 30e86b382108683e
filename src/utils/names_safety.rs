//! Copyright name-safety substitution (spec §4.7): outline JSON is
//! scanned for names matching a curated list of famous trademarked
//! characters and renamed to a safe stand-in before the plan/outline is
//! persisted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// (trademarked name, safe replacement). Deliberately small and
/// representative rather than exhaustive — an immutable table in the
/// teacher's "regex-driven validator" style (Design Notes §9).
static TRADEMARKED_NAMES: &[(&str, &str)] = &[
    ("Harry Potter", "Barnaby Thorne"),
    ("Hermione Granger", "Wren Castellan"),
    ("Sherlock Holmes", "Edmund Slate"),
    ("Luke Skywalker", "Kale Windrider"),
    ("Darth Vader", "Lord Ashgrave"),
    ("Spider-Man", "The Lattice"),
    ("Batman", "The Nightwarden"),
    ("Frodo Baggins", "Robin Underhollow"),
    ("Mickey Mouse", "Pip Whiskerton"),
];

static PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    TRADEMARKED_NAMES
        .iter()
        .map(|(name, replacement)| {
            let escaped = regex::escape(name);
            (Regex::new(&format!(r"(?i)\b{escaped}\b")).unwrap(), *replacement)
        })
        .collect()
});

/// Replaces any trademarked name found in `text` with its safe
/// stand-in, case-insensitively, whole-word.
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in PATTERNS.iter() {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    out
}

/// Applies `sanitize` to every string value of a character list
/// (name/description pairs), returning the rename map applied so
/// callers can keep downstream references consistent.
pub fn sanitize_character_names(names: &[String]) -> HashMap<String, String> {
    let mut renames = HashMap::new();
    for name in names {
        let sanitized = sanitize(name);
        if &sanitized != name {
            renames.insert(name.clone(), sanitized);
        }
    }
    renames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_trademarked_name_case_insensitively() {
        let text = "harry potter walked into the room.";
        assert_eq!(sanitize(text), "Barnaby Thorne walked into the room.");
    }

    #[test]
    fn leaves_original_names_untouched() {
        let text = "Nora Ellison walked into the room.";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn builds_rename_map_only_for_changed_names() {
        let names = vec!["Sherlock Holmes".to_string(), "Nora Ellison".to_string()];
        let renames = sanitize_character_names(&names);
        assert_eq!(renames.len(), 1);
        assert_eq!(renames["Sherlock Holmes"], "Edmund Slate");
    }
}
