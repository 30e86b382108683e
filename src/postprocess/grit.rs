//! Stage 6: restore grit (spec §4.5 step 6, §4.10) — reverses the
//! corporate-euphemism substitutions C10's lexical sanitizer may have
//! introduced upstream, so the accepted text reads direct again.

use crate::validators::tables::GRIT_RESTORE_MAP;
use once_cell::sync::Lazy;
use regex::Regex;

static PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    GRIT_RESTORE_MAP
        .iter()
        .map(|(euphemism, direct)| (Regex::new(&format!(r"(?i){}", regex::escape(euphemism))).unwrap(), *direct))
        .collect()
});

pub fn restore(text: &str) -> (String, usize) {
    let mut out = text.to_string();
    let mut count = 0;
    for (pattern, direct) in PATTERNS.iter() {
        let hits = pattern.find_iter(&out).count();
        if hits > 0 {
            count += hits;
            out = pattern.replace_all(&out, *direct).into_owned();
        }
    }
    (out, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_corporate_euphemism() {
        let (out, count) = restore("He was let go after the scandal.");
        assert_eq!(count, 1);
        assert!(out.contains("fired"));
    }

    #[test]
    fn leaves_direct_text_untouched() {
        let (out, count) = restore("He died in the fire.");
        assert_eq!(count, 0);
        assert_eq!(out, "He died in the fire.");
    }
}
