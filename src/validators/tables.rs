//! Immutable heuristic data tables (Design Notes §9: "keep all heuristic
//! regex lists as immutable data tables in a single module per concern").
//! Every other validator module imports from here rather than inlining
//! its own literals, so tests can exercise the tables directly.

/// AI-telltale phrases banned outright (spec §4.4).
pub const BANNED_PHRASES: &[&str] = &[
    "in the tapestry of",
    "a testament to",
    "it's important to note",
    "in today's fast-paced world",
    "navigate the complexities",
    "delve into",
    "a symphony of",
    "in the grand scheme of things",
    "at the end of the day",
    "little did they know",
    "a world where",
    "in a world where",
    "boundless",
    "unwavering",
    "unleash",
    "game-changer",
    "paradigm shift",
];

/// Visual tics that read as filler in comic scripts once repeated
/// (spec §4.4 "Comic").
pub const VISUAL_TICS: &[&str] = &[
    "crossed arms",
    "sweat drop",
    "raised eyebrow",
    "clenched jaw",
    "furrowed brow",
    "rolled eyes",
    "shrugged shoulders",
    "gritted teeth",
];

/// Patterns that state a character's emotion directly instead of
/// dramatizing it (spec §4.4 Comic "direct-emotion dialogue").
pub const DIRECT_EMOTION_PATTERNS: &[&str] = &[
    "i feel so",
    "i am so angry",
    "i am so sad",
    "i am so happy",
    "this makes me feel",
    "i'm feeling",
];

/// Internal-monologue markers rejected in comic/screenplay dialogue
/// (spec §4.4 Comic).
pub const INTERNAL_MONOLOGUE_MARKERS: &[&str] =
    &["(thinking)", "(to himself)", "(to herself)", "(internally)", "(v.o.)"];

/// Camera/narration phrases a screenplay action line should never use
/// (spec §4.4 Screenplay "we see/hear").
pub const SCREEN_DIRECTION_PATTERNS: &[&str] = &[
    "we see",
    "we hear",
    "the camera",
    "fade to",
    "cut to",
    "pan across",
    "zoom in",
];

/// "On the nose" dialogue: characters stating theme/plan outright
/// instead of implying it (spec §4.4 Screenplay, §4.4 Genre-aware).
pub const ON_THE_NOSE_PATTERNS: &[&str] = &[
    "as you know",
    "like i said before",
    "our plan is to",
    "the moral of this is",
    "i just want you to know that",
];

/// Genre-specific anachronism/implausibility rules (spec §4.4
/// "Genre-aware"): (genre, pattern, correction hint).
pub const GENRE_RULES: &[(&str, &str, &str)] = &[
    ("crime", "dna in hours", "DNA analysis historically takes days, not hours"),
    ("crime", "instant fingerprint match", "fingerprint matching is not instantaneous"),
    ("historical", "okay", "modern slang \"okay\" is anachronistic in a historical setting"),
    ("historical", "awesome", "modern slang \"awesome\" is anachronistic in a historical setting"),
    ("historical", "texted", "texting did not exist in this period"),
];

/// Non-visual sensory words for the 4+1 grounding rule (spec §4.4).
pub const SENSORY_WORDS: &[&str] = &[
    "smelled", "scent", "aroma", "stench", "reeked",
    "touch", "rough", "smooth", "cold", "warm", "gritty", "damp",
    "chill", "humid", "sweltering", "frost",
    "sound", "echoed", "creaked", "rustled", "hummed", "silence", "murmur",
];

/// Heat-scale euphemism map: explicit term → euphemism, used by C10's
/// lexical sanitizer on safety-block retries (spec §4.10).
pub const HEAT_SANITIZE_MAP: &[(&str, &str)] = &[
    ("blood", "crimson mark"),
    ("kill", "stop for good"),
    ("naked", "unclothed"),
    ("corpse", "still form"),
    ("gun", "weapon"),
    ("stabbed", "struck"),
    ("screamed in pain", "cried out"),
];

/// Reciprocal "restore grit" table: reverses the corporate euphemisms
/// the sanitizer may have introduced upstream, applied in the final
/// post-processing pass so accepted text reads direct again
/// (spec §4.10, §4.5 step 6).
pub const GRIT_RESTORE_MAP: &[(&str, &str)] = &[
    ("passed away", "died"),
    ("let go", "fired"),
    ("engaged in physical altercation", "fought"),
    ("resource", "person"),
    ("utilize", "use"),
    ("leverage", "use"),
    ("in a challenging situation", "in trouble"),
];

/// Fancy attribution verbs dialogue polish downgrades to "said" or an
/// action beat (spec §4.5 step 4).
pub const FANCY_ATTRIBUTION_VERBS: &[&str] = &[
    "exclaimed", "interjected", "opined", "articulated", "proclaimed",
    "bellowed", "expounded", "intoned", "vociferated", "ejaculated",
];

/// Neutral discourse-marker openers sentence-variety may reach for.
/// Deliberately excludes clichéd AI openers like "With a sigh" per
/// DESIGN.md's Open Question 3 resolution.
pub const NEUTRAL_OPENERS: &[&str] =
    &["Still,", "By then,", "Even so,", "Moments later,", "Outside,", "Meanwhile,"];

/// Lowercase pronoun sentence-starters tracked for the pronoun-start
/// ratio (spec §4.5 step 2).
pub const PRONOUN_STARTERS: &[&str] = &["he", "she", "they", "it", "i", "we", "you"];

/// Connectors sentence-variety's split technique breaks a medium
/// sentence at (spec §4.5 step 2's "splitting medium sentences").
pub const VARIETY_SPLIT_CONNECTORS: &[&str] = &[", and ", ", but ", ", then ", ", so "];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_nonempty_and_lowercase() {
        for phrase in BANNED_PHRASES {
            assert_eq!(*phrase, phrase.to_lowercase());
        }
        assert!(!GENRE_RULES.is_empty());
        assert!(!HEAT_SANITIZE_MAP.is_empty());
    }

    #[test]
    fn neutral_openers_exclude_forbidden_cliche() {
        assert!(!NEUTRAL_OPENERS.contains(&"With a sigh,"));
    }
}
