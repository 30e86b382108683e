use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VocabTier {
    Simple,
    Standard,
    Elevated,
}

/// Immutable dialogue rules for one character (spec §3, Glossary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub character: String,
    pub fingerprint: String,
    pub max_dialogue_words: u32,
    pub vocab_tier: VocabTier,
    pub internal_monologue_allowed: bool,
}

impl VoiceProfile {
    pub fn new(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            fingerprint: String::new(),
            max_dialogue_words: 40,
            vocab_tier: VocabTier::Standard,
            internal_monologue_allowed: true,
        }
    }
}
