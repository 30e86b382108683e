use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-character, per-book runtime facts (spec §3). `age` is monotonic
/// across chapters unless a story-declared time jump bumps it; location
/// changes are expected to be backed by a narrated transit beat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterFact {
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub status: String,
    pub location: String,
    pub knows: Vec<String>,
    pub does_not_know: Vec<String>,
    pub wounds: Vec<String>,
    pub conditions: Vec<String>,
    pub relationships: HashMap<String, String>,
    pub last_action: String,
    pub traits: Vec<String>,
    pub speech_pattern: String,
}

impl CharacterFact {
    pub fn new(canonical_name: impl Into<String>) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            aliases: Vec::new(),
            gender: None,
            age: None,
            status: "active".to_string(),
            location: String::new(),
            knows: Vec::new(),
            does_not_know: Vec::new(),
            wounds: Vec::new(),
            conditions: Vec::new(),
            relationships: HashMap::new(),
            last_action: String::new(),
            traits: Vec::new(),
            speech_pattern: String::new(),
        }
    }
}

/// An update an orchestrator wants to apply after a chapter. `age` is
/// only set when the story declares a time jump; otherwise it is left
/// unchanged, which is what makes the monotonic invariant trivial to
/// keep.
#[derive(Debug, Clone, Default)]
pub struct CharacterFactUpdate {
    pub age: Option<u32>,
    pub time_jump: bool,
    pub location: Option<String>,
    pub transit_narrated: bool,
    pub last_action: Option<String>,
    pub new_knows: Vec<String>,
    pub new_wounds: Vec<String>,
    pub new_conditions: Vec<String>,
}

fn union_push(existing: &mut Vec<String>, additions: &[String]) {
    for item in additions {
        if !existing.contains(item) {
            existing.push(item.clone());
        }
    }
}

impl CharacterFact {
    /// Applies an update, enforcing the age-monotonic invariant
    /// (spec §3, §8) and unioning the knows/wounds/conditions sets.
    /// Returns `false` (a rejected, logged-but-kept update) if the age
    /// would regress without a declared time jump, or if the location
    /// changed without a narrated transit — these are advisory-only
    /// conflicts per spec §7, never fatal.
    pub fn apply_update(&mut self, update: &CharacterFactUpdate) -> bool {
        let mut accepted = true;

        if let Some(new_age) = update.age {
            if let Some(current) = self.age {
                if new_age < current && !update.time_jump {
                    accepted = false;
                } else {
                    self.age = Some(new_age);
                }
            } else {
                self.age = Some(new_age);
            }
        }

        if let Some(ref new_location) = update.location {
            if new_location != &self.location && !self.location.is_empty() && !update.transit_narrated {
                accepted = false;
            } else {
                self.location = new_location.clone();
            }
        }

        if let Some(ref action) = update.last_action {
            self.last_action = action.clone();
        }

        union_push(&mut self.knows, &update.new_knows);
        union_push(&mut self.wounds, &update.new_wounds);
        union_push(&mut self.conditions, &update.new_conditions);

        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_increase_is_accepted() {
        let mut fact = CharacterFact::new("Nora");
        fact.age = Some(30);
        let update = CharacterFactUpdate {
            age: Some(31),
            ..Default::default()
        };
        assert!(fact.apply_update(&update));
        assert_eq!(fact.age, Some(31));
    }

    #[test]
    fn age_regression_without_time_jump_is_rejected() {
        let mut fact = CharacterFact::new("Nora");
        fact.age = Some(30);
        let update = CharacterFactUpdate {
            age: Some(29),
            time_jump: false,
            ..Default::default()
        };
        assert!(!fact.apply_update(&update));
        assert_eq!(fact.age, Some(30));
    }

    #[test]
    fn age_regression_with_time_jump_is_accepted() {
        let mut fact = CharacterFact::new("Nora");
        fact.age = Some(30);
        let update = CharacterFactUpdate {
            age: Some(10),
            time_jump: true,
            ..Default::default()
        };
        assert!(fact.apply_update(&update));
        assert_eq!(fact.age, Some(10));
    }

    #[test]
    fn location_change_without_transit_is_rejected_but_knowledge_still_unions() {
        let mut fact = CharacterFact::new("Nora");
        fact.location = "Chicago".to_string();
        let update = CharacterFactUpdate {
            location: Some("Rome".to_string()),
            transit_narrated: false,
            new_knows: vec!["the secret passphrase".to_string()],
            ..Default::default()
        };
        assert!(!fact.apply_update(&update));
        assert_eq!(fact.location, "Chicago");
        assert!(fact.knows.contains(&"the secret passphrase".to_string()));
    }

    #[test]
    fn knows_union_never_duplicates() {
        let mut fact = CharacterFact::new("Nora");
        fact.knows.push("a secret".to_string());
        let update = CharacterFactUpdate {
            new_knows: vec!["a secret".to_string(), "another secret".to_string()],
            ..Default::default()
        };
        fact.apply_update(&update);
        assert_eq!(fact.knows.len(), 2);
    }
}
