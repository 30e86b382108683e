use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tracks sensory seeds and physical-friction beats already spent in
/// this book, so later chapters don't repeat them (spec §3, Glossary:
/// "Chaos seed / friction").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChaosFrictionHistory {
    pub used_chaos_seeds: HashSet<String>,
    pub used_friction_events: HashSet<String>,
    pub chaos_count_this_chapter: u32,
    pub friction_count_this_chapter: u32,
}

impl ChaosFrictionHistory {
    pub fn start_chapter(&mut self) {
        self.chaos_count_this_chapter = 0;
        self.friction_count_this_chapter = 0;
    }

    /// Picks the first unused seed from `pool` respecting `cap_per_chapter`,
    /// marking it used. Returns `None` once the pool is exhausted or the
    /// chapter's cap is reached.
    pub fn pick_chaos_seed(&mut self, pool: &[&str], cap_per_chapter: u32) -> Option<String> {
        if self.chaos_count_this_chapter >= cap_per_chapter {
            return None;
        }
        let pick = pool.iter().find(|seed| !self.used_chaos_seeds.contains(**seed))?;
        self.used_chaos_seeds.insert(pick.to_string());
        self.chaos_count_this_chapter += 1;
        Some(pick.to_string())
    }

    pub fn pick_friction_event(&mut self, pool: &[&str], cap_per_chapter: u32) -> Option<String> {
        if self.friction_count_this_chapter >= cap_per_chapter {
            return None;
        }
        let pick = pool
            .iter()
            .find(|event| !self.used_friction_events.contains(**event))?;
        self.used_friction_events.insert(pick.to_string());
        self.friction_count_this_chapter += 1;
        Some(pick.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_repeat_seeds_across_chapters() {
        let mut history = ChaosFrictionHistory::default();
        let pool = ["rain", "woodsmoke", "static"];
        let first = history.pick_chaos_seed(&pool, 2).unwrap();
        history.start_chapter();
        let second = history.pick_chaos_seed(&pool, 2).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn respects_per_chapter_cap() {
        let mut history = ChaosFrictionHistory::default();
        let pool = ["rain", "woodsmoke", "static"];
        history.pick_chaos_seed(&pool, 1).unwrap();
        assert!(history.pick_chaos_seed(&pool, 1).is_none());
    }
}
