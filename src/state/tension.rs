use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensionType {
    Romantic,
    Dramatic,
    Conflict,
    Mystery,
    Horror,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensionHistoryPoint {
    pub chapter: u32,
    pub level: u8,
    pub reason: String,
    pub anchors: Vec<String>,
}

/// A per-book trajectory of one inter-character emotional pressure
/// (spec §3). `current_level` is bounded to `[0, 10]`; consecutive
/// history points may not differ by more than the format's per-chapter
/// cap (spec §3, §8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensionArc {
    pub id: String,
    pub kind: TensionType,
    pub participants: Vec<String>,
    pub current_level: u8,
    pub target_level: u8,
    pub history: Vec<TensionHistoryPoint>,
    pub peak_chapter: Option<u32>,
    pub resolution_chapter: Option<u32>,
}

impl TensionArc {
    pub fn new(id: impl Into<String>, kind: TensionType, participants: Vec<String>, target_level: u8) -> Self {
        Self {
            id: id.into(),
            kind,
            participants,
            current_level: 0,
            target_level,
            history: Vec::new(),
            peak_chapter: None,
            resolution_chapter: None,
        }
    }

    /// Validates and applies a new level at `chapter`, enforcing the
    /// format-specific per-step cap (spec §3: text 1/chapter, visual
    /// 2/page, screenplay 2/scene). Rejects (returns `false`, state
    /// unchanged) if the jump is too large.
    pub fn update_level(
        &mut self,
        chapter: u32,
        new_level: u8,
        reason: impl Into<String>,
        anchors: Vec<String>,
        cap: u8,
    ) -> bool {
        let new_level = new_level.min(10);
        let delta = (new_level as i16 - self.current_level as i16).unsigned_abs();
        if delta > cap as u16 {
            return false;
        }

        self.current_level = new_level;
        self.history.push(TensionHistoryPoint {
            chapter,
            level: new_level,
            reason: reason.into(),
            anchors,
        });

        if new_level >= self.target_level && self.peak_chapter.is_none() {
            self.peak_chapter = Some(chapter);
        }

        true
    }

    pub fn resolve(&mut self, chapter: u32) {
        self.resolution_chapter = Some(chapter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_step_within_cap() {
        let mut arc = TensionArc::new("t1", TensionType::Romantic, vec!["A".into(), "B".into()], 8);
        assert!(arc.update_level(1, 1, "first spark", vec![], 1));
        assert_eq!(arc.current_level, 1);
        assert!(arc.update_level(2, 2, "tension builds", vec![], 1));
    }

    #[test]
    fn rejects_step_exceeding_cap() {
        let mut arc = TensionArc::new("t1", TensionType::Conflict, vec!["A".into(), "B".into()], 8);
        assert!(!arc.update_level(1, 5, "too fast", vec![], 1));
        assert_eq!(arc.current_level, 0);
    }

    #[test]
    fn sets_peak_chapter_once_target_reached() {
        let mut arc = TensionArc::new("t1", TensionType::Horror, vec!["A".into()], 3);
        arc.update_level(1, 2, "a", vec![], 2);
        arc.update_level(2, 3, "b", vec![], 2);
        assert_eq!(arc.peak_chapter, Some(2));
    }
}
