//! Deterministic Post-Processing Pipeline (spec §4.5, C5): a fixed
//! sequence of pure text rewriters, no LLM calls, run once per accepted
//! chapter. Each stage records a structural count for telemetry.

pub mod burstiness;
pub mod cliche;
pub mod dialogue;
pub mod grit;
pub mod names;
pub mod variety;

pub use names::CharacterRef;
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
pub struct StageCounts {
    pub cliches_removed: usize,
    pub sentences_varied: usize,
    pub burstiness_edits: usize,
    pub dialogue_tags_polished: usize,
    pub names_replaced: usize,
    pub euphemisms_reversed: usize,
}

/// Runs the full pipeline in the fixed order spec §4.5 specifies.
/// `characters` feeds the name-frequency enforcer (step 5, "needs
/// stable text" — hence it runs last); its gender field drives
/// gender-aware pronoun selection there.
pub fn run(text: &str, characters: &[CharacterRef<'_>]) -> (String, StageCounts) {
    let mut counts = StageCounts::default();

    let (text, n) = cliche::remove(text);
    counts.cliches_removed = n;

    let (text, n) = variety::fix(&text);
    counts.sentences_varied = n;

    let (text, n) = burstiness::inject(&text);
    counts.burstiness_edits = n;

    let (text, n) = dialogue::polish(&text);
    counts.dialogue_tags_polished = n;

    let (text, n) = names::enforce_frequency(&text, characters);
    counts.names_replaced = n;

    let (text, n) = grit::restore(&text);
    counts.euphemisms_reversed = n;

    (text, counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_is_idempotent_on_already_clean_prose() {
        let text = "Nora walked to the window. Outside, rain struck the glass. \
                     She thought of the letter still unopened on the table, and waited.";
        let nora = CharacterRef { name: "Nora", gender: Some("female") };
        let (once, _) = run(text, &[nora]);
        let (twice, _) = run(&once, &[nora]);
        assert_eq!(once, twice);
    }
}
