//! Entity search over the session-notes tables.

use crate::strategies::best_match;
use loreweave_models::{EntityMatch, MatchStrategy, SessionCorpus, SessionNote, Tool};

/// Scan the structured tables of every session, newest first. One hit per
/// (session, table): the best strategy per field wins.
pub fn search(entity_norm: &str, corpus: &SessionCorpus, fuzzy_threshold: f32) -> Vec<EntityMatch> {
    let mut matches = Vec::new();

    for note in corpus.notes().iter().rev() {
        matches.extend(search_note(entity_norm, note, fuzzy_threshold));
    }

    matches
}

fn search_note(entity_norm: &str, note: &SessionNote, fuzzy_threshold: f32) -> Vec<EntityMatch> {
    let mut hits = Vec::new();
    let n = note.session_number;

    let mut table = |table_name: &str, candidates: &mut dyn Iterator<Item = &str>| {
        let mut best: Option<(MatchStrategy, f32, String)> = None;
        for candidate in candidates {
            if let Some((strategy, confidence)) =
                best_match(entity_norm, candidate, fuzzy_threshold)
            {
                let better = best
                    .as_ref()
                    .map(|(_, incumbent, _)| confidence > *incumbent)
                    .unwrap_or(true);
                if better {
                    best = Some((strategy, confidence, candidate.to_string()));
                }
            }
        }
        if let Some((strategy, confidence, matched_text)) = best {
            hits.push(EntityMatch {
                source_tool: Tool::SessionNotes,
                section_path: format!("session_notes.{n}.{table_name}"),
                matched_text,
                strategy,
                confidence,
            });
        }
    };

    table("npcs", &mut note.npcs.keys().map(String::as_str));
    table("locations", &mut note.locations.iter().map(String::as_str));
    table("items", &mut note.items.iter().map(String::as_str));
    table("encounters", &mut note.encounters.iter().map(String::as_str));
    table(
        "spells_used",
        &mut note.spells_used.iter().map(String::as_str),
    );
    table("decisions", &mut note.decisions.keys().map(String::as_str));

    hits
}
