//! Structured lookup: entity membership in the session tables.

use loreweave_models::{SessionCorpus, SessionNote, SessionSearchResult, SessionSnippet};

/// Structured hits carry full confidence; ranking within them is
/// chronological (newest session first).
const STRUCTURED_SCORE: f32 = 1.0;

/// Scan the tables of every session for the given entities, newest
/// session first. With no entities, fall back to narrative snippets
/// (summary and key events) so sequence-style intentions still get
/// structured results.
pub fn lookup(corpus: &SessionCorpus, entities: &[String]) -> Vec<SessionSearchResult> {
    let mut results = Vec::new();

    for note in corpus.notes().iter().rev() {
        if entities.is_empty() {
            results.extend(narrative_snippets(note));
        } else {
            for entity in entities {
                results.extend(entity_snippets(note, entity));
            }
        }
    }

    results
}

/// Summary plus key events of one session.
pub fn narrative_snippets(note: &SessionNote) -> Vec<SessionSearchResult> {
    let mut snippets = vec![SessionSearchResult {
        session_number: note.session_number,
        session_title: note.title.clone(),
        snippet_id: "summary".to_string(),
        kind: SessionSnippet::Summary,
        content: note.summary.clone(),
        score: STRUCTURED_SCORE,
    }];

    for (idx, event) in note.key_events.iter().enumerate() {
        snippets.push(SessionSearchResult {
            session_number: note.session_number,
            session_title: note.title.clone(),
            snippet_id: format!("key_event:{idx}"),
            kind: SessionSnippet::KeyEvent,
            content: event.clone(),
            score: STRUCTURED_SCORE,
        });
    }

    snippets
}

fn entity_snippets(note: &SessionNote, entity: &str) -> Vec<SessionSearchResult> {
    let needle = entity.to_lowercase();
    let mut hits = Vec::new();

    let mut push = |snippet_id: String, kind: SessionSnippet, content: String| {
        hits.push(SessionSearchResult {
            session_number: note.session_number,
            session_title: note.title.clone(),
            snippet_id,
            kind,
            content,
            score: STRUCTURED_SCORE,
        });
    };

    for (name, interaction) in &note.npcs {
        if name.to_lowercase().contains(&needle) {
            push(
                format!("npc:{name}"),
                SessionSnippet::Npc,
                format!("{name}: {interaction}"),
            );
        }
    }

    for location in &note.locations {
        if location.to_lowercase().contains(&needle) {
            push(
                format!("location:{location}"),
                SessionSnippet::Location,
                location.clone(),
            );
        }
    }

    for item in &note.items {
        if item.to_lowercase().contains(&needle) {
            push(format!("item:{item}"), SessionSnippet::Item, item.clone());
        }
    }

    for (idx, encounter) in note.encounters.iter().enumerate() {
        if encounter.to_lowercase().contains(&needle) {
            push(
                format!("encounter:{idx}"),
                SessionSnippet::Encounter,
                encounter.clone(),
            );
        }
    }

    for spell in &note.spells_used {
        if spell.to_lowercase().contains(&needle) {
            push(
                format!("spell_used:{spell}"),
                SessionSnippet::SpellUsed,
                spell.clone(),
            );
        }
    }

    for (who, decisions) in &note.decisions {
        if who.to_lowercase().contains(&needle) {
            for (idx, decision) in decisions.iter().enumerate() {
                push(
                    format!("decision:{who}:{idx}"),
                    SessionSnippet::Decision,
                    format!("{who}: {decision}"),
                );
            }
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn corpus() -> SessionCorpus {
        let mut npcs = BTreeMap::new();
        npcs.insert(
            "Elara".to_string(),
            "Asked the party to recover the chalice".to_string(),
        );
        let mut decisions = BTreeMap::new();
        decisions.insert(
            "Duskryn".to_string(),
            vec!["Spared the cultist".to_string()],
        );

        let notes = vec![
            SessionNote {
                session_number: 7,
                date: NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
                title: "The Sunken Chapel".to_string(),
                summary: "The party explored the chapel beneath the lake.".to_string(),
                key_events: vec!["Found the drowned altar".to_string()],
                npcs,
                locations: vec!["Sunken Chapel".to_string()],
                encounters: vec![],
                spells_used: vec![],
                items: vec![],
                decisions,
                quotes: vec![],
                cliffhanger: None,
                summary_embedding: vec![],
                event_embeddings: vec![],
            },
            SessionNote {
                session_number: 8,
                date: NaiveDate::from_ymd_opt(2026, 5, 9).unwrap(),
                title: "Ashes of Thornhollow".to_string(),
                summary: "Thornhollow burned while the party slept.".to_string(),
                key_events: vec![],
                npcs: BTreeMap::new(),
                locations: vec![],
                encounters: vec![],
                spells_used: vec![],
                items: vec![],
                decisions: BTreeMap::new(),
                quotes: vec![],
                cliffhanger: Some("Who lit the fire?".to_string()),
                summary_embedding: vec![],
                event_embeddings: vec![],
            },
        ];
        SessionCorpus::new(notes).unwrap()
    }

    #[test]
    fn entity_lookup_hits_npc_table() {
        let results = lookup(&corpus(), &["Elara".to_string()]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].session_number, 7);
        assert_eq!(results[0].snippet_id, "npc:Elara");
        assert!(results[0].content.contains("chalice"));
    }

    #[test]
    fn empty_entities_yield_narrative_newest_first() {
        let results = lookup(&corpus(), &[]);
        assert_eq!(results[0].session_number, 8);
        assert_eq!(results[0].snippet_id, "summary");
        assert!(results.iter().any(|r| r.snippet_id == "key_event:0"));
    }

    #[test]
    fn decision_lookup_by_character() {
        let results = lookup(&corpus(), &["Duskryn".to_string()]);
        assert_eq!(results[0].snippet_id, "decision:Duskryn:0");
        assert!(results[0].content.contains("Spared"));
    }
}
