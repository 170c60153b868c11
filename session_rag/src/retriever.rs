//! Intention-dispatched retrieval with structured-first fusion.

use crate::errors::{SessionRagError, SessionRagResult};
use crate::{semantic, structured};
use loreweave_models::{Intention, SessionCorpus, SessionSearchResult, ToolQueryInput};
use loreweave_registry::{session_spec, SessionStrategy, TemporalPolicy};
use std::collections::HashSet;
use tracing::debug;

pub struct SessionRetriever;

impl SessionRetriever {
    /// Run every intention's strategy, fuse with structured hits first,
    /// dedup by (session_number, snippet_id), apply the strictest
    /// temporal policy, and trim to `top_k`.
    ///
    /// `query_embedding` is required only by semantic strategies; without
    /// it they contribute nothing.
    pub fn query(
        corpus: &SessionCorpus,
        input: &ToolQueryInput,
        query_embedding: Option<&[f32]>,
        top_k: usize,
    ) -> SessionRagResult<Vec<SessionSearchResult>> {
        if input.intentions.is_empty() || input.intentions.len() > 2 {
            return Err(SessionRagError::IntentionCount(input.intentions.len()));
        }

        let mut intentions = Vec::with_capacity(input.intentions.len());
        for intention in &input.intentions {
            match intention {
                Intention::Session(i) => intentions.push(*i),
                other => return Err(SessionRagError::WrongTool(other.as_str().to_string())),
            }
        }

        let mut structured_hits = Vec::new();
        let mut semantic_hits = Vec::new();
        let mut temporal: Option<TemporalPolicy> = None;

        for intention in &intentions {
            let spec = session_spec(*intention);

            match spec.strategy {
                SessionStrategy::Structured => {
                    structured_hits.extend(structured::lookup(corpus, &input.entities));
                }
                SessionStrategy::Semantic => {
                    if let Some(embedding) = query_embedding {
                        semantic_hits.extend(semantic::lookup(corpus, embedding, top_k));
                    }
                }
                SessionStrategy::Fused => {
                    structured_hits.extend(structured::lookup(corpus, &input.entities));
                    if let Some(embedding) = query_embedding {
                        semantic_hits.extend(semantic::lookup(corpus, embedding, top_k));
                    }
                }
            }

            temporal = Some(match (temporal, spec.temporal) {
                (None, policy) => policy,
                (Some(a), b) => strictest(a, b),
            });
        }

        // Auto-included sections resolve to their sessions' narrative
        for path in &input.auto_include_sections {
            if let Some(session_number) = parse_session_path(path) {
                if let Some(note) = corpus.get(session_number) {
                    structured_hits.extend(structured::narrative_snippets(note));
                }
            }
        }

        // Fusion: structured first, then semantic, dedup on the way
        let mut seen: HashSet<(u32, String)> = HashSet::new();
        let mut fused = Vec::new();
        for hit in structured_hits.into_iter().chain(semantic_hits) {
            if seen.insert((hit.session_number, hit.snippet_id.clone())) {
                fused.push(hit);
            }
        }

        // Temporal filter applies post-fusion
        if let Some(policy) = temporal {
            fused = apply_temporal(corpus, fused, policy);
        }

        fused.truncate(top_k);

        debug!(
            intentions = intentions.len(),
            hits = fused.len(),
            "📜 Session retrieval complete"
        );

        Ok(fused)
    }
}

/// The more restrictive of two temporal policies.
fn strictest(a: TemporalPolicy, b: TemporalPolicy) -> TemporalPolicy {
    use TemporalPolicy::*;
    match (a, b) {
        (Latest, _) | (_, Latest) => Latest,
        (Recent(x), Recent(y)) => Recent(x.min(y)),
        (Recent(n), All) | (All, Recent(n)) => Recent(n),
        (All, All) => All,
    }
}

fn apply_temporal(
    corpus: &SessionCorpus,
    hits: Vec<SessionSearchResult>,
    policy: TemporalPolicy,
) -> Vec<SessionSearchResult> {
    let cutoff: Option<u32> = match policy {
        TemporalPolicy::All => None,
        TemporalPolicy::Latest => corpus.latest().map(|n| n.session_number),
        TemporalPolicy::Recent(n) => corpus
            .recent(n as usize)
            .last()
            .map(|note| note.session_number),
    };

    match (policy, cutoff) {
        (TemporalPolicy::All, _) | (_, None) => hits,
        (TemporalPolicy::Latest, Some(latest)) => hits
            .into_iter()
            .filter(|h| h.session_number == latest)
            .collect(),
        (TemporalPolicy::Recent(_), Some(oldest)) => hits
            .into_iter()
            .filter(|h| h.session_number >= oldest)
            .collect(),
    }
}

/// Extract the session number from a `session_notes.<n>...` path.
fn parse_session_path(path: &str) -> Option<u32> {
    let mut parts = path.split('.');
    if parts.next()? != "session_notes" {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use loreweave_models::{SessionIntention, SessionNote, Tool};
    use std::collections::BTreeMap;

    fn corpus() -> SessionCorpus {
        let make = |n: u32, npc: Option<(&str, &str)>| {
            let mut npcs = BTreeMap::new();
            if let Some((name, interaction)) = npc {
                npcs.insert(name.to_string(), interaction.to_string());
            }
            SessionNote {
                session_number: n,
                date: NaiveDate::from_ymd_opt(2026, 6, n).unwrap(),
                title: format!("Session {n}"),
                summary: format!("Summary {n}"),
                key_events: vec![format!("Event {n}a"), format!("Event {n}b")],
                npcs,
                locations: vec![],
                encounters: vec![],
                spells_used: vec![],
                items: vec![],
                decisions: BTreeMap::new(),
                quotes: vec![],
                cliffhanger: None,
                summary_embedding: vec![1.0, 0.0],
                event_embeddings: vec![],
            }
        };

        SessionCorpus::new(vec![
            make(1, Some(("Elara", "met at the shrine"))),
            make(2, None),
            make(3, Some(("Elara", "asked for help"))),
        ])
        .unwrap()
    }

    fn input(intention: SessionIntention, entities: Vec<&str>) -> ToolQueryInput {
        ToolQueryInput {
            tool: Tool::SessionNotes,
            intentions: vec![Intention::Session(intention)],
            entities: entities.into_iter().map(String::from).collect(),
            auto_include_sections: vec![],
        }
    }

    #[test]
    fn npc_info_returns_all_hit_sessions_newest_first() {
        let results = SessionRetriever::query(
            &corpus(),
            &input(SessionIntention::NpcInfo, vec!["Elara"]),
            None,
            5,
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].session_number, 3);
        assert_eq!(results[1].session_number, 1);
    }

    #[test]
    fn event_sequence_keeps_latest_session_only() {
        let results = SessionRetriever::query(
            &corpus(),
            &input(SessionIntention::EventSequence, vec![]),
            Some(&[1.0, 0.0]),
            10,
        )
        .unwrap();

        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.session_number == 3));
        assert!(results.iter().any(|r| r.snippet_id == "summary"));
        assert!(results.iter().any(|r| r.snippet_id.starts_with("key_event")));
    }

    #[test]
    fn fusion_dedups_structured_and_semantic() {
        // EventSequence is fused: the latest summary arrives both ways
        let results = SessionRetriever::query(
            &corpus(),
            &input(SessionIntention::EventSequence, vec![]),
            Some(&[1.0, 0.0]),
            10,
        )
        .unwrap();

        let summaries = results
            .iter()
            .filter(|r| r.session_number == 3 && r.snippet_id == "summary")
            .count();
        assert_eq!(summaries, 1);
    }

    #[test]
    fn top_k_trims_results() {
        let results = SessionRetriever::query(
            &corpus(),
            &input(SessionIntention::PartyDynamics, vec![]),
            Some(&[1.0, 0.0]),
            2,
        )
        .unwrap();
        assert!(results.len() <= 2);
    }

    #[test]
    fn wrong_tool_intention_rejected() {
        let err = SessionRetriever::query(
            &corpus(),
            &ToolQueryInput {
                tool: Tool::SessionNotes,
                intentions: vec![Intention::Character(
                    loreweave_models::CharacterIntention::CombatInfo,
                )],
                entities: vec![],
                auto_include_sections: vec![],
            },
            None,
            5,
        )
        .unwrap_err();
        assert!(matches!(err, SessionRagError::WrongTool(_)));
    }
}
