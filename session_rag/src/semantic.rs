//! Semantic lookup: dot-product scoring against precomputed embeddings.

use loreweave_models::{SessionCorpus, SessionSearchResult, SessionSnippet};

/// Score the query embedding against every session's summary and event
/// embeddings, returning the top `k` snippets by dot product.
pub fn lookup(
    corpus: &SessionCorpus,
    query_embedding: &[f32],
    k: usize,
) -> Vec<SessionSearchResult> {
    let mut scored = Vec::new();

    for note in corpus.notes() {
        if !note.summary_embedding.is_empty() {
            scored.push(SessionSearchResult {
                session_number: note.session_number,
                session_title: note.title.clone(),
                snippet_id: "summary".to_string(),
                kind: SessionSnippet::Summary,
                content: note.summary.clone(),
                score: dot(query_embedding, &note.summary_embedding),
            });
        }

        for (idx, embedding) in note.event_embeddings.iter().enumerate() {
            let Some(event) = note.key_events.get(idx) else {
                continue;
            };
            scored.push(SessionSearchResult {
                session_number: note.session_number,
                session_title: note.title.clone(),
                snippet_id: format!("key_event:{idx}"),
                kind: SessionSnippet::KeyEvent,
                content: event.clone(),
                score: dot(query_embedding, embedding),
            });
        }
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
