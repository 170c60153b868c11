//! Conversation context detector.
//!
//! Keeps a rolling buffer of recent (query, answer) embeddings. A new
//! query needs context when it closely resembles recent exchanges or
//! when pronoun/ellipsis heuristics fire.

use crate::embedder::{cosine, LocalEmbedder};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;

static PRONOUN_OPENERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(and |what about |how about |also |then |it |that |those |they |he |she |him |her |them )",
    )
    .expect("pronoun pattern")
});

static BARE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(it|that one|those|them|the same|again)\b\s*[?.!]*\s*$").expect("reference pattern")
});

/// One remembered exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub query: String,
    pub answer: String,
    embedding: Vec<f32>,
}

/// Outcome of the context check.
#[derive(Debug, Clone, Default)]
pub struct ContextSignal {
    pub with_context: bool,
    /// Most similar recent exchanges, best first, capped by the caller's top-k
    pub snippets: Vec<(String, String)>,
}

pub struct ContextDetector {
    embedder: LocalEmbedder,
    window: usize,
    similarity_tau: f32,
    buffer: VecDeque<Exchange>,
}

impl ContextDetector {
    pub fn new(window: usize, similarity_tau: f32) -> Self {
        Self {
            embedder: LocalEmbedder::new(),
            window,
            similarity_tau,
            buffer: VecDeque::with_capacity(window),
        }
    }

    /// Record a completed exchange. Oldest entries fall off the window.
    pub fn observe(&mut self, query: &str, answer: &str) {
        let embedding = self.embedder.embed(&format!("{query} {answer}"));
        if self.buffer.len() == self.window {
            self.buffer.pop_front();
        }
        self.buffer.push_back(Exchange {
            query: query.to_string(),
            answer: answer.to_string(),
            embedding,
        });
    }

    /// Decide whether the query leans on conversation context and, if so,
    /// which recent exchanges to inject.
    pub fn check(&self, query: &str, topk: usize) -> ContextSignal {
        let heuristic = PRONOUN_OPENERS.is_match(query) || BARE_REFERENCE.is_match(query);

        let query_embedding = self.embedder.embed(query);
        let mut scored: Vec<(f32, &Exchange)> = self
            .buffer
            .iter()
            .map(|exchange| (cosine(&query_embedding, &exchange.embedding), exchange))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let max_similarity = scored.first().map(|(s, _)| *s).unwrap_or(0.0);
        let with_context = !self.buffer.is_empty()
            && (max_similarity >= self.similarity_tau || heuristic);

        let snippets = if with_context {
            scored
                .into_iter()
                .take(topk)
                .map(|(_, exchange)| (exchange.query.clone(), exchange.answer.clone()))
                .collect()
        } else {
            Vec::new()
        };

        ContextSignal {
            with_context,
            snippets,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
