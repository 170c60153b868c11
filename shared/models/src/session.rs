//! Session-notes corpus.
//!
//! One structured record per game session, with precomputed embeddings
//! for the summary and each key event. `session_number` is unique and
//! defines chronological order.

use crate::error::{ModelError, ModelResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured record of one game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionNote {
    pub session_number: u32,
    pub date: NaiveDate,
    pub title: String,
    pub summary: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_events: Vec<String>,

    /// NPC name → how the party interacted with them
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub npcs: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encounters: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spells_used: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,

    /// Character name → decisions they made this session
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub decisions: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliffhanger: Option<String>,

    /// Precomputed embedding of `summary`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary_embedding: Vec<f32>,

    /// Precomputed embeddings parallel to `key_events`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_embeddings: Vec<Vec<f32>>,
}

/// The loaded session corpus, ordered by session number ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCorpus {
    notes: Vec<SessionNote>,
}

impl SessionCorpus {
    /// Build a corpus, sorting by session number and validating uniqueness.
    pub fn new(mut notes: Vec<SessionNote>) -> ModelResult<Self> {
        notes.sort_by_key(|n| n.session_number);

        for pair in notes.windows(2) {
            if pair[0].session_number == pair[1].session_number {
                return Err(ModelError::CorpusIntegrity(format!(
                    "duplicate session number {}",
                    pair[0].session_number
                )));
            }
        }

        Ok(Self { notes })
    }

    pub fn notes(&self) -> &[SessionNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, session_number: u32) -> Option<&SessionNote> {
        self.notes
            .binary_search_by_key(&session_number, |n| n.session_number)
            .ok()
            .map(|idx| &self.notes[idx])
    }

    /// Most recent session, if any.
    pub fn latest(&self) -> Option<&SessionNote> {
        self.notes.last()
    }

    /// The last `n` sessions, most recent first.
    pub fn recent(&self, n: usize) -> Vec<&SessionNote> {
        self.notes.iter().rev().take(n).collect()
    }
}

/// Where a snippet inside a session note came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionSnippet {
    Summary,
    KeyEvent,
    Npc,
    Location,
    Encounter,
    SpellUsed,
    Item,
    Decision,
    Quote,
    Cliffhanger,
}

impl SessionSnippet {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionSnippet::Summary => "summary",
            SessionSnippet::KeyEvent => "key_event",
            SessionSnippet::Npc => "npc",
            SessionSnippet::Location => "location",
            SessionSnippet::Encounter => "encounter",
            SessionSnippet::SpellUsed => "spell_used",
            SessionSnippet::Item => "item",
            SessionSnippet::Decision => "decision",
            SessionSnippet::Quote => "quote",
            SessionSnippet::Cliffhanger => "cliffhanger",
        }
    }
}

/// One hit from session-notes retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSearchResult {
    pub session_number: u32,
    pub session_title: String,
    /// Identifies the snippet within its session, e.g. "npc:Elara" or
    /// "key_event:2". Dedup key together with `session_number`.
    pub snippet_id: String,
    pub kind: SessionSnippet,
    pub content: String,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(n: u32) -> SessionNote {
        SessionNote {
            session_number: n,
            date: NaiveDate::from_ymd_opt(2026, 1, n as u32 % 28 + 1).unwrap(),
            title: format!("Session {n}"),
            summary: "The party pressed on.".to_string(),
            key_events: vec![],
            npcs: BTreeMap::new(),
            locations: vec![],
            encounters: vec![],
            spells_used: vec![],
            items: vec![],
            decisions: BTreeMap::new(),
            quotes: vec![],
            cliffhanger: None,
            summary_embedding: vec![],
            event_embeddings: vec![],
        }
    }

    #[test]
    fn rejects_duplicate_session_numbers() {
        assert!(SessionCorpus::new(vec![note(1), note(1)]).is_err());
    }

    #[test]
    fn sorts_and_finds_latest() {
        let corpus = SessionCorpus::new(vec![note(3), note(1), note(2)]).unwrap();
        assert_eq!(corpus.latest().unwrap().session_number, 3);
        assert_eq!(corpus.get(2).unwrap().session_number, 2);
        let recent = corpus.recent(2);
        assert_eq!(recent[0].session_number, 3);
        assert_eq!(recent[1].session_number, 2);
    }
}
