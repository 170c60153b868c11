//! Query intake types.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Maximum prior exchanges carried with a query.
pub const MAX_HISTORY_TURNS: usize = 10;

/// One prior (query, answer) exchange from the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryTurn {
    pub query: String,
    pub answer: String,
}

/// An immutable user query against a named character.
///
/// Created once on intake, consumed once by the pipeline, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The natural-language question
    pub text: String,

    /// Character the question is asked about
    pub character_name: String,

    /// Prior exchanges, oldest first, capped at [`MAX_HISTORY_TURNS`]
    #[serde(default)]
    pub session_history: Vec<HistoryTurn>,
}

impl Query {
    /// Build a validated query. History beyond the cap is dropped from the
    /// oldest end.
    pub fn new(
        text: impl Into<String>,
        character_name: impl Into<String>,
        mut session_history: Vec<HistoryTurn>,
    ) -> ModelResult<Self> {
        let text = text.into();
        let character_name = character_name.into();

        if text.trim().is_empty() {
            return Err(ModelError::Validation("query text is empty".to_string()));
        }
        if character_name.trim().is_empty() {
            return Err(ModelError::Validation(
                "character name is empty".to_string(),
            ));
        }

        if session_history.len() > MAX_HISTORY_TURNS {
            let excess = session_history.len() - MAX_HISTORY_TURNS;
            session_history.drain(..excess);
        }

        Ok(Self {
            text,
            character_name,
            session_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_text() {
        assert!(Query::new("   ", "Duskryn", vec![]).is_err());
    }

    #[test]
    fn history_capped_to_most_recent() {
        let turns: Vec<HistoryTurn> = (0..14)
            .map(|i| HistoryTurn {
                query: format!("q{i}"),
                answer: format!("a{i}"),
            })
            .collect();

        let q = Query::new("What's my AC?", "Duskryn", turns).unwrap();

        assert_eq!(q.session_history.len(), MAX_HISTORY_TURNS);
        assert_eq!(q.session_history[0].query, "q4");
        assert_eq!(q.session_history.last().unwrap().query, "q13");
    }
}
