//! Entities extracted from queries and their resolved matches.

use crate::routing::Tool;
use serde::{Deserialize, Serialize};

/// A proper noun or term extracted from the query. Carries no source
/// tagging or scoping; resolution decides where it lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub name: String,
    pub confidence: f32,
}

/// How a match was found, in priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Substring,
    Fuzzy,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::Substring => "substring",
            MatchStrategy::Fuzzy => "fuzzy",
        }
    }
}

/// A single location where an entity was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMatch {
    pub source_tool: Tool,
    /// Dotted path into the source, e.g. `character_data.inventory` or
    /// `rulebook.42` or `session_notes.12.npcs`
    pub section_path: String,
    pub matched_text: String,
    pub strategy: MatchStrategy,
    pub confidence: f32,
}

/// All matches for one extracted entity. An entity with zero matches is
/// still returned; multi-location hits are never filtered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySearchResult {
    pub entity_name: String,
    pub matches: Vec<EntityMatch>,
}

impl EntitySearchResult {
    pub fn empty(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            matches: vec![],
        }
    }

    /// Tools that produced at least one match.
    pub fn matched_tools(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.matches.iter().map(|m| m.source_tool).collect();
        tools.sort();
        tools.dedup();
        tools
    }
}
