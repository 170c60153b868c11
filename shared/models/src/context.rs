//! Inputs to the per-tool retrievers and the assembled final context.

use crate::routing::{Intention, Tool};
use crate::rulebook::RulebookHit;
use crate::session::SessionSearchResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unified input accepted by every retriever. Each retriever validates
/// the shape it needs and ignores fields it does not use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolQueryInput {
    pub tool: Tool,
    pub intentions: Vec<Intention>,
    /// Entity names resolved to this tool
    #[serde(default)]
    pub entities: Vec<String>,
    /// Sections force-included because an entity resolved to them
    #[serde(default)]
    pub auto_include_sections: Vec<String>,
}

/// The character slice returned by character retrieval. Section insertion
/// order is preserved; absent sections are omitted entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterSlice {
    pub sections: Map<String, Value>,
}

impl CharacterSlice {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }
}

/// Everything handed to the final-answer prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssembledContext {
    /// The highest-priority source text
    pub primary: String,
    /// Remaining source text
    pub supporting: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_slice: Option<CharacterSlice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_slice: Option<Vec<RulebookHit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_slice: Option<Vec<SessionSearchResult>>,
    /// Entities that matched in more than one source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cross_refs: Vec<String>,
    pub confidence: f32,
}
