//! Events streamed to the transport layer during one query.
//!
//! Per query the metadata events are emitted in a fixed order:
//! routing, entities, context_sources, then response chunks, then
//! performance. `response_complete` or `error` terminates the stream.

use crate::entity::EntitySearchResult;
use crate::routing::{DecisionSource, Tool};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Routing decision summary published once per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingMetadata {
    pub tools: Vec<Tool>,
    /// Tool → its intentions as strings
    pub intentions: BTreeMap<String, Vec<String>>,
    pub source: DecisionSource,
    pub abstained: bool,
    pub fastpath_hit: bool,
    /// Set when routing fell back to the heuristic default plan
    #[serde(default)]
    pub fallback: bool,
}

/// Extracted entities and their resolution summary, published once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitiesMetadata {
    pub results: Vec<EntitySearchResult>,
}

/// Which sources contributed to the final context, published once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSourcesMetadata {
    pub sources: Vec<Tool>,
    /// Tools that were selected but timed out or failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<Tool>,
}

/// Milliseconds spent per pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub fastpath_ms: u64,
    pub local_ms: u64,
    pub routing_llm_ms: u64,
    pub entity_resolution_ms: u64,
    /// Tool name → retrieval milliseconds
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub retrieval_ms: BTreeMap<String, u64>,
    pub final_llm_ms: u64,
    pub total_ms: u64,
}

/// Final performance event, published once at the end of the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub stages: StageTimings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_counts: Option<TokenCounts>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenCounts {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// The tagged event union streamed to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryEvent {
    MessageReceived { query_id: String },
    RoutingMetadata(RoutingMetadata),
    EntitiesMetadata(EntitiesMetadata),
    ContextSources(ContextSourcesMetadata),
    ResponseChunk { content: String },
    PerformanceMetrics(PerformanceMetrics),
    ResponseComplete,
    Error { message: String },
}

impl QueryEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryEvent::MessageReceived { .. } => "message_received",
            QueryEvent::RoutingMetadata(_) => "routing_metadata",
            QueryEvent::EntitiesMetadata(_) => "entities_metadata",
            QueryEvent::ContextSources(_) => "context_sources",
            QueryEvent::ResponseChunk { .. } => "response_chunk",
            QueryEvent::PerformanceMetrics(_) => "performance_metrics",
            QueryEvent::ResponseComplete => "response_complete",
            QueryEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryEvent::ResponseComplete | QueryEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_snake_case_type() {
        let event = QueryEvent::ResponseChunk {
            content: "AC is 19".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "response_chunk");
        assert_eq!(json["content"], "AC is 19");
    }

    #[test]
    fn terminal_detection() {
        assert!(QueryEvent::ResponseComplete.is_terminal());
        assert!(QueryEvent::Error {
            message: "boom".to_string()
        }
        .is_terminal());
        assert!(!QueryEvent::MessageReceived {
            query_id: "q".to_string()
        }
        .is_terminal());
    }
}
