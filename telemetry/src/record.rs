//! The per-query telemetry record.

use chrono::{DateTime, Utc};
use loreweave_models::{StageTimings, TokenCounts, Tool};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user correction to one tool of the routing plan. Corrections are
/// per-tool; a full-plan correction is just several of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCorrection {
    pub tool: Tool,
    /// Whether the tool should have been selected
    pub should_have_fired: bool,
    /// The intention that should have been used, when relevant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_intention: Option<String>,
}

/// Everything captured about one query. Appended once at the terminal
/// state regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub qid: String,
    pub timestamp: DateTime<Utc>,
    pub query_text: String,
    pub character_name: String,

    pub fastpath_hit: bool,
    /// character_data, session_notes, rulebook, needs_context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_probs: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<f32>,
    pub abstain: bool,
    /// Tool → intentions actually executed
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plan: BTreeMap<String, Vec<String>>,
    /// The heuristic fallback plan was used after routing failed
    #[serde(default)]
    pub fallback: bool,
    pub with_context: bool,

    pub latency_ms: StageTimings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_counts: Option<TokenCounts>,

    /// Gold labels, when a curator supplied them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels_gold: Vec<String>,
    /// Subjective answer quality in [0,1], when rated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_quality: Option<f32>,

    /// Terminal outcome: "complete", "error", or "cancelled"
    pub outcome: String,
}

impl QueryRecord {
    /// Tools the plan selected, as label strings.
    pub fn predicted_labels(&self) -> Vec<String> {
        self.plan.keys().cloned().collect()
    }
}
