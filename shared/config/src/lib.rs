//! Process-wide engine configuration.
//!
//! Defaults are compiled in, a YAML file can replace them, and individual
//! environment variables override either. Loaded once at startup.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::warn;

/// Which classifier backend the local router uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    ZeroShot,
    FewShot,
}

impl Default for ClassifierMode {
    fn default() -> Self {
        Self::ZeroShot
    }
}

/// Per-label decision thresholds for the local classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingThresholds {
    #[serde(default = "default_tool_threshold")]
    pub character: f32,
    #[serde(default = "default_tool_threshold")]
    pub rulebook: f32,
    #[serde(default = "default_tool_threshold")]
    pub session_notes: f32,
    #[serde(default = "default_context_threshold")]
    pub needs_context: f32,
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            character: default_tool_threshold(),
            rulebook: default_tool_threshold(),
            session_notes: default_tool_threshold(),
            needs_context: default_context_threshold(),
        }
    }
}

fn default_tool_threshold() -> f32 {
    0.55
}

fn default_context_threshold() -> f32 {
    0.40
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Gate for the local classifier; when false every query goes to the LLM router
    #[serde(default = "default_true")]
    pub local_enabled: bool,
    #[serde(default)]
    pub classifier_mode: ClassifierMode,
    #[serde(default)]
    pub thresholds: RoutingThresholds,
    /// Abstain only below this risk ceiling
    #[serde(default = "default_abstain_risk_tau")]
    pub abstain_risk_tau: f32,
    /// Context-detector cosine similarity threshold
    #[serde(default = "default_context_sim_tau")]
    pub context_sim_tau: f32,
    /// Rolling history buffer size for the context detector
    #[serde(default = "default_similarity_window")]
    pub similarity_window: usize,
    /// Recent exchanges injected when context is needed
    #[serde(default = "default_topk_context")]
    pub topk_context: usize,
    /// Margin each tool probability must clear above its threshold
    #[serde(default = "default_decision_margin")]
    pub decision_margin: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            classifier_mode: ClassifierMode::default(),
            thresholds: RoutingThresholds::default(),
            abstain_risk_tau: default_abstain_risk_tau(),
            context_sim_tau: default_context_sim_tau(),
            similarity_window: default_similarity_window(),
            topk_context: default_topk_context(),
            decision_margin: default_decision_margin(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_abstain_risk_tau() -> f32 {
    0.01
}

fn default_context_sim_tau() -> f32 {
    0.75
}

fn default_similarity_window() -> usize {
    10
}

fn default_topk_context() -> usize {
    3
}

fn default_decision_margin() -> f32 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulebookRetrievalConfig {
    /// Final-answer section cap
    #[serde(default = "default_rulebook_k")]
    pub k: usize,
    /// Content-selection token budget
    #[serde(default = "default_rulebook_token_budget")]
    pub token_budget: u32,
}

impl Default for RulebookRetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_rulebook_k(),
            token_budget: default_rulebook_token_budget(),
        }
    }
}

fn default_rulebook_k() -> usize {
    10
}

fn default_rulebook_token_budget() -> u32 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRetrievalConfig {
    #[serde(default = "default_session_top_k")]
    pub top_k: usize,
}

impl Default for SessionRetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_session_top_k(),
        }
    }
}

fn default_session_top_k() -> usize {
    5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub rulebook: RulebookRetrievalConfig,
    #[serde(default)]
    pub session: SessionRetrievalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Minimum normalized similarity accepted by the fuzzy strategy
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f32,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

fn default_fuzzy_threshold() -> f32 {
    0.75
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_local_classifier_timeout_ms")]
    pub local_classifier_timeout_ms: u64,
    #[serde(default = "default_routing_llm_timeout_ms")]
    pub routing_llm_timeout_ms: u64,
    #[serde(default = "default_retrieval_timeout_ms")]
    pub retrieval_timeout_ms: u64,
    #[serde(default = "default_final_llm_timeout_ms")]
    pub final_llm_timeout_ms: u64,
    #[serde(default = "default_max_intentions_per_tool")]
    pub max_intentions_per_tool: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            local_classifier_timeout_ms: default_local_classifier_timeout_ms(),
            routing_llm_timeout_ms: default_routing_llm_timeout_ms(),
            retrieval_timeout_ms: default_retrieval_timeout_ms(),
            final_llm_timeout_ms: default_final_llm_timeout_ms(),
            max_intentions_per_tool: default_max_intentions_per_tool(),
        }
    }
}

fn default_local_classifier_timeout_ms() -> u64 {
    200
}

fn default_routing_llm_timeout_ms() -> u64 {
    10_000
}

fn default_retrieval_timeout_ms() -> u64 {
    5_000
}

fn default_final_llm_timeout_ms() -> u64 {
    60_000
}

fn default_max_intentions_per_tool() -> usize {
    2
}

/// The full configuration surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub entity: EntityConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl EngineConfig {
    /// Load from a YAML file, falling back to defaults on any failure.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_yaml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse config {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Defaults (or the file named by `LOREWEAVE_CONFIG`), then env overrides.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let mut config = match env::var("LOREWEAVE_CONFIG") {
            Ok(path) => Self::from_file(path),
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        override_bool("LOREWEAVE_ROUTING_LOCAL_ENABLED", &mut self.routing.local_enabled);
        if let Ok(mode) = env::var("LOREWEAVE_ROUTING_CLASSIFIER_MODE") {
            match mode.as_str() {
                "zero_shot" => self.routing.classifier_mode = ClassifierMode::ZeroShot,
                "few_shot" => self.routing.classifier_mode = ClassifierMode::FewShot,
                other => warn!("Unknown classifier mode '{}' ignored", other),
            }
        }
        override_f32("LOREWEAVE_ROUTING_ABSTAIN_RISK_TAU", &mut self.routing.abstain_risk_tau);
        override_f32("LOREWEAVE_ROUTING_CONTEXT_SIM_TAU", &mut self.routing.context_sim_tau);
        override_f32(
            "LOREWEAVE_ROUTING_THRESHOLD_CHARACTER",
            &mut self.routing.thresholds.character,
        );
        override_f32(
            "LOREWEAVE_ROUTING_THRESHOLD_RULEBOOK",
            &mut self.routing.thresholds.rulebook,
        );
        override_f32(
            "LOREWEAVE_ROUTING_THRESHOLD_SESSION_NOTES",
            &mut self.routing.thresholds.session_notes,
        );
        override_f32(
            "LOREWEAVE_ROUTING_THRESHOLD_NEEDS_CONTEXT",
            &mut self.routing.thresholds.needs_context,
        );
        override_usize("LOREWEAVE_ROUTING_SIMILARITY_WINDOW", &mut self.routing.similarity_window);
        override_usize("LOREWEAVE_ROUTING_TOPK_CONTEXT", &mut self.routing.topk_context);
        override_usize("LOREWEAVE_RETRIEVAL_RULEBOOK_K", &mut self.retrieval.rulebook.k);
        override_usize("LOREWEAVE_RETRIEVAL_SESSION_TOP_K", &mut self.retrieval.session.top_k);
        override_f32("LOREWEAVE_ENTITY_FUZZY_THRESHOLD", &mut self.entity.fuzzy_threshold);
        override_u64(
            "LOREWEAVE_LIMITS_ROUTING_LLM_TIMEOUT_MS",
            &mut self.limits.routing_llm_timeout_ms,
        );
        override_u64(
            "LOREWEAVE_LIMITS_RETRIEVAL_TIMEOUT_MS",
            &mut self.limits.retrieval_timeout_ms,
        );
        override_u64(
            "LOREWEAVE_LIMITS_FINAL_LLM_TIMEOUT_MS",
            &mut self.limits.final_llm_timeout_ms,
        );
        override_usize(
            "LOREWEAVE_LIMITS_MAX_INTENTIONS_PER_TOOL",
            &mut self.limits.max_intentions_per_tool,
        );
    }
}

fn override_bool(key: &str, target: &mut bool) {
    if let Ok(value) = env::var(key) {
        *target = value == "true" || value == "1";
    }
}

fn override_f32(key: &str, target: &mut f32) {
    if let Ok(value) = env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!("Ignoring non-numeric {}={}", key, value),
        }
    }
}

fn override_u64(key: &str, target: &mut u64) {
    if let Ok(value) = env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!("Ignoring non-numeric {}={}", key, value),
        }
    }
}

fn override_usize(key: &str, target: &mut usize) {
    if let Ok(value) = env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!("Ignoring non-numeric {}={}", key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_values() {
        let config = EngineConfig::default();
        assert!(config.routing.local_enabled);
        assert_eq!(config.routing.thresholds.character, 0.55);
        assert_eq!(config.routing.thresholds.needs_context, 0.40);
        assert_eq!(config.routing.abstain_risk_tau, 0.01);
        assert_eq!(config.retrieval.rulebook.k, 10);
        assert_eq!(config.retrieval.rulebook.token_budget, 8000);
        assert_eq!(config.retrieval.session.top_k, 5);
        assert_eq!(config.entity.fuzzy_threshold, 0.75);
        assert_eq!(config.limits.max_intentions_per_tool, 2);
    }

    #[test]
    fn yaml_round_trip_preserves_overrides() {
        let yaml = r#"
routing:
  local_enabled: false
  classifier_mode: few_shot
retrieval:
  session:
    top_k: 8
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.routing.local_enabled);
        assert_eq!(config.routing.classifier_mode, ClassifierMode::FewShot);
        assert_eq!(config.retrieval.session.top_k, 8);
        // untouched keys keep defaults
        assert_eq!(config.retrieval.rulebook.k, 10);
    }
}
