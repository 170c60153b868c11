//! The local router: fastpath, calibrated classification, abstention.

use crate::backends::{ClassifierBackend, FewShotHead, ZeroShotClassifier, LABELS};
use crate::calibration::Calibrator;
use crate::context_detector::{ContextDetector, ContextSignal};
use crate::fastpath::{FastpathHit, FastpathMatcher};
use crate::intent_head::derive_intention;
use loreweave_config::{ClassifierMode, RoutingConfig};
use loreweave_models::{Intention, Tool};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// What the local router concluded for one query.
#[derive(Debug, Clone)]
pub enum LocalRouteOutcome {
    /// L0 hit: canned reply or single-tool plan, no LLM anywhere
    Fastpath(FastpathHit),
    /// Safe to answer without any retrieval
    Abstain { risk: f32 },
    /// Confident multi-label decision with locally derived intentions
    Plan {
        tools: Vec<(Tool, Intention, f32)>,
        probs: [f32; 4],
        risk: f32,
        with_context: bool,
        ctx_snippets: Vec<(String, String)>,
    },
    /// Not confident enough; fall back to LLM routing
    Decline {
        probs: [f32; 4],
        risk: f32,
        with_context: bool,
        ctx_snippets: Vec<(String, String)>,
    },
}

pub struct LocalRouter {
    fastpath: FastpathMatcher,
    backend: Box<dyn ClassifierBackend>,
    calibrator: Calibrator,
    context: Mutex<ContextDetector>,
    abstain_risk_tau: f32,
    decision_margin: f32,
    topk_context: usize,
}

impl LocalRouter {
    /// Build from config. `few_shot` mode needs a weight artifact path;
    /// a missing or malformed artifact degrades to zero-shot with a
    /// warning rather than failing startup.
    pub fn new(config: &RoutingConfig, artifact_path: Option<&str>) -> Self {
        let backend: Box<dyn ClassifierBackend> = match (config.classifier_mode, artifact_path) {
            (ClassifierMode::FewShot, Some(path)) => match FewShotHead::from_file(path) {
                Ok(head) => Box::new(head),
                Err(e) => {
                    warn!("Few-shot artifact unusable ({}), using zero-shot", e);
                    Box::new(ZeroShotClassifier::new())
                }
            },
            (ClassifierMode::FewShot, None) => {
                warn!("Few-shot mode configured without artifact, using zero-shot");
                Box::new(ZeroShotClassifier::new())
            }
            (ClassifierMode::ZeroShot, _) => Box::new(ZeroShotClassifier::new()),
        };

        info!("🧭 Local router ready (backend: {})", backend.name());

        Self {
            fastpath: FastpathMatcher::new(),
            backend,
            calibrator: Calibrator::new(1.0, config.thresholds.clone()),
            context: Mutex::new(ContextDetector::new(
                config.similarity_window,
                config.context_sim_tau,
            )),
            abstain_risk_tau: config.abstain_risk_tau,
            decision_margin: config.decision_margin,
            topk_context: config.topk_context,
        }
    }

    /// Classify one query. Pure CPU; the caller owns the latency budget.
    pub fn route(&self, query: &str) -> LocalRouteOutcome {
        // L0 first: no classifier work for trivial queries
        if let Some(hit) = self.fastpath.check(query) {
            debug!("⚡ Fastpath hit");
            return LocalRouteOutcome::Fastpath(hit);
        }

        let logits = self.backend.logits(query);
        let decision = self.calibrator.calibrate(logits);

        let ContextSignal {
            with_context,
            snippets,
        } = self.context.lock().check(query, self.topk_context);

        let no_tool = !decision.decisions[..3].iter().any(|d| *d);
        if decision.risk <= self.abstain_risk_tau && no_tool {
            debug!(risk = decision.risk, "🪶 Abstaining: no retrieval needed");
            return LocalRouteOutcome::Abstain {
                risk: decision.risk,
            };
        }

        if self.calibrator.confident(&decision, self.decision_margin) {
            let mut tools = Vec::new();
            for (idx, label) in LABELS.iter().enumerate().take(3) {
                if !decision.decisions[idx] {
                    continue;
                }
                let tool = match label.as_str() {
                    "character_data" => Tool::CharacterData,
                    "session_notes" => Tool::SessionNotes,
                    _ => Tool::Rulebook,
                };
                match derive_intention(tool, query) {
                    Some(intention) => tools.push((tool, intention, decision.probs[idx])),
                    None => {
                        // Intention head has no evidence; the LLM selector
                        // stays authoritative
                        debug!(tool = tool.as_str(), "No local intention, declining");
                        return LocalRouteOutcome::Decline {
                            probs: decision.probs,
                            risk: decision.risk,
                            with_context,
                            ctx_snippets: snippets,
                        };
                    }
                }
            }

            info!(
                tools = tools.len(),
                risk = decision.risk,
                "🧭 Local plan accepted"
            );
            return LocalRouteOutcome::Plan {
                tools,
                probs: decision.probs,
                risk: decision.risk,
                with_context,
                ctx_snippets: snippets,
            };
        }

        debug!(risk = decision.risk, "🧭 Local router declines");
        LocalRouteOutcome::Decline {
            probs: decision.probs,
            risk: decision.risk,
            with_context,
            ctx_snippets: snippets,
        }
    }

    /// Record a finished exchange for the context detector.
    pub fn observe(&self, query: &str, answer: &str) {
        self.context.lock().observe(query, answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_config::RoutingConfig;

    fn router() -> LocalRouter {
        LocalRouter::new(&RoutingConfig::default(), None)
    }

    #[test]
    fn greeting_takes_fastpath() {
        match router().route("Hi") {
            LocalRouteOutcome::Fastpath(FastpathHit::CannedReply(_)) => {}
            other => panic!("expected canned fastpath, got {other:?}"),
        }
    }

    #[test]
    fn ac_lookup_takes_fastpath_plan() {
        match router().route("What's my AC?") {
            LocalRouteOutcome::Fastpath(FastpathHit::ToolPlan { tool, .. }) => {
                assert_eq!(tool, Tool::CharacterData);
            }
            other => panic!("expected fastpath plan, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_compound_query_declines_or_plans_multi() {
        // must never abstain on a substantive question
        match router().route("What combat abilities do I have tied to Eldaryth of Regret?") {
            LocalRouteOutcome::Abstain { .. } => panic!("abstained on substantive query"),
            LocalRouteOutcome::Fastpath(_) => panic!("fastpath matched a substantive query"),
            _ => {}
        }
    }

    #[test]
    fn observe_feeds_context_detection() {
        let router = router();
        router.observe("Who is Elara?", "Elara is a cleric.");
        match router.route("And what does she want from us?") {
            LocalRouteOutcome::Plan { with_context, .. }
            | LocalRouteOutcome::Decline { with_context, .. } => {
                assert!(with_context);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
