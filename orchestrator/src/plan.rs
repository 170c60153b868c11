//! Building the routing decision from its three possible sources:
//! fastpath rules, the local classifier, or the two LLM calls.

use loreweave_models::{
    CharacterIntention, DecisionSource, Entity, Intention, ModelResult, RoutingDecision, Tool,
    ToolNeed,
};

/// A fastpath hit becomes a single-tool plan with full confidence.
pub fn from_fastpath(tool: Tool, intention: Intention) -> RoutingDecision {
    RoutingDecision {
        tools_needed: vec![ToolNeed {
            tool,
            intentions: vec![intention],
            confidence: 1.0,
        }],
        entities: vec![],
        source: DecisionSource::Local,
        abstained: false,
    }
}

/// A confident local classification. The local path extracts no
/// entities; resolution runs over an empty set.
pub fn from_local(tools: Vec<(Tool, Intention, f32)>) -> ModelResult<RoutingDecision> {
    let decision = RoutingDecision {
        tools_needed: tools
            .into_iter()
            .map(|(tool, intention, confidence)| ToolNeed {
                tool,
                intentions: vec![intention],
                confidence,
            })
            .collect(),
        entities: vec![],
        source: DecisionSource::Local,
        abstained: false,
    };
    decision.validate()?;
    Ok(decision)
}

/// The classifier abstained: answer without retrieval.
pub fn abstained() -> RoutingDecision {
    RoutingDecision {
        tools_needed: vec![],
        entities: vec![],
        source: DecisionSource::Local,
        abstained: true,
    }
}

/// Merge the two LLM replies into a validated decision.
pub fn from_llm(tools_needed: Vec<ToolNeed>, entities: Vec<Entity>) -> ModelResult<RoutingDecision> {
    let decision = RoutingDecision {
        tools_needed,
        entities,
        source: DecisionSource::Llm,
        abstained: false,
    };
    decision.validate()?;
    Ok(decision)
}

/// Heuristic fallback when routing fails entirely: a character summary
/// alone, flagged in metadata by the caller.
pub fn fallback(entities: Vec<Entity>) -> RoutingDecision {
    RoutingDecision {
        tools_needed: vec![ToolNeed {
            tool: Tool::CharacterData,
            intentions: vec![Intention::Character(CharacterIntention::CharacterSummary)],
            confidence: 0.3,
        }],
        entities,
        source: DecisionSource::Llm,
        abstained: false,
    }
}
