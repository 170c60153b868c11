//! Context assembly: turn per-tool slices into the final prompt input.

use loreweave_models::{
    AssembledContext, CharacterSlice, EntitySearchResult, RoutingDecision, RulebookHit,
    SessionSearchResult, Tool,
};
use std::collections::HashMap;
use std::fmt::Write;

/// What one retriever produced.
#[derive(Debug, Clone)]
pub enum ToolSlice {
    Character(CharacterSlice),
    Sessions(Vec<SessionSearchResult>),
    Rules(Vec<RulebookHit>),
}

/// Merge the collected slices. The highest-confidence tool's material is
/// primary; the rest is supporting. Entities resolved in more than one
/// source become cross references.
pub fn assemble(
    decision: &RoutingDecision,
    slices: Vec<(Tool, ToolSlice)>,
    entity_results: &HashMap<String, EntitySearchResult>,
) -> AssembledContext {
    // Render in plan-confidence order
    let mut ordered: Vec<(f32, Tool, String, ToolSlice)> = slices
        .into_iter()
        .map(|(tool, slice)| {
            let confidence = decision
                .need_for(tool)
                .map(|need| need.confidence)
                .unwrap_or(0.0);
            (confidence, tool, render(tool, &slice), slice)
        })
        .collect();
    ordered.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut context = AssembledContext {
        confidence: mean_confidence(decision),
        ..Default::default()
    };

    for (idx, (_, tool, text, slice)) in ordered.into_iter().enumerate() {
        if idx == 0 {
            context.primary = text;
        } else if context.supporting.is_empty() {
            context.supporting = text;
        } else {
            context.supporting.push_str("\n\n");
            context.supporting.push_str(&text);
        }

        match (tool, slice) {
            (Tool::CharacterData, ToolSlice::Character(slice)) => {
                context.character_slice = Some(slice);
            }
            (Tool::SessionNotes, ToolSlice::Sessions(hits)) => {
                context.session_slice = Some(hits);
            }
            (Tool::Rulebook, ToolSlice::Rules(hits)) => {
                context.rules_slice = Some(hits);
            }
            _ => {}
        }
    }

    let mut cross_refs: Vec<String> = entity_results
        .values()
        .filter(|result| result.matched_tools().len() > 1)
        .map(|result| result.entity_name.clone())
        .collect();
    cross_refs.sort();
    context.cross_refs = cross_refs;

    context
}

fn mean_confidence(decision: &RoutingDecision) -> f32 {
    if decision.tools_needed.is_empty() {
        return 0.0;
    }
    let sum: f32 = decision.tools_needed.iter().map(|n| n.confidence).sum();
    sum / decision.tools_needed.len() as f32
}

fn render(tool: Tool, slice: &ToolSlice) -> String {
    match slice {
        ToolSlice::Character(slice) => {
            let mut out = String::from("[Character Sheet]\n");
            for (name, value) in &slice.sections {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
                writeln!(out, "### {name}\n{pretty}").ok();
            }
            out
        }
        ToolSlice::Sessions(hits) => {
            let mut out = String::from("[Session Notes]\n");
            for hit in hits {
                writeln!(
                    out,
                    "Session {} — {} ({}): {}",
                    hit.session_number,
                    hit.session_title,
                    hit.kind.as_str(),
                    hit.content
                )
                .ok();
            }
            out
        }
        ToolSlice::Rules(hits) => {
            let mut out = String::from("[Rulebook]\n");
            for hit in hits {
                writeln!(out, "### {}\n{}", hit.title, hit.content).ok();
            }
            out
        }
    }
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::{
        CharacterIntention, DecisionSource, EntityMatch, Intention, MatchStrategy, ToolNeed,
    };

    fn decision() -> RoutingDecision {
        RoutingDecision {
            tools_needed: vec![
                ToolNeed {
                    tool: Tool::CharacterData,
                    intentions: vec![Intention::Character(CharacterIntention::CombatInfo)],
                    confidence: 0.9,
                },
                ToolNeed {
                    tool: Tool::Rulebook,
                    intentions: vec![Intention::parse(Tool::Rulebook, "rule_mechanics").unwrap()],
                    confidence: 0.7,
                },
            ],
            entities: vec![],
            source: DecisionSource::Llm,
            abstained: false,
        }
    }

    #[test]
    fn highest_confidence_tool_is_primary() {
        let mut slice = CharacterSlice::default();
        slice
            .sections
            .insert("combat_stats".to_string(), serde_json::json!({"armor_class": 19}));

        let context = assemble(
            &decision(),
            vec![
                (Tool::Rulebook, ToolSlice::Rules(vec![])),
                (Tool::CharacterData, ToolSlice::Character(slice)),
            ],
            &HashMap::new(),
        );

        assert!(context.primary.starts_with("[Character Sheet]"));
        assert!(context.supporting.starts_with("[Rulebook]"));
        assert!(context.character_slice.is_some());
    }

    #[test]
    fn multi_source_entities_become_cross_refs() {
        let mut results = HashMap::new();
        results.insert(
            "persuasion".to_string(),
            EntitySearchResult {
                entity_name: "persuasion".to_string(),
                matches: vec![
                    EntityMatch {
                        source_tool: Tool::CharacterData,
                        section_path: "character_data.proficiencies_and_modifiers".to_string(),
                        matched_text: "persuasion".to_string(),
                        strategy: MatchStrategy::Exact,
                        confidence: 1.0,
                    },
                    EntityMatch {
                        source_tool: Tool::Rulebook,
                        section_path: "rulebook.9".to_string(),
                        matched_text: "Persuasion".to_string(),
                        strategy: MatchStrategy::Exact,
                        confidence: 1.0,
                    },
                ],
            },
        );

        let context = assemble(&decision(), vec![], &results);
        assert_eq!(context.cross_refs, vec!["persuasion"]);
    }
}
