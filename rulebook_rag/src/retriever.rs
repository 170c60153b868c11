//! Two-phase retrieval: filter candidates by category, then score.

use crate::errors::{RulebookRagError, RulebookRagResult};
use crate::scoring::{score_section, ScoringContext};
use crate::selection::{select_content, ScoredSection};
use loreweave_models::{
    Intention, RuleCategory, RulebookCorpus, RulebookHit, SectionId, ToolQueryInput,
};
use loreweave_registry::{rulebook_spec, RulebookStrategy};
use std::collections::HashSet;
use tracing::debug;

pub struct RulebookRetriever;

impl RulebookRetriever {
    /// Retrieve rulebook content for the input's intentions.
    ///
    /// Candidates are restricted to sections whose categories intersect
    /// the intentions' category sets; auto-included sections bypass the
    /// filter. Direct-grab strategies pin title-matched sections to the
    /// top before semantic ranking fills the rest.
    pub fn query(
        corpus: &RulebookCorpus,
        input: &ToolQueryInput,
        query_embedding: Option<&[f32]>,
        context_hints: &[String],
        k: usize,
        token_budget: u32,
    ) -> RulebookRagResult<Vec<RulebookHit>> {
        if input.intentions.is_empty() || input.intentions.len() > 2 {
            return Err(RulebookRagError::IntentionCount(input.intentions.len()));
        }

        let mut intentions = Vec::with_capacity(input.intentions.len());
        for intention in &input.intentions {
            match intention {
                Intention::Rulebook(i) => intentions.push(*i),
                other => return Err(RulebookRagError::WrongTool(other.as_str().to_string())),
            }
        }

        let mut categories: Vec<RuleCategory> = Vec::new();
        let mut direct_grab = false;
        for intention in &intentions {
            let spec = rulebook_spec(*intention);
            for category in spec.categories {
                if !categories.contains(category) {
                    categories.push(*category);
                }
            }
            direct_grab |= matches!(
                spec.strategy,
                RulebookStrategy::DirectSection | RulebookStrategy::Fused
            );
        }

        // Phase 1: candidate filtering
        let mut candidates: Vec<SectionId> = Vec::new();
        let mut seen: HashSet<SectionId> = HashSet::new();
        for category in &categories {
            for id in corpus.sections_in_category(*category) {
                if seen.insert(*id) {
                    candidates.push(*id);
                }
            }
        }
        for path in &input.auto_include_sections {
            if let Some(id) = parse_rulebook_path(path) {
                if corpus.get(id).is_some() && seen.insert(id) {
                    candidates.push(id);
                }
            }
        }

        // Phase 2: scoring
        let entities_lower: Vec<String> = input.entities.iter().map(|e| e.to_lowercase()).collect();
        let hints_lower: Vec<String> = context_hints.iter().map(|h| h.to_lowercase()).collect();
        let ctx = ScoringContext {
            query_embedding,
            entities: &entities_lower,
            context_hints: &hints_lower,
            intention_categories: &categories,
        };

        let mut ranked: Vec<ScoredSection> = candidates
            .iter()
            .filter_map(|id| corpus.get(*id))
            .map(|section| {
                let mut score = score_section(section, &ctx);
                if direct_grab && title_matches_entity(&section.title, &entities_lower) {
                    score = 1.0;
                }
                ScoredSection {
                    section_id: section.id,
                    score,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            candidates = ranked.len(),
            categories = categories.len(),
            "📖 Rulebook candidates ranked"
        );

        Ok(select_content(corpus, &ranked, k, token_budget))
    }
}

fn title_matches_entity(title: &str, entities_lower: &[String]) -> bool {
    let title_lower = title.to_lowercase();
    entities_lower
        .iter()
        .any(|entity| entity.len() >= 3 && title_lower.contains(entity.as_str()))
}

/// Extract the section id from a `rulebook.<id>` path.
fn parse_rulebook_path(path: &str) -> Option<SectionId> {
    path.strip_prefix("rulebook.")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::{RulebookIntention, Section, SectionLevel, Tool};

    fn corpus() -> RulebookCorpus {
        let combat_chapter = Section {
            id: 1,
            title: "Combat".to_string(),
            level: SectionLevel::Chapter,
            content: String::new(),
            parent_id: None,
            children_ids: vec![2],
            categories: vec![RuleCategory::Combat],
            vector: vec![0.5, 0.5],
        };
        let grappling = Section {
            id: 2,
            title: "Grappling".to_string(),
            level: SectionLevel::Leaf,
            content: "When you want to grab a creature, make a grapple check.".to_string(),
            parent_id: Some(1),
            children_ids: vec![],
            categories: vec![RuleCategory::Combat],
            vector: vec![1.0, 0.0],
        };
        let spells = Section {
            id: 3,
            title: "Casting a Spell".to_string(),
            level: SectionLevel::Leaf,
            content: "Spell slots, components, and concentration.".to_string(),
            parent_id: None,
            children_ids: vec![],
            categories: vec![RuleCategory::Spellcasting],
            vector: vec![0.0, 1.0],
        };
        RulebookCorpus::new(vec![combat_chapter, grappling, spells]).unwrap()
    }

    fn input(intention: RulebookIntention, entities: Vec<&str>) -> ToolQueryInput {
        ToolQueryInput {
            tool: Tool::Rulebook,
            intentions: vec![Intention::Rulebook(intention)],
            entities: entities.into_iter().map(String::from).collect(),
            auto_include_sections: vec![],
        }
    }

    #[test]
    fn category_filter_excludes_other_categories() {
        let hits = RulebookRetriever::query(
            &corpus(),
            &input(RulebookIntention::RuleMechanics, vec!["grappling"]),
            Some(&[1.0, 0.0]),
            &[],
            10,
            8000,
        )
        .unwrap();

        assert!(hits.iter().all(|h| h.section_id != 3));
        assert_eq!(hits[0].section_id, 2);
    }

    #[test]
    fn auto_include_bypasses_category_filter() {
        let mut query_input = input(RulebookIntention::RuleMechanics, vec![]);
        query_input.auto_include_sections = vec!["rulebook.3".to_string()];

        let hits = RulebookRetriever::query(
            &corpus(),
            &query_input,
            Some(&[0.0, 1.0]),
            &[],
            10,
            8000,
        )
        .unwrap();

        assert!(hits.iter().any(|h| h.section_id == 3));
    }

    #[test]
    fn direct_grab_pins_title_matched_section() {
        let hits = RulebookRetriever::query(
            &corpus(),
            &input(RulebookIntention::ConditionEffects, vec![]),
            None,
            &[],
            10,
            8000,
        );
        // ConditionEffects maps to the Conditions category: no candidates here
        assert!(hits.unwrap().is_empty());

        let hits = RulebookRetriever::query(
            &corpus(),
            &input(RulebookIntention::CombatSequence, vec!["grappling"]),
            None,
            &[],
            10,
            8000,
        )
        .unwrap();
        assert_eq!(hits[0].section_id, 2);
        assert_eq!(hits[0].score, 1.0);
    }

    #[test]
    fn wrong_tool_intention_rejected() {
        let err = RulebookRetriever::query(
            &corpus(),
            &ToolQueryInput {
                tool: Tool::Rulebook,
                intentions: vec![Intention::Session(
                    loreweave_models::SessionIntention::NpcInfo,
                )],
                entities: vec![],
                auto_include_sections: vec![],
            },
            None,
            &[],
            10,
            8000,
        )
        .unwrap_err();
        assert!(matches!(err, RulebookRagError::WrongTool(_)));
    }
}
