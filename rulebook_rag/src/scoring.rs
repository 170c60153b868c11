//! Per-candidate scoring: semantic similarity plus additive boosts.

use loreweave_models::{RuleCategory, Section, SectionLevel};

const ENTITY_TITLE_WEIGHT: f32 = 0.2;
const ENTITY_LEAF_CONTENT_WEIGHT: f32 = 0.15;
const ENTITY_INNER_CONTENT_WEIGHT: f32 = 0.10;
const ENTITY_BOOST_CAP: f32 = 0.4;

const CONTEXT_HINT_WEIGHT: f32 = 0.05;
const CONTEXT_BOOST_CAP: f32 = 0.2;

const CHAPTER_ADJUSTMENT: f32 = -0.15;
const SECTION_ADJUSTMENT: f32 = -0.05;
const CONTENT_LEAF_ADJUSTMENT: f32 = 0.10;

const CATEGORY_BONUS: f32 = 0.2;

/// Inputs shared across all candidates of one query.
pub struct ScoringContext<'a> {
    pub query_embedding: Option<&'a [f32]>,
    /// Lowercased entity names
    pub entities: &'a [String],
    /// Lowercased context hints
    pub context_hints: &'a [String],
    pub intention_categories: &'a [RuleCategory],
}

/// Final score = clamp(semantic + entity + context + level + category, 0, 1).
pub fn score_section(section: &Section, ctx: &ScoringContext<'_>) -> f32 {
    let semantic = match ctx.query_embedding {
        Some(embedding) if !section.vector.is_empty() => cosine(embedding, &section.vector),
        _ => 0.0,
    };

    let total = semantic
        + entity_boost(section, ctx.entities)
        + context_boost(section, ctx.context_hints)
        + level_adjustment(section)
        + category_bonus(section, ctx.intention_categories);

    total.clamp(0.0, 1.0)
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn entity_boost(section: &Section, entities: &[String]) -> f32 {
    let title = section.title.to_lowercase();
    let content = section.content.to_lowercase();

    let mut boost = 0.0;
    for entity in entities {
        if entity.len() < 3 {
            continue;
        }
        if title.contains(entity.as_str()) {
            boost += ENTITY_TITLE_WEIGHT;
        } else if content.contains(entity.as_str()) {
            boost += if section.is_leaf() {
                ENTITY_LEAF_CONTENT_WEIGHT
            } else {
                ENTITY_INNER_CONTENT_WEIGHT
            };
        }
    }

    boost.min(ENTITY_BOOST_CAP)
}

fn context_boost(section: &Section, hints: &[String]) -> f32 {
    let haystack = format!(
        "{} {}",
        section.title.to_lowercase(),
        section.content.to_lowercase()
    );

    let hits = hints
        .iter()
        .filter(|hint| hint.len() >= 3 && haystack.contains(hint.as_str()))
        .count();

    (hits as f32 * CONTEXT_HINT_WEIGHT).min(CONTEXT_BOOST_CAP)
}

fn level_adjustment(section: &Section) -> f32 {
    match section.level {
        SectionLevel::Chapter => CHAPTER_ADJUSTMENT,
        SectionLevel::Section => SECTION_ADJUSTMENT,
        SectionLevel::Subsection => 0.0,
        SectionLevel::Leaf => {
            if section.has_content() {
                CONTENT_LEAF_ADJUSTMENT
            } else {
                0.0
            }
        }
    }
}

fn category_bonus(section: &Section, intention_categories: &[RuleCategory]) -> f32 {
    if section
        .categories
        .iter()
        .any(|c| intention_categories.contains(c))
    {
        CATEGORY_BONUS
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(level: SectionLevel, title: &str, content: &str) -> Section {
        Section {
            id: 1,
            title: title.to_string(),
            level,
            content: content.to_string(),
            parent_id: None,
            children_ids: vec![],
            categories: vec![RuleCategory::Combat],
            vector: vec![1.0, 0.0],
        }
    }

    fn ctx<'a>(
        entities: &'a [String],
        hints: &'a [String],
        categories: &'a [RuleCategory],
    ) -> ScoringContext<'a> {
        ScoringContext {
            query_embedding: None,
            entities,
            context_hints: hints,
            intention_categories: categories,
        }
    }

    #[test]
    fn title_hit_outweighs_content_hit() {
        let entities = vec!["grappling".to_string()];
        let titled = section(SectionLevel::Leaf, "Grappling", "How to grab.");
        let content_only = section(SectionLevel::Leaf, "Special Attacks", "Grappling a foe.");

        let categories = [RuleCategory::Combat];
        let score_titled = score_section(&titled, &ctx(&entities, &[], &categories));
        let score_content = score_section(&content_only, &ctx(&entities, &[], &categories));
        assert!(score_titled > score_content);
    }

    #[test]
    fn entity_boost_caps_at_point_four() {
        let entities: Vec<String> = ["grappling", "shoving", "climbing", "attack"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let s = section(
            SectionLevel::Subsection,
            "Grappling Shoving Climbing Attack",
            "",
        );
        assert_eq!(entity_boost(&s, &entities), ENTITY_BOOST_CAP);
    }

    #[test]
    fn chapters_are_penalized_content_leaves_rewarded() {
        let chapter = section(SectionLevel::Chapter, "Combat", "");
        let leaf = section(SectionLevel::Leaf, "Opportunity Attacks", "Leaving reach...");
        assert_eq!(level_adjustment(&chapter), CHAPTER_ADJUSTMENT);
        assert_eq!(level_adjustment(&leaf), CONTENT_LEAF_ADJUSTMENT);
    }

    #[test]
    fn score_is_clamped_to_unit_interval() {
        let entities = vec!["grappling".to_string()];
        let hints = vec!["melee".to_string(), "attack".to_string()];
        let mut s = section(
            SectionLevel::Leaf,
            "Grappling",
            "A melee attack to grab a foe.",
        );
        s.vector = vec![1.0, 0.0];
        let categories = [RuleCategory::Combat];
        let mut scoring = ctx(&entities, &hints, &categories);
        let embedding = [1.0, 0.0];
        scoring.query_embedding = Some(&embedding);

        let score = score_section(&s, &scoring);
        assert!(score <= 1.0);
        assert!(score > 0.0);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
