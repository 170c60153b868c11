//! Entity search over the rulebook hierarchy.
//!
//! Titles get the full strategy set; section content gets a word-level
//! scan only, since whole-string similarity against pages of text is
//! meaningless.

use crate::strategies::{best_match, content_match};
use loreweave_models::{EntityMatch, RulebookCorpus, Tool};

pub fn search(entity_norm: &str, corpus: &RulebookCorpus, fuzzy_threshold: f32) -> Vec<EntityMatch> {
    let mut matches = Vec::new();

    for section in corpus.iter() {
        let title_hit = best_match(entity_norm, &section.title, fuzzy_threshold);
        let content_hit = if section.has_content() {
            content_match(entity_norm, &section.content)
        } else {
            None
        };

        // Best of title vs content for this section
        let best = match (title_hit, content_hit) {
            (Some(t), Some(c)) => Some(if c.1 > t.1 {
                (c, occurrence(&section.content, entity_norm))
            } else {
                (t, section.title.clone())
            }),
            (Some(t), None) => Some((t, section.title.clone())),
            (None, Some(c)) => Some((c, occurrence(&section.content, entity_norm))),
            (None, None) => None,
        };

        if let Some(((strategy, confidence), matched_text)) = best {
            matches.push(EntityMatch {
                source_tool: Tool::Rulebook,
                section_path: format!("rulebook.{}", section.id),
                matched_text,
                strategy,
                confidence,
            });
        }
    }

    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches
}

/// The matched span from the original content, case preserved.
fn occurrence(content: &str, entity_norm: &str) -> String {
    let lower = content.to_lowercase();
    match lower.find(entity_norm) {
        Some(pos) if content.is_char_boundary(pos) && content.is_char_boundary(pos + entity_norm.len()) => {
            content[pos..pos + entity_norm.len()].to_string()
        }
        _ => entity_norm.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::{MatchStrategy, RuleCategory, Section, SectionLevel};

    fn corpus() -> RulebookCorpus {
        let mut chapter = Section {
            id: 1,
            title: "Combat".to_string(),
            level: SectionLevel::Chapter,
            content: String::new(),
            parent_id: None,
            children_ids: vec![2],
            categories: vec![RuleCategory::Combat],
            vector: vec![],
        };
        let leaf = Section {
            id: 2,
            title: "Grappling".to_string(),
            level: SectionLevel::Leaf,
            content: "When you want to grab a creature, you can use the Attack action \
                      to make a special melee attack, a grapple."
                .to_string(),
            parent_id: Some(1),
            children_ids: vec![],
            categories: vec![RuleCategory::Combat],
            vector: vec![],
        };
        chapter.children_ids = vec![2];
        RulebookCorpus::new(vec![chapter, leaf]).unwrap()
    }

    #[test]
    fn title_match_wins_over_content() {
        let matches = search("grappling", &corpus(), 0.75);
        let top = &matches[0];
        assert_eq!(top.section_path, "rulebook.2");
        assert_eq!(top.strategy, MatchStrategy::Exact);
        assert_eq!(top.matched_text, "Grappling");
    }

    #[test]
    fn exact_content_hit_reports_the_matched_span() {
        let matches = search("grapple", &corpus(), 0.75);
        let hit = matches
            .iter()
            .find(|m| m.section_path == "rulebook.2")
            .unwrap();
        assert_eq!(hit.strategy, MatchStrategy::Exact);
        assert_eq!(hit.matched_text.to_lowercase(), "grapple");
    }

    #[test]
    fn unrelated_entity_finds_nothing() {
        assert!(search("fireball", &corpus(), 0.75).is_empty());
    }
}
