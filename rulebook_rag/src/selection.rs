//! Content selection under a token budget.
//!
//! The top-scored section is included with all its descendants (leaf
//! content concatenated recursively); further sections join without
//! descendants until the budget or the list runs out. A section already
//! swept in as a descendant is skipped.

use loreweave_models::{estimate_tokens, RulebookCorpus, RulebookHit, Section, SectionId};
use std::collections::HashSet;
use tracing::debug;

/// A section with its query score, ordered best-first by the caller.
pub struct ScoredSection {
    pub section_id: SectionId,
    pub score: f32,
}

pub fn select_content(
    corpus: &RulebookCorpus,
    ranked: &[ScoredSection],
    k: usize,
    token_budget: u32,
) -> Vec<RulebookHit> {
    let mut hits: Vec<RulebookHit> = Vec::new();
    let mut included: HashSet<SectionId> = HashSet::new();
    let mut budget_left = token_budget;

    for (rank, scored) in ranked.iter().take(k).enumerate() {
        if included.contains(&scored.section_id) {
            continue;
        }
        let Some(section) = corpus.get(scored.section_id) else {
            continue;
        };

        let content = if rank == 0 {
            // Top section brings its whole subtree
            let text = subtree_content(corpus, section, budget_left);
            for id in corpus.descendants(section.id) {
                included.insert(id);
            }
            text
        } else {
            truncate_to_budget(&section.content, budget_left)
        };

        let cost = estimate_tokens(&content);
        if cost > budget_left {
            break;
        }
        budget_left -= cost;
        included.insert(section.id);

        hits.push(RulebookHit {
            section_id: section.id,
            title: section.title.clone(),
            level: section.level,
            score: scored.score,
            categories: section.categories.clone(),
            content,
        });

        if budget_left == 0 {
            break;
        }
    }

    debug!(
        selected = hits.len(),
        budget_left, "📖 Rulebook content selected"
    );

    hits
}

/// Concatenate the section's own content and every descendant leaf's
/// content, depth-first, stopping at the budget.
fn subtree_content(corpus: &RulebookCorpus, root: &Section, budget: u32) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut used = 0u32;

    let mut push = |text: &str, title: &str, used: &mut u32| -> bool {
        if text.trim().is_empty() {
            return true;
        }
        let block = format!("## {title}\n{text}");
        let cost = estimate_tokens(&block);
        if *used + cost > budget {
            return false;
        }
        *used += cost;
        parts.push(block);
        true
    };

    if !push(&root.content, &root.title, &mut used) {
        return truncate_to_budget(&root.content, budget);
    }

    for id in corpus.descendants(root.id) {
        let Some(section) = corpus.get(id) else {
            continue;
        };
        if !section.has_content() {
            continue;
        }
        if !push(&section.content, &section.title, &mut used) {
            break;
        }
    }

    parts.join("\n\n")
}

fn truncate_to_budget(content: &str, budget: u32) -> String {
    if estimate_tokens(content) <= budget {
        return content.to_string();
    }
    // 3.5 chars per token, matching the shared estimator
    let max_chars = (budget as f32 * 3.5) as usize;
    let mut cut = max_chars.min(content.len());
    while cut > 0 && !content.is_char_boundary(cut) {
        cut -= 1;
    }
    content[..cut].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::{RuleCategory, Section, SectionLevel};

    fn corpus() -> RulebookCorpus {
        let chapter = Section {
            id: 1,
            title: "Combat".to_string(),
            level: SectionLevel::Chapter,
            content: String::new(),
            parent_id: None,
            children_ids: vec![2, 3],
            categories: vec![RuleCategory::Combat],
            vector: vec![],
        };
        let leaf_a = Section {
            id: 2,
            title: "Grappling".to_string(),
            level: SectionLevel::Leaf,
            content: "Grappling rules text.".to_string(),
            parent_id: Some(1),
            children_ids: vec![],
            categories: vec![RuleCategory::Combat],
            vector: vec![],
        };
        let leaf_b = Section {
            id: 3,
            title: "Shoving".to_string(),
            level: SectionLevel::Leaf,
            content: "Shoving rules text.".to_string(),
            parent_id: Some(1),
            children_ids: vec![],
            categories: vec![RuleCategory::Combat],
            vector: vec![],
        };
        RulebookCorpus::new(vec![chapter, leaf_a, leaf_b]).unwrap()
    }

    fn scored(ids: &[u32]) -> Vec<ScoredSection> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| ScoredSection {
                section_id: *id,
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }

    #[test]
    fn top_section_brings_descendants() {
        let hits = select_content(&corpus(), &scored(&[1, 2, 3]), 10, 8000);

        assert_eq!(hits[0].section_id, 1);
        assert!(hits[0].content.contains("Grappling rules"));
        assert!(hits[0].content.contains("Shoving rules"));
        // descendants already included are skipped
        assert!(hits.iter().skip(1).all(|h| h.section_id != 2));
        assert!(hits.iter().skip(1).all(|h| h.section_id != 3));
    }

    #[test]
    fn later_sections_come_without_descendants() {
        let hits = select_content(&corpus(), &scored(&[2, 1]), 10, 8000);

        assert_eq!(hits[0].section_id, 2);
        let chapter_hit = hits.iter().find(|h| h.section_id == 1).unwrap();
        // chapter has no own content, so its hit carries none of the leaves
        assert!(!chapter_hit.content.contains("Shoving"));
    }

    #[test]
    fn budget_is_never_exceeded() {
        let budget = 15u32;
        let hits = select_content(&corpus(), &scored(&[1, 2, 3]), 10, budget);

        let total: u32 = hits.iter().map(|h| estimate_tokens(&h.content)).sum();
        assert!(total <= budget);
    }

    #[test]
    fn k_caps_the_section_count() {
        let hits = select_content(&corpus(), &scored(&[2, 3, 1]), 1, 8000);
        assert_eq!(hits.len(), 1);
    }
}
