//! Entity search over the character sheet.

use crate::strategies::best_match;
use loreweave_models::{Character, EntityMatch, MatchStrategy, Tool};
use std::collections::HashMap;

/// Scan the sheet's name-bearing fields. Returns the best hit per section.
pub fn search(entity_norm: &str, character: &Character, fuzzy_threshold: f32) -> Vec<EntityMatch> {
    let mut best_per_section: HashMap<&'static str, (MatchStrategy, f32, String)> = HashMap::new();

    let mut consider = |section: &'static str, candidate: &str| {
        if let Some((strategy, confidence)) = best_match(entity_norm, candidate, fuzzy_threshold) {
            let entry = best_per_section.entry(section);
            match entry {
                std::collections::hash_map::Entry::Occupied(mut slot) => {
                    if confidence > slot.get().1 {
                        slot.insert((strategy, confidence, candidate.to_string()));
                    }
                }
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert((strategy, confidence, candidate.to_string()));
                }
            }
        }
    };

    let base = &character.character_base;
    consider("character_base", &base.name);
    consider("character_base", &base.race);
    consider("character_base", &base.class);
    consider("character_base", &base.background);

    if let Some(inventory) = &character.inventory {
        for item in &inventory.items {
            consider("inventory", &item.name);
        }
    }

    if let Some(spell_list) = &character.spell_list {
        for spell in &spell_list.spells {
            consider("spell_list", &spell.name);
        }
    }

    if let Some(economy) = &character.action_economy {
        for entry in economy
            .actions
            .iter()
            .chain(economy.bonus_actions.iter())
            .chain(economy.reactions.iter())
        {
            consider("action_economy", &entry.name);
        }
    }

    if let Some(features) = &character.features_and_traits {
        for feature in &features.features {
            consider("features_and_traits", &feature.name);
        }
    }

    if let Some(proficiencies) = &character.proficiencies_and_modifiers {
        for skill in proficiencies.skills.keys() {
            consider("proficiencies_and_modifiers", skill);
        }
        for language in &proficiencies.languages {
            consider("proficiencies_and_modifiers", language);
        }
        for tool in &proficiencies.tools {
            consider("proficiencies_and_modifiers", tool);
        }
    }

    for (section, entries) in [
        ("organizations", &character.organizations),
        ("allies", &character.allies),
        ("enemies", &character.enemies),
        ("objectives", &character.objectives),
    ] {
        for entry in entries {
            consider(section, &entry.name);
        }
    }

    let mut matches: Vec<EntityMatch> = best_per_section
        .into_iter()
        .map(|(section, (strategy, confidence, matched_text))| EntityMatch {
            source_tool: Tool::CharacterData,
            section_path: format!("character_data.{section}"),
            matched_text,
            strategy,
            confidence,
        })
        .collect();

    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.section_path.cmp(&b.section_path))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::character::sample;

    #[test]
    fn finds_item_in_inventory() {
        let character = sample::duskryn();
        let matches = search("eldaryth of regret", &character, 0.75);

        assert!(!matches.is_empty());
        let inventory_hit = matches
            .iter()
            .find(|m| m.section_path == "character_data.inventory")
            .expect("inventory hit");
        assert_eq!(inventory_hit.strategy, MatchStrategy::Exact);
        assert_eq!(inventory_hit.confidence, 1.0);
    }

    #[test]
    fn skill_matches_in_proficiencies() {
        let character = sample::duskryn();
        let matches = search("persuasion", &character, 0.75);

        assert!(matches
            .iter()
            .any(|m| m.section_path == "character_data.proficiencies_and_modifiers"));
    }

    #[test]
    fn one_hit_per_section_keeps_best() {
        let character = sample::duskryn();
        // "eldaryth" substring-matches both the inventory item and the
        // attack action naming it; each section reports once
        let matches = search("eldaryth", &character, 0.75);
        let inventory_hits = matches
            .iter()
            .filter(|m| m.section_path == "character_data.inventory")
            .count();
        assert_eq!(inventory_hits, 1);
        assert!(matches
            .iter()
            .any(|m| m.section_path == "character_data.action_economy"));
    }

    #[test]
    fn no_match_returns_empty() {
        let character = sample::duskryn();
        assert!(search("vecna", &character, 0.75).is_empty());
    }
}
