//! Builds a [`CharacterSlice`] from intentions and entity-driven includes.

use crate::errors::{CharacterRagError, CharacterRagResult};
use loreweave_models::{Character, CharacterSlice, Intention, ToolQueryInput};
use loreweave_registry::character_spec;
use std::collections::HashSet;
use tracing::debug;

pub struct CharacterRetriever;

impl CharacterRetriever {
    /// Shape the sheet for the given input.
    ///
    /// The slice is the union of every intention's required sections plus
    /// `auto_include_sections`; each intention's optional sections are
    /// added only when an entity match referred to them (they arrive via
    /// auto-include). Absent sections are omitted, preserving sheet order.
    pub fn query(
        character: &Character,
        input: &ToolQueryInput,
    ) -> CharacterRagResult<CharacterSlice> {
        if input.intentions.is_empty() || input.intentions.len() > 2 {
            return Err(CharacterRagError::IntentionCount(input.intentions.len()));
        }

        let mut intentions = Vec::with_capacity(input.intentions.len());
        for intention in &input.intentions {
            match intention {
                Intention::Character(i) => intentions.push(*i),
                other => {
                    return Err(CharacterRagError::WrongTool(other.as_str().to_string()));
                }
            }
        }

        // Auto-includes arrive as bare names or dotted paths
        let auto_include: HashSet<String> = input
            .auto_include_sections
            .iter()
            .map(|path| strip_tool_prefix(path).to_string())
            .collect();

        let mut ordered: Vec<&'static str> = Vec::new();

        for intention in &intentions {
            for section in character_spec(*intention).required_sections {
                push_unique(section, &mut ordered);
            }
        }

        for intention in &intentions {
            for section in character_spec(*intention).optional_sections {
                if auto_include.contains(*section) {
                    push_unique(section, &mut ordered);
                }
            }
        }

        // Any further auto-included section joins regardless of intention
        for section in &auto_include {
            push_unique(section, &mut ordered);
        }

        let mut slice = CharacterSlice::default();
        for section in ordered {
            if let Some(value) = character.section_value(section) {
                slice.sections.insert(section.to_string(), value);
            }
        }

        debug!(
            intentions = intentions.len(),
            sections = slice.sections.len(),
            "📇 Character slice assembled"
        );

        Ok(slice)
    }
}

fn strip_tool_prefix(path: &str) -> &str {
    path.strip_prefix("character_data.").unwrap_or(path)
}

/// Append a section once, resolving it to its canonical static name.
/// Unknown names (a mis-mapped auto-include) are dropped silently.
fn push_unique(section: &str, ordered: &mut Vec<&'static str>) {
    if ordered.iter().any(|existing| *existing == section) {
        return;
    }
    if let Some(known) = loreweave_models::character::SECTION_NAMES
        .iter()
        .find(|known| **known == section)
    {
        ordered.push(*known);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::character::sample;
    use loreweave_models::{CharacterIntention, Tool};

    fn input(intentions: Vec<Intention>, auto_include: Vec<&str>) -> ToolQueryInput {
        ToolQueryInput {
            tool: Tool::CharacterData,
            intentions,
            entities: vec![],
            auto_include_sections: auto_include.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn combat_info_returns_required_sections() {
        let character = sample::duskryn();
        let slice = CharacterRetriever::query(
            &character,
            &input(
                vec![Intention::Character(CharacterIntention::CombatInfo)],
                vec![],
            ),
        )
        .unwrap();

        assert_eq!(
            slice.section_names(),
            vec!["ability_scores", "combat_stats", "action_economy"]
        );
    }

    #[test]
    fn entity_match_pulls_in_optional_section() {
        let character = sample::duskryn();
        let slice = CharacterRetriever::query(
            &character,
            &input(
                vec![Intention::Character(CharacterIntention::CombatInfo)],
                vec!["character_data.inventory"],
            ),
        )
        .unwrap();

        assert_eq!(
            slice.section_names(),
            vec![
                "ability_scores",
                "combat_stats",
                "action_economy",
                "inventory"
            ]
        );
    }

    #[test]
    fn two_intentions_union_without_duplicates() {
        let character = sample::duskryn();
        let slice = CharacterRetriever::query(
            &character,
            &input(
                vec![
                    Intention::Character(CharacterIntention::CombatInfo),
                    Intention::Character(CharacterIntention::AbilitiesInfo),
                ],
                vec![],
            ),
        )
        .unwrap();

        let names = slice.section_names();
        assert!(names.contains(&"ability_scores"));
        assert!(names.contains(&"proficiencies_and_modifiers"));
        assert_eq!(
            names.iter().filter(|n| **n == "ability_scores").count(),
            1
        );
    }

    #[test]
    fn three_intentions_rejected() {
        let character = sample::duskryn();
        let err = CharacterRetriever::query(
            &character,
            &input(
                vec![
                    Intention::Character(CharacterIntention::CombatInfo),
                    Intention::Character(CharacterIntention::AbilitiesInfo),
                    Intention::Character(CharacterIntention::MagicInfo),
                ],
                vec![],
            ),
        )
        .unwrap_err();
        assert!(matches!(err, CharacterRagError::IntentionCount(3)));
    }

    #[test]
    fn wrong_tool_intention_rejected() {
        let character = sample::duskryn();
        let err = CharacterRetriever::query(
            &character,
            &input(
                vec![Intention::Session(
                    loreweave_models::SessionIntention::NpcInfo,
                )],
                vec![],
            ),
        )
        .unwrap_err();
        assert!(matches!(err, CharacterRagError::WrongTool(_)));
    }

    #[test]
    fn absent_sections_are_omitted() {
        let character = sample::duskryn();
        let slice = CharacterRetriever::query(
            &character,
            &input(
                vec![Intention::Character(CharacterIntention::StoryInfo)],
                vec![],
            ),
        )
        .unwrap();

        // duskryn has neither background_info nor backstory
        assert!(slice.is_empty());
    }
}
