//! Character-data intention specs.

use loreweave_models::CharacterIntention;

/// What a character intention pulls from the sheet.
#[derive(Debug, Clone, Copy)]
pub struct CharacterIntentionSpec {
    pub description: &'static str,
    /// Always included in the slice
    pub required_sections: &'static [&'static str],
    /// Included only when an entity match refers to them, in priority order
    pub optional_sections: &'static [&'static str],
    /// Entity types this intention usually mentions, used in prompts
    pub entity_hints: &'static [&'static str],
}

/// Registry entry for a character intention.
pub fn character_spec(intention: CharacterIntention) -> CharacterIntentionSpec {
    use CharacterIntention::*;

    match intention {
        CharacterBasics => CharacterIntentionSpec {
            description: "Name, race, class, level, alignment, and background",
            required_sections: &["character_base"],
            optional_sections: &["background_info", "personality_traits"],
            entity_hints: &["class", "race", "background"],
        },
        CombatInfo => CharacterIntentionSpec {
            description: "Armor class, hit points, attacks, and combat actions",
            required_sections: &["ability_scores", "combat_stats", "action_economy"],
            optional_sections: &["inventory", "features_and_traits", "spellcasting_info"],
            entity_hints: &["weapon", "item", "feature"],
        },
        AbilitiesInfo => CharacterIntentionSpec {
            description: "Ability scores, skill modifiers, and proficiencies",
            required_sections: &["ability_scores", "proficiencies_and_modifiers"],
            optional_sections: &["features_and_traits", "passive_scores_and_senses"],
            entity_hints: &["skill", "ability", "save"],
        },
        InventoryInfo => CharacterIntentionSpec {
            description: "Carried equipment, attunements, and item properties",
            required_sections: &["inventory"],
            optional_sections: &["combat_stats", "spellcasting_info"],
            entity_hints: &["item", "weapon", "armor"],
        },
        MagicInfo => CharacterIntentionSpec {
            description: "Known spells, spell slots, and casting statistics",
            required_sections: &["spell_list", "spellcasting_info"],
            optional_sections: &["inventory", "features_and_traits"],
            entity_hints: &["spell", "item"],
        },
        StoryInfo => CharacterIntentionSpec {
            description: "Backstory, background, and long-term narrative threads",
            required_sections: &["background_info", "backstory"],
            optional_sections: &["personality_traits", "organizations", "objectives"],
            entity_hints: &["npc", "organization", "location"],
        },
        SocialInfo => CharacterIntentionSpec {
            description: "Personality, allies, enemies, and affiliations",
            required_sections: &["personality_traits"],
            optional_sections: &[
                "allies",
                "enemies",
                "organizations",
                "proficiencies_and_modifiers",
            ],
            entity_hints: &["npc", "organization", "skill"],
        },
        ProgressInfo => CharacterIntentionSpec {
            description: "Level, advancement, and current goals",
            required_sections: &["character_base"],
            optional_sections: &["features_and_traits", "objectives"],
            entity_hints: &["class", "feature"],
        },
        FullCharacter => CharacterIntentionSpec {
            description: "The entire character sheet",
            required_sections: &[
                "character_base",
                "ability_scores",
                "combat_stats",
                "inventory",
                "spell_list",
                "spellcasting_info",
                "action_economy",
                "features_and_traits",
                "background_info",
                "personality_traits",
                "proficiencies_and_modifiers",
                "passive_scores_and_senses",
                "backstory",
                "organizations",
                "allies",
                "enemies",
                "objectives",
            ],
            optional_sections: &[],
            entity_hints: &[],
        },
        CharacterSummary => CharacterIntentionSpec {
            description: "A compact overview: identity, defenses, and abilities",
            required_sections: &["character_base", "combat_stats", "ability_scores"],
            optional_sections: &["objectives"],
            entity_hints: &[],
        },
    }
}
