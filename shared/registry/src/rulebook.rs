//! Rulebook intention specs.

use loreweave_models::{RuleCategory, RulebookIntention};
use serde::{Deserialize, Serialize};

/// How a rulebook intention retrieves its sections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RulebookStrategy {
    /// Title-first lookup of a known section
    DirectSection,
    /// Embedding similarity over the filtered candidates
    Semantic,
    /// Direct grab seeded, then semantic fill
    Fused,
}

#[derive(Debug, Clone, Copy)]
pub struct RulebookIntentionSpec {
    pub description: &'static str,
    pub categories: &'static [RuleCategory],
    pub strategy: RulebookStrategy,
}

/// Registry entry for a rulebook intention.
pub fn rulebook_spec(intention: RulebookIntention) -> RulebookIntentionSpec {
    use RuleCategory::*;
    use RulebookIntention::*;
    use RulebookStrategy::*;

    match intention {
        RuleMechanics => RulebookIntentionSpec {
            description: "How a general game mechanic works",
            categories: &[Combat, AbilitiesSkills, Conditions],
            strategy: Semantic,
        },
        CombatSequence => RulebookIntentionSpec {
            description: "Initiative, turns, and the order of combat",
            categories: &[Combat],
            strategy: DirectSection,
        },
        AttackRolls => RulebookIntentionSpec {
            description: "Making attacks, advantage, and critical hits",
            categories: &[Combat],
            strategy: Semantic,
        },
        DamageHealing => RulebookIntentionSpec {
            description: "Damage types, resistance, healing, and dropping to zero",
            categories: &[Combat, Conditions],
            strategy: Semantic,
        },
        MovementPositioning => RulebookIntentionSpec {
            description: "Movement, speed, and positioning in combat",
            categories: &[Combat, Exploration],
            strategy: Semantic,
        },
        ActionsInCombat => RulebookIntentionSpec {
            description: "Actions, bonus actions, and reactions",
            categories: &[Combat],
            strategy: DirectSection,
        },
        ConditionEffects => RulebookIntentionSpec {
            description: "What each condition does",
            categories: &[Conditions],
            strategy: DirectSection,
        },
        SpellDetails => RulebookIntentionSpec {
            description: "What a specific spell does",
            categories: &[Spellcasting],
            strategy: DirectSection,
        },
        SpellcastingRules => RulebookIntentionSpec {
            description: "Casting, concentration, and spell slots",
            categories: &[Spellcasting],
            strategy: Semantic,
        },
        SpellComponents => RulebookIntentionSpec {
            description: "Verbal, somatic, and material components",
            categories: &[Spellcasting],
            strategy: Semantic,
        },
        ClassFeatures => RulebookIntentionSpec {
            description: "Features granted by a class",
            categories: &[CharacterCreation],
            strategy: DirectSection,
        },
        SubclassOptions => RulebookIntentionSpec {
            description: "Subclass choices and what they grant",
            categories: &[CharacterCreation],
            strategy: Semantic,
        },
        LevelingRules => RulebookIntentionSpec {
            description: "Experience, levels, and advancement",
            categories: &[CharacterCreation],
            strategy: Semantic,
        },
        MulticlassRules => RulebookIntentionSpec {
            description: "Requirements and effects of multiclassing",
            categories: &[CharacterCreation, OptionalRules],
            strategy: Semantic,
        },
        RaceTraits => RulebookIntentionSpec {
            description: "Racial traits and features",
            categories: &[CharacterCreation],
            strategy: DirectSection,
        },
        BackgroundDetails => RulebookIntentionSpec {
            description: "Backgrounds and their features",
            categories: &[CharacterCreation],
            strategy: Semantic,
        },
        FeatDetails => RulebookIntentionSpec {
            description: "What a feat grants and requires",
            categories: &[CharacterCreation, OptionalRules],
            strategy: DirectSection,
        },
        SkillChecks => RulebookIntentionSpec {
            description: "Skill checks and which ability they use",
            categories: &[AbilitiesSkills],
            strategy: Semantic,
        },
        AbilityScoreRules => RulebookIntentionSpec {
            description: "Ability scores, modifiers, and score generation",
            categories: &[AbilitiesSkills, CharacterCreation],
            strategy: Semantic,
        },
        SavingThrows => RulebookIntentionSpec {
            description: "Saving throws and proficiency in them",
            categories: &[AbilitiesSkills, Combat],
            strategy: Semantic,
        },
        EquipmentDetails => RulebookIntentionSpec {
            description: "Gear, weapons, armor, and their properties",
            categories: &[Equipment],
            strategy: DirectSection,
        },
        MagicItems => RulebookIntentionSpec {
            description: "Magic items, attunement, and rarity",
            categories: &[Equipment],
            strategy: Fused,
        },
        CurrencyTrade => RulebookIntentionSpec {
            description: "Coinage, buying, and selling",
            categories: &[Equipment],
            strategy: Semantic,
        },
        RestingRecovery => RulebookIntentionSpec {
            description: "Short rests, long rests, and recovery",
            categories: &[Exploration],
            strategy: DirectSection,
        },
        TravelExploration => RulebookIntentionSpec {
            description: "Travel pace, navigation, and exploration",
            categories: &[Exploration],
            strategy: Semantic,
        },
        EnvironmentHazards => RulebookIntentionSpec {
            description: "Environmental dangers and hazards",
            categories: &[Exploration, GameMastering],
            strategy: Semantic,
        },
        MonsterStats => RulebookIntentionSpec {
            description: "Monster stat blocks and abilities",
            categories: &[MonstersNpcs],
            strategy: DirectSection,
        },
        NpcInteraction => RulebookIntentionSpec {
            description: "Social interaction and NPC attitude rules",
            categories: &[MonstersNpcs, GameMastering],
            strategy: Semantic,
        },
        DmGuidance => RulebookIntentionSpec {
            description: "Guidance for running the game",
            categories: &[GameMastering],
            strategy: Semantic,
        },
        OptionalVariants => RulebookIntentionSpec {
            description: "Optional and variant rules",
            categories: &[OptionalRules],
            strategy: Fused,
        },
    }
}
