//! Tools, intentions, and the routing decision handed to retrievers.

use crate::error::{ModelError, ModelResult};
use crate::entity::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Hard cap on intentions per tool in a single query.
pub const MAX_INTENTIONS_PER_TOOL: usize = 2;

// ============================================================================
// TOOL IDENTITY
// ============================================================================

/// One of the three retrieval sources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    CharacterData,
    SessionNotes,
    Rulebook,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::CharacterData, Tool::SessionNotes, Tool::Rulebook];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::CharacterData => "character_data",
            Tool::SessionNotes => "session_notes",
            Tool::Rulebook => "rulebook",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "character_data" => Some(Tool::CharacterData),
            "session_notes" => Some(Tool::SessionNotes),
            "rulebook" => Some(Tool::Rulebook),
            _ => None,
        }
    }
}

// ============================================================================
// PER-TOOL INTENTION ENUMERATIONS
// ============================================================================

macro_rules! intention_enum {
    ($name:ident, $($variant:ident => $text:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

intention_enum!(CharacterIntention,
    CharacterBasics => "character_basics",
    CombatInfo => "combat_info",
    AbilitiesInfo => "abilities_info",
    InventoryInfo => "inventory_info",
    MagicInfo => "magic_info",
    StoryInfo => "story_info",
    SocialInfo => "social_info",
    ProgressInfo => "progress_info",
    FullCharacter => "full_character",
    CharacterSummary => "character_summary",
);

intention_enum!(SessionIntention,
    CharacterStatus => "character_status",
    EventSequence => "event_sequence",
    NpcInfo => "npc_info",
    LocationDetails => "location_details",
    ItemTracking => "item_tracking",
    CombatRecap => "combat_recap",
    SpellAbilityUsage => "spell_ability_usage",
    CharacterDecisions => "character_decisions",
    PartyDynamics => "party_dynamics",
    QuestTracking => "quest_tracking",
    PuzzleSolutions => "puzzle_solutions",
    LootRewards => "loot_rewards",
    DeathRevival => "death_revival",
    DivineReligious => "divine_religious",
    MemoryVision => "memory_vision",
    RulesMechanics => "rules_mechanics",
    HumorMoments => "humor_moments",
    UnresolvedMysteries => "unresolved_mysteries",
    FutureImplications => "future_implications",
    CrossSession => "cross_session",
);

intention_enum!(RulebookIntention,
    RuleMechanics => "rule_mechanics",
    CombatSequence => "combat_sequence",
    AttackRolls => "attack_rolls",
    DamageHealing => "damage_healing",
    MovementPositioning => "movement_positioning",
    ActionsInCombat => "actions_in_combat",
    ConditionEffects => "condition_effects",
    SpellDetails => "spell_details",
    SpellcastingRules => "spellcasting_rules",
    SpellComponents => "spell_components",
    ClassFeatures => "class_features",
    SubclassOptions => "subclass_options",
    LevelingRules => "leveling_rules",
    MulticlassRules => "multiclass_rules",
    RaceTraits => "race_traits",
    BackgroundDetails => "background_details",
    FeatDetails => "feat_details",
    SkillChecks => "skill_checks",
    AbilityScoreRules => "ability_score_rules",
    SavingThrows => "saving_throws",
    EquipmentDetails => "equipment_details",
    MagicItems => "magic_items",
    CurrencyTrade => "currency_trade",
    RestingRecovery => "resting_recovery",
    TravelExploration => "travel_exploration",
    EnvironmentHazards => "environment_hazards",
    MonsterStats => "monster_stats",
    NpcInteraction => "npc_interaction",
    DmGuidance => "dm_guidance",
    OptionalVariants => "optional_variants",
);

/// An intention tagged with the tool it belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Intention {
    Character(CharacterIntention),
    Session(SessionIntention),
    Rulebook(RulebookIntention),
}

impl Intention {
    pub fn tool(&self) -> Tool {
        match self {
            Intention::Character(_) => Tool::CharacterData,
            Intention::Session(_) => Tool::SessionNotes,
            Intention::Rulebook(_) => Tool::Rulebook,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intention::Character(i) => i.as_str(),
            Intention::Session(i) => i.as_str(),
            Intention::Rulebook(i) => i.as_str(),
        }
    }

    /// Parse an intention string against a specific tool's enumeration.
    pub fn parse(tool: Tool, s: &str) -> ModelResult<Self> {
        let parsed = match tool {
            Tool::CharacterData => CharacterIntention::from_str(s).map(Intention::Character),
            Tool::SessionNotes => SessionIntention::from_str(s).map(Intention::Session),
            Tool::Rulebook => RulebookIntention::from_str(s).map(Intention::Rulebook),
        };
        parsed.ok_or_else(|| ModelError::UnknownIntention {
            tool: tool.as_str().to_string(),
            intention: s.to_string(),
        })
    }
}

// ============================================================================
// ROUTING DECISION
// ============================================================================

/// Where the routing decision came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Local,
    Llm,
}

/// One selected tool with its intentions and selection confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolNeed {
    pub tool: Tool,
    pub intentions: Vec<Intention>,
    pub confidence: f32,
}

/// The finalized plan for a single query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub tools_needed: Vec<ToolNeed>,
    pub entities: Vec<Entity>,
    pub source: DecisionSource,
    pub abstained: bool,
}

impl RoutingDecision {
    /// Validate the §3 invariants: each tool at most once, intentions drawn
    /// from that tool's enumeration, at most two intentions per tool.
    pub fn validate(&self) -> ModelResult<()> {
        let mut seen: HashSet<Tool> = HashSet::new();

        for need in &self.tools_needed {
            if !seen.insert(need.tool) {
                return Err(ModelError::Validation(format!(
                    "tool {} selected more than once",
                    need.tool.as_str()
                )));
            }
            if need.intentions.is_empty() {
                return Err(ModelError::Validation(format!(
                    "tool {} selected with no intention",
                    need.tool.as_str()
                )));
            }
            if need.intentions.len() > MAX_INTENTIONS_PER_TOOL {
                return Err(ModelError::Validation(format!(
                    "tool {} has {} intentions (max {})",
                    need.tool.as_str(),
                    need.intentions.len(),
                    MAX_INTENTIONS_PER_TOOL
                )));
            }
            for intention in &need.intentions {
                if intention.tool() != need.tool {
                    return Err(ModelError::Validation(format!(
                        "intention {} does not belong to tool {}",
                        intention.as_str(),
                        need.tool.as_str()
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn selected_tools(&self) -> Vec<Tool> {
        self.tools_needed.iter().map(|n| n.tool).collect()
    }

    pub fn need_for(&self, tool: Tool) -> Option<&ToolNeed> {
        self.tools_needed.iter().find(|n| n.tool == tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intention_enums_have_expected_cardinality() {
        assert_eq!(CharacterIntention::ALL.len(), 10);
        assert_eq!(SessionIntention::ALL.len(), 20);
        assert_eq!(RulebookIntention::ALL.len(), 30);
    }

    #[test]
    fn parse_rejects_cross_tool_intention() {
        assert!(Intention::parse(Tool::Rulebook, "combat_info").is_err());
        assert!(Intention::parse(Tool::CharacterData, "combat_info").is_ok());
    }

    #[test]
    fn duplicate_tool_fails_validation() {
        let decision = RoutingDecision {
            tools_needed: vec![
                ToolNeed {
                    tool: Tool::CharacterData,
                    intentions: vec![Intention::Character(CharacterIntention::CombatInfo)],
                    confidence: 0.9,
                },
                ToolNeed {
                    tool: Tool::CharacterData,
                    intentions: vec![Intention::Character(CharacterIntention::AbilitiesInfo)],
                    confidence: 0.8,
                },
            ],
            entities: vec![],
            source: DecisionSource::Llm,
            abstained: false,
        };
        assert!(decision.validate().is_err());
    }

    #[test]
    fn three_intentions_fail_validation() {
        let decision = RoutingDecision {
            tools_needed: vec![ToolNeed {
                tool: Tool::CharacterData,
                intentions: vec![
                    Intention::Character(CharacterIntention::CombatInfo),
                    Intention::Character(CharacterIntention::AbilitiesInfo),
                    Intention::Character(CharacterIntention::MagicInfo),
                ],
                confidence: 0.9,
            }],
            entities: vec![],
            source: DecisionSource::Llm,
            abstained: false,
        };
        assert!(decision.validate().is_err());
    }
}
