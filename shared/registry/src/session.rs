//! Session-notes intention specs.

use loreweave_models::SessionIntention;
use serde::{Deserialize, Serialize};

/// How a session intention retrieves: which primitive leads the fusion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStrategy {
    /// Table scans only
    Structured,
    /// Embedding similarity only
    Semantic,
    /// Both, structured hits ranked first
    Fused,
}

/// Post-fusion temporal filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemporalPolicy {
    /// No filter; all sessions eligible
    All,
    /// Only the last N sessions
    Recent(u32),
    /// Only the most recent session
    Latest,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionIntentionSpec {
    pub description: &'static str,
    pub strategy: SessionStrategy,
    pub temporal: TemporalPolicy,
}

/// Registry entry for a session intention.
pub fn session_spec(intention: SessionIntention) -> SessionIntentionSpec {
    use SessionIntention::*;
    use SessionStrategy::*;
    use TemporalPolicy::*;

    match intention {
        CharacterStatus => SessionIntentionSpec {
            description: "Current condition and situation of a character",
            strategy: Fused,
            temporal: Recent(3),
        },
        EventSequence => SessionIntentionSpec {
            description: "What happened, in order, during recent play",
            strategy: Fused,
            temporal: Latest,
        },
        NpcInfo => SessionIntentionSpec {
            description: "Who an NPC is and every interaction with them",
            strategy: Structured,
            temporal: All,
        },
        LocationDetails => SessionIntentionSpec {
            description: "Places the party has visited and what happened there",
            strategy: Structured,
            temporal: All,
        },
        ItemTracking => SessionIntentionSpec {
            description: "Items found, used, traded, or lost",
            strategy: Structured,
            temporal: All,
        },
        CombatRecap => SessionIntentionSpec {
            description: "Fights and encounters and how they unfolded",
            strategy: Fused,
            temporal: Recent(2),
        },
        SpellAbilityUsage => SessionIntentionSpec {
            description: "Spells and abilities used during sessions",
            strategy: Structured,
            temporal: All,
        },
        CharacterDecisions => SessionIntentionSpec {
            description: "Choices a character made and their stakes",
            strategy: Structured,
            temporal: All,
        },
        PartyDynamics => SessionIntentionSpec {
            description: "How party members relate and interact",
            strategy: Semantic,
            temporal: All,
        },
        QuestTracking => SessionIntentionSpec {
            description: "Active and completed quests and their status",
            strategy: Fused,
            temporal: All,
        },
        PuzzleSolutions => SessionIntentionSpec {
            description: "Puzzles encountered and how they were solved",
            strategy: Semantic,
            temporal: All,
        },
        LootRewards => SessionIntentionSpec {
            description: "Treasure and rewards gained",
            strategy: Structured,
            temporal: All,
        },
        DeathRevival => SessionIntentionSpec {
            description: "Deaths, near-deaths, and revivals",
            strategy: Semantic,
            temporal: All,
        },
        DivineReligious => SessionIntentionSpec {
            description: "Deities, omens, and religious events",
            strategy: Semantic,
            temporal: All,
        },
        MemoryVision => SessionIntentionSpec {
            description: "Visions, dreams, and recovered memories",
            strategy: Semantic,
            temporal: All,
        },
        RulesMechanics => SessionIntentionSpec {
            description: "Table rulings and mechanics discussed in play",
            strategy: Semantic,
            temporal: All,
        },
        HumorMoments => SessionIntentionSpec {
            description: "Memorable jokes and quotes",
            strategy: Structured,
            temporal: All,
        },
        UnresolvedMysteries => SessionIntentionSpec {
            description: "Open questions and unexplained events",
            strategy: Fused,
            temporal: All,
        },
        FutureImplications => SessionIntentionSpec {
            description: "Foreshadowing and consequences still to come",
            strategy: Fused,
            temporal: Recent(3),
        },
        CrossSession => SessionIntentionSpec {
            description: "Threads connecting multiple sessions",
            strategy: Semantic,
            temporal: All,
        },
    }
}
