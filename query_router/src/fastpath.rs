//! L0: declarative fastpath rules.
//!
//! A small pattern table catching trivial greetings, stock stat lookups,
//! and dice shortcuts. A hit yields either a canned reply or a
//! single-tool plan with no LLM involvement.

use loreweave_models::{CharacterIntention, Intention, Tool};
use once_cell::sync::Lazy;
use regex::Regex;

/// What a fastpath rule produces.
#[derive(Debug, Clone)]
pub enum FastpathHit {
    /// Answer directly, no retrieval at all
    CannedReply(String),
    /// Skip LLM routing, run one tool with one intention
    ToolPlan { tool: Tool, intention: Intention },
}

struct Rule {
    pattern: Regex,
    action: fn() -> FastpathHit,
}

fn canned(text: &'static str) -> FastpathHit {
    FastpathHit::CannedReply(text.to_string())
}

fn combat_plan() -> FastpathHit {
    FastpathHit::ToolPlan {
        tool: Tool::CharacterData,
        intention: Intention::Character(CharacterIntention::CombatInfo),
    }
}

fn abilities_plan() -> FastpathHit {
    FastpathHit::ToolPlan {
        tool: Tool::CharacterData,
        intention: Intention::Character(CharacterIntention::AbilitiesInfo),
    }
}

fn summary_plan() -> FastpathHit {
    FastpathHit::ToolPlan {
        tool: Tool::CharacterData,
        intention: Intention::Character(CharacterIntention::CharacterSummary),
    }
}

fn magic_plan() -> FastpathHit {
    FastpathHit::ToolPlan {
        tool: Tool::CharacterData,
        intention: Intention::Character(CharacterIntention::MagicInfo),
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let rule = |pattern: &str, action: fn() -> FastpathHit| Rule {
        pattern: Regex::new(pattern).expect("fastpath pattern"),
        action,
    };

    vec![
        // Greetings and pleasantries
        rule(r"(?i)^\s*(hi|hello|hey|greetings|good (morning|evening|afternoon))\s*[.!]*\s*$", || {
            canned("Well met! Ask me about your character, your past sessions, or the rules.")
        }),
        rule(r"(?i)^\s*(thanks|thank you|ty)\s*[.!]*\s*$", || {
            canned("Any time. May your rolls be high.")
        }),
        rule(r"(?i)^\s*(bye|goodbye|see you|farewell)\s*[.!]*\s*$", || {
            canned("Farewell, adventurer.")
        }),
        // Stock stat lookups. Anchored to the whole query so compound
        // questions still go through real routing.
        rule(r"(?i)^\s*what('?s| is) my (ac|armor class)\s*[?.!]*\s*$", combat_plan),
        rule(r"(?i)^\s*what('?s| is) my (hp|hit points?|health)\s*[?.!]*\s*$", combat_plan),
        rule(r"(?i)^\s*what('?s| is) my (initiative|speed)\s*[?.!]*\s*$", combat_plan),
        rule(
            r"(?i)^\s*what('?s| is) my (str|dex|con|int|wis|cha|strength|dexterity|constitution|intelligence|wisdom|charisma)( (score|modifier|mod|bonus))?\s*[?.!]*\s*$",
            abilities_plan,
        ),
        rule(
            r"(?i)^\s*what('?s| is) my (athletics|acrobatics|stealth|perception|persuasion|intimidation|insight|arcana|history|religion|nature|survival|medicine|investigation|deception|performance|animal handling|sleight of hand) (bonus|modifier|mod)\s*[?.!]*\s*$",
            abilities_plan,
        ),
        rule(r"(?i)^\s*what('?s| is) my proficiency bonus\s*[?.!]*\s*$", abilities_plan),
        rule(r"(?i)^\s*what spells (do i|can i) (know|cast)\s*[?.!]*\s*$", magic_plan),
        rule(r"(?i)^\s*how many spell slots( do i have( left)?)?\s*[?.!]*\s*$", magic_plan),
        rule(r"(?i)^\s*who am i\s*[?.!]*\s*$", summary_plan),
        rule(r"(?i)^\s*(show|describe) my character\s*[?.!]*\s*$", summary_plan),
        // Dice shortcuts
        rule(r"(?i)^\s*roll (a |an )?d?(4|6|8|10|12|20|100)\s*[?.!]*\s*$", || {
            canned("I don't roll dice for you, but your table surely will. State the check and I can tell you your modifier.")
        }),
        rule(r"(?i)^\s*(flip a coin|roll the dice)\s*[?.!]*\s*$", || {
            canned("That one's for the table. Ask me for the modifier and I'll have it ready.")
        }),
    ]
});

/// Pattern-table matcher. Stateless; the table is process-wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastpathMatcher;

impl FastpathMatcher {
    pub fn new() -> Self {
        Self
    }

    /// First matching rule wins.
    pub fn check(&self, query: &str) -> Option<FastpathHit> {
        RULES
            .iter()
            .find(|rule| rule.pattern.is_match(query))
            .map(|rule| (rule.action)())
    }
}
