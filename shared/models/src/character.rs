//! The character aggregate.
//!
//! Required sections are always present; optional sections are either
//! absent or fully formed. Derived values (modifiers, passive scores)
//! are stored, never recomputed here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// REQUIRED SECTIONS
// ============================================================================

/// Core identity of a character.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterBase {
    pub name: String,
    pub race: String,
    pub class: String,
    pub total_level: u8,
    pub alignment: String,
    pub background: String,
}

/// The six ability scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AbilityScores {
    pub str: u8,
    pub dex: u8,
    pub con: u8,
    pub int: u8,
    pub wis: u8,
    pub cha: u8,
}

/// Combat-facing statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CombatStats {
    pub max_hp: u16,
    pub armor_class: u8,
    pub initiative_bonus: i8,
    pub speed: u16,
    pub hit_dice: String,
}

// ============================================================================
// OPTIONAL SECTIONS
// ============================================================================

/// A single carried or stowed item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub equipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inventory {
    pub items: Vec<InventoryItem>,
}

/// A known or prepared spell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spell {
    pub name: String,
    pub level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default)]
    pub prepared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpellList {
    pub spells: Vec<Spell>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpellcastingInfo {
    pub ability: String,
    pub spell_save_dc: u8,
    pub spell_attack_bonus: i8,
    /// Slots by spell level, e.g. {1: 4, 2: 3}
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<u8, u8>,
}

/// Actions, bonus actions, and reactions available in combat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionEconomy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bonus_actions: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<NamedEntry>,
}

/// A named entry with free-form descriptive text. Used across several
/// optional sections (features, actions, organizations, allies, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeaturesAndTraits {
    pub features: Vec<NamedEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackgroundInfo {
    pub feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalityTraits {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ideals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bonds: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flaws: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProficienciesAndModifiers {
    pub proficiency_bonus: i8,
    /// Skill name → stored modifier, e.g. {"athletics": 7}
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub skills: BTreeMap<String, i8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub saving_throws: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassiveScoresAndSenses {
    pub passive_perception: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive_investigation: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive_insight: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Backstory {
    pub text: String,
}

// ============================================================================
// THE AGGREGATE
// ============================================================================

/// A fully loaded character sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub character_base: CharacterBase,
    pub ability_scores: AbilityScores,
    pub combat_stats: CombatStats,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spell_list: Option<SpellList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spellcasting_info: Option<SpellcastingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_economy: Option<ActionEconomy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features_and_traits: Option<FeaturesAndTraits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_info: Option<BackgroundInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality_traits: Option<PersonalityTraits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proficiencies_and_modifiers: Option<ProficienciesAndModifiers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive_scores_and_senses: Option<PassiveScoresAndSenses>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backstory: Option<Backstory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allies: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enemies: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<NamedEntry>,
}

/// Every addressable section name, in sheet order.
pub const SECTION_NAMES: &[&str] = &[
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
];

impl Character {
    /// Serialize a single section by name. Returns `None` for unknown
    /// names, absent optional sections, and empty lists.
    pub fn section_value(&self, name: &str) -> Option<Value> {
        fn ser<T: Serialize>(v: &T) -> Option<Value> {
            serde_json::to_value(v).ok()
        }
        fn ser_opt<T: Serialize>(v: &Option<T>) -> Option<Value> {
            v.as_ref().and_then(|inner| ser(inner))
        }
        fn ser_list(v: &[NamedEntry]) -> Option<Value> {
            if v.is_empty() {
                None
            } else {
                serde_json::to_value(v).ok()
            }
        }

        match name {
            "character_base" => ser(&self.character_base),
            "ability_scores" => ser(&self.ability_scores),
            "combat_stats" => ser(&self.combat_stats),
            "inventory" => ser_opt(&self.inventory),
            "spell_list" => ser_opt(&self.spell_list),
            "spellcasting_info" => ser_opt(&self.spellcasting_info),
            "action_economy" => ser_opt(&self.action_economy),
            "features_and_traits" => ser_opt(&self.features_and_traits),
            "background_info" => ser_opt(&self.background_info),
            "personality_traits" => ser_opt(&self.personality_traits),
            "proficiencies_and_modifiers" => ser_opt(&self.proficiencies_and_modifiers),
            "passive_scores_and_senses" => ser_opt(&self.passive_scores_and_senses),
            "backstory" => ser_opt(&self.backstory),
            "organizations" => ser_list(&self.organizations),
            "allies" => ser_list(&self.allies),
            "enemies" => ser_list(&self.enemies),
            "objectives" => ser_list(&self.objectives),
            _ => None,
        }
    }

    /// Names of the sections actually present on this sheet.
    pub fn present_sections(&self) -> Vec<&'static str> {
        SECTION_NAMES
            .iter()
            .copied()
            .filter(|name| self.section_value(name).is_some())
            .collect()
    }
}

/// Sample sheet used by the demo binary and test suites.
pub mod sample {
    use super::*;

    pub fn duskryn() -> Character {
        Character {
            character_base: CharacterBase {
                name: "Duskryn Nightwarden".to_string(),
                race: "Half-Elf".to_string(),
                class: "Paladin".to_string(),
                total_level: 9,
                alignment: "Lawful Neutral".to_string(),
                background: "Soldier".to_string(),
            },
            ability_scores: AbilityScores {
                str: 18,
                dex: 10,
                con: 14,
                int: 8,
                wis: 12,
                cha: 16,
            },
            combat_stats: CombatStats {
                max_hp: 76,
                armor_class: 19,
                initiative_bonus: 0,
                speed: 30,
                hit_dice: "9d10".to_string(),
            },
            inventory: Some(Inventory {
                items: vec![
                    InventoryItem {
                        name: "Eldaryth of Regret".to_string(),
                        quantity: 1,
                        equipped: true,
                        description: Some(
                            "Sentient longsword; grants advantage on fear saves while attuned"
                                .to_string(),
                        ),
                        properties: vec!["versatile".to_string(), "magical".to_string()],
                    },
                    InventoryItem {
                        name: "Shield of the Watch".to_string(),
                        quantity: 1,
                        equipped: true,
                        description: None,
                        properties: vec![],
                    },
                ],
            }),
            spell_list: Some(SpellList {
                spells: vec![Spell {
                    name: "Bless".to_string(),
                    level: 1,
                    school: Some("Enchantment".to_string()),
                    prepared: true,
                    description: None,
                }],
            }),
            spellcasting_info: Some(SpellcastingInfo {
                ability: "cha".to_string(),
                spell_save_dc: 15,
                spell_attack_bonus: 7,
                slots: BTreeMap::from([(1, 4), (2, 3)]),
            }),
            action_economy: Some(ActionEconomy {
                actions: vec![NamedEntry {
                    name: "Attack (Eldaryth of Regret)".to_string(),
                    description: Some("+9 to hit, 1d8+6 slashing".to_string()),
                }],
                bonus_actions: vec![],
                reactions: vec![NamedEntry {
                    name: "Opportunity Attack".to_string(),
                    description: None,
                }],
            }),
            features_and_traits: None,
            background_info: None,
            personality_traits: None,
            proficiencies_and_modifiers: Some(ProficienciesAndModifiers {
                proficiency_bonus: 4,
                skills: BTreeMap::from([
                    ("athletics".to_string(), 8),
                    ("persuasion".to_string(), 7),
                    ("intimidation".to_string(), 7),
                ]),
                saving_throws: vec!["wis".to_string(), "cha".to_string()],
                languages: vec!["Common".to_string(), "Elvish".to_string()],
                tools: vec![],
            }),
            passive_scores_and_senses: None,
            backstory: None,
            organizations: vec![],
            allies: vec![NamedEntry {
                name: "Elara".to_string(),
                description: Some("Cleric of the Dawnmother, traveling companion".to_string()),
            }],
            enemies: vec![],
            objectives: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_optional_sections_yield_none() {
        let c = sample::duskryn();
        assert!(c.section_value("backstory").is_none());
        assert!(c.section_value("organizations").is_none());
        assert!(c.section_value("inventory").is_some());
    }

    #[test]
    fn unknown_section_name_yields_none() {
        let c = sample::duskryn();
        assert!(c.section_value("nonexistent").is_none());
    }

    #[test]
    fn present_sections_always_include_required() {
        let c = sample::duskryn();
        let present = c.present_sections();
        assert!(present.contains(&"character_base"));
        assert!(present.contains(&"ability_scores"));
        assert!(present.contains(&"combat_stats"));
    }
}
