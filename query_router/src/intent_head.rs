//! Keyword intention heads.
//!
//! When the classifier selects a tool locally, these heads pick the
//! intention by keyword argmax. A head that scores nothing returns
//! `None` and the router declines to the LLM selector, which remains
//! the authority on intentions.

use loreweave_models::{
    CharacterIntention, Intention, RulebookIntention, SessionIntention, Tool,
};

/// Argmax intention for a tool, if any keyword evidence exists.
pub fn derive_intention(tool: Tool, query: &str) -> Option<Intention> {
    let query_lower = query.to_lowercase();
    match tool {
        Tool::CharacterData => character_intention(&query_lower).map(Intention::Character),
        Tool::SessionNotes => session_intention(&query_lower).map(Intention::Session),
        Tool::Rulebook => rulebook_intention(&query_lower).map(Intention::Rulebook),
    }
}

fn score(query: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| query.contains(*kw)).count()
}

fn character_intention(query: &str) -> Option<CharacterIntention> {
    let table: [(&[&str], CharacterIntention); 8] = [
        (
            &["ac", "armor class", "hit points", "hp", "attack", "damage", "initiative", "combat"],
            CharacterIntention::CombatInfo,
        ),
        (
            &["skill", "bonus", "modifier", "proficien", "check", "save", "ability"],
            CharacterIntention::AbilitiesInfo,
        ),
        (
            &["inventory", "item", "carry", "equipment", "gear", "weapon"],
            CharacterIntention::InventoryInfo,
        ),
        (
            &["spell", "slot", "cast", "magic"],
            CharacterIntention::MagicInfo,
        ),
        (
            &["backstory", "background", "story", "past", "history"],
            CharacterIntention::StoryInfo,
        ),
        (
            &["personality", "ally", "allies", "enemy", "friend", "organization"],
            CharacterIntention::SocialInfo,
        ),
        (
            &["level up", "next level", "progress", "advance"],
            CharacterIntention::ProgressInfo,
        ),
        (
            &["who am i", "describe my character", "summary"],
            CharacterIntention::CharacterSummary,
        ),
    ];

    argmax(query, &table)
}

fn session_intention(query: &str) -> Option<SessionIntention> {
    let table: [(&[&str], SessionIntention); 8] = [
        (
            &["last session", "happened", "recap", "so far", "recently"],
            SessionIntention::EventSequence,
        ),
        (
            &["who is", "who was", "npc", "remind me who"],
            SessionIntention::NpcInfo,
        ),
        (
            &["where", "place", "location", "town", "city"],
            SessionIntention::LocationDetails,
        ),
        (
            &["loot", "found", "treasure", "item"],
            SessionIntention::ItemTracking,
        ),
        (
            &["fight", "battle", "encounter", "combat"],
            SessionIntention::CombatRecap,
        ),
        (
            &["decide", "decision", "chose", "choice"],
            SessionIntention::CharacterDecisions,
        ),
        (
            &["quest", "mission", "task", "objective"],
            SessionIntention::QuestTracking,
        ),
        (
            &["mystery", "unresolved", "unanswered", "cliffhanger"],
            SessionIntention::UnresolvedMysteries,
        ),
    ];

    argmax(query, &table)
}

fn rulebook_intention(query: &str) -> Option<RulebookIntention> {
    let table: [(&[&str], RulebookIntention); 8] = [
        (
            &["how does", "how do", "rule for", "rules for", "work"],
            RulebookIntention::RuleMechanics,
        ),
        (
            &["spell", "cast", "concentration"],
            RulebookIntention::SpellcastingRules,
        ),
        (
            &["condition", "stunned", "prone", "grappled", "poisoned", "frightened"],
            RulebookIntention::ConditionEffects,
        ),
        (
            &["attack roll", "advantage", "critical"],
            RulebookIntention::AttackRolls,
        ),
        (
            &["rest", "recover", "hit dice"],
            RulebookIntention::RestingRecovery,
        ),
        (
            &["magic item", "attune"],
            RulebookIntention::MagicItems,
        ),
        (
            &["class", "feature", "subclass"],
            RulebookIntention::ClassFeatures,
        ),
        (
            &["save", "saving throw"],
            RulebookIntention::SavingThrows,
        ),
    ];

    argmax(query, &table)
}

fn argmax<T: Copy>(query: &str, table: &[(&[&str], T)]) -> Option<T> {
    table
        .iter()
        .map(|(keywords, intention)| (score(query, keywords), *intention))
        .filter(|(hits, _)| *hits > 0)
        .max_by_key(|(hits, _)| *hits)
        .map(|(_, intention)| intention)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combat_keywords_pick_combat_info() {
        let intention = derive_intention(Tool::CharacterData, "what is my armor class").unwrap();
        assert_eq!(intention.as_str(), "combat_info");
    }

    #[test]
    fn last_session_picks_event_sequence() {
        let intention =
            derive_intention(Tool::SessionNotes, "What happened last session?").unwrap();
        assert_eq!(intention.as_str(), "event_sequence");
    }

    #[test]
    fn no_evidence_returns_none() {
        assert!(derive_intention(Tool::Rulebook, "zzz qqq").is_none());
    }
}
