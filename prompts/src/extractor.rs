//! The entity extractor prompt.

use crate::Prompt;
use loreweave_models::CharacterIntention;
use loreweave_registry::character_spec;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Build the extractor prompt. The model must answer with JSON:
/// `{"entities": [{"name", "confidence"}]}` — names and confidences
/// only, no source tags or scoping.
pub fn entity_extractor_prompt(query: &str, context_snippets: &[(String, String)]) -> Prompt {
    // Entity categories: the fixed narrative kinds plus whatever the
    // registry's intention hints mention
    let mut categories: BTreeSet<&'static str> =
        BTreeSet::from(["npc", "location", "item", "spell", "rule term", "organization"]);
    for intention in CharacterIntention::ALL {
        for hint in character_spec(*intention).entity_hints {
            categories.insert(hint);
        }
    }

    let mut system = String::from(
        "Extract the proper nouns and game terms a tabletop-RPG assistant \
         should look up to answer the question.\n\nEntity categories: ",
    );
    let listed: Vec<&str> = categories.into_iter().collect();
    system.push_str(&listed.join(", "));
    system.push_str(
        ".\n\nRespond with JSON only, no prose:\n\
         {\"entities\": [{\"name\": \"...\", \"confidence\": 0.0}]}\n\
         Do not add source, type, or scope fields. Omit pronouns and \
         generic words. An empty list is valid.",
    );

    let mut user = String::new();
    if !context_snippets.is_empty() {
        user.push_str("Recent conversation:\n");
        for (prior_query, prior_answer) in context_snippets {
            writeln!(user, "Q: {prior_query}\nA: {prior_answer}").ok();
        }
        user.push('\n');
    }
    write!(user, "Question: {query}").ok();

    Prompt { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_flat_entities_only() {
        let prompt = entity_extractor_prompt("Who is Elara?", &[]);
        assert!(prompt.system.contains("\"entities\""));
        assert!(prompt.system.contains("Do not add source"));
    }

    #[test]
    fn registry_hints_feed_the_category_list() {
        let prompt = entity_extractor_prompt("What's in my pack?", &[]);
        // "weapon" comes from the combat_info / inventory_info hints
        assert!(prompt.system.contains("weapon"));
    }
}
