//! The tool-and-intention selector prompt.

use crate::Prompt;
use loreweave_models::{CharacterIntention, RulebookIntention, SessionIntention};
use loreweave_registry::{character_spec, rulebook_spec, session_spec};
use std::fmt::Write;

/// Build the selector prompt. The model must answer with JSON:
/// `{"tools_needed": [{"tool", "intention", "confidence"}]}`.
pub fn tool_selector_prompt(query: &str, context_snippets: &[(String, String)]) -> Prompt {
    let mut system = String::from(
        "You route questions for a tabletop-RPG assistant. Pick which knowledge \
         sources answer the question and with what intention.\n\n\
         Available tools and intentions:\n\n",
    );

    writeln!(system, "## character_data — the character sheet").ok();
    for intention in CharacterIntention::ALL {
        let spec = character_spec(*intention);
        writeln!(system, "- {}: {}", intention.as_str(), spec.description).ok();
    }

    writeln!(system, "\n## session_notes — the session history log").ok();
    for intention in SessionIntention::ALL {
        let spec = session_spec(*intention);
        writeln!(system, "- {}: {}", intention.as_str(), spec.description).ok();
    }

    writeln!(system, "\n## rulebook — the game rules reference").ok();
    for intention in RulebookIntention::ALL {
        let spec = rulebook_spec(*intention);
        writeln!(system, "- {}: {}", intention.as_str(), spec.description).ok();
    }

    system.push_str(
        "\nRespond with JSON only, no prose:\n\
         {\"tools_needed\": [{\"tool\": \"...\", \"intention\": \"...\", \"confidence\": 0.0}]}\n\
         Rules: at most one intention per tool; at most two tools unless the \
         question is clearly compound; confidence in [0,1].",
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
    fn every_registered_intention_appears() {
        let prompt = tool_selector_prompt("What's my AC?", &[]);
        for intention in CharacterIntention::ALL {
            assert!(prompt.system.contains(intention.as_str()));
        }
        for intention in SessionIntention::ALL {
            assert!(prompt.system.contains(intention.as_str()));
        }
        for intention in RulebookIntention::ALL {
            assert!(prompt.system.contains(intention.as_str()));
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let a = tool_selector_prompt("How does grappling work?", &[]);
        let b = tool_selector_prompt("How does grappling work?", &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn context_snippets_prefix_the_user_turn() {
        let snippets = vec![("Who is Elara?".to_string(), "A cleric.".to_string())];
        let prompt = tool_selector_prompt("What does she want?", &snippets);
        assert!(prompt.user.starts_with("Recent conversation:"));
        assert!(prompt.user.contains("Who is Elara?"));
        assert!(prompt.user.ends_with("Question: What does she want?"));
    }
}
