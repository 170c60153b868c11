//! The final grounded-answer prompt.

use crate::Prompt;
use loreweave_models::{AssembledContext, HistoryTurn};
use std::fmt::Write;

/// Build the final-answer prompt from the assembled context. The model
/// streams its answer; it is told to ground statements in the provided
/// sources and to acknowledge gaps.
pub fn final_answer_prompt(
    context: &AssembledContext,
    query: &str,
    history: &[HistoryTurn],
    omitted_sources: &[&str],
) -> Prompt {
    let mut system = String::from(
        "You are a tabletop-RPG assistant answering for a specific character. \
         Ground every claim in the provided source material and reference the \
         sources when relevant (character sheet, session notes, rulebook). \
         Use stored values as written; never recompute statistics. If the \
         sources do not cover something, say so plainly.\n",
    );

    if !omitted_sources.is_empty() {
        writeln!(
            system,
            "\nNote: the following sources were unavailable for this answer: {}. \
             Answer from what remains and mention the gap if it matters.",
            omitted_sources.join(", ")
        )
        .ok();
    }

    let mut user = String::new();

    if !context.primary.is_empty() {
        writeln!(user, "# Primary source material\n{}\n", context.primary).ok();
    }
    if !context.supporting.is_empty() {
        writeln!(user, "# Supporting material\n{}\n", context.supporting).ok();
    }
    if !context.cross_refs.is_empty() {
        writeln!(
            user,
            "# Cross-referenced in multiple sources\n{}\n",
            context.cross_refs.join(", ")
        )
        .ok();
    }

    if !history.is_empty() {
        user.push_str("# Recent conversation\n");
        for turn in history {
            writeln!(user, "Q: {}\nA: {}", turn.query, turn.answer).ok();
        }
        user.push('\n');
    }

    write!(user, "# Question\n{query}").ok();

    Prompt { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_context_and_question() {
        let context = AssembledContext {
            primary: "armor_class: 19".to_string(),
            supporting: String::new(),
            character_slice: None,
            rules_slice: None,
            session_slice: None,
            cross_refs: vec![],
            confidence: 0.9,
        };
        let prompt = final_answer_prompt(&context, "What's my AC?", &[], &[]);
        assert!(prompt.user.contains("armor_class: 19"));
        assert!(prompt.user.ends_with("What's my AC?"));
    }

    #[test]
    fn omitted_sources_are_flagged() {
        let prompt = final_answer_prompt(
            &AssembledContext::default(),
            "What happened?",
            &[],
            &["session_notes"],
        );
        assert!(prompt.system.contains("unavailable"));
        assert!(prompt.system.contains("session_notes"));
    }

    #[test]
    fn history_is_rendered_in_order() {
        let history = vec![
            HistoryTurn {
                query: "first".to_string(),
                answer: "one".to_string(),
            },
            HistoryTurn {
                query: "second".to_string(),
                answer: "two".to_string(),
            },
        ];
        let prompt = final_answer_prompt(&AssembledContext::default(), "third?", &history, &[]);
        let first = prompt.user.find("first").unwrap();
        let second = prompt.user.find("second").unwrap();
        assert!(first < second);
    }
}
