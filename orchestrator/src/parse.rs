//! Parsing the routing LLM's plain-text replies.
//!
//! The LLM interface has no JSON mode; replies are parsed leniently
//! (direct, fenced block, or brace-delimited substring) and the engine
//! gets one repair attempt before falling back.

use loreweave_models::{Entity, Intention, Tool, ToolNeed};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No JSON object found in reply")]
    NoJson,

    #[error("Reply JSON missing field: {0}")]
    MissingField(&'static str),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown intention '{intention}' for tool '{tool}'")]
    UnknownIntention { tool: String, intention: String },

    #[error("Tool {tool} has {count} intentions (max {max})")]
    TooManyIntentions {
        tool: String,
        count: usize,
        max: usize,
    },
}

/// Pull a JSON object out of free-form LLM text.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }

    // Fenced block
    if let Some(start) = text.find("```") {
        let inner = &text[start + 3..];
        let inner = inner.strip_prefix("json").unwrap_or(inner);
        if let Some(end) = inner.find("```") {
            if let Ok(value) = serde_json::from_str::<Value>(inner[..end].trim()) {
                return Some(value);
            }
        }
    }

    // Outermost braces
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&text[start..=end]).ok()
}

/// Parse the tool-selector reply into tool needs. Repeated tools merge
/// their intentions; more than `max_intentions` per tool is a validation
/// error surfaced during parse.
pub fn parse_selector(text: &str, max_intentions: usize) -> Result<Vec<ToolNeed>, ParseError> {
    let value = extract_json(text).ok_or(ParseError::NoJson)?;
    let entries = value
        .get("tools_needed")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingField("tools_needed"))?;

    let mut needs: Vec<ToolNeed> = Vec::new();

    for entry in entries {
        let tool_name = entry
            .get("tool")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingField("tool"))?;
        let tool = Tool::from_str(tool_name)
            .ok_or_else(|| ParseError::UnknownTool(tool_name.to_string()))?;

        let intention_name = entry
            .get("intention")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingField("intention"))?;
        let intention =
            Intention::parse(tool, intention_name).map_err(|_| ParseError::UnknownIntention {
                tool: tool_name.to_string(),
                intention: intention_name.to_string(),
            })?;

        let confidence = entry
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.5) as f32;
        let confidence = confidence.clamp(0.0, 1.0);

        if let Some(existing) = needs.iter_mut().find(|n| n.tool == tool) {
            if !existing.intentions.contains(&intention) {
                existing.intentions.push(intention);
            }
            existing.confidence = existing.confidence.max(confidence);
            if existing.intentions.len() > max_intentions {
                return Err(ParseError::TooManyIntentions {
                    tool: tool_name.to_string(),
                    count: existing.intentions.len(),
                    max: max_intentions,
                });
            }
        } else {
            needs.push(ToolNeed {
                tool,
                intentions: vec![intention],
                confidence,
            });
        }
    }

    Ok(needs)
}

/// Parse the entity-extractor reply. Malformed entries are skipped, not
/// fatal; an empty list is a valid answer.
pub fn parse_entities(text: &str) -> Result<Vec<Entity>, ParseError> {
    let value = extract_json(text).ok_or(ParseError::NoJson)?;
    let entries = value
        .get("entities")
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingField("entities"))?;

    let mut entities = Vec::new();
    for entry in entries {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            warn!("Skipping entity without name");
            continue;
        };
        if name.trim().is_empty() {
            continue;
        }
        let confidence = entry
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.5) as f32;
        entities.push(Entity {
            name: name.trim().to_string(),
            confidence: confidence.clamp(0.0, 1.0),
        });
    }

    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_selector_json() {
        let needs = parse_selector(
            r#"{"tools_needed": [{"tool": "character_data", "intention": "combat_info", "confidence": 0.92}]}"#,
            2,
        )
        .unwrap();
        assert_eq!(needs.len(), 1);
        assert_eq!(needs[0].tool, Tool::CharacterData);
        assert_eq!(needs[0].intentions[0].as_str(), "combat_info");
    }

    #[test]
    fn extracts_json_from_prose_and_fences() {
        let fenced = "Sure!\n```json\n{\"entities\": []}\n```";
        assert!(extract_json(fenced).is_some());

        let prose = "Here you go: {\"entities\": [{\"name\": \"Elara\", \"confidence\": 1.0}]} hope that helps";
        let entities = parse_entities(prose).unwrap();
        assert_eq!(entities[0].name, "Elara");
    }

    #[test]
    fn repeated_tool_merges_intentions() {
        let needs = parse_selector(
            r#"{"tools_needed": [
                {"tool": "character_data", "intention": "combat_info", "confidence": 0.9},
                {"tool": "character_data", "intention": "abilities_info", "confidence": 0.8}
            ]}"#,
            2,
        )
        .unwrap();
        assert_eq!(needs.len(), 1);
        assert_eq!(needs[0].intentions.len(), 2);
    }

    #[test]
    fn third_intention_is_a_validation_error() {
        let err = parse_selector(
            r#"{"tools_needed": [
                {"tool": "character_data", "intention": "combat_info"},
                {"tool": "character_data", "intention": "abilities_info"},
                {"tool": "character_data", "intention": "magic_info"}
            ]}"#,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::TooManyIntentions { count: 3, .. }));
    }

    #[test]
    fn unknown_intention_is_an_error() {
        let err = parse_selector(
            r#"{"tools_needed": [{"tool": "rulebook", "intention": "combat_info"}]}"#,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnknownIntention { .. }));
    }

    #[test]
    fn garbage_has_no_json() {
        assert!(matches!(
            parse_entities("I could not decide."),
            Err(ParseError::NoJson)
        ));
    }
}
