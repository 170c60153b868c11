//! The intention registry: one source of truth mapping every intention to
//! its required/optional sections, entity-type hints, categories, and
//! retrieval strategy.
//!
//! The prompt manager and the three retrievers all read from here, so a
//! registry change propagates to prompts and retrieval without touching
//! their code. `verify()` checks the registry is complete at startup.

pub mod character;
pub mod rulebook;
pub mod session;

pub use character::{character_spec, CharacterIntentionSpec};
pub use rulebook::{rulebook_spec, RulebookIntentionSpec, RulebookStrategy};
pub use session::{session_spec, SessionIntentionSpec, SessionStrategy, TemporalPolicy};

use loreweave_models::character::SECTION_NAMES;
use loreweave_models::{
    CharacterIntention, ModelError, ModelResult, RulebookIntention, SessionIntention,
};

/// Verify every enum value has a complete registry entry. Run once at
/// startup; an inconsistency is a programmer error.
pub fn verify() -> ModelResult<()> {
    for intention in CharacterIntention::ALL {
        let spec = character_spec(*intention);
        if spec.description.is_empty() {
            return Err(ModelError::Validation(format!(
                "character intention {} has no description",
                intention.as_str()
            )));
        }
        if spec.required_sections.is_empty() {
            return Err(ModelError::Validation(format!(
                "character intention {} has no required sections",
                intention.as_str()
            )));
        }
        for section in spec
            .required_sections
            .iter()
            .chain(spec.optional_sections.iter())
        {
            if !SECTION_NAMES.contains(section) {
                return Err(ModelError::Validation(format!(
                    "character intention {} references unknown section {}",
                    intention.as_str(),
                    section
                )));
            }
        }
    }

    for intention in SessionIntention::ALL {
        let spec = session_spec(*intention);
        if spec.description.is_empty() {
            return Err(ModelError::Validation(format!(
                "session intention {} has no description",
                intention.as_str()
            )));
        }
    }

    for intention in RulebookIntention::ALL {
        let spec = rulebook_spec(*intention);
        if spec.description.is_empty() {
            return Err(ModelError::Validation(format!(
                "rulebook intention {} has no description",
                intention.as_str()
            )));
        }
        if spec.categories.is_empty() {
            return Err(ModelError::Validation(format!(
                "rulebook intention {} maps to no categories",
                intention.as_str()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_complete() {
        verify().unwrap();
    }

    #[test]
    fn every_character_intention_has_valid_sections() {
        for intention in CharacterIntention::ALL {
            let spec = character_spec(*intention);
            for section in spec.required_sections {
                assert!(
                    SECTION_NAMES.contains(section),
                    "{} names unknown section {}",
                    intention.as_str(),
                    section
                );
            }
        }
    }
}
