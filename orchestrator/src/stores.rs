//! External store contracts and corpus loading.
//!
//! The character store is a live lookup; the session and rulebook
//! corpora are loaded once at startup into the in-memory structures and
//! are immutable for the process lifetime.

use crate::providers::{ProviderError, ProviderResult};
use async_trait::async_trait;
use loreweave_models::{Character, ModelResult, RulebookCorpus, Section, SessionCorpus, SessionNote};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Lookup of characters by name.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// `Ok(None)` means the character does not exist; errors are
    /// infrastructure failures.
    async fn load_character(&self, name: &str) -> ProviderResult<Option<Character>>;
}

/// Character store backed by a preloaded map. Lookups are
/// case-insensitive on the character name.
pub struct InMemoryCharacterStore {
    characters: HashMap<String, Character>,
}

impl InMemoryCharacterStore {
    pub fn new(characters: Vec<Character>) -> Self {
        let characters = characters
            .into_iter()
            .map(|c| (c.character_base.name.to_lowercase(), c))
            .collect();
        Self { characters }
    }

    /// Load every `.json` character file in a directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> ProviderResult<Self> {
        let mut characters = Vec::new();
        let entries = std::fs::read_dir(dir.as_ref())
            .map_err(|e| ProviderError::Http(format!("character dir: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| ProviderError::Http(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| ProviderError::Http(format!("{}: {e}", path.display())))?;
            let character: Character = serde_json::from_str(&raw)
                .map_err(|e| ProviderError::Malformed(format!("{}: {e}", path.display())))?;
            characters.push(character);
        }
        info!("✓ Loaded {} characters", characters.len());
        Ok(Self::new(characters))
    }
}

#[async_trait]
impl CharacterStore for InMemoryCharacterStore {
    async fn load_character(&self, name: &str) -> ProviderResult<Option<Character>> {
        Ok(self.characters.get(&name.to_lowercase()).cloned())
    }
}

/// Load the session corpus from a YAML file (a list of session notes).
pub fn load_sessions(path: impl AsRef<Path>) -> ModelResult<SessionCorpus> {
    let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        loreweave_models::ModelError::Validation(format!(
            "reading {}: {e}",
            path.as_ref().display()
        ))
    })?;
    let notes: Vec<SessionNote> = serde_yaml::from_str(&raw).map_err(|e| {
        loreweave_models::ModelError::Validation(format!(
            "parsing {}: {e}",
            path.as_ref().display()
        ))
    })?;
    let corpus = SessionCorpus::new(notes)?;
    info!("✓ Loaded {} session notes", corpus.len());
    Ok(corpus)
}

/// Load the rulebook corpus from a YAML file (a list of sections in
/// document order) and verify its integrity.
pub fn load_rulebook(path: impl AsRef<Path>) -> ModelResult<RulebookCorpus> {
    let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        loreweave_models::ModelError::Validation(format!(
            "reading {}: {e}",
            path.as_ref().display()
        ))
    })?;
    let sections: Vec<Section> = serde_yaml::from_str(&raw).map_err(|e| {
        loreweave_models::ModelError::Validation(format!(
            "parsing {}: {e}",
            path.as_ref().display()
        ))
    })?;
    let corpus = RulebookCorpus::new(sections)?;
    corpus.verify_category_index()?;
    info!("✓ Loaded rulebook with {} sections", corpus.len());
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::character::sample;

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let store = InMemoryCharacterStore::new(vec![sample::duskryn()]);
        assert!(store
            .load_character("duskryn nightwarden")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .load_character("Duskryn Nightwarden")
            .await
            .unwrap()
            .is_some());
        assert!(store.load_character("nobody").await.unwrap().is_none());
    }
}
