//! The resolver: fan each entity out across the selected tools only.

use crate::errors::{SearchError, SearchResult};
use crate::normalize::normalize;
use crate::sources;
use loreweave_models::{
    Character, Entity, EntityMatch, EntitySearchResult, RulebookCorpus, SessionCorpus, Tool,
};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use tracing::{debug, info};

/// Rulebook hits cached per normalized entity name.
const RULEBOOK_CACHE_CAP: usize = 100;

/// Map a section path back to the tool that owns it. Used by the
/// orchestrator to distribute auto-include sections.
pub fn section_to_tool(section_path: &str) -> Option<Tool> {
    let prefix = section_path.split('.').next()?;
    Tool::from_str(prefix)
}

/// Three-strategy entity resolver over the selected sources.
pub struct EntitySearchEngine {
    fuzzy_threshold: f32,
    rulebook_cache: Mutex<LruCache<String, Vec<EntityMatch>>>,
}

impl EntitySearchEngine {
    pub fn new(fuzzy_threshold: f32) -> Self {
        Self {
            fuzzy_threshold,
            rulebook_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(RULEBOOK_CACHE_CAP).unwrap(),
            )),
        }
    }

    /// Resolve every entity against exactly the sources in `selected_tools`.
    ///
    /// Entities with zero matches still appear in the result map with an
    /// empty match list. A selected tool whose storage handle is missing
    /// is a programmer error and fails the whole call.
    pub fn resolve(
        &self,
        entities: &[Entity],
        selected_tools: &[Tool],
        character: Option<&Character>,
        sessions: Option<&SessionCorpus>,
        rulebook: Option<&RulebookCorpus>,
    ) -> SearchResult<HashMap<String, EntitySearchResult>> {
        // Fail fast before any search runs
        for tool in selected_tools {
            let present = match tool {
                Tool::CharacterData => character.is_some(),
                Tool::SessionNotes => sessions.is_some(),
                Tool::Rulebook => rulebook.is_some(),
            };
            if !present {
                return Err(SearchError::MissingStorage(*tool));
            }
        }

        let mut results = HashMap::with_capacity(entities.len());

        for entity in entities {
            let entity_norm = normalize(&entity.name);
            let mut matches = Vec::new();

            for tool in selected_tools {
                match tool {
                    Tool::CharacterData => {
                        if let Some(character) = character {
                            matches.extend(sources::character::search(
                                &entity_norm,
                                character,
                                self.fuzzy_threshold,
                            ));
                        }
                    }
                    Tool::SessionNotes => {
                        if let Some(corpus) = sessions {
                            matches.extend(sources::session::search(
                                &entity_norm,
                                corpus,
                                self.fuzzy_threshold,
                            ));
                        }
                    }
                    Tool::Rulebook => {
                        if let Some(corpus) = rulebook {
                            matches.extend(self.search_rulebook_cached(&entity_norm, corpus));
                        }
                    }
                }
            }

            debug!(
                entity = %entity.name,
                hits = matches.len(),
                "🔎 Entity resolved"
            );

            results.insert(
                entity.name.clone(),
                EntitySearchResult {
                    entity_name: entity.name.clone(),
                    matches,
                },
            );
        }

        info!(
            entities = entities.len(),
            tools = selected_tools.len(),
            "🔎 Entity resolution complete"
        );

        Ok(results)
    }

    fn search_rulebook_cached(
        &self,
        entity_norm: &str,
        corpus: &RulebookCorpus,
    ) -> Vec<EntityMatch> {
        if let Some(cached) = self.rulebook_cache.lock().get(entity_norm) {
            return cached.clone();
        }

        let matches = sources::rulebook::search(entity_norm, corpus, self.fuzzy_threshold);
        self.rulebook_cache
            .lock()
            .put(entity_norm.to_string(), matches.clone());
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_models::character::sample;

    fn entity(name: &str) -> Entity {
        Entity {
            name: name.to_string(),
            confidence: 1.0,
        }
    }

    #[test]
    fn searches_only_selected_tools() {
        let engine = EntitySearchEngine::new(0.75);
        let character = sample::duskryn();
        let sessions = SessionCorpus::default();

        let results = engine
            .resolve(
                &[entity("Eldaryth of Regret")],
                &[Tool::SessionNotes],
                Some(&character),
                Some(&sessions),
                None,
            )
            .unwrap();

        // the sword lives on the character sheet, which was not selected
        assert!(results["Eldaryth of Regret"].matches.is_empty());
    }

    #[test]
    fn zero_match_entities_still_returned() {
        let engine = EntitySearchEngine::new(0.75);
        let character = sample::duskryn();

        let results = engine
            .resolve(
                &[entity("Nonexistent Thing")],
                &[Tool::CharacterData],
                Some(&character),
                None,
                None,
            )
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results["Nonexistent Thing"].matches.is_empty());
    }

    #[test]
    fn missing_storage_for_selected_tool_fails_fast() {
        let engine = EntitySearchEngine::new(0.75);
        let err = engine
            .resolve(&[entity("Elara")], &[Tool::Rulebook], None, None, None)
            .unwrap_err();
        assert!(matches!(err, SearchError::MissingStorage(Tool::Rulebook)));
    }

    #[test]
    fn section_to_tool_maps_prefixes() {
        assert_eq!(
            section_to_tool("character_data.inventory"),
            Some(Tool::CharacterData)
        );
        assert_eq!(section_to_tool("rulebook.42"), Some(Tool::Rulebook));
        assert_eq!(
            section_to_tool("session_notes.3.npcs"),
            Some(Tool::SessionNotes)
        );
        assert_eq!(section_to_tool("unknown.path"), None);
    }
}
