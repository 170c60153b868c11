//! Rulebook corpus: a hierarchy of sections held in an id-indexed arena.
//!
//! Sections reference their parent and children by id, so traversal never
//! needs owned cycles. Substantive text is concentrated in leaf sections.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type SectionId = u32;

/// Depth of a section in the rulebook hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SectionLevel {
    Chapter,
    Section,
    Subsection,
    Leaf,
}

impl SectionLevel {
    pub fn from_depth(depth: u8) -> ModelResult<Self> {
        match depth {
            1 => Ok(SectionLevel::Chapter),
            2 => Ok(SectionLevel::Section),
            3 => Ok(SectionLevel::Subsection),
            4 => Ok(SectionLevel::Leaf),
            other => Err(ModelError::CorpusIntegrity(format!(
                "section level {other} outside 1..=4"
            ))),
        }
    }
}

/// The ten rulebook content categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    CharacterCreation,
    Combat,
    Spellcasting,
    Equipment,
    AbilitiesSkills,
    Conditions,
    Exploration,
    MonstersNpcs,
    GameMastering,
    OptionalRules,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 10] = [
        RuleCategory::CharacterCreation,
        RuleCategory::Combat,
        RuleCategory::Spellcasting,
        RuleCategory::Equipment,
        RuleCategory::AbilitiesSkills,
        RuleCategory::Conditions,
        RuleCategory::Exploration,
        RuleCategory::MonstersNpcs,
        RuleCategory::GameMastering,
        RuleCategory::OptionalRules,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::CharacterCreation => "character_creation",
            RuleCategory::Combat => "combat",
            RuleCategory::Spellcasting => "spellcasting",
            RuleCategory::Equipment => "equipment",
            RuleCategory::AbilitiesSkills => "abilities_skills",
            RuleCategory::Conditions => "conditions",
            RuleCategory::Exploration => "exploration",
            RuleCategory::MonstersNpcs => "monsters_npcs",
            RuleCategory::GameMastering => "game_mastering",
            RuleCategory::OptionalRules => "optional_rules",
        }
    }
}

/// A hierarchical text unit from the rulebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub level: SectionLevel,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<SectionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children_ids: Vec<SectionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<RuleCategory>,
    /// Precomputed embedding of title + content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector: Vec<f32>,
}

impl Section {
    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// A scored rulebook retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulebookHit {
    pub section_id: SectionId,
    pub title: String,
    pub level: SectionLevel,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<RuleCategory>,
    pub content: String,
}

/// The loaded rulebook, immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct RulebookCorpus {
    sections: HashMap<SectionId, Section>,
    /// Document order of section ids
    order: Vec<SectionId>,
    category_index: HashMap<RuleCategory, Vec<SectionId>>,
}

impl RulebookCorpus {
    /// Build the corpus and its category index, validating hierarchy
    /// invariants. Order of `sections` is document order.
    pub fn new(sections: Vec<Section>) -> ModelResult<Self> {
        let order: Vec<SectionId> = sections.iter().map(|s| s.id).collect();
        let mut by_id: HashMap<SectionId, Section> = HashMap::with_capacity(sections.len());

        for section in sections {
            if by_id.insert(section.id, section).is_some() {
                return Err(ModelError::CorpusIntegrity(
                    "duplicate section id".to_string(),
                ));
            }
        }

        // Parent/children consistency
        for section in by_id.values() {
            if let Some(parent_id) = section.parent_id {
                let parent = by_id.get(&parent_id).ok_or_else(|| {
                    ModelError::CorpusIntegrity(format!(
                        "section {} references missing parent {}",
                        section.id, parent_id
                    ))
                })?;
                if !parent.children_ids.contains(&section.id) {
                    return Err(ModelError::CorpusIntegrity(format!(
                        "section {} not listed among children of parent {}",
                        section.id, parent_id
                    )));
                }
            }
            for child_id in &section.children_ids {
                let child = by_id.get(child_id).ok_or_else(|| {
                    ModelError::CorpusIntegrity(format!(
                        "section {} references missing child {}",
                        section.id, child_id
                    ))
                })?;
                if child.parent_id != Some(section.id) {
                    return Err(ModelError::CorpusIntegrity(format!(
                        "child {} does not point back to parent {}",
                        child_id, section.id
                    )));
                }
            }
        }

        // Category index: every section id under every category it carries
        let mut category_index: HashMap<RuleCategory, Vec<SectionId>> = HashMap::new();
        for id in &order {
            let section = &by_id[id];
            for category in &section.categories {
                category_index.entry(*category).or_default().push(*id);
            }
        }

        Ok(Self {
            sections: by_id,
            order,
            category_index,
        })
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sections in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.order.iter().filter_map(|id| self.sections.get(id))
    }

    /// Section ids carrying the given category, in document order.
    pub fn sections_in_category(&self, category: RuleCategory) -> &[SectionId] {
        self.category_index
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Depth-first descendants of a section, in document order.
    pub fn descendants(&self, id: SectionId) -> Vec<SectionId> {
        let mut out = Vec::new();
        let mut stack: Vec<SectionId> = match self.get(id) {
            Some(section) => section.children_ids.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(section) = self.get(next) {
                stack.extend(section.children_ids.iter().rev().copied());
            }
        }
        out
    }

    /// Verify the category index lists exactly the sections carrying each
    /// category. Cheap enough to run at startup.
    pub fn verify_category_index(&self) -> ModelResult<()> {
        for category in RuleCategory::ALL {
            let indexed = self.sections_in_category(category);
            for id in indexed {
                let section = self.get(*id).ok_or_else(|| {
                    ModelError::CorpusIntegrity(format!("index lists missing section {id}"))
                })?;
                if !section.categories.contains(&category) {
                    return Err(ModelError::CorpusIntegrity(format!(
                        "section {id} indexed under {} it does not carry",
                        category.as_str()
                    )));
                }
            }
            let carrying = self
                .iter()
                .filter(|s| s.categories.contains(&category))
                .count();
            if carrying != indexed.len() {
                return Err(ModelError::CorpusIntegrity(format!(
                    "category {} index incomplete: {} indexed, {} carrying",
                    category.as_str(),
                    indexed.len(),
                    carrying
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: SectionId, level: SectionLevel, parent: Option<SectionId>) -> Section {
        Section {
            id,
            title: format!("Section {id}"),
            level,
            content: String::new(),
            parent_id: parent,
            children_ids: vec![],
            categories: vec![],
            vector: vec![],
        }
    }

    #[test]
    fn rejects_dangling_parent() {
        let s = section(1, SectionLevel::Section, Some(99));
        assert!(RulebookCorpus::new(vec![s]).is_err());
    }

    #[test]
    fn category_index_is_exact() {
        let mut chapter = section(1, SectionLevel::Chapter, None);
        chapter.children_ids = vec![2];
        chapter.categories = vec![RuleCategory::Combat];
        let mut leaf = section(2, SectionLevel::Leaf, Some(1));
        leaf.categories = vec![RuleCategory::Combat, RuleCategory::Conditions];
        leaf.content = "Grappling rules.".to_string();

        let corpus = RulebookCorpus::new(vec![chapter, leaf]).unwrap();
        corpus.verify_category_index().unwrap();

        assert_eq!(corpus.sections_in_category(RuleCategory::Combat), &[1, 2]);
        assert_eq!(corpus.sections_in_category(RuleCategory::Conditions), &[2]);
        assert!(corpus
            .sections_in_category(RuleCategory::Spellcasting)
            .is_empty());
    }

    #[test]
    fn descendants_follow_document_order() {
        let mut root = section(1, SectionLevel::Chapter, None);
        root.children_ids = vec![2, 4];
        let mut mid = section(2, SectionLevel::Section, Some(1));
        mid.children_ids = vec![3];
        let leaf_a = section(3, SectionLevel::Leaf, Some(2));
        let leaf_b = section(4, SectionLevel::Leaf, Some(1));

        let corpus = RulebookCorpus::new(vec![root, mid, leaf_a, leaf_b]).unwrap();
        assert_eq!(corpus.descendants(1), vec![2, 3, 4]);
    }
}
