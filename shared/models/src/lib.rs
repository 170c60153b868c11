//! Shared data model for the loreweave query engine.
//!
//! Everything that crosses a component boundary lives here: queries,
//! the character aggregate, the two corpora, routing decisions, entity
//! search results, assembled context, and the streamed event types.

pub mod character;
pub mod context;
pub mod entity;
pub mod error;
pub mod events;
pub mod query;
pub mod routing;
pub mod rulebook;
pub mod session;
pub mod tokens;

pub use character::{
    AbilityScores, ActionEconomy, BackgroundInfo, Backstory, Character, CharacterBase,
    CombatStats, FeaturesAndTraits, Inventory, InventoryItem, NamedEntry, PassiveScoresAndSenses,
    PersonalityTraits, ProficienciesAndModifiers, Spell, SpellList, SpellcastingInfo,
};
pub use context::{AssembledContext, CharacterSlice, ToolQueryInput};
pub use entity::{Entity, EntityMatch, EntitySearchResult, MatchStrategy};
pub use error::{ModelError, ModelResult};
pub use events::{
    ContextSourcesMetadata, EntitiesMetadata, PerformanceMetrics, QueryEvent, RoutingMetadata,
    StageTimings, TokenCounts,
};
pub use query::{HistoryTurn, Query, MAX_HISTORY_TURNS};
pub use routing::{
    CharacterIntention, DecisionSource, Intention, RoutingDecision, RulebookIntention,
    SessionIntention, Tool, ToolNeed, MAX_INTENTIONS_PER_TOOL,
};
pub use rulebook::{RuleCategory, RulebookCorpus, RulebookHit, Section, SectionId, SectionLevel};
pub use session::{SessionCorpus, SessionNote, SessionSearchResult, SessionSnippet};
pub use tokens::estimate_tokens;
