//! Unified entity resolution across the three retrieval sources.
//!
//! Every extracted entity is searched against only the tools the routing
//! decision selected, with three strategies per searchable field: exact,
//! substring, and fuzzy. Hits from every source are preserved; nothing
//! picks a "primary" location.

pub mod engine;
pub mod errors;
pub mod normalize;
pub mod sources;
pub mod strategies;

pub use engine::{section_to_tool, EntitySearchEngine};
pub use errors::{SearchError, SearchResult};
