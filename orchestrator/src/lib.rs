//! The central orchestrator: drives the full query pipeline from intake
//! to streamed answer.
//!
//! One [`engine::QueryEngine`] owns every store, provider handle, the
//! local router, and the per-process caches. `process_query_stream`
//! walks the state machine — local routing, LLM routing, entity
//! resolution, parallel retrieval, context assembly, final streaming —
//! and yields tagged events in a fixed order.

pub mod assemble;
pub mod engine;
pub mod errors;
pub mod parse;
pub mod plan;
pub mod providers;
pub mod stores;

pub use engine::QueryEngine;
pub use errors::{EngineError, EngineResult};
