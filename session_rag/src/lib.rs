//! Session-notes retrieval: hybrid structured + embedding search over
//! the session log.
//!
//! Two primitives — table scans and embedding similarity — fused per
//! intention with structured hits ranked first, then temporal filters
//! applied. The caller supplies the query embedding so this crate stays
//! synchronous and CPU-only.

pub mod errors;
pub mod retriever;
pub mod semantic;
pub mod structured;

pub use errors::{SessionRagError, SessionRagResult};
pub use retriever::SessionRetriever;
