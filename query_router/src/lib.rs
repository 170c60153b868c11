//! Local routing classifier: fastpath rules, a calibrated multi-label
//! classifier with two backends, an abstention gate, and a conversation
//! context detector.
//!
//! The router's job is to replace the two-LLM routing step on queries it
//! can answer safely. It abstains on trivial queries needing no
//! retrieval, short-circuits confident multi-label decisions, and
//! declines everything else back to LLM routing.

pub mod backends;
pub mod calibration;
pub mod context_detector;
pub mod embedder;
pub mod errors;
pub mod fastpath;
pub mod intent_head;
pub mod router;

pub use errors::{RouterError, RouterResult};
pub use fastpath::{FastpathHit, FastpathMatcher};
pub use router::{LocalRouteOutcome, LocalRouter};
