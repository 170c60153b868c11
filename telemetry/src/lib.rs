//! Telemetry and feedback: one durable record per query, user
//! corrections attached by query id, and idempotent export of training
//! rows for the local classifier's few-shot head.

pub mod export;
pub mod record;
pub mod store;

pub use export::TrainingRow;
pub use record::{QueryRecord, ToolCorrection};
pub use store::{FeedbackSink, JsonlFeedbackStore, StoreError, StoreResult};
