//! Tracing setup for the loreweave engine.
//!
//! One environment-driven subscriber installed by whoever owns the
//! process (the CLI driver here, the real transport in deployment).

pub mod init;

pub use init::{init_tracing, TracingConfig};

// Re-export tracing for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Instrument, Level};
