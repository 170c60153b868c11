//! Tracing initialization.
//!
//! The engine runs as a single process, so there is exactly one knob per
//! caller: the service name stamped on the startup line. Everything else
//! (level filter, output format) comes from the environment, which keeps
//! the CLI driver and test harnesses on identical wiring.

use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Subscriber settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Name stamped on the startup log line
    pub service_name: String,
    /// "json" for machine consumption, anything else renders pretty.
    /// Read from `LOG_FORMAT`.
    pub format: String,
    /// Fallback filter when `RUST_LOG` is unset
    pub level: String,
}

impl TracingConfig {
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

/// Install the global subscriber. Called once at process start; the
/// engine crates themselves only emit through the `tracing` macros.
pub fn init_tracing(config: TracingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }

    tracing::info!(
        service = %config.service_name,
        format = %config.format,
        "Tracing initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_service_stamps_the_name() {
        let config = TracingConfig::for_service("loreweave-test");
        assert_eq!(config.service_name, "loreweave-test");
        assert!(!config.format.is_empty());
        assert!(!config.level.is_empty());
    }
}
