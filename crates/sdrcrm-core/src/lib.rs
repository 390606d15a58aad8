//! Core types and utilities for the SDR sales CRM client

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, LoggingConfig};
pub use error::{Error, Result};
pub use types::{Deal, DealStage, EntityId, LeadStage, Page, StageStats};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over the configured level. Calling this twice
/// is harmless; the second subscriber is ignored.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if config.format == "json" {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_ok() {
        tracing::debug!(level = %config.level, format = %config.format, "logging initialized");
    }
}
