//! Structured logging.
//!
//! # Design Decisions
//! - tracing for structured events; the env filter wins over the config
//!   level so `RUST_LOG` works in development
//! - JSON lines for production, pretty format otherwise

use tracing_subscriber::EnvFilter;

use crate::config::schema::LoggingConfig;

/// Initialize the global subscriber. Call once at startup.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
