//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value formats (bind addresses, forward URL, log level)
//! - Detect listener conflicts
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first

use thiserror::Error;

use crate::config::schema::StratumConfig;

/// A single semantic configuration problem.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid {section} bind address {addr:?}")]
    InvalidBindAddr { section: &'static str, addr: String },
    #[error("server and admin listeners both bind {addr}")]
    ListenerConflict { addr: String },
    #[error("invalid forward url {url:?}: {reason}")]
    InvalidForwardUrl { url: String, reason: String },
    #[error("invalid log level {level:?}: {reason}")]
    InvalidLogLevel { level: String, reason: String },
    #[error("server timeout must be greater than zero")]
    ZeroTimeout,
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &StratumConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let server_addr = bind_addr(&config.server.host, config.server.port);
    if server_addr.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddr {
            section: "server",
            addr: server_addr.clone(),
        });
    }

    let admin_addr = bind_addr(&config.admin.host, config.admin.port);
    if admin_addr.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddr {
            section: "admin",
            addr: admin_addr.clone(),
        });
    }

    if config.admin.enabled && server_addr == admin_addr {
        errors.push(ValidationError::ListenerConflict { addr: server_addr });
    }

    if config.server.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if !config.forward.url.is_empty() {
        if let Err(e) = url::Url::parse(&config.forward.url) {
            errors.push(ValidationError::InvalidForwardUrl {
                url: config.forward.url.clone(),
                reason: format!("{e}"),
            });
        }
    }

    if let Err(e) = config.logging.level.parse::<tracing_subscriber::EnvFilter>() {
        errors.push(ValidationError::InvalidLogLevel {
            level: config.logging.level.clone(),
            reason: format!("{e}"),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn bind_addr(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&StratumConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = StratumConfig::default();
        config.server.host = "not-an-ip".to_string();
        config.server.timeout_secs = 0;
        config.forward.url = "::bad::".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn rejects_listener_conflicts() {
        let mut config = StratumConfig::default();
        config.admin.host = config.server.host.clone();
        config.admin.port = config.server.port;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::ListenerConflict { .. }));
    }
}
