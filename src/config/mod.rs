//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     -> loader.rs (parse & deserialize)
//!     -> validation.rs (semantic checks)
//!     -> StratumConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; runtime changes go through the admin
//!   API instead
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::StratumConfig;
