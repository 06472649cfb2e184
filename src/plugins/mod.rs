//! Plugins and plugin pools.
//!
//! # Responsibilities
//! - Define the [`Plugin`] entity pairing an identity with a chain transform
//! - Manage plugin pools executed as nested chains in registration order
//! - Ship the built-in plugin kinds (forward, auth)
//!
//! # Data Flow
//! Scope/Manager -> PluginLayer::run -> nested Plugin transforms -> next

pub mod builtin;
mod layer;
mod plugin;

pub use layer::PluginLayer;
pub use plugin::Plugin;
