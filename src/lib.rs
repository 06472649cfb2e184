//! Extensible HTTP middleware proxy runtime.
//!
//! stratum is built around a phase/priority middleware layer: handlers and
//! transforms are registered into named phases ("request", "error", custom)
//! and folded around a terminal handler per request. On top of that core sit
//! composition primitives (mux, rules, plugins, scopes) and a control plane
//! (manager, instances, JSON admin API) for reconfiguring a running proxy.

// Pipeline core
pub mod engine;
pub mod layer;
pub mod mux;
pub mod options;

// Composition entities
pub mod plugins;
pub mod registry;
pub mod rules;

// Control plane
pub mod admin;
pub mod manager;

// Cross-cutting concerns
pub mod config;
pub mod http;
pub mod observability;

pub use engine::Engine;
pub use layer::{handler_fn, transform_fn, Handler, Layer, Middleware, Next, Priority};
pub use manager::Manager;
pub use mux::Mux;
pub use options::Options;
pub use registry::Registry;
