//! HTTP serving and upstream forwarding.
//!
//! # Responsibilities
//! - Front-door server wiring the engine behind an axum router
//! - Upstream forwarding with a shared hyper client
//!
//! # Data Flow
//! listener -> router fallback -> Engine -> (optionally) Forwarder -> upstream

mod forwarder;
mod server;

pub use forwarder::{ForwardError, Forwarder};
pub use server::{router, serve, ServerError, ServerOptions};
