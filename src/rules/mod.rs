//! Matching rules and rule pools.
//!
//! # Responsibilities
//! - Define the [`Rule`] entity pairing an identity with a request predicate
//! - Manage rule pools with AND semantics across every registered rule
//! - Ship the built-in rule kinds (path, vhost, method)
//!
//! # Data Flow
//! Scope -> RuleLayer::matches -> each Rule::matches -> verdict

pub mod builtin;
mod layer;
mod rule;

pub use layer::RuleLayer;
pub use rule::Rule;
