//! Concurrency-safe rule pool with AND matching.
//!
//! # Design Decisions
//! - One reader/writer lock per pool; matching snapshots the pool and
//!   releases the lock before evaluating predicates
//! - An empty pool matches everything (vacuous AND), which is what makes
//!   a scope with no rules apply globally
//! - Removal of an absent id returns false rather than erroring

use std::sync::Arc;

use parking_lot::RwLock;

use super::rule::Rule;
use crate::layer::Request;

/// Ordered collection of rules combined with AND semantics.
#[derive(Default)]
pub struct RuleLayer {
    pool: RwLock<Vec<Arc<Rule>>>,
}

impl RuleLayer {
    /// Create an empty rule layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the pool.
    pub fn use_rule(&self, rule: Rule) -> Arc<Rule> {
        let rule = Arc::new(rule);
        self.pool.write().push(rule.clone());
        rule
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.pool.read().len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.pool.read().is_empty()
    }

    /// Remove the first rule with the given id. Returns false when the id
    /// is absent.
    pub fn remove(&self, id: &str) -> bool {
        let mut pool = self.pool.write();
        match pool.iter().position(|r| r.id() == id) {
            Some(index) => {
                pool.remove(index);
                true
            }
            None => false,
        }
    }

    /// Find a rule by id or name.
    pub fn get(&self, id_or_name: &str) -> Option<Arc<Rule>> {
        self.pool
            .read()
            .iter()
            .find(|r| r.id() == id_or_name || r.name() == id_or_name)
            .cloned()
    }

    /// Snapshot of the registered rules.
    pub fn all(&self) -> Vec<Arc<Rule>> {
        self.pool.read().clone()
    }

    /// Remove every rule.
    pub fn flush(&self) {
        self.pool.write().clear();
    }

    /// AND over the current pool. The lock is released before any
    /// predicate runs.
    pub fn matches(&self, req: &Request) -> bool {
        let snapshot = self.all();
        snapshot.iter().all(|rule| rule.matches(req))
    }
}
