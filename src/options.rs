//! Polymorphic option bags for rules and plugins.
//!
//! # Responsibilities
//! - String-keyed storage of JSON-shaped values
//! - Typed read accessors for validation and factories
//!
//! # Design Decisions
//! - Accessors return `Option<T>`: `None` for both a missing key and a
//!   wrong-typed value; `exists` distinguishes the two, which is what the
//!   registry's param validation relies on
//! - Owned by the entity it configures and treated as immutable after
//!   construction; `set` exists for building and for applying declared
//!   defaults during validation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Immutable-by-convention key/value option bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    /// Create an empty option bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the key is present, regardless of its type.
    pub fn exists(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value, or `None` when absent or not a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Boolean value, or `None` when absent or not a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Integer value, or `None` when absent or not an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    /// Float value, or `None` when absent or not representable as f64.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Insert a field. Used while building and when applying defaults.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
