//! Catalog of installable rule and plugin kinds.
//!
//! # Responsibilities
//! - Hold descriptors for every rule and plugin kind the runtime can build.
//! - Validate caller-supplied option bags against a descriptor's parameter
//!   schema before handing them to the factory.
//! - Build configured [`Rule`] and [`Plugin`] instances on demand.
//!
//! # Design Decisions
//! - Descriptors are cloneable and serializable so the admin catalog can be
//!   rendered straight from the pools; factories and validators are skipped
//!   during serialization.
//! - Validation mutates the option bag in place: defaults are applied first,
//!   then mandatory and type checks run against the completed bag.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::layer::Transform;
use crate::mux::{MatchError, Matcher};
use crate::options::Options;
use crate::plugins::Plugin;
use crate::rules::Rule;

/// Errors raised while resolving descriptors or building instances.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("rule does not exist: {0}")]
    RuleNotFound(String),
    #[error("plugin does not exist: {0}")]
    PluginNotFound(String),
    #[error("missing required param: {0}")]
    MissingParam(String),
    #[error("invalid type for param: {0}")]
    InvalidType(String),
    #[error("invalid value for param {param}: {reason}")]
    InvalidValue { param: String, reason: String },
    #[error("invalid pattern: {0}")]
    Pattern(#[from] MatchError),
}

/// Expected JSON shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Bool,
    Int,
    Float,
}

impl ParamKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Bool => value.is_boolean(),
            ParamKind::Int => value.as_i64().is_some(),
            ParamKind::Float => value.as_f64().is_some(),
        }
    }
}

/// Extra per-field check run after the structural checks pass.
pub type Validator = Arc<dyn Fn(&Value, &Options) -> Result<(), String> + Send + Sync>;

/// One parameter accepted by a rule or plugin kind.
#[derive(Clone, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub mandatory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(skip)]
    pub validator: Option<Validator>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            mandatory: false,
            default: None,
            examples: Vec::new(),
            validator: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Options) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }
}

/// Parameter schema of a rule or plugin kind.
pub type Params = Vec<Field>;

/// Factory producing a configured matcher from a validated option bag.
pub type RuleFactory = Arc<dyn Fn(&Options) -> Result<Matcher, RegistryError> + Send + Sync>;

/// Factory producing a configured transform from a validated option bag.
pub type PluginFactory = Arc<dyn Fn(&Options) -> Result<Transform, RegistryError> + Send + Sync>;

/// Descriptor for an installable rule kind.
#[derive(Clone, Serialize)]
pub struct RuleInfo {
    pub name: String,
    pub description: String,
    pub params: Params,
    #[serde(skip)]
    pub factory: RuleFactory,
}

/// Descriptor for an installable plugin kind.
#[derive(Clone, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
    pub params: Params,
    #[serde(skip)]
    pub factory: PluginFactory,
}

/// Validate and complete an option bag against a parameter schema.
///
/// Defaults are written into the bag before the mandatory check, so an
/// optional field with a default never trips it. Unknown keys pass through
/// untouched.
pub fn validate(params: &Params, opts: &mut Options) -> Result<(), RegistryError> {
    for field in params {
        if !opts.exists(&field.name) {
            if let Some(default) = &field.default {
                opts.set(&field.name, default.clone());
            }
        }
        if field.mandatory && !opts.exists(&field.name) {
            return Err(RegistryError::MissingParam(field.name.clone()));
        }
    }

    for field in params {
        let value = match opts.get(&field.name) {
            Some(value) => value.clone(),
            None => continue,
        };
        if !field.kind.accepts(&value) {
            return Err(RegistryError::InvalidType(field.name.clone()));
        }
        if let Some(validator) = &field.validator {
            validator(&value, opts).map_err(|reason| RegistryError::InvalidValue {
                param: field.name.clone(),
                reason,
            })?;
        }
    }

    Ok(())
}

/// Runtime catalog of rule and plugin descriptors.
#[derive(Default)]
pub struct Registry {
    rules: RwLock<HashMap<String, RuleInfo>>,
    plugins: RwLock<HashMap<String, PluginInfo>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in rule and plugin kinds.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        crate::rules::builtin::register(&registry);
        crate::plugins::builtin::register(&registry);
        registry
    }

    /// Install or replace a rule descriptor, keyed by its name.
    pub fn register_rule(&self, info: RuleInfo) {
        self.rules.write().insert(info.name.clone(), info);
    }

    /// Install or replace a plugin descriptor, keyed by its name.
    pub fn register_plugin(&self, info: PluginInfo) {
        self.plugins.write().insert(info.name.clone(), info);
    }

    /// Look up a rule descriptor by name.
    pub fn rule(&self, name: &str) -> Option<RuleInfo> {
        self.rules.read().get(name).cloned()
    }

    /// Look up a plugin descriptor by name.
    pub fn plugin(&self, name: &str) -> Option<PluginInfo> {
        self.plugins.read().get(name).cloned()
    }

    /// All rule descriptors, sorted by name.
    pub fn rules(&self) -> Vec<RuleInfo> {
        let mut all: Vec<_> = self.rules.read().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// All plugin descriptors, sorted by name.
    pub fn plugins(&self) -> Vec<PluginInfo> {
        let mut all: Vec<_> = self.plugins.read().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Build a configured rule from a registered kind.
    pub fn build_rule(&self, name: &str, mut opts: Options) -> Result<Rule, RegistryError> {
        let info = self
            .rule(name)
            .ok_or_else(|| RegistryError::RuleNotFound(name.to_owned()))?;
        validate(&info.params, &mut opts)?;
        let matcher = (info.factory)(&opts)?;
        Ok(Rule::with_options(&info.name, &info.description, opts, matcher))
    }

    /// Build a configured plugin from a registered kind.
    pub fn build_plugin(&self, name: &str, mut opts: Options) -> Result<Plugin, RegistryError> {
        let info = self
            .plugin(name)
            .ok_or_else(|| RegistryError::PluginNotFound(name.to_owned()))?;
        validate(&info.params, &mut opts)?;
        let transform = (info.factory)(&opts)?;
        Ok(Plugin::with_options(
            &info.name,
            &info.description,
            opts,
            transform,
        ))
    }
}
