//! JSON projections of the control plane entities.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::manager::{Instance, Scope};
use crate::options::Options;
use crate::plugins::Plugin;
use crate::registry::{PluginInfo, RuleInfo};
use crate::rules::Rule;

#[derive(Serialize)]
pub struct ServerInfo {
    pub hostname: String,
    pub version: &'static str,
    pub platform: &'static str,
    pub links: BTreeMap<&'static str, &'static str>,
}

impl ServerInfo {
    pub fn current() -> Self {
        let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_owned());
        let links = BTreeMap::from([
            ("catalog", "/catalog"),
            ("plugins", "/plugins"),
            ("scopes", "/scopes"),
            ("instances", "/instances"),
        ]);
        Self {
            hostname,
            version: env!("CARGO_PKG_VERSION"),
            platform: std::env::consts::OS,
            links,
        }
    }
}

#[derive(Serialize)]
pub struct Catalog {
    pub rules: Vec<RuleInfo>,
    pub plugins: Vec<PluginInfo>,
}

#[derive(Serialize)]
pub struct PluginEntity {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Options::is_empty")]
    pub config: Options,
    #[serde(skip_serializing_if = "Options::is_empty")]
    pub metadata: Options,
}

impl From<&Plugin> for PluginEntity {
    fn from(plugin: &Plugin) -> Self {
        Self {
            id: plugin.id().to_owned(),
            name: plugin.name().to_owned(),
            description: plugin.description().to_owned(),
            config: plugin.options().clone(),
            metadata: plugin.metadata().clone(),
        }
    }
}

#[derive(Serialize)]
pub struct RuleEntity {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Options::is_empty")]
    pub config: Options,
}

impl From<&Rule> for RuleEntity {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id().to_owned(),
            name: rule.name().to_owned(),
            description: rule.description().to_owned(),
            config: rule.options().clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ScopeEntity {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub rules: Vec<RuleEntity>,
    pub plugins: Vec<PluginEntity>,
}

impl From<&Scope> for ScopeEntity {
    fn from(scope: &Scope) -> Self {
        Self {
            id: scope.id().to_owned(),
            name: scope.name().to_owned(),
            description: scope.description().to_owned(),
            rules: scope.rules().all().iter().map(|r| r.as_ref().into()).collect(),
            plugins: scope
                .plugins()
                .all()
                .iter()
                .map(|p| p.as_ref().into())
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct InstanceEntity {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Options::is_empty")]
    pub metadata: Options,
    pub scopes: Vec<ScopeEntity>,
}

impl From<&Instance> for InstanceEntity {
    fn from(instance: &Instance) -> Self {
        Self {
            id: instance.id().to_owned(),
            name: instance.name().to_owned(),
            description: instance.description().to_owned(),
            metadata: instance.metadata(),
            scopes: instance
                .scopes()
                .iter()
                .map(|s| s.as_ref().into())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::transform_fn;

    #[test]
    fn plugin_entity_omits_empty_fields() {
        let plugin = Plugin::new("auth", "", transform_fn(|next| next));
        let rendered = serde_json::to_value(PluginEntity::from(&plugin)).unwrap();
        assert_eq!(rendered["name"], "auth");
        assert!(rendered.get("description").is_none());
        assert!(rendered.get("config").is_none());
    }

    #[test]
    fn scope_entity_includes_nested_pools() {
        let scope = Scope::new("s", "");
        scope.use_plugin(Plugin::new("p", "", transform_fn(|next| next)));
        let rendered = serde_json::to_value(ScopeEntity::from(&scope)).unwrap();
        assert_eq!(rendered["rules"].as_array().unwrap().len(), 0);
        assert_eq!(rendered["plugins"][0]["name"], "p");
    }
}
