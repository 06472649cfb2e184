//! Admin REST handlers.
//!
//! Every nested variant resolves its path segments through the shared
//! resolution helpers and delegates to the pool-generic create/list/delete
//! logic, so global and instance-scoped routes behave identically.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::admin::context::{
    parse_body, resolve_instance, resolve_plugin, resolve_rule, resolve_scope, ApiError,
};
use crate::admin::entities::{
    Catalog, InstanceEntity, PluginEntity, RuleEntity, ScopeEntity, ServerInfo,
};
use crate::manager::{Instance, Manager, Scope};
use crate::plugins::PluginLayer;

#[derive(Deserialize)]
struct CreateEntity {
    #[serde(default)]
    name: String,
    #[serde(default)]
    config: crate::options::Options,
}

#[derive(Deserialize)]
struct CreateScope {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

pub async fn index() -> Json<ServerInfo> {
    Json(ServerInfo::current())
}

pub async fn catalog(State(manager): State<Arc<Manager>>) -> Json<Catalog> {
    let registry = manager.registry();
    Json(Catalog {
        rules: registry.rules(),
        plugins: registry.plugins(),
    })
}

// Global plugins.

pub async fn list_plugins(State(manager): State<Arc<Manager>>) -> Json<Vec<PluginEntity>> {
    Json(plugin_entities(manager.plugins()))
}

pub async fn create_plugin(
    State(manager): State<Arc<Manager>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PluginEntity>, ApiError> {
    create_plugin_in(&manager, manager.plugins(), &headers, &body)
}

pub async fn get_plugin(
    State(manager): State<Arc<Manager>>,
    Path(plugin): Path<String>,
) -> Result<Json<PluginEntity>, ApiError> {
    let plugin = resolve_plugin(manager.plugins(), &plugin)?;
    Ok(Json(plugin.as_ref().into()))
}

pub async fn delete_plugin(
    State(manager): State<Arc<Manager>>,
    Path(plugin): Path<String>,
) -> Result<StatusCode, ApiError> {
    delete_plugin_in(manager.plugins(), &plugin)
}

// Global scopes.

pub async fn list_scopes(State(manager): State<Arc<Manager>>) -> Json<Vec<ScopeEntity>> {
    Json(manager.scopes().iter().map(|s| s.as_ref().into()).collect())
}

pub async fn create_scope(
    State(manager): State<Arc<Manager>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ScopeEntity>, ApiError> {
    let data: CreateScope = parse_body(&headers, &body)?;
    if data.name.is_empty() {
        return Err(ApiError::bad_request("Missing required param: name"));
    }
    let scope = manager.use_scope(Scope::new(data.name, data.description));
    metrics::counter!("stratum_admin_mutations_total").increment(1);
    Ok(Json(scope.as_ref().into()))
}

pub async fn get_scope(
    State(manager): State<Arc<Manager>>,
    Path(scope): Path<String>,
) -> Result<Json<ScopeEntity>, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    Ok(Json(scope.as_ref().into()))
}

pub async fn delete_scope(
    State(manager): State<Arc<Manager>>,
    Path(scope): Path<String>,
) -> Result<StatusCode, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    if manager.remove_scope(scope.id()) {
        metrics::counter!("stratum_admin_mutations_total").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::internal("Cannot remove scope"))
    }
}

// Plugins nested under a global scope.

pub async fn list_scope_plugins(
    State(manager): State<Arc<Manager>>,
    Path(scope): Path<String>,
) -> Result<Json<Vec<PluginEntity>>, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    Ok(Json(plugin_entities(scope.plugins())))
}

pub async fn create_scope_plugin(
    State(manager): State<Arc<Manager>>,
    Path(scope): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PluginEntity>, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    create_plugin_in(&manager, scope.plugins(), &headers, &body)
}

pub async fn get_scope_plugin(
    State(manager): State<Arc<Manager>>,
    Path((scope, plugin)): Path<(String, String)>,
) -> Result<Json<PluginEntity>, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    let plugin = resolve_plugin(scope.plugins(), &plugin)?;
    Ok(Json(plugin.as_ref().into()))
}

pub async fn delete_scope_plugin(
    State(manager): State<Arc<Manager>>,
    Path((scope, plugin)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    delete_plugin_in(scope.plugins(), &plugin)
}

// Rules nested under a global scope.

pub async fn list_scope_rules(
    State(manager): State<Arc<Manager>>,
    Path(scope): Path<String>,
) -> Result<Json<Vec<RuleEntity>>, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    Ok(Json(rule_entities(&scope)))
}

pub async fn create_scope_rule(
    State(manager): State<Arc<Manager>>,
    Path(scope): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RuleEntity>, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    create_rule_in(&manager, &scope, &headers, &body)
}

pub async fn get_scope_rule(
    State(manager): State<Arc<Manager>>,
    Path((scope, rule)): Path<(String, String)>,
) -> Result<Json<RuleEntity>, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    let rule = resolve_rule(&scope, &rule)?;
    Ok(Json(rule.as_ref().into()))
}

pub async fn delete_scope_rule(
    State(manager): State<Arc<Manager>>,
    Path((scope, rule)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let scope = resolve_scope(&manager, None, &scope)?;
    delete_rule_in(&scope, &rule)
}

// Instances.

pub async fn list_instances(State(manager): State<Arc<Manager>>) -> Json<Vec<InstanceEntity>> {
    Json(
        manager
            .instances()
            .iter()
            .map(|i| i.as_ref().into())
            .collect(),
    )
}

pub async fn get_instance(
    State(manager): State<Arc<Manager>>,
    Path(instance): Path<String>,
) -> Result<Json<InstanceEntity>, ApiError> {
    let instance = resolve_instance(&manager, &instance)?;
    Ok(Json(instance.as_ref().into()))
}

pub async fn delete_instance(
    State(manager): State<Arc<Manager>>,
    Path(instance): Path<String>,
) -> Result<StatusCode, ApiError> {
    let instance = resolve_instance(&manager, &instance)?;
    if manager.remove_instance(instance.id()) {
        metrics::counter!("stratum_admin_mutations_total").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::internal("Cannot remove instance"))
    }
}

// Scopes nested under an instance.

pub async fn list_instance_scopes(
    State(manager): State<Arc<Manager>>,
    Path(instance): Path<String>,
) -> Result<Json<Vec<ScopeEntity>>, ApiError> {
    let instance = resolve_instance(&manager, &instance)?;
    Ok(Json(
        instance.scopes().iter().map(|s| s.as_ref().into()).collect(),
    ))
}

pub async fn create_instance_scope(
    State(manager): State<Arc<Manager>>,
    Path(instance): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ScopeEntity>, ApiError> {
    let instance = resolve_instance(&manager, &instance)?;
    let data: CreateScope = parse_body(&headers, &body)?;
    if data.name.is_empty() {
        return Err(ApiError::bad_request("Missing required param: name"));
    }
    let scope = instance.use_scope(Scope::new(data.name, data.description));
    metrics::counter!("stratum_admin_mutations_total").increment(1);
    Ok(Json(scope.as_ref().into()))
}

pub async fn get_instance_scope(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope)): Path<(String, String)>,
) -> Result<Json<ScopeEntity>, ApiError> {
    let instance = resolve_instance(&manager, &instance)?;
    let scope = resolve_scope(&manager, Some(&instance), &scope)?;
    Ok(Json(scope.as_ref().into()))
}

pub async fn delete_instance_scope(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let instance = resolve_instance(&manager, &instance)?;
    let scope = resolve_scope(&manager, Some(&instance), &scope)?;
    if instance.remove_scope(scope.id()) {
        metrics::counter!("stratum_admin_mutations_total").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::internal("Cannot remove scope"))
    }
}

// Plugins nested under an instance scope.

pub async fn list_instance_scope_plugins(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope)): Path<(String, String)>,
) -> Result<Json<Vec<PluginEntity>>, ApiError> {
    let scope = instance_scope(&manager, &instance, &scope)?;
    Ok(Json(plugin_entities(scope.plugins())))
}

pub async fn create_instance_scope_plugin(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PluginEntity>, ApiError> {
    let scope = instance_scope(&manager, &instance, &scope)?;
    create_plugin_in(&manager, scope.plugins(), &headers, &body)
}

pub async fn get_instance_scope_plugin(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope, plugin)): Path<(String, String, String)>,
) -> Result<Json<PluginEntity>, ApiError> {
    let scope = instance_scope(&manager, &instance, &scope)?;
    let plugin = resolve_plugin(scope.plugins(), &plugin)?;
    Ok(Json(plugin.as_ref().into()))
}

pub async fn delete_instance_scope_plugin(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope, plugin)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let scope = instance_scope(&manager, &instance, &scope)?;
    delete_plugin_in(scope.plugins(), &plugin)
}

// Rules nested under an instance scope.

pub async fn list_instance_scope_rules(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope)): Path<(String, String)>,
) -> Result<Json<Vec<RuleEntity>>, ApiError> {
    let scope = instance_scope(&manager, &instance, &scope)?;
    Ok(Json(rule_entities(&scope)))
}

pub async fn create_instance_scope_rule(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RuleEntity>, ApiError> {
    let scope = instance_scope(&manager, &instance, &scope)?;
    create_rule_in(&manager, &scope, &headers, &body)
}

pub async fn get_instance_scope_rule(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope, rule)): Path<(String, String, String)>,
) -> Result<Json<RuleEntity>, ApiError> {
    let scope = instance_scope(&manager, &instance, &scope)?;
    let rule = resolve_rule(&scope, &rule)?;
    Ok(Json(rule.as_ref().into()))
}

pub async fn delete_instance_scope_rule(
    State(manager): State<Arc<Manager>>,
    Path((instance, scope, rule)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let scope = instance_scope(&manager, &instance, &scope)?;
    delete_rule_in(&scope, &rule)
}

// Shared pool-generic logic.

fn instance_scope(
    manager: &Manager,
    instance: &str,
    scope: &str,
) -> Result<Arc<Scope>, ApiError> {
    let instance: Arc<Instance> = resolve_instance(manager, instance)?;
    resolve_scope(manager, Some(&instance), scope)
}

fn plugin_entities(pool: &PluginLayer) -> Vec<PluginEntity> {
    pool.all().iter().map(|p| p.as_ref().into()).collect()
}

fn rule_entities(scope: &Scope) -> Vec<RuleEntity> {
    scope.rules().all().iter().map(|r| r.as_ref().into()).collect()
}

fn create_plugin_in(
    manager: &Manager,
    pool: &PluginLayer,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Json<PluginEntity>, ApiError> {
    let data: CreateEntity = parse_body(headers, body)?;
    if data.name.is_empty() {
        return Err(ApiError::bad_request("Missing required param: name"));
    }
    let plugin = manager.registry().build_plugin(&data.name, data.config)?;
    let plugin = pool.use_plugin(plugin);
    metrics::counter!("stratum_admin_mutations_total").increment(1);
    tracing::info!(plugin = plugin.name(), id = plugin.id(), "plugin installed");
    Ok(Json(plugin.as_ref().into()))
}

fn delete_plugin_in(pool: &PluginLayer, id: &str) -> Result<StatusCode, ApiError> {
    let plugin = resolve_plugin(pool, id)?;
    if pool.remove(plugin.id()) {
        metrics::counter!("stratum_admin_mutations_total").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::internal("Cannot remove plugin"))
    }
}

fn create_rule_in(
    manager: &Manager,
    scope: &Scope,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Json<RuleEntity>, ApiError> {
    let data: CreateEntity = parse_body(headers, body)?;
    if data.name.is_empty() {
        return Err(ApiError::bad_request("Missing required param: name"));
    }
    let rule = manager.registry().build_rule(&data.name, data.config)?;
    let rule = scope.use_rule(rule);
    metrics::counter!("stratum_admin_mutations_total").increment(1);
    tracing::info!(rule = rule.name(), id = rule.id(), "rule installed");
    Ok(Json(rule.as_ref().into()))
}

fn delete_rule_in(scope: &Scope, id: &str) -> Result<StatusCode, ApiError> {
    let rule = resolve_rule(scope, id)?;
    if scope.remove_rule(rule.id()) {
        metrics::counter!("stratum_admin_mutations_total").increment(1);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::internal("Cannot remove rule"))
    }
}
