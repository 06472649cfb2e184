//! Admin API error shape and path resolution.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

use crate::manager::{Instance, Manager, Scope};
use crate::plugins::{Plugin, PluginLayer};
use crate::registry::RegistryError;
use crate::rules::Rule;

/// JSON error reply: `{code, message}` with the code mirroring the HTTP
/// status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn unsupported_media() -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Invalid content type. Must be application/json",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.status.as_u16(),
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::RuleNotFound(_) => Self::not_found("Rule not found"),
            RegistryError::PluginNotFound(_) => Self::not_found("Plugin not found"),
            other => Self::bad_request(format!("Cannot create entity: {other}")),
        }
    }
}

/// Parse a JSON request body, enforcing the content type.
pub fn parse_body<T: DeserializeOwned>(headers: &HeaderMap, body: &Bytes) -> Result<T, ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if !is_json {
        return Err(ApiError::unsupported_media());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))
}

/// Resolve an instance path segment.
pub fn resolve_instance(manager: &Manager, id: &str) -> Result<Arc<Instance>, ApiError> {
    manager
        .get_instance(id)
        .ok_or_else(|| ApiError::not_found("Instance not found"))
}

/// Resolve a scope path segment, globally or inside an instance.
pub fn resolve_scope(
    manager: &Manager,
    instance: Option<&Instance>,
    id: &str,
) -> Result<Arc<Scope>, ApiError> {
    let scope = match instance {
        Some(instance) => instance.get_scope(id),
        None => manager.get_scope(id),
    };
    scope.ok_or_else(|| ApiError::not_found("Scope not found"))
}

/// Resolve a plugin path segment inside a pool.
pub fn resolve_plugin(pool: &PluginLayer, id: &str) -> Result<Arc<Plugin>, ApiError> {
    pool.get(id)
        .ok_or_else(|| ApiError::not_found("Plugin not found"))
}

/// Resolve a rule path segment inside a scope.
pub fn resolve_rule(scope: &Scope, id: &str) -> Result<Arc<Rule>, ApiError> {
    scope
        .rules()
        .get(id)
        .ok_or_else(|| ApiError::not_found("Rule not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        name: String,
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        headers
    }

    #[test]
    fn rejects_non_json_content_type() {
        let err = parse_body::<Body>(&HeaderMap::new(), &Bytes::from_static(b"{}")).unwrap_err();
        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn rejects_malformed_json() {
        let err =
            parse_body::<Body>(&json_headers(), &Bytes::from_static(b"not json")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parses_valid_bodies() {
        let body = Bytes::from_static(br#"{"name":"x"}"#);
        let parsed: Body = parse_body(&json_headers(), &body).unwrap();
        assert_eq!(parsed.name, "x");
    }
}
