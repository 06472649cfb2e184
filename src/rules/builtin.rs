//! Built-in rule kinds.

use std::sync::Arc;

use crate::mux::{match_host, match_method, match_path};
use crate::registry::{Field, ParamKind, Registry, RuleInfo};

/// Install the built-in rule descriptors into a registry.
pub fn register(registry: &Registry) {
    registry.register_rule(path());
    registry.register_rule(vhost());
    registry.register_rule(method());
}

/// Matches requests whose path equals or matches the configured pattern.
fn path() -> RuleInfo {
    RuleInfo {
        name: "path".to_owned(),
        description: "matches the request path against an exact value or regex".to_owned(),
        params: vec![Field::new("pattern", ParamKind::String, "path or regex")
            .mandatory()
            .example("/api/v1/users")
            .example("^/api/.*$")],
        factory: Arc::new(|opts| {
            let pattern = opts.get_str("pattern").unwrap_or_default();
            Ok(match_path(pattern)?)
        }),
    }
}

/// Matches requests by Host header.
fn vhost() -> RuleInfo {
    RuleInfo {
        name: "vhost".to_owned(),
        description: "matches the request host against an exact value or regex".to_owned(),
        params: vec![Field::new("pattern", ParamKind::String, "hostname or regex")
            .mandatory()
            .example("api.example.com")],
        factory: Arc::new(|opts| {
            let pattern = opts.get_str("pattern").unwrap_or_default();
            Ok(match_host(pattern)?)
        }),
    }
}

/// Matches requests by HTTP method. Accepts a comma separated list.
fn method() -> RuleInfo {
    RuleInfo {
        name: "method".to_owned(),
        description: "matches the request method against a comma separated list".to_owned(),
        params: vec![Field::new("methods", ParamKind::String, "methods, e.g. GET,POST")
            .mandatory()
            .example("GET")
            .example("GET,POST,DELETE")
            .validator(|value, _opts| {
                let raw = value.as_str().unwrap_or_default();
                if raw.split(',').all(|m| m.trim().is_empty()) {
                    return Err("at least one method is required".to_owned());
                }
                Ok(())
            })],
        factory: Arc::new(|opts| {
            let raw = opts.get_str("methods").unwrap_or_default();
            let methods: Vec<String> = raw
                .split(',')
                .map(|m| m.trim().to_ascii_uppercase())
                .filter(|m| !m.is_empty())
                .collect();
            Ok(match_method(methods))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Request;
    use crate::options::Options;
    use crate::registry::RegistryError;
    use axum::body::Body;
    use serde_json::json;

    fn get(uri: &str) -> Request {
        let mut req = Request::new(Body::empty());
        *req.uri_mut() = uri.parse().unwrap();
        req
    }

    #[test]
    fn path_rule_builds_and_matches() {
        let registry = Registry::with_builtin();
        let mut opts = Options::new();
        opts.set("pattern", json!("^/api/.*$"));
        let rule = registry.build_rule("path", opts).unwrap();
        assert!(rule.matches(&get("/api/v1/users")));
        assert!(!rule.matches(&get("/health")));
    }

    #[test]
    fn path_rule_requires_pattern() {
        let registry = Registry::with_builtin();
        let err = registry.build_rule("path", Options::new()).err().unwrap();
        assert!(matches!(err, RegistryError::MissingParam(ref p) if p == "pattern"));
    }

    #[test]
    fn method_rule_normalizes_case_and_whitespace() {
        let registry = Registry::with_builtin();
        let mut opts = Options::new();
        opts.set("methods", json!("get, post"));
        let rule = registry.build_rule("method", opts).unwrap();

        let mut req = get("/");
        *req.method_mut() = axum::http::Method::POST;
        assert!(rule.matches(&req));

        let mut req = get("/");
        *req.method_mut() = axum::http::Method::DELETE;
        assert!(!rule.matches(&req));
    }

    #[test]
    fn method_rule_rejects_empty_list() {
        let registry = Registry::with_builtin();
        let mut opts = Options::new();
        opts.set("methods", json!(" , "));
        let err = registry.build_rule("method", opts).err().unwrap();
        assert!(matches!(err, RegistryError::InvalidValue { ref param, .. } if param == "methods"));
    }

    #[test]
    fn vhost_rule_matches_host_header() {
        let registry = Registry::with_builtin();
        let mut opts = Options::new();
        opts.set("pattern", json!("api.example.com"));
        let rule = registry.build_rule("vhost", opts).unwrap();

        let mut req = get("/");
        req.headers_mut()
            .insert("host", "api.example.com".parse().unwrap());
        assert!(rule.matches(&req));
    }
}
