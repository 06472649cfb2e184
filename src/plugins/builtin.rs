//! Built-in plugin kinds.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, StatusCode};

use crate::http::Forwarder;
use crate::layer::{handler_fn, transform_fn, Request, Response};
use crate::registry::{Field, ParamKind, PluginInfo, Registry, RegistryError};

/// Install the built-in plugin descriptors into a registry.
pub fn register(registry: &Registry) {
    registry.register_plugin(forward());
    registry.register_plugin(auth());
}

/// Terminates the chain by proxying to a fixed upstream.
fn forward() -> PluginInfo {
    PluginInfo {
        name: "forward".to_owned(),
        description: "proxies matching requests to an upstream server".to_owned(),
        params: vec![Field::new("url", ParamKind::String, "upstream base url")
            .mandatory()
            .example("http://127.0.0.1:9000")
            .validator(|value, _opts| {
                let raw = value.as_str().unwrap_or_default();
                url::Url::parse(raw)
                    .map(|_| ())
                    .map_err(|e| format!("{e}"))
            })],
        factory: Arc::new(|opts| {
            let target = opts.get_str("url").unwrap_or_default();
            let forwarder =
                Arc::new(
                    Forwarder::new(target).map_err(|e| RegistryError::InvalidValue {
                        param: "url".to_owned(),
                        reason: format!("{e}"),
                    })?,
                );
            Ok(transform_fn(move |_next| {
                let forwarder = forwarder.clone();
                handler_fn(move |req: Request| {
                    let forwarder = forwarder.clone();
                    async move { forwarder.forward(req).await }
                })
            }))
        }),
    }
}

/// Rejects requests that do not carry the configured bearer token.
fn auth() -> PluginInfo {
    PluginInfo {
        name: "auth".to_owned(),
        description: "requires a bearer token on every matching request".to_owned(),
        params: vec![Field::new("token", ParamKind::String, "expected bearer token")
            .mandatory()
            .validator(|value, _opts| {
                if value.as_str().unwrap_or_default().is_empty() {
                    return Err("token must not be empty".to_owned());
                }
                Ok(())
            })],
        factory: Arc::new(|opts| {
            let expected = format!("Bearer {}", opts.get_str("token").unwrap_or_default());
            Ok(transform_fn(move |next| {
                let expected = expected.clone();
                handler_fn(move |req: Request| {
                    let next = next.clone();
                    let authorized = req
                        .headers()
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .is_some_and(|v| v == expected);
                    async move {
                        if authorized {
                            next.call(req).await
                        } else {
                            let mut res = Response::new(Body::from("stratum: unauthorized"));
                            *res.status_mut() = StatusCode::UNAUTHORIZED;
                            res
                        }
                    }
                })
            }))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[test]
    fn forward_requires_a_url() {
        let registry = Registry::with_builtin();
        let err = registry.build_plugin("forward", Options::new()).err().unwrap();
        assert!(matches!(err, RegistryError::MissingParam(ref p) if p == "url"));
    }

    #[test]
    fn forward_rejects_unparseable_urls() {
        let registry = Registry::with_builtin();
        let mut opts = Options::new();
        opts.set("url", json!("::not a url::"));
        let err = registry.build_plugin("forward", opts).err().unwrap();
        assert!(matches!(err, RegistryError::InvalidValue { ref param, .. } if param == "url"));
    }

    #[test]
    fn forward_builds_with_a_valid_url() {
        let registry = Registry::with_builtin();
        let mut opts = Options::new();
        opts.set("url", json!("http://127.0.0.1:9000"));
        let plugin = registry.build_plugin("forward", opts).unwrap();
        assert_eq!(plugin.name(), "forward");
        assert_eq!(plugin.options().get_str("url"), Some("http://127.0.0.1:9000"));
    }

    #[tokio::test]
    async fn auth_gates_on_the_bearer_token() {
        let registry = Registry::with_builtin();
        let mut opts = Options::new();
        opts.set("token", json!("s3cret"));
        let plugin = registry.build_plugin("auth", opts).unwrap();

        let chain = plugin.handle(handler_fn(|_req| async {
            Response::new(Body::from("ok"))
        }));

        let denied = chain.call(Request::new(Body::empty())).await;
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let mut req = Request::new(Body::empty());
        req.headers_mut()
            .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
        let allowed = chain.call(req).await;
        assert_eq!(allowed.status(), StatusCode::OK);
        let body = allowed.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[test]
    fn auth_rejects_empty_tokens() {
        let registry = Registry::with_builtin();
        let mut opts = Options::new();
        opts.set("token", json!(""));
        let err = registry.build_plugin("auth", opts).err().unwrap();
        assert!(matches!(err, RegistryError::InvalidValue { ref param, .. } if param == "token"));
    }
}
