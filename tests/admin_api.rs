//! Admin REST surface, exercised through the router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use stratum::{Engine, Manager};

fn admin_app() -> (Router, Arc<Manager>) {
    let manager = Arc::new(Manager::default());
    (stratum::admin::router(manager.clone()), manager)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn index_reports_server_info() {
    let (app, _manager) = admin_app();
    let res = app.oneshot(get("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let info = body_json(res).await;
    assert!(info["hostname"].is_string());
    assert_eq!(info["links"]["catalog"], "/catalog");
}

#[tokio::test]
async fn catalog_lists_builtin_kinds() {
    let (app, _manager) = admin_app();
    let res = app.oneshot(get("/catalog")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let catalog = body_json(res).await;
    let rule_names: Vec<_> = catalog["rules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_owned())
        .collect();
    assert!(rule_names.contains(&"path".to_owned()));
    assert!(rule_names.contains(&"method".to_owned()));
    assert!(rule_names.contains(&"vhost".to_owned()));

    let plugin = &catalog["plugins"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "forward")
        .unwrap();
    assert_eq!(plugin["params"][0]["name"], "url");
    assert_eq!(plugin["params"][0]["mandatory"], true);
}

#[tokio::test]
async fn plugin_creation_validates_params() {
    let (app, _manager) = admin_app();

    let res = app
        .clone()
        .oneshot(post_json("/plugins", json!({"name": "forward"})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err = body_json(res).await;
    assert_eq!(err["code"], 400);
    assert!(err["message"].as_str().unwrap().contains("url"));

    let res = app
        .oneshot(post_json(
            "/plugins",
            json!({"name": "forward", "config": {"url": "http://127.0.0.1:9000"}}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let plugin = body_json(res).await;
    assert!(!plugin["id"].as_str().unwrap().is_empty());
    assert_eq!(plugin["name"], "forward");
    assert_eq!(plugin["config"]["url"], "http://127.0.0.1:9000");
}

#[tokio::test]
async fn plugin_creation_requires_json_content_type() {
    let (app, _manager) = admin_app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/plugins")
        .body(Body::from(r#"{"name": "forward"}"#))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn unknown_plugin_kind_is_not_found() {
    let (app, _manager) = admin_app();
    let res = app
        .oneshot(post_json("/plugins", json!({"name": "ghost"})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn plugin_lifecycle_round_trips() {
    let (app, _manager) = admin_app();

    let res = app
        .clone()
        .oneshot(post_json(
            "/plugins",
            json!({"name": "auth", "config": {"token": "s3cret"}}),
        ))
        .await
        .unwrap();
    let created = body_json(res).await;
    let id = created["id"].as_str().unwrap().to_owned();

    let res = app.clone().oneshot(get("/plugins")).await.unwrap();
    let listed = body_json(res).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(get(&format!("/plugins/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(delete(&format!("/plugins/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .oneshot(delete(&format!("/plugins/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scope_tree_supports_nested_rules_and_plugins() {
    let (app, _manager) = admin_app();

    let res = app
        .clone()
        .oneshot(post_json(
            "/scopes",
            json!({"name": "admin", "description": "Admin panel"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let scope = body_json(res).await;
    let scope_id = scope["id"].as_str().unwrap().to_owned();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/scopes/{scope_id}/rules"),
            json!({"name": "path", "config": {"pattern": "/admin(/.*)?"}}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let rule = body_json(res).await;
    let rule_id = rule["id"].as_str().unwrap().to_owned();
    assert_eq!(rule["config"]["pattern"], "/admin(/.*)?");

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/scopes/{scope_id}/plugins"),
            json!({"name": "auth", "config": {"token": "t"}}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(get(&format!("/scopes/{scope_id}")))
        .await
        .unwrap();
    let fetched = body_json(res).await;
    assert_eq!(fetched["rules"].as_array().unwrap().len(), 1);
    assert_eq!(fetched["plugins"].as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(delete(&format!("/scopes/{scope_id}/rules/{rule_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .clone()
        .oneshot(delete(&format!("/scopes/{scope_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app
        .oneshot(delete(&format!("/scopes/{scope_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_scope_name_is_rejected() {
    let (app, _manager) = admin_app();
    let res = app
        .oneshot(post_json("/scopes", json!({"description": "no name"})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err = body_json(res).await;
    assert!(err["message"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn resolution_fails_at_the_first_missing_segment() {
    let (app, _manager) = admin_app();

    let res = app.clone().oneshot(get("/scopes/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["message"], "Scope not found");

    let res = app
        .clone()
        .oneshot(get("/instances/nope/scopes/also-nope"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["message"], "Instance not found");
}

#[tokio::test]
async fn instance_tree_mirrors_the_global_tree() {
    let (app, manager) = admin_app();
    let engine = Engine::new();
    let instance = manager.manage("proxy", "Managed engine", &engine);
    let iid = instance.id().to_owned();

    let res = app.clone().oneshot(get("/instances")).await.unwrap();
    let listed = body_json(res).await;
    assert_eq!(listed[0]["name"], "proxy");

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/instances/{iid}/scopes"),
            json!({"name": "local"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let scope = body_json(res).await;
    let sid = scope["id"].as_str().unwrap().to_owned();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/instances/{iid}/scopes/{sid}/rules"),
            json!({"name": "method", "config": {"methods": "GET"}}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(get(&format!("/instances/{iid}")))
        .await
        .unwrap();
    let fetched = body_json(res).await;
    assert_eq!(fetched["scopes"][0]["rules"][0]["name"], "method");

    let res = app
        .clone()
        .oneshot(delete(&format!("/instances/{iid}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.oneshot(get(&format!("/instances/{iid}"))).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_layer_middleware_wraps_the_api() {
    let manager = Arc::new(Manager::default());
    manager
        .layer()
        .use_request(|req: stratum::layer::Request, next: stratum::layer::Next| async move {
            let mut res = next.run(req).await;
            res.headers_mut()
                .insert("x-admin-layer", "1".parse().unwrap());
            res
        });

    let app = stratum::admin::router(manager);
    let res = app.oneshot(get("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-admin-layer"], "1");
}
