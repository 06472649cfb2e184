//! JSON admin API.
//!
//! # Responsibilities
//! - Route table for the control plane REST surface
//! - Wrap the API behind the manager's own middleware layer, so admin
//!   traffic is extensible with the same phase/priority machinery as
//!   proxied traffic
//!
//! # Data Flow
//! admin request -> manager Layer "request" phase -> axum router terminal
//!   -> handler -> pool mutation/snapshot -> JSON reply

pub mod context;
pub mod entities;
pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use crate::layer::{handler_fn, ArcHandler, Request, REQUEST_PHASE};
use crate::manager::Manager;

use self::handlers as h;

/// Build the admin router.
///
/// The API router runs as the terminal of the manager's layer, so middleware
/// registered on `manager.layer()` wraps every admin request.
pub fn router(manager: Arc<Manager>) -> Router {
    let api = Router::new()
        .route("/", get(h::index))
        .route("/catalog", get(h::catalog))
        .route("/plugins", get(h::list_plugins).post(h::create_plugin))
        .route(
            "/plugins/{plugin}",
            get(h::get_plugin).delete(h::delete_plugin),
        )
        .route("/scopes", get(h::list_scopes).post(h::create_scope))
        .route("/scopes/{scope}", get(h::get_scope).delete(h::delete_scope))
        .route(
            "/scopes/{scope}/plugins",
            get(h::list_scope_plugins).post(h::create_scope_plugin),
        )
        .route(
            "/scopes/{scope}/plugins/{plugin}",
            get(h::get_scope_plugin).delete(h::delete_scope_plugin),
        )
        .route(
            "/scopes/{scope}/rules",
            get(h::list_scope_rules).post(h::create_scope_rule),
        )
        .route(
            "/scopes/{scope}/rules/{rule}",
            get(h::get_scope_rule).delete(h::delete_scope_rule),
        )
        .route("/instances", get(h::list_instances))
        .route(
            "/instances/{instance}",
            get(h::get_instance).delete(h::delete_instance),
        )
        .route(
            "/instances/{instance}/scopes",
            get(h::list_instance_scopes).post(h::create_instance_scope),
        )
        .route(
            "/instances/{instance}/scopes/{scope}",
            get(h::get_instance_scope).delete(h::delete_instance_scope),
        )
        .route(
            "/instances/{instance}/scopes/{scope}/plugins",
            get(h::list_instance_scope_plugins).post(h::create_instance_scope_plugin),
        )
        .route(
            "/instances/{instance}/scopes/{scope}/plugins/{plugin}",
            get(h::get_instance_scope_plugin).delete(h::delete_instance_scope_plugin),
        )
        .route(
            "/instances/{instance}/scopes/{scope}/rules",
            get(h::list_instance_scope_rules).post(h::create_instance_scope_rule),
        )
        .route(
            "/instances/{instance}/scopes/{scope}/rules/{rule}",
            get(h::get_instance_scope_rule).delete(h::delete_instance_scope_rule),
        )
        .with_state(manager.clone());

    let terminal: ArcHandler = handler_fn(move |req: Request| {
        let api = api.clone();
        async move {
            match api.oneshot(req).await {
                Ok(res) => res,
                Err(infallible) => match infallible {},
            }
        }
    });

    let layer = manager.layer().clone();
    Router::new().fallback(move |req: Request| {
        let layer = layer.clone();
        let terminal = terminal.clone();
        async move { layer.run(REQUEST_PHASE, req, Some(terminal)).await }
    })
}
