//! Canonical handler types for the middleware engine.
//!
//! # Responsibilities
//! - Define the terminal handler shape: `fn(Request) -> Future<Response>`
//! - Define the chain transform shape: `fn(next) -> handler`
//! - Provide the `Next` continuation passed to explicit-next middleware
//! - Provide the fixed fallback responders (no route, internal error)
//!
//! # Design Decisions
//! - Handlers are type-erased behind `Arc<dyn Handler>` so chains can be
//!   rebuilt per dispatch from a pool snapshot without re-boxing futures
//! - Futures are `'static`: handlers clone their captured state into the
//!   future instead of borrowing across await points

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::StatusCode;

/// HTTP request type flowing through the engine.
pub type Request = axum::http::Request<Body>;

/// HTTP response type produced by handlers.
pub type Response = axum::http::Response<Body>;

/// Boxed future returned by type-erased handlers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A terminal request handler: consumes the request, produces the response.
pub trait Handler: Send + Sync {
    /// Handle the request to completion.
    fn call(&self, req: Request) -> BoxFuture<Response>;
}

/// Shared, type-erased handler reference.
pub type ArcHandler = Arc<dyn Handler>;

/// A chain transform: wraps the `next` handler and returns the wrapping
/// handler. Stacks of these are folded around a terminal handler at
/// dispatch time.
pub type Transform = Arc<dyn Fn(ArcHandler) -> ArcHandler + Send + Sync>;

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture<Response> {
        Box::pin(self(req))
    }
}

/// Wrap an async function into a shared handler.
pub fn handler_fn<F, Fut>(f: F) -> ArcHandler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(f)
}

/// Wrap a `fn(next) -> handler` closure into a chain transform.
pub fn transform_fn<F>(f: F) -> Transform
where
    F: Fn(ArcHandler) -> ArcHandler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The continuation handed to explicit-next middleware. Invoking it runs
/// the remainder of the chain down to the terminal handler.
#[derive(Clone)]
pub struct Next {
    inner: ArcHandler,
}

impl Next {
    /// Wrap a handler as the continuation of a chain.
    pub fn new(inner: ArcHandler) -> Self {
        Self { inner }
    }

    /// Run the rest of the chain.
    pub async fn run(&self, req: Request) -> Response {
        self.inner.call(req).await
    }

    /// The underlying handler, for embedding as a nested terminal.
    pub fn handler(&self) -> ArcHandler {
        self.inner.clone()
    }
}

/// Explicit-next middleware objects. Layers, muxes, scopes and control
/// plane entities all compose through this trait.
pub trait Middleware: Send + Sync {
    /// Process the request, optionally delegating to `next`.
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Response>;
}

/// Fault captured from a panicking handler, attached to the request
/// dispatched into the error phase.
#[derive(Debug, Clone)]
pub struct Fault {
    /// Panic payload rendered as text.
    pub message: String,
}

fn plaintext(status: StatusCode, body: &'static str) -> Response {
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = status;
    res
}

/// Default terminal handler: fixed 502 when no route is configured.
pub fn no_route_handler() -> ArcHandler {
    handler_fn(|_req| async {
        plaintext(StatusCode::BAD_GATEWAY, "stratum: no route configured")
    })
}

/// Default error-phase terminal handler: fixed 500 body.
pub fn internal_error_handler() -> ArcHandler {
    handler_fn(|_req| async {
        plaintext(StatusCode::INTERNAL_SERVER_ERROR, "stratum: internal server error")
    })
}
