//! Middleware layer engine.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     -> Layer::run(phase)
//!     -> snapshot phase stack (read lock, released before execution)
//!     -> fold transforms around the terminal handler
//!       (head..normal..tail, FIFO within class; last registered in a
//!        class sits closest to the terminal)
//!     -> await the composed chain
//!
//! On panic in a non-"error" phase:
//!     caught once at the run boundary
//!     -> rebuild request from the preserved head, attach Fault
//!     -> dispatch the "error" phase with the fixed 500 terminal
//! ```
//!
//! # Design Decisions
//! - Phases are independent; an empty phase falls through to the terminal
//! - The "error" phase never re-enters error handling: it runs without a
//!   recovery boundary, so a second panic propagates instead of recursing
//! - Registration is lock-guarded and can race with traffic; dispatch only
//!   holds the pool lock while snapshotting

pub mod adapter;
pub mod handler;
mod stack;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use parking_lot::RwLock;

pub use adapter::IntoMiddleware;
pub use handler::{
    handler_fn, internal_error_handler, no_route_handler, transform_fn, ArcHandler, BoxFuture,
    Fault, Handler, Middleware, Next, Request, Response, Transform,
};
pub use stack::Priority;

use stack::Stack;

/// The phase traffic enters by default.
pub const REQUEST_PHASE: &str = "request";

/// The phase faults are redirected into. Never recurses into itself.
pub const ERROR_PHASE: &str = "error";

/// Phase-keyed, priority-ordered middleware layer.
pub struct Layer {
    pool: RwLock<HashMap<String, Stack>>,
    final_handler: RwLock<ArcHandler>,
}

impl Layer {
    /// Create an empty layer with the default 502 no-route terminal.
    pub fn new() -> Self {
        Self {
            pool: RwLock::new(HashMap::new()),
            final_handler: RwLock::new(no_route_handler()),
        }
    }

    /// Register a handler in the "request" phase at normal priority.
    pub fn use_request<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.use_priority(REQUEST_PHASE, Priority::Normal, handler);
    }

    /// Register a handler in the "request" phase at head priority.
    pub fn use_head<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.use_priority(REQUEST_PHASE, Priority::Head, handler);
    }

    /// Register a handler in the "request" phase at tail priority.
    pub fn use_tail<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.use_priority(REQUEST_PHASE, Priority::Tail, handler);
    }

    /// Register a handler in the "error" phase at normal priority.
    pub fn use_error<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.use_priority(ERROR_PHASE, Priority::Normal, handler);
    }

    /// Register a handler in the given phase at normal priority.
    pub fn use_phase<Args>(&self, phase: &str, handler: impl IntoMiddleware<Args>) {
        self.use_priority(phase, Priority::Normal, handler);
    }

    /// Register a handler in the given phase at the given priority.
    pub fn use_priority<Args>(
        &self,
        phase: &str,
        priority: Priority,
        handler: impl IntoMiddleware<Args>,
    ) {
        let transform = handler.into_middleware();
        let mut pool = self.pool.write();
        pool.entry(phase.to_string())
            .or_default()
            .push(priority, transform);
    }

    /// Replace the terminal handler invoked when the innermost transform
    /// calls `next`.
    pub fn use_final_handler(&self, handler: ArcHandler) {
        *self.final_handler.write() = handler;
    }

    /// The configured terminal handler.
    pub fn final_handler(&self) -> ArcHandler {
        self.final_handler.read().clone()
    }

    /// Clear every phase. The terminal handler is kept.
    pub fn flush(&self) {
        self.pool.write().clear();
    }

    /// Number of transforms registered in a phase.
    pub fn phase_len(&self, phase: &str) -> usize {
        self.pool.read().get(phase).map_or(0, Stack::len)
    }

    /// Execute the stack registered for `phase`.
    ///
    /// `terminal` overrides the layer's configured terminal handler for
    /// this dispatch; pass `None` to use the configured one. For the
    /// "error" phase the fallback terminal is the fixed 500 responder.
    pub async fn run(&self, phase: &str, req: Request, terminal: Option<ArcHandler>) -> Response {
        if phase == ERROR_PHASE {
            // No recovery boundary here: a faulting error handler must not
            // re-enter error handling.
            let terminal = terminal.unwrap_or_else(internal_error_handler);
            return self.dispatch(phase, req, terminal).await;
        }

        let terminal = terminal.unwrap_or_else(|| self.final_handler());
        let head = RequestHead::capture(&req);

        match AssertUnwindSafe(self.dispatch(phase, req, terminal))
            .catch_unwind()
            .await
        {
            Ok(res) => res,
            Err(panic) => {
                let message = panic_message(panic);
                metrics::counter!("stratum_handler_panics_total").increment(1);
                tracing::error!(phase, error = %message, "handler panicked, running error phase");
                let mut ereq = head.into_request();
                ereq.extensions_mut().insert(Fault { message });
                self.dispatch(ERROR_PHASE, ereq, internal_error_handler())
                    .await
            }
        }
    }

    async fn dispatch(&self, phase: &str, req: Request, terminal: ArcHandler) -> Response {
        let transforms = {
            let pool = self.pool.read();
            pool.get(phase).map(Stack::join).unwrap_or_default()
        };
        let mut chain = terminal;
        for transform in transforms.iter().rev() {
            chain = transform(chain);
        }
        chain.call(req).await
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

/// Request metadata preserved before dispatch so the error phase can be
/// fed a reconstructed request after the original was consumed by a
/// faulting chain.
struct RequestHead {
    method: axum::http::Method,
    uri: axum::http::Uri,
    version: axum::http::Version,
    headers: axum::http::HeaderMap,
}

impl RequestHead {
    fn capture(req: &Request) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            version: req.version(),
            headers: req.headers().clone(),
        }
    }

    fn into_request(self) -> Request {
        let mut req = Request::new(axum::body::Body::empty());
        *req.method_mut() = self.method;
        *req.uri_mut() = self.uri;
        *req.version_mut() = self.version;
        *req.headers_mut() = self.headers;
        req
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    async fn body_text(res: Response) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn counting_terminal(counter: Arc<AtomicUsize>) -> ArcHandler {
        handler_fn(move |_req| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Response::new(Body::from("terminal"))
            }
        })
    }

    fn tracer(order: Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Transform {
        transform_fn(move |next: ArcHandler| {
            let order = order.clone();
            handler_fn(move |req| {
                let order = order.clone();
                let next = next.clone();
                async move {
                    order.lock().unwrap().push(name);
                    next.call(req).await
                }
            })
        })
    }

    #[tokio::test]
    async fn empty_phase_invokes_terminal_exactly_once() {
        let layer = Layer::new();
        let count = Arc::new(AtomicUsize::new(0));
        layer.use_final_handler(counting_terminal(count.clone()));

        let res = layer.run(REQUEST_PHASE, Request::new(Body::empty()), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn custom_phase_with_no_stack_falls_through() {
        let layer = Layer::new();
        let count = Arc::new(AtomicUsize::new(0));
        let res = layer
            .run("warmup", Request::new(Body::empty()), Some(counting_terminal(count.clone())))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn interleaved_priorities_execute_head_normal_tail_fifo() {
        let layer = Layer::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        layer.use_priority(REQUEST_PHASE, Priority::Tail, tracer(order.clone(), "t1"));
        layer.use_priority(REQUEST_PHASE, Priority::Normal, tracer(order.clone(), "n1"));
        layer.use_priority(REQUEST_PHASE, Priority::Head, tracer(order.clone(), "h1"));
        layer.use_priority(REQUEST_PHASE, Priority::Normal, tracer(order.clone(), "n2"));
        layer.use_priority(REQUEST_PHASE, Priority::Head, tracer(order.clone(), "h2"));
        layer.use_priority(REQUEST_PHASE, Priority::Tail, tracer(order.clone(), "t2"));

        layer.run(REQUEST_PHASE, Request::new(Body::empty()), None).await;

        let seen = order.lock().unwrap().clone();
        assert_eq!(seen, vec!["h1", "h2", "n1", "n2", "t1", "t2"]);
    }

    #[tokio::test]
    async fn default_terminal_replies_502_no_route() {
        let layer = Layer::new();
        let res = layer.run(REQUEST_PHASE, Request::new(Body::empty()), None).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_text(res).await, "stratum: no route configured");
    }

    #[tokio::test]
    async fn panic_redirects_into_error_phase_with_fault() {
        let layer = Layer::new();
        let fault_seen = Arc::new(Mutex::new(None::<String>));
        let seen = fault_seen.clone();

        fn boom() -> Response {
            panic!("boom in handler")
        }
        layer.use_request(|_req: Request, _next: Next| async move { boom() });
        layer.use_error(move |req: Request, next: Next| {
            let seen = seen.clone();
            async move {
                let fault = req.extensions().get::<Fault>().cloned();
                *seen.lock().unwrap() = fault.map(|f| f.message);
                next.run(req).await
            }
        });

        let res = layer.run(REQUEST_PHASE, Request::new(Body::empty()), None).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(res).await, "stratum: internal server error");
        assert_eq!(
            fault_seen.lock().unwrap().as_deref(),
            Some("boom in handler")
        );
    }

    #[tokio::test]
    async fn panic_in_error_phase_propagates_instead_of_recursing() {
        let layer = Layer::new();
        fn boom() -> Response {
            panic!("request failure")
        }
        fn boom_again() -> Response {
            panic!("error handler failure")
        }
        layer.use_request(|_req: Request, _next: Next| async move { boom() });
        layer.use_error(|_req: Request, _next: Next| async move { boom_again() });

        // The error phase runs without a recovery boundary: the second
        // panic escapes Layer::run instead of re-entering error handling.
        let run = layer.run(REQUEST_PHASE, Request::new(Body::empty()), None);
        let outcome = AssertUnwindSafe(run).catch_unwind().await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn error_phase_without_stack_uses_error_terminal() {
        let layer = Layer::new();
        let res = layer.run(ERROR_PHASE, Request::new(Body::empty()), None).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn flush_is_idempotent() {
        let layer = Layer::new();
        layer.use_request(|req: Request, next: Next| async move { next.run(req).await });
        assert_eq!(layer.phase_len(REQUEST_PHASE), 1);

        layer.flush();
        assert_eq!(layer.phase_len(REQUEST_PHASE), 0);
        layer.flush();
        assert_eq!(layer.phase_len(REQUEST_PHASE), 0);

        // Terminal handler survives the flush.
        let res = layer.run(REQUEST_PHASE, Request::new(Body::empty()), None).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn registered_final_handler_overrides_default() {
        let layer = Layer::new();
        layer.use_final_handler(handler_fn(|_req| async {
            Response::new(Body::from("custom"))
        }));
        let res = layer.run(REQUEST_PHASE, Request::new(Body::empty()), None).await;
        assert_eq!(body_text(res).await, "custom");
    }
}
