//! Top-level request engine.
//!
//! # Responsibilities
//! - Own the root middleware [`Layer`] and expose its registration surface
//! - Drive every incoming request through the "request" phase
//! - Provide the forward-to-upstream convenience terminal
//!
//! # Data Flow
//! HTTP server -> Engine::handle -> Layer::run("request") -> final handler

use std::sync::Arc;

use crate::http::{ForwardError, Forwarder};
use crate::layer::{
    handler_fn, ArcHandler, IntoMiddleware, Layer, Priority, Request, Response, REQUEST_PHASE,
};

/// The runtime's request pipeline.
///
/// Cheap to clone; clones share the same underlying layer.
#[derive(Clone)]
pub struct Engine {
    layer: Arc<Layer>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            layer: Arc::new(Layer::new()),
        }
    }

    /// The root layer, for callers that need phase-level control.
    pub fn layer(&self) -> &Arc<Layer> {
        &self.layer
    }

    /// Register a handler in the "request" phase at normal priority.
    pub fn use_request<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.layer.use_request(handler);
    }

    /// Register a handler in the "request" phase at head priority.
    pub fn use_head<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.layer.use_head(handler);
    }

    /// Register a handler in the "request" phase at tail priority.
    pub fn use_tail<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.layer.use_tail(handler);
    }

    /// Register a handler in the "error" phase.
    pub fn use_error<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.layer.use_error(handler);
    }

    /// Register a handler in an arbitrary phase.
    pub fn use_phase<Args>(&self, phase: &str, handler: impl IntoMiddleware<Args>) {
        self.layer.use_phase(phase, handler);
    }

    /// Register a handler in an arbitrary phase at an explicit priority.
    pub fn use_priority<Args>(
        &self,
        phase: &str,
        priority: Priority,
        handler: impl IntoMiddleware<Args>,
    ) {
        self.layer.use_priority(phase, priority, handler);
    }

    /// Replace the terminal handler reached when no middleware responds.
    pub fn use_final_handler(&self, handler: ArcHandler) {
        self.layer.use_final_handler(handler);
    }

    /// Remove every registered middleware from every phase.
    pub fn flush(&self) {
        self.layer.flush();
    }

    /// Terminal handler that proxies everything to `target`.
    pub fn forward(&self, target: &str) -> Result<(), ForwardError> {
        let forwarder = Arc::new(Forwarder::new(target)?);
        self.layer.use_final_handler(handler_fn(move |req: Request| {
            let forwarder = forwarder.clone();
            async move { forwarder.forward(req).await }
        }));
        Ok(())
    }

    /// Run a request through the pipeline.
    pub async fn handle(&self, req: Request) -> Response {
        let start = std::time::Instant::now();
        let res = self.layer.run(REQUEST_PHASE, req, None).await;
        crate::observability::metrics::record_request(res.status().as_u16(), start.elapsed());
        res
    }
}
