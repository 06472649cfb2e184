//! Conditional sub-pipelines.
//!
//! # Data Flow
//! ```text
//! Mux::handle(req, next)
//!     -> evaluate matcher list (AND)
//!     -> on match: run the owned layer's "request" phase with next as
//!       terminal
//!     -> otherwise: pass through to next untouched
//! ```
//!
//! # Design Decisions
//! - A mux is itself middleware, so muxes nest anywhere a handler is
//!   accepted (mux-in-mux composition)
//! - Matchers are fixed at build time; the owned layer stays mutable at
//!   runtime like any other layer

pub mod compose;
pub mod matchers;

use std::sync::Arc;

use crate::layer::{
    ArcHandler, BoxFuture, IntoMiddleware, Layer, Middleware, Next, Request, Response,
    REQUEST_PHASE,
};

pub use compose::{every, some};
pub use matchers::{
    match_header, match_host, match_method, match_path, match_query, MatchError, Matcher,
};

/// A middleware layer gated by a composable boolean match predicate.
pub struct Mux {
    matchers: Vec<Matcher>,
    layer: Arc<Layer>,
}

impl Mux {
    /// Create a mux with no matchers. Until a matcher is added it matches
    /// every request.
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
            layer: Arc::new(Layer::new()),
        }
    }

    /// Create a mux from an initial set of AND-ed matchers.
    pub fn matching<I>(matchers: I) -> Self
    where
        I: IntoIterator<Item = Matcher>,
    {
        Self::new().every(matchers)
    }

    /// Mux matching any of the given HTTP methods.
    pub fn method<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().add_matcher(match_method(methods))
    }

    /// Mux matching the request path against a pattern.
    pub fn path(pattern: &str) -> Result<Self, MatchError> {
        Ok(Self::new().add_matcher(match_path(pattern)?))
    }

    /// Mux matching the request host against a pattern.
    pub fn host(pattern: &str) -> Result<Self, MatchError> {
        Ok(Self::new().add_matcher(match_host(pattern)?))
    }

    /// Mux matching a query parameter against a pattern.
    pub fn query(key: &str, pattern: &str) -> Result<Self, MatchError> {
        Ok(Self::new().add_matcher(match_query(key, pattern)?))
    }

    /// Mux matching a header value against a pattern.
    pub fn header(key: &str, pattern: &str) -> Result<Self, MatchError> {
        Ok(Self::new().add_matcher(match_header(key, pattern)?))
    }

    /// AND-extend the matcher list with one matcher.
    pub fn add_matcher(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// AND-extend the matcher list. All matchers must pass.
    pub fn every<I>(mut self, matchers: I) -> Self
    where
        I: IntoIterator<Item = Matcher>,
    {
        self.matchers.extend(matchers);
        self
    }

    /// Add a single synthesized matcher that passes when at least one of
    /// the given matchers passes.
    pub fn some<I>(self, matchers: I) -> Self
    where
        I: IntoIterator<Item = Matcher>,
    {
        let matchers: Vec<Matcher> = matchers.into_iter().collect();
        self.add_matcher(Arc::new(move |req: &Request| {
            matchers.iter().any(|m| m(req))
        }))
    }

    /// Whether the request passes every registered matcher.
    pub fn matches(&self, req: &Request) -> bool {
        self.matchers.iter().all(|m| m(req))
    }

    /// The matcher list, for composing muxes.
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Register a handler in the owned layer's "request" phase.
    pub fn use_request<Args>(&self, handler: impl IntoMiddleware<Args>) {
        self.layer.use_request(handler);
    }

    /// Register a handler in a specific phase of the owned layer.
    pub fn use_phase<Args>(&self, phase: &str, handler: impl IntoMiddleware<Args>) {
        self.layer.use_phase(phase, handler);
    }

    /// Replace the owned layer's terminal handler.
    pub fn use_final_handler(&self, handler: ArcHandler) {
        self.layer.use_final_handler(handler);
    }

    /// The owned middleware layer.
    pub fn layer(&self) -> &Layer {
        &self.layer
    }
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for Mux {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Response> {
        if self.matches(&req) {
            let layer = self.layer.clone();
            Box::pin(async move { layer.run(REQUEST_PHASE, req, Some(next.handler())).await })
        } else {
            Box::pin(async move { next.run(req).await })
        }
    }
}
