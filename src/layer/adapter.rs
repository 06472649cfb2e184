//! Adaptation of the supported handler shapes into chain transforms.
//!
//! # Responsibilities
//! - Accept the closed set of registrable shapes at `use_*` call sites
//! - Normalize every shape into the canonical `Transform`
//!
//! # Design Decisions
//! - A closed adapter trait instead of runtime duck typing: an unsupported
//!   shape is a compile error, not a startup panic
//! - `Args` is an inference marker (the axum `Handler<T>` pattern) so the
//!   explicit-next and terminal-only function shapes can coexist

use std::future::Future;
use std::sync::Arc;

use super::handler::{ArcHandler, Middleware, Next, Request, Response, Transform};

/// Conversion of a registrable value into a chain transform.
///
/// Supported shapes:
/// - `async fn(Request, Next) -> Response`: explicit-next middleware
/// - `async fn(Request) -> Response`: terminal handler, the chain stops
///   here and `next` is never invoked
/// - [`Transform`]: raw `fn(next) -> handler` transform
/// - `Arc<M>` where `M: Middleware`: middleware objects (mux, plugin
///   layer, control plane entities)
pub trait IntoMiddleware<Args> {
    /// Produce the canonical chain transform.
    fn into_middleware(self) -> Transform;
}

/// Marker for the raw transform shape.
pub struct ViaTransform(());

/// Marker for `Middleware` trait objects.
pub struct ViaMiddleware(());

impl<F, Fut> IntoMiddleware<(Request, Next)> for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn into_middleware(self) -> Transform {
        let f = Arc::new(self);
        Arc::new(move |next: ArcHandler| {
            let f = f.clone();
            let next = Next::new(next);
            Arc::new(move |req: Request| f(req, next.clone())) as ArcHandler
        })
    }
}

impl<F, Fut> IntoMiddleware<(Request,)> for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn into_middleware(self) -> Transform {
        let handler: ArcHandler = Arc::new(self);
        Arc::new(move |_next: ArcHandler| handler.clone())
    }
}

impl IntoMiddleware<ViaTransform> for Transform {
    fn into_middleware(self) -> Transform {
        self
    }
}

impl<M> IntoMiddleware<ViaMiddleware> for Arc<M>
where
    M: Middleware + ?Sized + 'static,
{
    fn into_middleware(self) -> Transform {
        Arc::new(move |next: ArcHandler| {
            let m = self.clone();
            let next = Next::new(next);
            Arc::new(move |req: Request| m.handle(req, next.clone())) as ArcHandler
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::handler::{handler_fn, BoxFuture};
    use axum::body::Body;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    async fn body_text(res: Response) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn terminal() -> ArcHandler {
        handler_fn(|_req| async { Response::new(Body::from("terminal")) })
    }

    #[tokio::test]
    async fn adapts_explicit_next_functions() {
        let mw = (|req: Request, next: Next| async move {
            let mut res = next.run(req).await;
            res.headers_mut().insert("x-seen", "1".parse().unwrap());
            res
        })
        .into_middleware();

        let chain = mw(terminal());
        let res = chain.call(Request::new(Body::empty())).await;
        assert_eq!(res.headers()["x-seen"], "1");
        assert_eq!(body_text(res).await, "terminal");
    }

    #[tokio::test]
    async fn adapts_terminal_functions_and_stops_the_chain() {
        let mw = (|_req: Request| async {
            let mut res = Response::new(Body::from("short-circuit"));
            *res.status_mut() = StatusCode::FORBIDDEN;
            res
        })
        .into_middleware();

        let chain = mw(terminal());
        let res = chain.call(Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(res).await, "short-circuit");
    }

    #[tokio::test]
    async fn adapts_middleware_objects() {
        struct Tagger;

        impl Middleware for Tagger {
            fn handle(&self, req: Request, next: Next) -> BoxFuture<Response> {
                Box::pin(async move {
                    let mut res = next.run(req).await;
                    res.headers_mut().insert("x-tag", "obj".parse().unwrap());
                    res
                })
            }
        }

        let mw = Arc::new(Tagger).into_middleware();
        let res = mw(terminal()).call(Request::new(Body::empty())).await;
        assert_eq!(res.headers()["x-tag"], "obj");
    }
}
