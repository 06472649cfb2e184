//! HTTP front door.
//!
//! # Responsibilities
//! - Bind the listener and hand every request to the engine pipeline
//! - Apply request timeout and trace layers
//! - Shut down gracefully on ctrl-c

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::engine::Engine;
use crate::layer::Request;

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ServerOptions {
    pub fn bind_addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddr {
                host: self.host.clone(),
                port: self.port,
            })
    }
}

/// Server bring-up and runtime failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address {host}:{port}")]
    InvalidAddr { host: String, port: u16 },
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the router that feeds every request into the engine.
///
/// Each request is tagged with a fresh `x-request-id`, echoed on the
/// response so upstream and client logs can be correlated.
pub fn router(engine: Engine) -> Router {
    Router::new()
        .fallback(move |mut req: Request| {
            let engine = engine.clone();
            async move {
                let id = Uuid::new_v4().simple().to_string();
                if let Ok(value) = id.parse() {
                    req.headers_mut().insert("x-request-id", value);
                }
                let mut res = engine.handle(req).await;
                if let Ok(value) = id.parse() {
                    res.headers_mut().insert("x-request-id", value);
                }
                res
            }
        })
        .layer(TraceLayer::new_for_http())
}

/// Serve the engine until ctrl-c.
pub async fn serve(engine: Engine, options: ServerOptions) -> Result<(), ServerError> {
    let addr = options.bind_addr()?;
    let app = router(engine).layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        options.timeout,
    ));

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
