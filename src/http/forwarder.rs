//! Upstream request forwarding.

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use axum::http::{header, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::layer::{Request, Response};

/// Invalid forwarding target.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid forward target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// Proxies requests to a fixed upstream, rewriting scheme and authority
/// while preserving the original path and query.
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    scheme: Scheme,
    authority: Authority,
}

impl Forwarder {
    /// Build a forwarder for the given target, e.g. `http://127.0.0.1:9000`.
    pub fn new(target: &str) -> Result<Self, ForwardError> {
        let uri: Uri = target.parse().map_err(|e| ForwardError::InvalidTarget {
            target: target.to_owned(),
            reason: format!("{e}"),
        })?;
        let scheme = uri
            .scheme()
            .cloned()
            .ok_or_else(|| ForwardError::InvalidTarget {
                target: target.to_owned(),
                reason: "missing scheme".to_owned(),
            })?;
        let authority = uri
            .authority()
            .cloned()
            .ok_or_else(|| ForwardError::InvalidTarget {
                target: target.to_owned(),
                reason: "missing host".to_owned(),
            })?;

        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self {
            client,
            scheme,
            authority,
        })
    }

    /// The upstream authority requests are sent to.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Send the request upstream and return the upstream response.
    ///
    /// Upstream failures are reported as 502 rather than propagated, so a
    /// dead backend degrades the response instead of the pipeline.
    pub async fn forward(&self, mut req: Request) -> Response {
        let path_and_query = req
            .uri()
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        let uri = match Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
        {
            Ok(uri) => uri,
            Err(error) => {
                tracing::error!(%error, "failed to build upstream uri");
                return bad_gateway();
            }
        };

        *req.uri_mut() = uri;
        if let Ok(host) = self.authority.as_str().parse() {
            req.headers_mut().insert(header::HOST, host);
        }

        metrics::counter!("stratum_forwarded_requests_total").increment(1);
        match self.client.request(req).await {
            Ok(res) => res.map(Body::new),
            Err(error) => {
                metrics::counter!("stratum_upstream_failures_total").increment(1);
                tracing::error!(%error, upstream = %self.authority, "upstream request failed");
                bad_gateway()
            }
        }
    }
}

fn bad_gateway() -> Response {
    let mut res = Response::new(Body::from("stratum: upstream unavailable"));
    *res.status_mut() = StatusCode::BAD_GATEWAY;
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_scheme_and_authority() {
        let f = Forwarder::new("http://127.0.0.1:9000").unwrap();
        assert_eq!(f.authority().as_str(), "127.0.0.1:9000");
    }

    #[test]
    fn rejects_targets_without_scheme() {
        assert!(Forwarder::new("127.0.0.1:9000").is_err());
        assert!(Forwarder::new("not a url").is_err());
    }
}
