//! Request matcher predicates.
//!
//! # Responsibilities
//! - Match method, path, host, query params and headers
//! - Short-circuit on exact equality before falling back to the pattern
//!
//! # Design Decisions
//! - Patterns are regular expressions compiled at construction; an invalid
//!   pattern is a configuration error returned as `Result`, never a panic
//! - Matchers are pure `Fn(&Request) -> bool` and carry no mutable state

use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::layer::Request;

/// Boolean predicate over an incoming request.
pub type Matcher = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Invalid matcher configuration.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The supplied pattern is not a valid regular expression.
    #[error("invalid match pattern {pattern:?}: {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Compilation failure reported by the regex engine.
        source: regex::Error,
    },
}

fn compile(pattern: &str) -> Result<Regex, MatchError> {
    Regex::new(pattern).map_err(|source| MatchError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Match the HTTP method against any of the given names.
pub fn match_method<I, S>(methods: I) -> Matcher
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let methods: Vec<String> = methods.into_iter().map(Into::into).collect();
    Arc::new(move |req: &Request| methods.iter().any(|m| req.method().as_str() == m))
}

/// Match the request path against the given pattern.
pub fn match_path(pattern: &str) -> Result<Matcher, MatchError> {
    let exact = pattern.to_string();
    let rex = compile(pattern)?;
    Ok(Arc::new(move |req: &Request| {
        let path = req.uri().path();
        path == exact || rex.is_match(path)
    }))
}

/// Match the request host against the given pattern. The URI authority is
/// preferred; the Host header is the fallback.
pub fn match_host(pattern: &str) -> Result<Matcher, MatchError> {
    let exact = pattern.to_string();
    let rex = compile(pattern)?;
    Ok(Arc::new(move |req: &Request| {
        if let Some(host) = req.uri().host() {
            if host == exact || rex.is_match(host) {
                return true;
            }
        }
        req.headers()
            .get(axum::http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|host| host == exact || rex.is_match(host))
    }))
}

/// Match a query string parameter against the given pattern.
pub fn match_query(key: &str, pattern: &str) -> Result<Matcher, MatchError> {
    let key = key.to_string();
    let rex = compile(pattern)?;
    Ok(Arc::new(move |req: &Request| {
        let Some(query) = req.uri().query() else {
            return false;
        };
        url::form_urlencoded::parse(query.as_bytes())
            .any(|(k, v)| k == key.as_str() && rex.is_match(&v))
    }))
}

/// Match a header value against the given pattern.
pub fn match_header(key: &str, pattern: &str) -> Result<Matcher, MatchError> {
    let key = key.to_string();
    let rex = compile(pattern)?;
    Ok(Arc::new(move |req: &Request| {
        req.headers()
            .get(key.as_str())
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| rex.is_match(v))
    }))
}
