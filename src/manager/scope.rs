//! Scoped rule and plugin composition.

use uuid::Uuid;

use crate::layer::{BoxFuture, Middleware, Next, Request, Response};
use crate::plugins::{Plugin, PluginLayer};
use crate::rules::{Rule, RuleLayer};

use std::sync::Arc;

/// A conditional plugin group: plugins that only run when every rule in the
/// scope matches the request.
///
/// A scope with zero rules matches everything.
pub struct Scope {
    id: String,
    name: String,
    description: String,
    rules: RuleLayer,
    plugins: PluginLayer,
}

impl Scope {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            description: description.into(),
            rules: RuleLayer::new(),
            plugins: PluginLayer::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Register a rule gating this scope.
    pub fn use_rule(&self, rule: Rule) -> Arc<Rule> {
        self.rules.use_rule(rule)
    }

    /// Register a plugin executed when the scope matches.
    pub fn use_plugin(&self, plugin: Plugin) -> Arc<Plugin> {
        self.plugins.use_plugin(plugin)
    }

    pub fn remove_rule(&self, id: &str) -> bool {
        self.rules.remove(id)
    }

    pub fn remove_plugin(&self, id: &str) -> bool {
        self.plugins.remove(id)
    }

    /// The scope's rule pool.
    pub fn rules(&self) -> &RuleLayer {
        &self.rules
    }

    /// The scope's plugin pool.
    pub fn plugins(&self) -> &PluginLayer {
        &self.plugins
    }

    pub fn flush_rules(&self) {
        self.rules.flush();
    }

    pub fn flush_plugins(&self) {
        self.plugins.flush();
    }

    /// Whether every registered rule accepts the request.
    pub fn matches(&self, req: &Request) -> bool {
        self.rules.matches(req)
    }
}

impl Middleware for Scope {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Response> {
        if self.matches(&req) {
            self.plugins.handle(req, next)
        } else {
            Box::pin(async move { next.run(req).await })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{handler_fn, transform_fn};
    use crate::mux::match_path;
    use axum::body::Body;
    use http_body_util::BodyExt;

    fn tagging(tag: &'static str) -> Plugin {
        Plugin::new(
            tag,
            "",
            transform_fn(move |next| {
                handler_fn(move |mut req: Request| {
                    let next = next.clone();
                    async move {
                        req.headers_mut().append("x-tag", tag.parse().unwrap());
                        next.call(req).await
                    }
                })
            }),
        )
    }

    fn echo_tags() -> Next {
        Next::new(handler_fn(|req: Request| async move {
            let tags: Vec<_> = req
                .headers()
                .get_all("x-tag")
                .iter()
                .map(|v| v.to_str().unwrap().to_owned())
                .collect();
            Response::new(Body::from(tags.join(",")))
        }))
    }

    fn get(uri: &str) -> Request {
        let mut req = Request::new(Body::empty());
        *req.uri_mut() = uri.parse().unwrap();
        req
    }

    #[tokio::test]
    async fn matching_scope_runs_its_plugins() {
        let scope = Scope::new("admin", "admin traffic");
        scope.use_rule(Rule::new("path", "", match_path("/admin(/.*)?").unwrap()));
        scope.use_plugin(tagging("admin"));

        let res = scope.handle(get("/admin/users"), echo_tags()).await;
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"admin");
    }

    #[tokio::test]
    async fn mismatching_scope_passes_through_untouched() {
        let scope = Scope::new("admin", "");
        scope.use_rule(Rule::new("path", "", match_path("/admin(/.*)?").unwrap()));
        scope.use_plugin(tagging("admin"));

        let res = scope.handle(get("/public"), echo_tags()).await;
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"");
    }

    #[tokio::test]
    async fn scope_without_rules_matches_everything() {
        let scope = Scope::new("default", "");
        scope.use_plugin(tagging("always"));

        let res = scope.handle(get("/anything"), echo_tags()).await;
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"always");
    }
}
