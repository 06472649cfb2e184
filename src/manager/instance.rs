//! Managed engine instances.

use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::layer::{BoxFuture, IntoMiddleware, Middleware, Next, Request, Response};
use crate::manager::Scope;
use crate::options::Options;

/// A managed engine registration.
///
/// Each instance carries its own scope collection, applied to traffic of the
/// engine it was attached to, independently of the manager's global scopes.
pub struct Instance {
    id: String,
    name: String,
    description: String,
    metadata: RwLock<Options>,
    scopes: RwLock<Vec<Arc<Scope>>>,
}

impl Instance {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            description: description.into(),
            metadata: RwLock::new(Options::new()),
            scopes: RwLock::new(Vec::new()),
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

    /// Snapshot of the instance metadata.
    pub fn metadata(&self) -> Options {
        self.metadata.read().clone()
    }

    /// Set one metadata entry.
    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.write().set(key, value);
    }

    /// Create and register a scope local to this instance.
    pub fn new_scope(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Arc<Scope> {
        self.use_scope(Scope::new(name, description))
    }

    /// Register an existing scope.
    pub fn use_scope(&self, scope: Scope) -> Arc<Scope> {
        let scope = Arc::new(scope);
        self.scopes.write().push(scope.clone());
        scope
    }

    /// Look up a scope by id or, failing that, by name.
    pub fn get_scope(&self, id_or_name: &str) -> Option<Arc<Scope>> {
        let scopes = self.scopes.read();
        scopes
            .iter()
            .find(|s| s.id() == id_or_name)
            .or_else(|| scopes.iter().find(|s| s.name() == id_or_name))
            .cloned()
    }

    /// Remove a scope by id or name. Returns whether anything was removed.
    pub fn remove_scope(&self, id_or_name: &str) -> bool {
        let mut scopes = self.scopes.write();
        let before = scopes.len();
        scopes.retain(|s| s.id() != id_or_name && s.name() != id_or_name);
        scopes.len() != before
    }

    /// Snapshot of the scope list in registration order.
    pub fn scopes(&self) -> Vec<Arc<Scope>> {
        self.scopes.read().clone()
    }
}

impl Middleware for Instance {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Response> {
        let snapshot = self.scopes();
        Box::pin(async move {
            let mut chain = next.handler();
            for scope in snapshot.into_iter().rev() {
                chain = scope.into_middleware()(chain);
            }
            chain.call(req).await
        })
    }
}
