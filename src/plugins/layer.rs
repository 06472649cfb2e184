//! Plugin pool with chained execution.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::layer::{BoxFuture, Middleware, Next, Request, Response};
use crate::plugins::Plugin;

/// Ordered pool of plugins executed as a nested handler chain.
///
/// Plugins run in registration order: the first plugin registered sits
/// outermost and sees the request first. Each plugin decides whether to call
/// further down the chain; a plugin that short-circuits suppresses every
/// plugin registered after it.
#[derive(Default)]
pub struct PluginLayer {
    pool: RwLock<Vec<Arc<Plugin>>>,
}

impl PluginLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin to the pool.
    pub fn use_plugin(&self, plugin: Plugin) -> Arc<Plugin> {
        let plugin = Arc::new(plugin);
        self.pool.write().push(plugin.clone());
        plugin
    }

    /// Remove a plugin by id. Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut pool = self.pool.write();
        let before = pool.len();
        pool.retain(|p| p.id() != id);
        pool.len() != before
    }

    /// Look up a plugin by id or, failing that, by name.
    pub fn get(&self, id_or_name: &str) -> Option<Arc<Plugin>> {
        let pool = self.pool.read();
        pool.iter()
            .find(|p| p.id() == id_or_name)
            .or_else(|| pool.iter().find(|p| p.name() == id_or_name))
            .cloned()
    }

    /// Snapshot of the pool in registration order.
    pub fn all(&self) -> Vec<Arc<Plugin>> {
        self.pool.read().clone()
    }

    pub fn len(&self) -> usize {
        self.pool.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.read().is_empty()
    }

    /// Drop every plugin.
    pub fn flush(&self) {
        self.pool.write().clear();
    }

    /// Run the request through the chain, ending at `next`.
    ///
    /// The pool is snapshotted up front, so plugins added or removed during
    /// execution do not affect in-flight requests.
    pub async fn run(&self, req: Request, next: Next) -> Response {
        let snapshot = self.all();
        let mut chain = next.handler();
        for plugin in snapshot.iter().rev() {
            chain = plugin.handle(chain);
        }
        chain.call(req).await
    }
}

impl Middleware for PluginLayer {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Response> {
        let snapshot = self.all();
        Box::pin(async move {
            let mut chain = next.handler();
            for plugin in snapshot.iter().rev() {
                chain = plugin.handle(chain);
            }
            chain.call(req).await
        })
    }
}
