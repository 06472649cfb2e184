//! Runtime control plane.
//!
//! # Responsibilities
//! - Track managed engine instances and their scope trees
//! - Hold the global scope and plugin pools applied to managed traffic
//! - Stand up the JSON admin server over its own middleware layer
//!
//! # Data Flow
//! Engine request phase -> Manager middleware (global scopes, global plugins)
//!   -> Instance middleware (instance scopes) -> engine terminal
//! Admin request -> admin Layer -> admin router -> pool mutation

mod instance;
mod scope;

pub use instance::Instance;
pub use scope::Scope;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::engine::Engine;
use crate::http::{ServerError, ServerOptions};
use crate::layer::{
    BoxFuture, IntoMiddleware, Layer, Middleware, Next, Priority, Request, Response, REQUEST_PHASE,
};
use crate::plugins::{Plugin, PluginLayer};
use crate::registry::Registry;

/// Central control plane over one or more managed engines.
pub struct Manager {
    layer: Arc<Layer>,
    plugins: PluginLayer,
    scopes: RwLock<Vec<Arc<Scope>>>,
    instances: RwLock<Vec<Arc<Instance>>>,
    registry: Arc<Registry>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(Arc::new(Registry::with_builtin()))
    }
}

impl Manager {
    /// A manager backed by the given catalog of installable kinds.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            layer: Arc::new(Layer::new()),
            plugins: PluginLayer::new(),
            scopes: RwLock::new(Vec::new()),
            instances: RwLock::new(Vec::new()),
            registry,
        }
    }

    /// The catalog of installable rule and plugin kinds.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The admin middleware layer.
    pub fn layer(&self) -> &Arc<Layer> {
        &self.layer
    }

    /// Attach an engine to this manager.
    ///
    /// Registers the manager's global middleware and a fresh instance as
    /// tail-priority request middleware on the engine, so managed behavior
    /// runs after everything registered directly on the engine.
    pub fn manage(
        self: &Arc<Self>,
        name: impl Into<String>,
        description: impl Into<String>,
        engine: &Engine,
    ) -> Arc<Instance> {
        let instance = Arc::new(Instance::new(name, description));
        engine.use_priority(REQUEST_PHASE, Priority::Tail, self.clone());
        engine.use_priority(REQUEST_PHASE, Priority::Tail, instance.clone());
        self.instances.write().push(instance.clone());
        instance
    }

    /// Create and register a global scope.
    pub fn new_scope(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Arc<Scope> {
        self.use_scope(Scope::new(name, description))
    }

    /// Create and register the catch-all default scope.
    pub fn new_default_scope(&self) -> Arc<Scope> {
        self.new_scope("default", "Default generic scope")
    }

    /// Register an existing scope.
    pub fn use_scope(&self, scope: Scope) -> Arc<Scope> {
        let scope = Arc::new(scope);
        self.scopes.write().push(scope.clone());
        scope
    }

    /// Look up a global scope by id or, failing that, by name.
    pub fn get_scope(&self, id_or_name: &str) -> Option<Arc<Scope>> {
        let scopes = self.scopes.read();
        scopes
            .iter()
            .find(|s| s.id() == id_or_name)
            .or_else(|| scopes.iter().find(|s| s.name() == id_or_name))
            .cloned()
    }

    /// Remove a global scope by id or name. Returns whether anything was
    /// removed.
    pub fn remove_scope(&self, id_or_name: &str) -> bool {
        let mut scopes = self.scopes.write();
        let before = scopes.len();
        scopes.retain(|s| s.id() != id_or_name && s.name() != id_or_name);
        scopes.len() != before
    }

    /// Snapshot of the global scope list in registration order.
    pub fn scopes(&self) -> Vec<Arc<Scope>> {
        self.scopes.read().clone()
    }

    /// Register a global plugin applied to every managed request.
    pub fn use_plugin(&self, plugin: Plugin) -> Arc<Plugin> {
        self.plugins.use_plugin(plugin)
    }

    /// Look up a global plugin by id or name.
    pub fn get_plugin(&self, id_or_name: &str) -> Option<Arc<Plugin>> {
        self.plugins.get(id_or_name)
    }

    /// Remove a global plugin by id.
    pub fn remove_plugin(&self, id: &str) -> bool {
        self.plugins.remove(id)
    }

    /// The global plugin pool.
    pub fn plugins(&self) -> &PluginLayer {
        &self.plugins
    }

    /// Look up an instance by id or, failing that, by name.
    pub fn get_instance(&self, id_or_name: &str) -> Option<Arc<Instance>> {
        let instances = self.instances.read();
        instances
            .iter()
            .find(|i| i.id() == id_or_name)
            .or_else(|| instances.iter().find(|i| i.name() == id_or_name))
            .cloned()
    }

    /// Remove an instance registration by id or name.
    ///
    /// Middleware already registered on the instance's engine keeps running;
    /// removal only detaches the instance from the control plane.
    pub fn remove_instance(&self, id_or_name: &str) -> bool {
        let mut instances = self.instances.write();
        let before = instances.len();
        instances.retain(|i| i.id() != id_or_name && i.name() != id_or_name);
        instances.len() != before
    }

    /// Snapshot of the managed instances in registration order.
    pub fn instances(&self) -> Vec<Arc<Instance>> {
        self.instances.read().clone()
    }

    /// Serve the admin API until ctrl-c.
    pub async fn listen_and_serve(
        self: Arc<Self>,
        options: ServerOptions,
    ) -> Result<(), ServerError> {
        let addr = options.bind_addr()?;
        let app = crate::admin::router(self);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        tracing::info!(%addr, "admin api listening");
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Serve the admin API with default server options.
    pub async fn serve_default(self: Arc<Self>) -> Result<(), ServerError> {
        self.listen_and_serve(ServerOptions::default()).await
    }
}

impl Middleware for Manager {
    fn handle(&self, req: Request, next: Next) -> BoxFuture<Response> {
        let scopes = self.scopes();
        let plugins = self.plugins.all();
        Box::pin(async move {
            let mut chain = next.handler();
            for scope in scopes.into_iter().rev() {
                chain = scope.into_middleware()(chain);
            }
            for plugin in plugins.iter().rev() {
                chain = plugin.handle(chain);
            }
            chain.call(req).await
        })
    }
}
