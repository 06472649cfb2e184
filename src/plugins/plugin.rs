//! Plugin entity.

use uuid::Uuid;

use crate::layer::{ArcHandler, Transform};
use crate::options::Options;

/// A named, configurable unit of request-handling behavior wrapping a
/// handler-chain transform.
///
/// A plugin's behavior is fixed by its captured configuration; the entity
/// itself holds no other mutable state.
pub struct Plugin {
    id: String,
    name: String,
    description: String,
    options: Options,
    metadata: Options,
    transform: Transform,
}

impl Plugin {
    /// Create a plugin with an empty option bag.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        transform: Transform,
    ) -> Self {
        Self::with_options(name, description, Options::new(), transform)
    }

    /// Create a plugin carrying the options it was configured with.
    pub fn with_options(
        name: impl Into<String>,
        description: impl Into<String>,
        options: Options,
        transform: Transform,
    ) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            description: description.into(),
            options,
            metadata: Options::new(),
            transform,
        }
    }

    /// Attach free-form metadata.
    pub fn with_metadata(mut self, metadata: Options) -> Self {
        self.metadata = metadata;
        self
    }

    /// Unique identifier assigned at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Semantic name identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human friendly description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The configuration the plugin was built from.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Free-form metadata.
    pub fn metadata(&self) -> &Options {
        &self.metadata
    }

    /// Wrap `next` with the plugin's transform.
    pub fn handle(&self, next: ArcHandler) -> ArcHandler {
        (self.transform)(next)
    }
}
