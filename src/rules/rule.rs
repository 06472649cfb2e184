//! Traffic rule entity.

use uuid::Uuid;

use crate::layer::Request;
use crate::mux::Matcher;
use crate::options::Options;

/// A predicate over incoming traffic plus identity metadata.
///
/// Rules are immutable after construction: the matcher and options are
/// fixed, only the generated id distinguishes two rules built from the
/// same descriptor.
pub struct Rule {
    id: String,
    name: String,
    description: String,
    options: Options,
    matcher: Matcher,
}

impl Rule {
    /// Create a rule with an empty option bag.
    pub fn new(name: impl Into<String>, description: impl Into<String>, matcher: Matcher) -> Self {
        Self::with_options(name, description, Options::new(), matcher)
    }

    /// Create a rule carrying the options it was configured with.
    pub fn with_options(
        name: impl Into<String>,
        description: impl Into<String>,
        options: Options,
        matcher: Matcher,
    ) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            description: description.into(),
            options,
            matcher,
        }
    }

    /// Unique identifier assigned at construction.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Semantic alias.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human friendly description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The configuration the rule was built from.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether the request passes the rule assertion.
    pub fn matches(&self, req: &Request) -> bool {
        (self.matcher)(req)
    }
}
