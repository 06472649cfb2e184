//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! engine / forwarder / admin produce:
//!     -> logging.rs (structured log events)
//!     -> metrics.rs (counters, histograms)
//!
//! Consumers:
//!     -> stdout (pretty or JSON lines)
//!     -> Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
