//! Cross-cutting observability.
//!
//! Structured logs go through `tracing` (the subscriber is installed by the
//! binary); request metrics are recorded here and exposed on a dedicated
//! Prometheus scrape endpoint.

pub mod metrics;
