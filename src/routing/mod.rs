//! Resolved routing state.
//!
//! The types here form the immutable configuration snapshot the
//! forwarding engine reads on every request: backend groups with their
//! load balancers, and ordered routing rules. Snapshots are produced by
//! the configuration resolver and published by the configuration manager;
//! they are never mutated after publication.

mod rule;
mod snapshot;

pub use rule::Rule;
pub use snapshot::{BackendGroup, Config, HealthCheckSpec};
