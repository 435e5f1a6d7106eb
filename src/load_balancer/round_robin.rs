//! Round-robin load balancing.

use super::LoadBalancer;
use http::Uri;

/// Round-robin strategy: a cursor over the backend sequence that advances
/// by exactly one per call and wraps around.
#[derive(Debug)]
pub struct RoundRobin {
    /// Ordered backends.
    backends: Vec<Uri>,
    /// Cursor into `backends`.
    current: usize,
}

impl RoundRobin {
    /// Create a new round-robin balancer over the given backends.
    ///
    /// The backend list must be non-empty; configuration validation
    /// guarantees at least one server per group.
    #[must_use]
    pub fn new(backends: Vec<Uri>) -> Self {
        Self {
            backends,
            current: 0,
        }
    }
}

impl LoadBalancer for RoundRobin {
    fn next(&mut self) -> Uri {
        let backend = self.backends[self.current].clone();
        self.current = (self.current + 1) % self.backends.len();
        backend
    }
}
