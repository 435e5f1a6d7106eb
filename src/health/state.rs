//! Per-backend health state.

use crate::routing::BackendGroup;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Health of a single backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendHealth {
    /// Whether the backend currently receives traffic.
    pub healthy: bool,
    /// Consecutive failed probes since the last success.
    pub consecutive_failures: u32,
}

impl Default for BackendHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            consecutive_failures: 0,
        }
    }
}

/// Health state for all backends, keyed by group name and backend URL.
///
/// Reads vastly outnumber writes: every forwarded request may consult the
/// state, while only probe transitions write it.
#[derive(Debug, Default)]
pub struct HealthState {
    inner: RwLock<HashMap<String, HashMap<String, BackendHealth>>>,
}

impl HealthState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the state for a new set of backend groups.
    ///
    /// Entries for `(group, backend)` pairs that survive keep their
    /// current health; new pairs are seeded healthy with zero failures;
    /// removed pairs are dropped.
    pub fn reconcile(&self, groups: &[Arc<BackendGroup>]) {
        let mut inner = self.inner.write().expect("health state lock poisoned");

        let mut next: HashMap<String, HashMap<String, BackendHealth>> = HashMap::new();
        for group in groups {
            let entry = next.entry(group.name().to_string()).or_default();
            for server in group.servers() {
                let key = server.to_string();
                let health = inner
                    .get(group.name())
                    .and_then(|backends| backends.get(&key))
                    .copied()
                    .unwrap_or_default();
                entry.insert(key, health);
            }
        }

        *inner = next;
    }

    /// Check whether a backend is healthy. Unknown backends are healthy.
    #[must_use]
    pub fn is_healthy(&self, group: &str, backend: &str) -> bool {
        self.inner
            .read()
            .expect("health state lock poisoned")
            .get(group)
            .and_then(|backends| backends.get(backend))
            .map_or(true, |health| health.healthy)
    }

    /// Record a successful probe.
    ///
    /// Resets the failure counter; returns `true` when this flipped the
    /// backend from unhealthy to healthy.
    pub fn record_success(&self, group: &str, backend: &str) -> bool {
        let mut inner = self.inner.write().expect("health state lock poisoned");
        let health = inner
            .entry(group.to_string())
            .or_default()
            .entry(backend.to_string())
            .or_default();

        health.consecutive_failures = 0;
        let transitioned = !health.healthy;
        health.healthy = true;
        transitioned
    }

    /// Record a failed probe.
    ///
    /// Increments the failure counter; once it reaches `retries` while
    /// the backend is healthy, flips it to unhealthy and returns `true`.
    pub fn record_failure(&self, group: &str, backend: &str, retries: u32) -> bool {
        let mut inner = self.inner.write().expect("health state lock poisoned");
        let health = inner
            .entry(group.to_string())
            .or_default()
            .entry(backend.to_string())
            .or_default();

        health.consecutive_failures += 1;
        if health.consecutive_failures >= retries && health.healthy {
            health.healthy = false;
            return true;
        }
        false
    }

    /// Get a backend's current health, if tracked.
    #[must_use]
    pub fn get(&self, group: &str, backend: &str) -> Option<BackendHealth> {
        self.inner
            .read()
            .expect("health state lock poisoned")
            .get(group)
            .and_then(|backends| backends.get(backend))
            .copied()
    }
}
