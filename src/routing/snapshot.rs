//! Configuration snapshot and backend groups.

use super::rule::Rule;
use crate::load_balancer::{LoadBalancer, Strategy};
use http::Uri;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An immutable configuration snapshot.
///
/// Replaced as a whole on reload; readers hold an `Arc` to one snapshot
/// for the duration of a request.
#[derive(Debug)]
pub struct Config {
    /// Listening port. Port 0 delegates the choice to the OS.
    pub port: u16,
    /// Backend groups, in document order.
    pub backend_groups: Vec<Arc<BackendGroup>>,
    /// Routing rules, in document order. The first matching rule wins.
    pub rules: Vec<Rule>,
}

impl Config {
    /// Find the first rule matching the request's host and path.
    #[must_use]
    pub fn first_matching_rule(&self, host: &str, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(host, path))
    }
}

/// Active health check parameters for a backend group.
#[derive(Debug, Clone)]
pub struct HealthCheckSpec {
    /// Probe path, starting with `/`.
    pub path: String,
    /// Time between probes. Strictly greater than `timeout`, so probes
    /// never overlap themselves.
    pub interval: Duration,
    /// Per-probe deadline.
    pub timeout: Duration,
    /// Consecutive failures before a healthy backend is marked unhealthy.
    pub retries: u32,
}

/// A named, ordered set of backends sharing a load balancing strategy.
#[derive(Debug)]
pub struct BackendGroup {
    /// Group name, unique within a snapshot.
    name: String,
    /// Backend URLs (absolute, http scheme), in document order.
    servers: Vec<Uri>,
    /// The group's balancer. Stateful; access is serialized here.
    lb: Mutex<Box<dyn LoadBalancer>>,
    /// Optional active health check parameters.
    health_check: Option<HealthCheckSpec>,
}

impl BackendGroup {
    /// Create a group, instantiating its load balancer from the strategy.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        servers: Vec<Uri>,
        strategy: Strategy,
        health_check: Option<HealthCheckSpec>,
    ) -> Self {
        let lb = strategy.instantiate(servers.clone());
        Self {
            name: name.into(),
            servers,
            lb: Mutex::new(lb),
            health_check,
        }
    }

    /// Get the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the backend URLs in document order.
    #[must_use]
    pub fn servers(&self) -> &[Uri] {
        &self.servers
    }

    /// Get the health check parameters, if configured.
    #[must_use]
    pub fn health_check(&self) -> Option<&HealthCheckSpec> {
        self.health_check.as_ref()
    }

    /// Advance the group's balancer by one and return the selected
    /// backend. Concurrent callers observe distinct cursor positions.
    #[must_use]
    pub fn next_backend(&self) -> Uri {
        self.lb.lock().expect("load balancer lock poisoned").next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_group(name: &str, count: usize) -> Arc<BackendGroup> {
        let servers: Vec<Uri> = (0..count)
            .map(|i| format!("http://10.0.0.{}:8080", i + 1).parse().unwrap())
            .collect();
        Arc::new(BackendGroup::new(name, servers, Strategy::RoundRobin, None))
    }

    #[test]
    fn test_next_backend_advances_by_one() {
        let group = make_group("web", 2);
        let first = group.next_backend();
        let second = group.next_backend();
        let third = group.next_backend();

        assert_ne!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_first_matching_rule_in_declared_order() {
        let api = make_group("api", 1);
        let web = make_group("web", 1);
        let config = Config {
            port: 0,
            backend_groups: vec![Arc::clone(&api), Arc::clone(&web)],
            rules: vec![
                Rule::new("", "/api", Arc::clone(&api), Vec::new(), Vec::new()),
                Rule::new("", "", Arc::clone(&web), Vec::new(), Vec::new()),
            ],
        };

        let matched = config.first_matching_rule("example.com", "/api").unwrap();
        assert_eq!(matched.backend_group().name(), "api");

        let fallback = config.first_matching_rule("example.com", "/other").unwrap();
        assert_eq!(fallback.backend_group().name(), "web");
    }

    #[test]
    fn test_no_rule_matches() {
        let api = make_group("api", 1);
        let config = Config {
            port: 0,
            backend_groups: vec![Arc::clone(&api)],
            rules: vec![Rule::new("", "/api", api, Vec::new(), Vec::new())],
        };

        assert!(config.first_matching_rule("example.com", "/other").is_none());
    }

    #[test]
    fn test_empty_rule_set_matches_nothing() {
        let config = Config {
            port: 0,
            backend_groups: vec![make_group("web", 1)],
            rules: Vec::new(),
        };

        assert!(config.first_matching_rule("example.com", "/").is_none());
    }
}
