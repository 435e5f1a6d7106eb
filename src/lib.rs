//! # Switchyard
//!
//! A layer-7 reverse proxy that accepts HTTP requests on a single port,
//! selects a backend group through host/path routing rules, applies
//! per-rule request/response transformations, load-balances across the
//! group, and streams the upstream response back to the caller.
//!
//! ## Features
//!
//! - Ordered host/path routing rules (first match wins)
//! - Round-robin load balancing across backend groups
//! - Active health checks with failure-detection hysteresis
//! - Hot-reloadable YAML configuration (SIGHUP), versioned snapshots
//! - Per-rule request/response header operations
//!
//! ## Architecture
//!
//! The [`config::ConfigManager`] owns the versioned configuration;
//! handlers read a stable snapshot per request. The
//! [`health::HealthChecker`] runs one probe loop per health-checked
//! backend and rebinds its task set when a new snapshot is installed.
//! The [`proxy::Proxy`] ties both to the HTTP server and forwards each
//! request through an injectable [`proxy::BackendClient`].

pub mod config;
pub mod health;
pub mod load_balancer;
pub mod operations;
pub mod proxy;
pub mod routing;

pub use config::{ConfigManager, YamlFileSource};
pub use health::HealthChecker;
pub use proxy::{BackendClient, HttpClient, Proxy};
pub use routing::Config;
