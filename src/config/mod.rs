//! # Configuration System
//!
//! YAML-based configuration for the proxy: document decoding, semantic
//! validation, resolution into an immutable runtime snapshot, and the
//! versioned manager that hot-reloads the snapshot on SIGHUP.
//!
//! ## Example Configuration
//!
//! ```yaml
//! port: 8080
//! backend_groups:
//!   - name: web
//!     load_balancing: round_robin
//!     servers: ["127.0.0.1:9001", "127.0.0.1:9002"]
//!     health_check:
//!       path: /health
//!       interval: 2s
//!       timeout: 500ms
//!       retries: 3
//! rules:
//!   - path: /
//!     backend_group: web
//!     response_operations:
//!       - type: add_header
//!         header: X-Served-By
//!         value: switchyard
//! ```

mod error;
mod manager;
mod resolve;
mod schema;
mod source;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use manager::ConfigManager;
pub use schema::{BackendGroupDoc, ConfigDocument, HealthCheckDoc, OperationDoc, RuleDoc};
pub use source::{ConfigSource, YamlFileSource};
pub use validation::validate;
