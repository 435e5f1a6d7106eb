//! Configuration document definitions.
//!
//! This module defines the raw YAML document shape. All types derive
//! Serde traits for deserialization; semantic checks live in
//! [`super::validation`] and the conversion to runtime types in the
//! resolver. Every field defaults so that missing values surface as
//! path-indexed validation errors rather than decode errors; the one
//! exception is operation variants, whose unknown `type` tags fail at
//! decode.

use serde::Deserialize;

/// Root configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    /// Listening port. Port 0 delegates the choice to the OS, which is
    /// useful for tests.
    pub port: u16,

    /// Backend group definitions.
    pub backend_groups: Vec<BackendGroupDoc>,

    /// Routing rules, evaluated in declared order.
    pub rules: Vec<RuleDoc>,
}

/// A backend group definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackendGroupDoc {
    /// Group name, unique within the document.
    pub name: String,

    /// Load balancing strategy name. Empty selects `round_robin`.
    pub load_balancing: String,

    /// Server entries of the form `host[:port]` or `ip:port`, with an
    /// optional `http://` prefix.
    pub servers: Vec<String>,

    /// Optional active health check.
    pub health_check: Option<HealthCheckDoc>,
}

/// Health check parameters for a backend group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthCheckDoc {
    /// Probe path, starting with `/`.
    pub path: String,

    /// Probe interval as a duration string (e.g. `2s`, `500ms`).
    pub interval: String,

    /// Per-probe deadline as a duration string. Must be less than the
    /// interval.
    pub timeout: String,

    /// Consecutive failures before a backend is marked unhealthy.
    pub retries: u32,
}

/// A routing rule definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleDoc {
    /// Host to match exactly. Optional if `path` is given.
    pub host: String,

    /// Path to match exactly. Optional if `host` is given; `/` means any
    /// path.
    pub path: String,

    /// Name of the target backend group.
    pub backend_group: String,

    /// Operations applied to the forwarded request, in order.
    pub request_operations: Vec<OperationDoc>,

    /// Operations applied to the upstream response, in order.
    pub response_operations: Vec<OperationDoc>,
}

/// A request or response operation, dispatched on its `type` tag.
///
/// Unknown tags fail at decode, which surfaces as a load error.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationDoc {
    /// Append a header to the request or response.
    AddHeader {
        /// Header name.
        header: String,
        /// Header value.
        value: String,
    },
}
