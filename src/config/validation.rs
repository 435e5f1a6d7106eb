//! Configuration document validation.
//!
//! Checks the decoded document for semantic correctness before resolution.
//! Errors carry a path-indexed message naming the offending field
//! (`rule 2: path must start with /`). Validation is total: a document
//! that passes here resolves without failure.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BackendGroupDoc, ConfigDocument, HealthCheckDoc, OperationDoc, RuleDoc};
use crate::load_balancer::Strategy;
use http::header::{HeaderName, HeaderValue};
use regex::Regex;
use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;
use std::time::Duration;

/// RFC 1035 label sequence: alphanumeric plus hyphen, labels of 1-63
/// characters, no leading or trailing hyphen.
static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)*[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
    )
    .unwrap()
});

/// Validate a configuration document.
///
/// # Errors
///
/// Returns a [`ConfigError::ValidationError`] naming the first offending
/// field.
pub fn validate(document: &ConfigDocument) -> ConfigResult<()> {
    if document.backend_groups.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one backend group must be defined".to_string(),
        ));
    }
    if document.rules.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one rule must be defined".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    for (i, group) in document.backend_groups.iter().enumerate() {
        validate_backend_group(group)
            .map_err(|e| ConfigError::ValidationError(format!("backend group {i}: {e}")))?;
        if !seen_names.insert(group.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "backend group {i}: duplicate name \"{}\"",
                group.name
            )));
        }
    }

    for (i, rule) in document.rules.iter().enumerate() {
        validate_rule(rule).map_err(|e| ConfigError::ValidationError(format!("rule {i}: {e}")))?;

        if !document
            .backend_groups
            .iter()
            .any(|g| g.name == rule.backend_group)
        {
            return Err(ConfigError::ValidationError(format!(
                "rule {i}: backend group \"{}\" not found",
                rule.backend_group
            )));
        }
    }

    Ok(())
}

fn validate_backend_group(group: &BackendGroupDoc) -> Result<(), String> {
    if group.name.is_empty() {
        return Err("name is required".to_string());
    }
    if group.servers.is_empty() {
        return Err("at least one server must be defined".to_string());
    }

    for (j, server) in group.servers.iter().enumerate() {
        let address = server.strip_prefix("http://").unwrap_or(server);
        if !is_valid_host(address) {
            return Err(format!(
                "server {j} \"{server}\" must be in format [hostname|IP:port]"
            ));
        }
    }

    if Strategy::from_name(&group.load_balancing).is_none() {
        return Err(format!(
            "invalid load balancing type \"{}\"",
            group.load_balancing
        ));
    }

    if let Some(health_check) = &group.health_check {
        validate_health_check(health_check).map_err(|e| format!("health check: {e}"))?;
    }

    Ok(())
}

fn validate_health_check(health_check: &HealthCheckDoc) -> Result<(), String> {
    if !health_check.path.starts_with('/') {
        return Err(format!(
            "path \"{}\" must start with /",
            health_check.path
        ));
    }

    let interval = parse_duration(&health_check.interval, "interval")?;
    let timeout = parse_duration(&health_check.timeout, "timeout")?;
    if timeout >= interval {
        return Err(format!(
            "invalid timeout \"{}\": must be less than interval \"{}\"",
            health_check.timeout, health_check.interval
        ));
    }

    if health_check.retries == 0 {
        return Err("retries must be at least 1".to_string());
    }

    Ok(())
}

fn validate_rule(rule: &RuleDoc) -> Result<(), String> {
    if rule.host.is_empty() && rule.path.is_empty() {
        return Err("either host or path must be specified".to_string());
    }

    if !rule.host.is_empty() && !is_valid_host(&rule.host) {
        return Err(format!(
            "host \"{}\" must be in format [hostname|IP:port]",
            rule.host
        ));
    }

    if !rule.path.is_empty() && !rule.path.starts_with('/') {
        return Err("path must start with /".to_string());
    }

    if rule.backend_group.is_empty() {
        return Err("backend_group is required".to_string());
    }

    for (j, op) in rule.request_operations.iter().enumerate() {
        validate_operation(op).map_err(|e| format!("request operation {j}: {e}"))?;
    }
    for (j, op) in rule.response_operations.iter().enumerate() {
        validate_operation(op).map_err(|e| format!("response operation {j}: {e}"))?;
    }

    Ok(())
}

fn validate_operation(op: &OperationDoc) -> Result<(), String> {
    match op {
        OperationDoc::AddHeader { header, value } => {
            if header.is_empty() {
                return Err("header is missing".to_string());
            }
            if value.is_empty() {
                return Err("value is missing".to_string());
            }
            if header.parse::<HeaderName>().is_err() {
                return Err(format!("invalid header name \"{header}\""));
            }
            if value.parse::<HeaderValue>().is_err() {
                return Err(format!("invalid value for header \"{header}\""));
            }
            Ok(())
        },
    }
}

fn parse_duration(value: &str, field: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value)
        .map_err(|e| format!("invalid {field} \"{value}\": {e}"))?;
    if duration.is_zero() {
        return Err(format!(
            "invalid {field} \"{value}\": must be greater than 0"
        ));
    }
    Ok(duration)
}

/// Check that an address is a DNS name or IP literal, optionally followed
/// by a port in [1, 65535].
fn is_valid_host(addr: &str) -> bool {
    if addr.is_empty() {
        return false;
    }

    // Bracketed IPv6, with or without port: [::1] or [::1]:8080
    if let Some(rest) = addr.strip_prefix('[') {
        let Some((host, suffix)) = rest.split_once(']') else {
            return false;
        };
        if host.parse::<Ipv6Addr>().is_err() {
            return false;
        }
        return match suffix.strip_prefix(':') {
            Some(port) => is_valid_port(port),
            None => suffix.is_empty(),
        };
    }

    // More than one colon without brackets: a bare IPv6 literal.
    if addr.matches(':').count() > 1 {
        return addr.parse::<Ipv6Addr>().is_ok();
    }

    if let Some((host, port)) = addr.split_once(':') {
        if !is_valid_port(port) {
            return false;
        }
        return host.parse::<Ipv4Addr>().is_ok() || DNS_NAME.is_match(host);
    }

    addr.parse::<Ipv4Addr>().is_ok() || DNS_NAME.is_match(addr)
}

fn is_valid_port(port: &str) -> bool {
    port.parse::<u16>().is_ok_and(|p| p >= 1)
}
