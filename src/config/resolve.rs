//! Resolution of a validated document into the runtime snapshot.

use super::schema::{ConfigDocument, OperationDoc};
use crate::load_balancer::Strategy;
use crate::operations::{RequestOperation, ResponseOperation};
use crate::routing::{BackendGroup, Config, HealthCheckSpec, Rule};
use http::header::{HeaderName, HeaderValue};
use http::Uri;
use std::collections::HashMap;
use std::sync::Arc;

impl ConfigDocument {
    /// Resolve the document into an immutable [`Config`] snapshot.
    ///
    /// Resolution is pure and always succeeds on a document that passed
    /// [`super::validate`]; the `expect` calls below state the invariants
    /// validation established.
    #[must_use]
    pub fn resolve(&self) -> Config {
        let mut groups_by_name: HashMap<&str, Arc<BackendGroup>> = HashMap::new();
        let mut backend_groups = Vec::with_capacity(self.backend_groups.len());

        for group in &self.backend_groups {
            let servers: Vec<Uri> = group
                .servers
                .iter()
                .map(|server| {
                    let url = if server.starts_with("http://") {
                        server.clone()
                    } else {
                        format!("http://{server}")
                    };
                    url.parse().expect("validated server address must parse as a URL")
                })
                .collect();

            let strategy = Strategy::from_name(&group.load_balancing)
                .expect("validated load balancing type must be recognized");

            let health_check = group.health_check.as_ref().map(|hc| HealthCheckSpec {
                path: hc.path.clone(),
                interval: humantime::parse_duration(&hc.interval)
                    .expect("validated interval must parse"),
                timeout: humantime::parse_duration(&hc.timeout)
                    .expect("validated timeout must parse"),
                retries: hc.retries,
            });

            let resolved = Arc::new(BackendGroup::new(
                group.name.clone(),
                servers,
                strategy,
                health_check,
            ));
            groups_by_name.insert(group.name.as_str(), Arc::clone(&resolved));
            backend_groups.push(resolved);
        }

        let rules = self
            .rules
            .iter()
            .map(|rule| {
                let group = groups_by_name
                    .get(rule.backend_group.as_str())
                    .expect("validated rule must reference an existing group");

                // A path of "/" means "any path"; resolving it to the
                // empty string keeps catch-all rules order-sensitive.
                let path = if rule.path == "/" { "" } else { rule.path.as_str() };

                Rule::new(
                    rule.host.clone(),
                    path,
                    Arc::clone(group),
                    rule.request_operations.iter().map(resolve_request_operation).collect(),
                    rule.response_operations.iter().map(resolve_response_operation).collect(),
                )
            })
            .collect();

        Config {
            port: self.port,
            backend_groups,
            rules,
        }
    }
}

fn resolve_request_operation(op: &OperationDoc) -> RequestOperation {
    match op {
        OperationDoc::AddHeader { header, value } => RequestOperation::AddHeader {
            header: parse_header_name(header),
            value: parse_header_value(value),
        },
    }
}

fn resolve_response_operation(op: &OperationDoc) -> ResponseOperation {
    match op {
        OperationDoc::AddHeader { header, value } => ResponseOperation::AddHeader {
            header: parse_header_name(header),
            value: parse_header_value(value),
        },
    }
}

fn parse_header_name(name: &str) -> HeaderName {
    name.parse().expect("validated header name must parse")
}

fn parse_header_value(value: &str) -> HeaderValue {
    value.parse().expect("validated header value must parse")
}
