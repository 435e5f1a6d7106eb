//! Routing rules and request matching.

use super::snapshot::BackendGroup;
use crate::operations::{RequestOperation, ResponseOperation};
use http::{Request, Response};
use std::sync::Arc;

/// A routing rule: an optional exact host match, an optional exact path
/// match, a target backend group, and the operations to apply to the
/// exchange.
///
/// An empty host or path component matches anything; the resolver rewrites
/// a document path of `/` to the empty string so catch-all rules keep
/// their place in first-match-wins ordering.
#[derive(Debug)]
pub struct Rule {
    /// Exact host to match, or empty for any host.
    host: String,
    /// Exact path to match, or empty for any path.
    path: String,
    /// Target backend group.
    backend_group: Arc<BackendGroup>,
    /// Request operations, applied in declared order.
    request_operations: Vec<RequestOperation>,
    /// Response operations, applied in declared order.
    response_operations: Vec<ResponseOperation>,
}

impl Rule {
    /// Create a new rule.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        path: impl Into<String>,
        backend_group: Arc<BackendGroup>,
        request_operations: Vec<RequestOperation>,
        response_operations: Vec<ResponseOperation>,
    ) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            backend_group,
            request_operations,
            response_operations,
        }
    }

    /// Get the target backend group.
    #[must_use]
    pub fn backend_group(&self) -> &Arc<BackendGroup> {
        &self.backend_group
    }

    /// Check whether the rule matches a request's host and path.
    ///
    /// Host comparison is exact and case-sensitive, against the Host
    /// header as sent (including any port). Path comparison is exact; no
    /// prefix semantics.
    #[must_use]
    pub fn matches(&self, host: &str, path: &str) -> bool {
        if !self.host.is_empty() && self.host != host {
            return false;
        }
        if !self.path.is_empty() && self.path != path {
            return false;
        }
        true
    }

    /// Apply the rule's request operations in declared order.
    pub fn apply_request_operations<B>(&self, request: &mut Request<B>) {
        for op in &self.request_operations {
            op.apply(request);
        }
    }

    /// Apply the rule's response operations in declared order.
    pub fn apply_response_operations<B>(&self, response: &mut Response<B>) {
        for op in &self.response_operations {
            op.apply(response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::Strategy;
    use http::header::{HeaderName, HeaderValue};
    use http::Uri;

    fn make_group() -> Arc<BackendGroup> {
        Arc::new(BackendGroup::new(
            "web",
            vec![Uri::from_static("http://10.0.0.1:8080")],
            Strategy::RoundRobin,
            None,
        ))
    }

    fn make_rule(host: &str, path: &str) -> Rule {
        Rule::new(host, path, make_group(), Vec::new(), Vec::new())
    }

    #[test]
    fn test_match_host_and_path() {
        let rule = make_rule("example.com", "/api");

        assert!(rule.matches("example.com", "/api"));
        assert!(!rule.matches("example.com", "/other"));
        assert!(!rule.matches("other.com", "/api"));
    }

    #[test]
    fn test_empty_host_matches_any_host() {
        let rule = make_rule("", "/api");

        assert!(rule.matches("example.com", "/api"));
        assert!(rule.matches("other.com:8080", "/api"));
        assert!(!rule.matches("example.com", "/"));
    }

    #[test]
    fn test_empty_path_matches_any_path() {
        let rule = make_rule("example.com", "");

        assert!(rule.matches("example.com", "/"));
        assert!(rule.matches("example.com", "/anything/at/all"));
        assert!(!rule.matches("other.com", "/"));
    }

    #[test]
    fn test_host_match_is_case_sensitive() {
        let rule = make_rule("example.com", "");
        assert!(!rule.matches("Example.com", "/"));
    }

    #[test]
    fn test_path_match_has_no_prefix_semantics() {
        let rule = make_rule("", "/api");
        assert!(!rule.matches("example.com", "/api/users"));
    }

    #[test]
    fn test_operations_apply_in_declared_order() {
        let ops = vec![
            RequestOperation::AddHeader {
                header: HeaderName::from_static("x-order"),
                value: HeaderValue::from_static("first"),
            },
            RequestOperation::AddHeader {
                header: HeaderName::from_static("x-order"),
                value: HeaderValue::from_static("second"),
            },
        ];
        let rule = Rule::new("", "", make_group(), ops, Vec::new());

        let mut request = Request::builder().body(()).unwrap();
        rule.apply_request_operations(&mut request);

        let values: Vec<_> = request.headers().get_all("x-order").iter().collect();
        assert_eq!(values, vec!["first", "second"]);
    }
}
