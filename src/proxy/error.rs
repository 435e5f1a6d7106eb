//! Error types for the forwarding engine.

use thiserror::Error;

/// Errors that can occur while forwarding a request.
///
/// Handlers map these to HTTP status codes and never abort the process.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No routing rule matched the request. Answered with 404.
    #[error("no matching rule for {method} {path}")]
    NoMatchingRule {
        /// HTTP method.
        method: String,
        /// Request path.
        path: String,
    },

    /// Every backend of the selected group is unhealthy. Answered with
    /// 503.
    #[error("no healthy backend in group '{0}'")]
    NoHealthyBackend(String),

    /// The upstream exchange failed. Answered with 502.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// The rewritten upstream URI did not parse.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),
}

/// Result type for forwarding operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProxyError::NoMatchingRule {
            method: "GET".to_string(),
            path: "/api".to_string(),
        };
        assert_eq!(err.to_string(), "no matching rule for GET /api");
    }
}
