//! The backend client capability.

use super::body::ProxyBody;
use super::error::{ProxyError, ProxyResult};
use async_trait::async_trait;
use http::{Request, Response};
use http_body_util::BodyExt;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

/// Capability to send a request to a backend.
///
/// The forwarding engine and the health checker depend on this trait
/// rather than on a concrete HTTP client, so tests can substitute mock
/// backends.
#[async_trait]
pub trait BackendClient: Send + Sync + std::fmt::Debug {
    /// Send the request upstream and return the response.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Upstream`] on any transport failure.
    async fn send(&self, request: Request<ProxyBody>) -> ProxyResult<Response<ProxyBody>>;
}

/// Bundled [`BackendClient`] backed by a pooling hyper client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpConnector, ProxyBody>,
}

impl HttpClient {
    /// Create a new client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendClient for HttpClient {
    async fn send(&self, request: Request<ProxyBody>) -> ProxyResult<Response<ProxyBody>> {
        let response = self
            .inner
            .request(request)
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        Ok(response.map(BodyExt::boxed))
    }
}
