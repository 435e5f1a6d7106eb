//! HTTP server and per-request forwarding.

use super::body::{empty, ProxyBody};
use super::client::BackendClient;
use super::error::ProxyError;
use crate::config::ConfigManager;
use crate::health::HealthChecker;
use crate::routing::BackendGroup;
use http::header::{HeaderValue, HOST};
use http::{Request, Response, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How long `serve` waits for in-flight connections after shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The forwarding engine.
///
/// Reads the latest configuration snapshot per request, so in-flight
/// requests keep a consistent view while reloads install new snapshots.
#[derive(Debug)]
pub struct Proxy {
    /// Versioned configuration owner.
    manager: Arc<ConfigManager>,
    /// Health state reader for backend selection.
    health: Arc<HealthChecker>,
    /// Client used for upstream requests.
    client: Arc<dyn BackendClient>,
}

impl Proxy {
    /// Create a new proxy over the given collaborators.
    #[must_use]
    pub fn new(
        manager: Arc<ConfigManager>,
        health: Arc<HealthChecker>,
        client: Arc<dyn BackendClient>,
    ) -> Self {
        Self {
            manager,
            health,
            client,
        }
    }

    /// Accept connections on `listener` until the shutdown signal fires,
    /// then drain in-flight connections for up to [`DRAIN_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        info!(address = %addr, "proxy listening");

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "new connection");

                            let manager = Arc::clone(&self.manager);
                            let health = Arc::clone(&self.health);
                            let client = Arc::clone(&self.client);

                            connections.spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |request: Request<Incoming>| {
                                    let manager = Arc::clone(&manager);
                                    let health = Arc::clone(&health);
                                    let client = Arc::clone(&client);
                                    async move {
                                        // The caller's body streams straight
                                        // through to the backend.
                                        let request = request.map(BodyExt::boxed);
                                        Ok::<_, Infallible>(
                                            handle(request, manager, health, client).await,
                                        )
                                    }
                                });

                                if let Err(e) =
                                    http1::Builder::new().serve_connection(io, service).await
                                {
                                    debug!(error = %e, "connection error");
                                }
                            });

                            // Reap connection tasks that already finished.
                            while connections.try_join_next().is_some() {}
                        },
                        Err(e) => {
                            warn!(error = %e, "accept error");
                        },
                    }
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        info!(active = connections.len(), "proxy draining connections");
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("drain timed out, aborting remaining connections");
            connections.abort_all();
        }
        info!("proxy shut down");

        Ok(())
    }
}

/// Forward one request and produce the response.
async fn handle(
    request: Request<ProxyBody>,
    manager: Arc<ConfigManager>,
    health: Arc<HealthChecker>,
    client: Arc<dyn BackendClient>,
) -> Response<ProxyBody> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let config = manager.latest();

    let rule = match config.first_matching_rule(&host, &path) {
        Some(rule) => rule,
        None => {
            let err = ProxyError::NoMatchingRule {
                method: method.to_string(),
                path: path.clone(),
            };
            error!(request_type = "server", method = %method, path = %path, "{err}");
            return status_response(StatusCode::NOT_FOUND);
        },
    };

    let mut upstream_request = request;
    rule.apply_request_operations(&mut upstream_request);

    let group = rule.backend_group();
    let backend = match select_backend(group, &health) {
        Ok(backend) => backend,
        Err(err) => {
            warn!(method = %method, path = %path, "{err}");
            return status_response(StatusCode::SERVICE_UNAVAILABLE);
        },
    };

    if let Err(err) = rewrite_to_backend(&mut upstream_request, &backend) {
        error!(request_type = "client", method = %method, path = %path, "{err}");
        return status_response(StatusCode::BAD_GATEWAY);
    }

    match client.send(upstream_request).await {
        Ok(mut response) => {
            rule.apply_response_operations(&mut response);
            response
        },
        Err(err) => {
            error!(request_type = "client", method = %method, path = %path, "{err}");
            status_response(StatusCode::BAD_GATEWAY)
        },
    }
}

/// Select a backend from the group's balancer.
///
/// Groups without a health check take the balancer's pick as-is. For
/// health-checked groups, the balancer is re-invoked up to the number of
/// servers to skip unhealthy backends; when every backend is down the
/// caller answers 503.
fn select_backend(group: &BackendGroup, health: &HealthChecker) -> Result<Uri, ProxyError> {
    if group.health_check().is_none() {
        return Ok(group.next_backend());
    }

    for _ in 0..group.servers().len() {
        let candidate = group.next_backend();
        if health.is_healthy(group.name(), &candidate.to_string()) {
            return Ok(candidate);
        }
    }

    Err(ProxyError::NoHealthyBackend(group.name().to_string()))
}

/// Redirect the request at the chosen backend: scheme and authority from
/// the backend URL, path prefixed with the backend's path, query
/// preserved, Host header set to the backend authority.
fn rewrite_to_backend(
    request: &mut Request<ProxyBody>,
    backend: &Uri,
) -> Result<(), ProxyError> {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str());

    let backend_base = backend.to_string();
    let target = format!("{}{}", backend_base.trim_end_matches('/'), path_and_query);
    let uri: Uri = match target.parse() {
        Ok(uri) => uri,
        Err(_) => return Err(ProxyError::InvalidTarget(target)),
    };

    let authority = backend
        .authority()
        .ok_or_else(|| ProxyError::InvalidTarget(backend_base.clone()))?;
    let host_value = HeaderValue::from_str(authority.as_str())
        .map_err(|_| ProxyError::InvalidTarget(backend_base.clone()))?;

    *request.uri_mut() = uri;
    request.headers_mut().insert(HOST, host_value);
    Ok(())
}

fn status_response(status: StatusCode) -> Response<ProxyBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}
