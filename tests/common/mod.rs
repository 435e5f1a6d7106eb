//! Shared helpers for integration tests: throwaway hyper backends and a
//! fully wired proxy bound to an OS-assigned port.

use bytes::Bytes;
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use switchyard::proxy::body::{empty, full, ProxyBody};
use switchyard::{BackendClient, ConfigManager, HealthChecker, HttpClient, Proxy, YamlFileSource};
use tokio::net::TcpListener;
use tokio::sync::watch;

/// A backend server living for the duration of a test.
pub struct TestBackend {
    pub addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl TestBackend {
    /// The backend's `host:port` form for a `servers` config entry.
    pub fn server_entry(&self) -> String {
        self.addr.to_string()
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a hyper backend on an OS-assigned port.
pub async fn spawn_backend<F, Fut>(handler: F) -> TestBackend
where
    F: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let handler = handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |request| {
                    let handler = handler.clone();
                    async move { Ok::<_, Infallible>(handler(request).await) }
                });
                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    TestBackend { addr, handle }
}

/// Backend answering every request with a fixed body.
pub async fn echo_backend(name: &'static str) -> TestBackend {
    spawn_backend(move |_request| async move {
        Response::new(Full::new(Bytes::from_static(name.as_bytes())))
    })
    .await
}

/// Backend whose `/health` endpoint follows a shared flag; other paths
/// answer with the backend's name.
pub async fn health_backend(name: &'static str, healthy: Arc<AtomicBool>) -> TestBackend {
    spawn_backend(move |request| {
        let healthy = Arc::clone(&healthy);
        async move {
            if request.uri().path() == "/health" {
                let status = if healthy.load(Ordering::Relaxed) {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                };
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = status;
                response
            } else {
                Response::new(Full::new(Bytes::from_static(name.as_bytes())))
            }
        }
    })
    .await
}

/// A proxy wired like the binary, serving on an OS-assigned port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub manager: Arc<ConfigManager>,
    config_path: PathBuf,
    _dir: tempfile::TempDir,
    shutdown: watch::Sender<bool>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Overwrite the configuration file; pair with
    /// `manager.reload()` to install it.
    pub fn update_config(&self, yaml: &str) {
        std::fs::write(&self.config_path, yaml).unwrap();
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Start a proxy from a YAML configuration string.
pub async fn start_proxy(yaml: &str) -> TestProxy {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, yaml).unwrap();

    let manager =
        Arc::new(ConfigManager::new(Box::new(YamlFileSource::new(&config_path))).unwrap());
    let client: Arc<dyn BackendClient> = Arc::new(HttpClient::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let checker = Arc::new(HealthChecker::new(Arc::clone(&client)));
    checker.start(manager.latest(), manager.subscribe(), shutdown_rx.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let proxy = Proxy::new(Arc::clone(&manager), checker, client);
    tokio::spawn(async move {
        let _ = proxy.serve(listener, shutdown_rx).await;
    });

    TestProxy {
        addr,
        manager,
        config_path,
        _dir: dir,
        shutdown: shutdown_tx,
    }
}

/// Issue a GET and return status, headers, and collected body.
pub async fn get(url: &str) -> (StatusCode, HeaderMap, Bytes) {
    send(Method::GET, url, empty()).await
}

/// Issue a POST with a body.
pub async fn post(url: &str, body: impl Into<Bytes>) -> (StatusCode, HeaderMap, Bytes) {
    send(Method::POST, url, full(body.into())).await
}

async fn send(method: Method, url: &str, body: ProxyBody) -> (StatusCode, HeaderMap, Bytes) {
    let client = HttpClient::new();
    let request = Request::builder()
        .method(method)
        .uri(url)
        .body(body)
        .unwrap();

    let response = client.send(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    (parts.status, parts.headers, bytes)
}
