//! Probe task management.

use super::state::HealthState;
use crate::proxy::body::empty;
use crate::proxy::BackendClient;
use crate::routing::{Config, HealthCheckSpec};
use http::{Method, Request, StatusCode};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Runs one probe loop per health-checked backend and maintains the
/// shared [`HealthState`].
///
/// The checker is bound to a configuration snapshot; on every snapshot
/// the manager publishes, it cancels the running probe generation,
/// reconciles the state map, and spawns a fresh task set for the new
/// snapshot.
#[derive(Debug)]
pub struct HealthChecker {
    /// Shared health state, read by the forwarding engine.
    state: Arc<HealthState>,
    /// Client used to issue probes.
    client: Arc<dyn BackendClient>,
}

impl HealthChecker {
    /// Create a checker probing through the given client.
    #[must_use]
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self {
            state: Arc::new(HealthState::new()),
            client,
        }
    }

    /// Get the shared health state.
    #[must_use]
    pub fn state(&self) -> &Arc<HealthState> {
        &self.state
    }

    /// Check whether a backend is healthy.
    #[must_use]
    pub fn is_healthy(&self, group: &str, backend: &str) -> bool {
        self.state.is_healthy(group, backend)
    }

    /// Start probing `config`, rebinding on every snapshot from
    /// `reloads`, until the shutdown signal fires.
    pub fn start(
        self: &Arc<Self>,
        config: Arc<Config>,
        mut reloads: watch::Receiver<Arc<Config>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let checker = Arc::clone(self);

        tokio::spawn(async move {
            let mut generation = checker.bind(&config, &shutdown);

            loop {
                tokio::select! {
                    changed = reloads.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = reloads.borrow_and_update().clone();
                        // Dropping the generation sender cancels the
                        // previous probe tasks.
                        drop(generation);
                        generation = checker.bind(&snapshot, &shutdown);
                        debug!("probe tasks rebound to new configuration");
                    }
                    _ = shutdown.changed() => {
                        break;
                    }
                }
            }

            drop(generation);
        });
    }

    /// Reconcile state with `config` and spawn one probe task per
    /// health-checked backend. The returned sender owns the generation;
    /// dropping it cancels the tasks.
    fn bind(&self, config: &Config, shutdown: &watch::Receiver<bool>) -> watch::Sender<()> {
        self.state.reconcile(&config.backend_groups);

        let (generation_tx, generation_rx) = watch::channel(());
        for group in &config.backend_groups {
            let Some(spec) = group.health_check() else {
                continue;
            };
            for server in group.servers() {
                tokio::spawn(probe_backend(
                    Arc::clone(&self.state),
                    Arc::clone(&self.client),
                    group.name().to_string(),
                    server.to_string(),
                    spec.clone(),
                    generation_rx.clone(),
                    shutdown.clone(),
                ));
            }
        }

        generation_tx
    }
}

/// Probe loop for one backend. Exits when its generation is cancelled or
/// the shutdown signal fires.
async fn probe_backend(
    state: Arc<HealthState>,
    client: Arc<dyn BackendClient>,
    group: String,
    backend: String,
    spec: HealthCheckSpec,
    mut generation: watch::Receiver<()>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(spec.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first probe
    // lands one interval after start.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                probe_once(&state, client.as_ref(), &group, &backend, &spec).await;
            }
            _ = generation.changed() => return,
            _ = shutdown.changed() => return,
        }
    }
}

/// Issue a single probe and record the outcome.
async fn probe_once(
    state: &HealthState,
    client: &dyn BackendClient,
    group: &str,
    backend: &str,
    spec: &HealthCheckSpec,
) {
    let target = format!("{}{}", backend.trim_end_matches('/'), spec.path);
    let request = match Request::builder()
        .method(Method::GET)
        .uri(target.as_str())
        .body(empty())
    {
        Ok(request) => request,
        Err(e) => {
            error!(backend = %backend, error = %e, "failed to build probe request");
            return;
        },
    };

    let outcome = timeout(spec.timeout, client.send(request)).await;
    let success = matches!(&outcome, Ok(Ok(response)) if response.status() == StatusCode::OK);

    if success {
        if state.record_success(group, backend) {
            info!(backend_group = %group, backend = %backend, "backend is healthy");
        }
    } else if state.record_failure(group, backend, spec.retries) {
        warn!(backend_group = %group, backend = %backend, "backend is unhealthy");
    }
}
