//! Versioned configuration manager with hot reload.

use super::error::ConfigResult;
use super::source::ConfigSource;
use crate::routing::Config;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

/// Versioned store of configuration snapshots.
#[derive(Debug)]
struct VersionedStore {
    /// Version of the most recently installed snapshot.
    latest: u64,
    /// All installed snapshots by version.
    configs: HashMap<u64, Arc<Config>>,
}

/// Owns the active configuration and reloads it on an external signal.
///
/// Readers take a stable [`Arc`] to the latest snapshot and hold it for
/// the duration of one request; a reload installs a whole new snapshot at
/// `latest + 1` and advances the pointer atomically. A failed reload
/// leaves the store untouched, so the previous configuration keeps
/// serving traffic.
#[derive(Debug)]
pub struct ConfigManager {
    /// The configured source, re-invoked on every reload.
    source: Box<dyn ConfigSource>,
    /// Versioned snapshot store. Read-mostly; written only on reload.
    store: RwLock<VersionedStore>,
    /// Publishes each installed snapshot to subscribers.
    publisher: watch::Sender<Arc<Config>>,
}

impl ConfigManager {
    /// Load the initial configuration from the source and store it as
    /// version 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails; startup errors are
    /// fatal to the caller.
    pub fn new(source: Box<dyn ConfigSource>) -> ConfigResult<Self> {
        let config = Arc::new(source.load()?);
        let (publisher, _) = watch::channel(Arc::clone(&config));

        let mut configs = HashMap::new();
        configs.insert(0, config);

        Ok(Self {
            source,
            store: RwLock::new(VersionedStore { latest: 0, configs }),
            publisher,
        })
    }

    /// Get the latest configuration snapshot.
    ///
    /// The returned `Arc` stays valid across the whole request even if a
    /// reload installs a newer snapshot meanwhile.
    #[must_use]
    pub fn latest(&self) -> Arc<Config> {
        let store = self.store.read().expect("config store lock poisoned");
        Arc::clone(
            store
                .configs
                .get(&store.latest)
                .expect("latest version always has a snapshot"),
        )
    }

    /// Get the version of the latest snapshot. Version 0 is the initial
    /// load.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.store.read().expect("config store lock poisoned").latest
    }

    /// Subscribe to snapshot installations.
    ///
    /// The receiver yields every snapshot installed after subscription;
    /// the health checker uses this to reconcile its probe tasks.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Config>> {
        self.publisher.subscribe()
    }

    /// Re-run the source pipeline and install the result as the latest
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns the load error and leaves the store unchanged; in-flight
    /// and subsequent requests keep seeing the previous snapshot.
    pub fn reload(&self) -> ConfigResult<Arc<Config>> {
        let config = Arc::new(self.source.load()?);

        {
            let mut store = self.store.write().expect("config store lock poisoned");
            store.latest += 1;
            let latest = store.latest;
            store.configs.insert(latest, Arc::clone(&config));
        }
        self.publisher.send_replace(Arc::clone(&config));

        Ok(config)
    }

    /// Start the background reload task.
    ///
    /// The task reloads the configuration on each SIGHUP and exits when
    /// the shutdown signal fires. Reload failures are logged and
    /// non-fatal.
    pub fn start(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut hangup = match signal(SignalKind::hangup()) {
                Ok(stream) => stream,
                Err(e) => {
                    error!(error = %e, "failed to install SIGHUP handler");
                    return;
                },
            };

            loop {
                tokio::select! {
                    _ = hangup.recv() => {
                        match manager.reload() {
                            Ok(_) => {
                                info!(version = manager.version(), "configuration reloaded");
                            },
                            Err(e) => {
                                error!(error = %e, "configuration reload failed");
                            },
                        }
                    }
                    _ = shutdown.changed() => {
                        break;
                    }
                }
            }
        });
    }
}
