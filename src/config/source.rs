//! Configuration sources.

use super::error::{ConfigError, ConfigResult};
use super::schema::ConfigDocument;
use super::validation::validate;
use crate::routing::Config;
use std::path::{Path, PathBuf};

/// A loadable source of configuration.
///
/// The manager re-invokes `load` on every reload; implementations run the
/// full read → decode → validate → resolve pipeline each time so a failed
/// reload never produces a partial snapshot.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Load, validate, and resolve a configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read, decoded, or
    /// validated.
    fn load(&self) -> ConfigResult<Config>;
}

/// Configuration source backed by a YAML file on disk.
#[derive(Debug, Clone)]
pub struct YamlFileSource {
    /// Path to the configuration file.
    path: PathBuf,
}

impl YamlFileSource {
    /// Create a source for the given file path.
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigSource for YamlFileSource {
    fn load(&self) -> ConfigResult<Config> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;

        let document: ConfigDocument = serde_yaml::from_str(&content)?;
        validate(&document)?;
        Ok(document.resolve())
    }
}
