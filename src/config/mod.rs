//! Settings persistence.
//!
//! [`SettingsStore`] owns the configuration of one scope (global, or a single
//! project) and delegates every read and write to a [`PreferenceStore`]
//! collaborator. Two collaborators ship with the crate:
//! - [`YamlPreferenceStore`]: one YAML document per scope on disk
//! - [`MemoryPreferenceStore`]: in-process, used by tests and embedders
//!
//! Runtime settings for the binary live in [`AppSettings`].

pub mod memory;
pub mod settings;
pub mod yaml;

pub use memory::MemoryPreferenceStore;
pub use settings::AppSettings;
pub use yaml::YamlPreferenceStore;

use crate::models::{Configuration, ConfigurationKey, PartialConfiguration};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Failures of the persistence collaborator. Never fatal.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read preferences from {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write preferences to {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse preferences in {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[source] serde_yaml_ng::Error),

    #[error("Preference store unavailable: {0}")]
    Unavailable(String),
}

/// External persistence collaborator (an IDE preference store, a file, ...).
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceStore {
    /// Current persisted value of a single key
    fn get(&self, key: ConfigurationKey) -> Result<String, StorageError> {
        Ok(self.get_all()?.get(key).to_string())
    }

    /// Every persisted value, defaults filled in for unset keys
    fn get_all(&self) -> Result<Configuration, StorageError>;

    /// Merge the supplied keys into the persisted configuration
    fn update(&mut self, partial: &PartialConfiguration) -> Result<(), StorageError>;

    /// The built-in defaults this store falls back to
    fn default_configuration(&self) -> Configuration {
        Configuration::defaults()
    }

    /// Project delegation flag. Global stores always report `false`.
    fn use_global(&self) -> Result<bool, StorageError>;

    fn set_use_global(&mut self, use_global: bool) -> Result<(), StorageError>;
}

/// Configuration of one scope, backed by a [`PreferenceStore`].
///
/// No validation happens here; the resolver decides what a value means.
pub struct SettingsStore {
    backend: Box<dyn PreferenceStore>,
}

impl SettingsStore {
    pub fn new(backend: impl PreferenceStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn from_boxed(backend: Box<dyn PreferenceStore>) -> Self {
        Self { backend }
    }

    /// Load either the persisted configuration or, when `use_defaults` is set,
    /// the built-in defaults.
    pub fn load(&self, use_defaults: bool) -> Result<Configuration, StorageError> {
        if use_defaults {
            tracing::debug!("Loading default configuration");
            return Ok(self.backend.default_configuration());
        }
        self.backend.get_all()
    }

    pub fn get(&self, key: ConfigurationKey) -> Result<String, StorageError> {
        self.backend.get(key)
    }

    /// Merge `partial` into the persisted configuration. Keys not present keep
    /// their previous values.
    pub fn update(&mut self, partial: &PartialConfiguration) -> Result<(), StorageError> {
        tracing::debug!("Updating {} preference keys", partial.len());
        self.backend.update(partial)
    }

    pub fn use_global(&self) -> Result<bool, StorageError> {
        self.backend.use_global()
    }

    pub fn set_use_global(&mut self, use_global: bool) -> Result<(), StorageError> {
        self.backend.set_use_global(use_global)
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolutionMethod;
    use mockall::predicate::eq;

    #[test]
    fn test_load_defaults_skips_backend() {
        let mut backend = MockPreferenceStore::new();
        backend.expect_get_all().never();
        backend
            .expect_default_configuration()
            .returning(Configuration::defaults);

        let store = SettingsStore::new(backend);
        let config = store.load(true).unwrap();
        assert_eq!(config, Configuration::defaults());
    }

    #[test]
    fn test_load_persisted_delegates() {
        let mut persisted = Configuration::defaults();
        persisted.set_resolution_method(ResolutionMethod::PreBuiltDirectory);
        let expected = persisted.clone();

        let mut backend = MockPreferenceStore::new();
        backend
            .expect_get_all()
            .times(1)
            .returning(move || Ok(persisted.clone()));

        let store = SettingsStore::new(backend);
        assert_eq!(store.load(false).unwrap(), expected);
    }

    #[test]
    fn test_update_passes_partial_through() {
        let mut partial = PartialConfiguration::new();
        partial.insert(ConfigurationKey::AnalysisThreads, "2".to_string());

        let mut backend = MockPreferenceStore::new();
        backend
            .expect_update()
            .with(eq(partial.clone()))
            .times(1)
            .returning(|_| Ok(()));

        let mut store = SettingsStore::new(backend);
        store.update(&partial).unwrap();
    }

    #[test]
    fn test_storage_failure_surfaces() {
        let mut backend = MockPreferenceStore::new();
        backend
            .expect_get_all()
            .returning(|| Err(StorageError::Unavailable("locked".to_string())));

        let store = SettingsStore::new(backend);
        let err = store.load(false).unwrap_err();
        assert!(err.to_string().contains("locked"));
    }
}
