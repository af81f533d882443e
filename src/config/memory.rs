use super::{PreferenceStore, StorageError};
use crate::models::{Configuration, PartialConfiguration};

/// In-process preference store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    configuration: Configuration,
    use_global: bool,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already populated configuration.
    pub fn with_configuration(configuration: Configuration) -> Self {
        Self {
            configuration,
            use_global: false,
        }
    }

    /// Start from a project configuration with its delegation flag.
    pub fn for_project(configuration: Configuration, use_global: bool) -> Self {
        Self {
            configuration,
            use_global,
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_all(&self) -> Result<Configuration, StorageError> {
        Ok(self.configuration.clone())
    }

    fn update(&mut self, partial: &PartialConfiguration) -> Result<(), StorageError> {
        self.configuration.merge(partial);
        Ok(())
    }

    fn use_global(&self) -> Result<bool, StorageError> {
        Ok(self.use_global)
    }

    fn set_use_global(&mut self, use_global: bool) -> Result<(), StorageError> {
        self.use_global = use_global;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfigurationKey;

    #[test]
    fn test_update_then_get() {
        let mut store = MemoryPreferenceStore::new();
        let mut partial = PartialConfiguration::new();
        partial.insert(ConfigurationKey::CheckerPath, "/opt/cc".to_string());
        store.update(&partial).unwrap();

        assert_eq!(store.get(ConfigurationKey::CheckerPath).unwrap(), "/opt/cc");
        assert_eq!(store.get(ConfigurationKey::AnalysisThreads).unwrap(), "4");
    }

    #[test]
    fn test_use_global_flag() {
        let mut store = MemoryPreferenceStore::new();
        assert!(!store.use_global().unwrap());
        store.set_use_global(true).unwrap();
        assert!(store.use_global().unwrap());
    }
}
