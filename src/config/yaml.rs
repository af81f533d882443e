use super::{PreferenceStore, StorageError};
use crate::models::{Configuration, PartialConfiguration};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// File name of the global preference document
pub const GLOBAL_PREFERENCES_FILE: &str = "global.yaml";

/// Directory holding one preference document per project
pub const PROJECT_PREFERENCES_DIR: &str = "projects";

/// On-disk layout of a preference document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferenceDocument {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    use_global: bool,

    #[serde(default)]
    configuration: Configuration,
}

/// Preference store backed by a single YAML document.
///
/// A missing file reads as the default configuration; the file and its parent
/// directory are created on the first write.
#[derive(Debug, Clone)]
pub struct YamlPreferenceStore {
    path: Utf8PathBuf,
}

impl YamlPreferenceStore {
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Global preferences inside `preferences_dir`.
    pub fn global<P: AsRef<Utf8Path>>(preferences_dir: P) -> Self {
        Self::new(preferences_dir.as_ref().join(GLOBAL_PREFERENCES_FILE))
    }

    /// Preferences of one project inside `preferences_dir`.
    pub fn project<P: AsRef<Utf8Path>>(preferences_dir: P, project_id: &str) -> Self {
        let file_name = format!("{}.yaml", sanitize_project_id(project_id));
        Self::new(
            preferences_dir
                .as_ref()
                .join(PROJECT_PREFERENCES_DIR)
                .join(file_name),
        )
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn read_document(&self) -> Result<PreferenceDocument, StorageError> {
        if !self.path.exists() {
            tracing::debug!("Preference file {} not found, using defaults", self.path);
            return Ok(PreferenceDocument::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;

        // An empty file deserializes to unit, not a mapping
        if contents.trim().is_empty() {
            return Ok(PreferenceDocument::default());
        }

        serde_yaml_ng::from_str(&contents).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_document(&self, document: &PreferenceDocument) -> Result<(), StorageError> {
        let yaml_string = serde_yaml_ng::to_string(document).map_err(StorageError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        fs::write(&self.path, yaml_string).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!("Saved preferences to {}", self.path);
        Ok(())
    }
}

impl PreferenceStore for YamlPreferenceStore {
    fn get_all(&self) -> Result<Configuration, StorageError> {
        let document = self.read_document()?;
        tracing::debug!("Loaded preferences from {}", self.path);
        Ok(document.configuration)
    }

    fn update(&mut self, partial: &PartialConfiguration) -> Result<(), StorageError> {
        let mut document = self.read_document()?;
        document.configuration.merge(partial);
        self.write_document(&document)
    }

    fn use_global(&self) -> Result<bool, StorageError> {
        Ok(self.read_document()?.use_global)
    }

    fn set_use_global(&mut self, use_global: bool) -> Result<(), StorageError> {
        let mut document = self.read_document()?;
        document.use_global = use_global;
        self.write_document(&document)
    }
}

/// Keep project identifiers usable as file names.
fn sanitize_project_id(project_id: &str) -> String {
    let sanitized: String = project_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        sanitized
    }
}
