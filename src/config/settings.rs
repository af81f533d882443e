use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix of environment variables overriding [`AppSettings`]
pub const ENV_PREFIX: &str = "CCR";

/// Runtime settings of the binary.
///
/// Layered, later sources winning:
/// 1. built-in defaults
/// 2. an optional settings file (format inferred from its extension)
/// 3. `CCR_*` environment variables, e.g. `CCR_PROBE_TIMEOUT_SECS=10`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub preferences_dir: Utf8PathBuf,
    pub log_dir: Utf8PathBuf,
    pub log_prefix: String,
    pub debug_mode: bool,
    pub console_output: bool,
    pub probe_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            preferences_dir: Utf8PathBuf::from(".codechecker"),
            log_dir: Utf8PathBuf::from("logs"),
            log_prefix: "codechecker-resolver".to_string(),
            debug_mode: false,
            console_output: false,
            probe_timeout_secs: 5,
        }
    }
}

impl AppSettings {
    /// Load settings, reading `settings_file` when it exists.
    pub fn load(settings_file: Option<&Utf8Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("preferences_dir", defaults.preferences_dir.as_str())?
            .set_default("log_dir", defaults.log_dir.as_str())?
            .set_default("log_prefix", defaults.log_prefix.as_str())?
            .set_default("debug_mode", defaults.debug_mode)?
            .set_default("console_output", defaults.console_output)?
            .set_default("probe_timeout_secs", defaults.probe_timeout_secs)?;

        if let Some(path) = settings_file {
            if path.exists() {
                tracing::debug!("Reading settings file {}", path);
            } else {
                tracing::debug!("Settings file {} not found, skipping", path);
            }
            builder = builder.add_source(File::with_name(path.as_str()).required(false));
        }

        let settings: AppSettings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to assemble runtime settings")?
            .try_deserialize()
            .context("Failed to deserialize runtime settings")?;

        Ok(settings)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let settings = AppSettings::load(None).unwrap();
        assert_eq!(settings.preferences_dir, Utf8PathBuf::from(".codechecker"));
        assert_eq!(settings.probe_timeout(), Duration::from_secs(5));
        assert!(!settings.debug_mode);
    }

    #[test]
    fn test_missing_file_is_optional() {
        let settings = AppSettings::load(Some(Utf8Path::new("/nonexistent/settings.yaml")));
        assert!(settings.is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join("settings.yaml")).unwrap();
        fs::write(&path, "debug_mode: true\nprobe_timeout_secs: 12\n").unwrap();

        let settings = AppSettings::load(Some(path.as_path())).unwrap();
        assert!(settings.debug_mode);
        assert_eq!(settings.probe_timeout_secs, 12);
        assert_eq!(settings.log_dir, Utf8PathBuf::from("logs"));
    }
}
