use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of analysis threads
pub const DEFAULT_ANALYSIS_THREADS: &str = "4";

/// Default compiler commands captured while logging a build
pub const DEFAULT_COMPILER_NAMES: &str = "gcc:g++:clang:clang++";

/// The fixed set of settable configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationKey {
    CheckerPath,
    AnalysisOptions,
    AnalysisThreads,
    CompilerNames,
    ResolutionMethod,
}

impl ConfigurationKey {
    /// Every key, in the order they are persisted.
    pub const ALL: [ConfigurationKey; 5] = [
        ConfigurationKey::CheckerPath,
        ConfigurationKey::AnalysisOptions,
        ConfigurationKey::AnalysisThreads,
        ConfigurationKey::CompilerNames,
        ConfigurationKey::ResolutionMethod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationKey::CheckerPath => "checker_path",
            ConfigurationKey::AnalysisOptions => "analysis_options",
            ConfigurationKey::AnalysisThreads => "analysis_threads",
            ConfigurationKey::CompilerNames => "compiler_names",
            ConfigurationKey::ResolutionMethod => "resolution_method",
        }
    }

    /// Built-in default value for this key.
    pub fn default_value(&self) -> &'static str {
        match self {
            ConfigurationKey::CheckerPath => "",
            ConfigurationKey::AnalysisOptions => "",
            ConfigurationKey::AnalysisThreads => DEFAULT_ANALYSIS_THREADS,
            ConfigurationKey::CompilerNames => DEFAULT_COMPILER_NAMES,
            ConfigurationKey::ResolutionMethod => ResolutionMethod::SearchPath.as_str(),
        }
    }
}

impl fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ConfigurationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ConfigurationKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| format!("unknown configuration key: {}", s))
    }
}

/// Strategy used to find the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMethod {
    /// Search the process search path for the executable
    #[default]
    SearchPath,
    /// Use a fixed, pre-built package directory supplied by the user
    PreBuiltDirectory,
}

impl ResolutionMethod {
    /// Persisted representation (`PATH` / `PRE`)
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::SearchPath => "PATH",
            ResolutionMethod::PreBuiltDirectory => "PRE",
        }
    }

    /// Parse a persisted value, falling back to [`ResolutionMethod::SearchPath`]
    /// for anything unrecognised.
    pub fn from_persisted(value: &str) -> Self {
        match value.parse() {
            Ok(method) => method,
            Err(_) => {
                tracing::warn!(
                    "Unknown resolution method '{}', falling back to {}",
                    value,
                    ResolutionMethod::SearchPath
                );
                ResolutionMethod::SearchPath
            }
        }
    }

    /// Whether this method reads the user-supplied checker path.
    pub fn requires_path(&self) -> bool {
        matches!(self, ResolutionMethod::PreBuiltDirectory)
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PATH" | "SEARCH_PATH" | "SEARCHPATH" => Ok(ResolutionMethod::SearchPath),
            "PRE" | "PRE_BUILT" | "PREBUILT" | "PREBUILTDIRECTORY" => {
                Ok(ResolutionMethod::PreBuiltDirectory)
            }
            _ => Err(format!("unknown resolution method: {}", s)),
        }
    }
}

/// A subset of configuration values, as handed to [`Configuration::merge`].
pub type PartialConfiguration = IndexMap<ConfigurationKey, String>;

/// Mapping from every [`ConfigurationKey`] to its string value.
///
/// Construction always fills missing keys with their defaults, so `get` never
/// fails. Snapshots are cloned and handed around by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PartialConfiguration", into = "PartialConfiguration")]
pub struct Configuration {
    values: IndexMap<ConfigurationKey, String>,
}

impl Configuration {
    /// The built-in default configuration.
    pub fn defaults() -> Self {
        Self::from(PartialConfiguration::new())
    }

    pub fn get(&self, key: ConfigurationKey) -> &str {
        self.values
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_value())
    }

    pub fn set(&mut self, key: ConfigurationKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    /// Overwrite the supplied keys; every other key keeps its value.
    pub fn merge(&mut self, partial: &PartialConfiguration) {
        for (key, value) in partial {
            self.values.insert(*key, value.clone());
        }
    }

    pub fn resolution_method(&self) -> ResolutionMethod {
        ResolutionMethod::from_persisted(self.get(ConfigurationKey::ResolutionMethod))
    }

    pub fn set_resolution_method(&mut self, method: ResolutionMethod) {
        self.set(ConfigurationKey::ResolutionMethod, method.as_str());
    }

    /// Compiler names parsed from [`ConfigurationKey::CompilerNames`].
    pub fn compilers(&self) -> Vec<String> {
        parse_compiler_list(self.get(ConfigurationKey::CompilerNames))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConfigurationKey, &str)> {
        ConfigurationKey::ALL
            .into_iter()
            .map(move |key| (key, self.get(key)))
    }

    /// Full copy of the values, suitable for [`Configuration::merge`].
    pub fn to_partial(&self) -> PartialConfiguration {
        self.iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::defaults()
    }
}

impl From<PartialConfiguration> for Configuration {
    fn from(mut partial: PartialConfiguration) -> Self {
        let values = ConfigurationKey::ALL
            .into_iter()
            .map(|key| {
                let value = partial
                    .shift_remove(&key)
                    .unwrap_or_else(|| key.default_value().to_string());
                (key, value)
            })
            .collect();
        Self { values }
    }
}

impl From<Configuration> for PartialConfiguration {
    fn from(config: Configuration) -> Self {
        config.values
    }
}

/// Split a compiler list on `:`, `,` or whitespace, dropping empty entries.
pub fn parse_compiler_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ':' || c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
