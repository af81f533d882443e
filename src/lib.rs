// CodeChecker Resolver - analyzer configuration for the CodeChecker static analyzer
//
// This is the library crate containing settings persistence, analyzer discovery
// and command rendering. The binary crate (main.rs) provides a small CLI over it.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::{AppSettings, SettingsStore, StorageError};
pub use models::{AnalyzerHandle, Configuration, ConfigurationKey, ResolutionMethod};
pub use state::{ConfigurationResolver, ProjectScope, ResolverError, ResolverState, StateChange};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
