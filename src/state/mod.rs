// State management module
//
// ConfigurationResolver drives the Uninitialized -> Loaded -> {Valid, Invalid}
// state machine. Every mutating call returns the StateChange events it caused,
// detected by comparing snapshots taken before and after the call.

pub mod resolver;

pub use resolver::{ConfigurationResolver, ProjectScope, ResolverError};

use crate::models::{AnalyzerHandle, Configuration, ConfigurationKey};
use crate::services::LocateError;
use camino::Utf8PathBuf;
use std::fmt;

/// Resolver lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResolverState {
    /// Nothing loaded yet
    #[default]
    Uninitialized,

    /// Configuration loaded, analyzer not resolved yet. Never observable between calls.
    Loaded,

    /// The analyzer was located; a command is rendered
    Valid(AnalyzerHandle),

    /// The analyzer could not be located; the reason is kept for display
    Invalid(LocateError),
}

impl ResolverState {
    pub fn name(&self) -> &'static str {
        match self {
            ResolverState::Uninitialized => "uninitialized",
            ResolverState::Loaded => "loaded",
            ResolverState::Valid(_) => "valid",
            ResolverState::Invalid(_) => "invalid",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ResolverState::Valid(_))
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, ResolverState::Uninitialized)
    }

    pub fn analyzer(&self) -> Option<&AnalyzerHandle> {
        match self {
            ResolverState::Valid(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Severity of the status message shown next to the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    None,
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::None => "none",
            Severity::Info => "info",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// Message for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

impl StatusMessage {
    pub fn none() -> Self {
        Self {
            severity: Severity::None,
            text: String::new(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

/// Events produced by resolver mutations
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Configuration was read from storage for the first time
    Loaded,

    /// The active configuration differs in these keys
    ConfigurationChanged { keys: Vec<ConfigurationKey> },

    /// A project switched between its own and the global configuration
    ScopeChanged { use_global: bool },

    /// A (different) analyzer was located
    AnalyzerResolved { location: Utf8PathBuf, version: String },

    /// Resolution failed (or failed for a different reason than before)
    ResolutionFailed { reason: String },

    /// The rendered command changed
    CommandChanged { command: String },

    /// Configuration was persisted
    Saved,
}

/// What change detection compares.
#[derive(Debug, Clone)]
pub(crate) struct ResolverSnapshot {
    pub state: ResolverState,
    pub configuration: Configuration,
    pub use_global: bool,
    pub rendered: String,
}

/// Compare two snapshots and list the resulting events.
pub(crate) fn detect_changes(old: &ResolverSnapshot, new: &ResolverSnapshot) -> Vec<StateChange> {
    let mut changes = Vec::new();

    if !old.state.is_loaded() && new.state.is_loaded() {
        changes.push(StateChange::Loaded);
    }

    if old.use_global != new.use_global {
        changes.push(StateChange::ScopeChanged {
            use_global: new.use_global,
        });
    }

    let changed_keys: Vec<ConfigurationKey> = ConfigurationKey::ALL
        .into_iter()
        .filter(|key| old.configuration.get(*key) != new.configuration.get(*key))
        .collect();
    if !changed_keys.is_empty() {
        changes.push(StateChange::ConfigurationChanged { keys: changed_keys });
    }

    if old.state != new.state {
        match &new.state {
            ResolverState::Valid(handle) => changes.push(StateChange::AnalyzerResolved {
                location: handle.location().to_path_buf(),
                version: handle.version().to_string(),
            }),
            ResolverState::Invalid(err) => changes.push(StateChange::ResolutionFailed {
                reason: err.to_string(),
            }),
            ResolverState::Uninitialized | ResolverState::Loaded => {}
        }
    }

    if old.rendered != new.rendered {
        changes.push(StateChange::CommandChanged {
            command: new.rendered.clone(),
        });
    }

    changes
}
