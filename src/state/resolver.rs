use super::{ResolverSnapshot, ResolverState, StateChange, StatusMessage, detect_changes};
use crate::config::{SettingsStore, StorageError};
use crate::metrics::Metrics;
use crate::models::{AnalyzerHandle, Configuration, ConfigurationKey};
use crate::services::{AnalyzerLocator, CommandRenderer, Discovery, RenderInput};
use camino::{Utf8Path, Utf8PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Status prefix shown when an analyzer was located
pub const VALID_PACKAGE_MESSAGE: &str = "CodeChecker being used: ";

/// Errors returned by resolver operations. None of them is fatal.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Project '{0}' uses the global configuration; edit the global configuration instead")]
    ScopeDelegated(String),

    #[error("No project is attached to this resolver")]
    NoProject,

    #[error("Configuration has not been loaded yet")]
    NotLoaded,
}

/// A project with its own settings, optionally delegating to the global ones.
#[derive(Debug)]
pub struct ProjectScope {
    id: String,
    store: SettingsStore,
    log_file: Option<Utf8PathBuf>,
}

impl ProjectScope {
    /// `log_file` is the project's compilation log referenced by the rendered
    /// command.
    pub fn new(id: impl Into<String>, store: SettingsStore, log_file: Option<Utf8PathBuf>) -> Self {
        Self {
            id: id.into(),
            store,
            log_file,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn log_file(&self) -> Option<&Utf8Path> {
        self.log_file.as_deref()
    }
}

/// Coordinates settings, analyzer discovery and command rendering for one
/// configuration page (global, or a single project).
///
/// The resolver keeps a working copy of the global configuration and, for a
/// project, of the project's own configuration. Edits go to the active copy;
/// switching scope never discards the other copy. Nothing is persisted until
/// [`save`](Self::save).
///
/// Every mutating call re-resolves synchronously and returns the
/// [`StateChange`] events it produced. The presentation layer reads the
/// outcome with [`current_rendered_command`](Self::current_rendered_command)
/// and [`current_status_message`](Self::current_status_message).
///
/// # Example
/// ```ignore
/// let mut resolver = ConfigurationResolver::global(
///     SettingsStore::new(YamlPreferenceStore::global(".codechecker")),
///     SystemDiscovery::new(),
/// );
/// resolver.load()?;
/// resolver.set_field(ConfigurationKey::AnalysisThreads, "8")?;
/// println!("{}", resolver.current_rendered_command());
/// resolver.save()?;
/// ```
pub struct ConfigurationResolver<D: Discovery> {
    global: SettingsStore,
    project: Option<ProjectScope>,
    locator: AnalyzerLocator<D>,

    global_config: Configuration,
    project_config: Configuration,
    use_global: bool,

    state: ResolverState,
    rendered: String,
    metrics: Metrics,
}

impl<D: Discovery> ConfigurationResolver<D> {
    /// Resolver for the global configuration page.
    pub fn global(global: SettingsStore, discovery: D) -> Self {
        Self::build(global, None, discovery)
    }

    /// Resolver for a project configuration page.
    pub fn for_project(global: SettingsStore, project: ProjectScope, discovery: D) -> Self {
        Self::build(global, Some(project), discovery)
    }

    fn build(global: SettingsStore, project: Option<ProjectScope>, discovery: D) -> Self {
        Self {
            global,
            project,
            locator: AnalyzerLocator::new(discovery),
            global_config: Configuration::defaults(),
            project_config: Configuration::defaults(),
            use_global: false,
            state: ResolverState::Uninitialized,
            rendered: String::new(),
            metrics: Metrics::new(),
        }
    }

    /// Read the persisted configuration and resolve the analyzer.
    ///
    /// On a storage failure nothing changes and the error is returned.
    pub fn load(&mut self) -> Result<Vec<StateChange>, ResolverError> {
        let global_config = self.global.load(false)?;
        let project_values = match &self.project {
            Some(project) => Some((project.store.load(false)?, project.store.use_global()?)),
            None => None,
        };

        let before = self.snapshot();

        self.global_config = global_config;
        if let Some((project_config, use_global)) = project_values {
            self.project_config = project_config;
            self.use_global = use_global;
        }
        self.state = ResolverState::Loaded;

        tracing::info!(
            "Loaded {} configuration (resolution method {})",
            self.scope_label(),
            self.active_configuration().resolution_method()
        );

        Ok(self.resolve_and_diff(before))
    }

    /// Edit one field of the active configuration and re-resolve.
    pub fn set_field(
        &mut self,
        key: ConfigurationKey,
        value: impl Into<String>,
    ) -> Result<Vec<StateChange>, ResolverError> {
        self.ensure_editable()?;

        let before = self.snapshot();
        let value = value.into();
        tracing::debug!("Setting {} = {:?}", key, value);
        self.active_configuration_mut().set(key, value);
        self.state = ResolverState::Loaded;

        Ok(self.resolve_and_diff(before))
    }

    /// Switch a project between its own configuration (`false`) and the
    /// global one (`true`).
    pub fn switch_scope(&mut self, use_global: bool) -> Result<Vec<StateChange>, ResolverError> {
        self.ensure_loaded()?;
        if self.project.is_none() {
            return Err(ResolverError::NoProject);
        }

        let before = self.snapshot();
        self.use_global = use_global;
        self.state = ResolverState::Loaded;
        tracing::info!("Switched to {} configuration", self.scope_label());

        Ok(self.resolve_and_diff(before))
    }

    /// Replace the active configuration with the built-in defaults.
    pub fn reset_to_defaults(&mut self) -> Result<Vec<StateChange>, ResolverError> {
        self.ensure_editable()?;

        let defaults = self.active_store().load(true)?;
        let before = self.snapshot();
        *self.active_configuration_mut() = defaults;
        self.state = ResolverState::Loaded;
        tracing::info!("Reset {} configuration to defaults", self.scope_label());

        Ok(self.resolve_and_diff(before))
    }

    /// Resolve again without any input change.
    pub fn recheck(&mut self) -> Result<Vec<StateChange>, ResolverError> {
        self.ensure_loaded()?;

        let before = self.snapshot();
        self.state = ResolverState::Loaded;
        Ok(self.resolve_and_diff(before))
    }

    /// Persist the active configuration and, for a project, the delegation
    /// flag. Works whether or not the analyzer is currently located.
    ///
    /// Before [`load`](Self::load) there is nothing to persist, so the call
    /// leaves storage untouched and reports no changes.
    pub fn save(&mut self) -> Result<Vec<StateChange>, ResolverError> {
        if !self.state.is_loaded() {
            tracing::debug!("Nothing loaded yet, skipping save");
            return Ok(Vec::new());
        }

        tracing::info!("Saving {} configuration", self.scope_label());
        let result = self.persist();
        self.metrics.record_save(result.is_ok());

        match result {
            Ok(()) => Ok(vec![StateChange::Saved]),
            Err(e) => {
                tracing::error!("Failed to save configuration: {}", e);
                Err(e.into())
            }
        }
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let config = self.active_configuration();
        let mut partial = config.to_partial();
        // Persist the method that was resolved, not the raw edited text
        partial.insert(
            ConfigurationKey::ResolutionMethod,
            config.resolution_method().as_str().to_string(),
        );
        let use_global = self.use_global;

        match &mut self.project {
            Some(project) if !use_global => project.store.update(&partial)?,
            _ => self.global.update(&partial)?,
        }

        if let Some(project) = &mut self.project {
            project.store.set_use_global(use_global)?;
        }

        Ok(())
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn analyzer(&self) -> Option<&AnalyzerHandle> {
        self.state.analyzer()
    }

    /// The command that would run; empty when no analyzer is located.
    pub fn current_rendered_command(&self) -> &str {
        &self.rendered
    }

    pub fn current_status_message(&self) -> StatusMessage {
        match &self.state {
            ResolverState::Valid(handle) => {
                StatusMessage::info(format!("{}{}", VALID_PACKAGE_MESSAGE, handle.location()))
            }
            ResolverState::Invalid(err) => StatusMessage::error(err.to_string()),
            ResolverState::Uninitialized | ResolverState::Loaded => StatusMessage::none(),
        }
    }

    /// Configuration currently used for rendering.
    pub fn active_configuration(&self) -> &Configuration {
        if self.reads_project_configuration() {
            &self.project_config
        } else {
            &self.global_config
        }
    }

    pub fn global_configuration(&self) -> &Configuration {
        &self.global_config
    }

    /// The project's own working configuration, even while delegating.
    pub fn project_configuration(&self) -> Option<&Configuration> {
        self.project.as_ref().map(|_| &self.project_config)
    }

    pub fn project(&self) -> Option<&ProjectScope> {
        self.project.as_ref()
    }

    pub fn uses_global(&self) -> bool {
        self.project.is_none() || self.use_global
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn locator(&self) -> &AnalyzerLocator<D> {
        &self.locator
    }

    fn reads_project_configuration(&self) -> bool {
        self.project.is_some() && !self.use_global
    }

    fn active_configuration_mut(&mut self) -> &mut Configuration {
        if self.reads_project_configuration() {
            &mut self.project_config
        } else {
            &mut self.global_config
        }
    }

    fn active_store(&self) -> &SettingsStore {
        match &self.project {
            Some(project) if !self.use_global => &project.store,
            _ => &self.global,
        }
    }

    fn scope_label(&self) -> String {
        match &self.project {
            Some(project) if self.use_global => format!("global (via project '{}')", project.id),
            Some(project) => format!("project '{}'", project.id),
            None => "global".to_string(),
        }
    }

    fn ensure_loaded(&self) -> Result<(), ResolverError> {
        if self.state.is_loaded() {
            Ok(())
        } else {
            Err(ResolverError::NotLoaded)
        }
    }

    fn ensure_editable(&self) -> Result<(), ResolverError> {
        self.ensure_loaded()?;
        match &self.project {
            Some(project) if self.use_global => {
                Err(ResolverError::ScopeDelegated(project.id.clone()))
            }
            _ => Ok(()),
        }
    }

    fn snapshot(&self) -> ResolverSnapshot {
        ResolverSnapshot {
            state: self.state.clone(),
            configuration: self.active_configuration().clone(),
            use_global: self.use_global,
            rendered: self.rendered.clone(),
        }
    }

    fn resolve_and_diff(&mut self, before: ResolverSnapshot) -> Vec<StateChange> {
        self.resolve();
        let changes = detect_changes(&before, &self.snapshot());
        tracing::debug!("Resolver is {} after {} changes", self.state.name(), changes.len());
        changes
    }

    /// Run the locator, then the renderer, on the active configuration.
    fn resolve(&mut self) {
        let config = self.active_configuration().clone();
        let method = config.resolution_method();
        let start = Instant::now();

        match self
            .locator
            .locate(method, config.get(ConfigurationKey::CheckerPath))
        {
            Ok(handle) => {
                self.metrics.record_resolution(true, start.elapsed());

                let log_file = self.project.as_ref().and_then(ProjectScope::log_file);
                let input = RenderInput::from_configuration(&config, log_file);
                self.rendered = CommandRenderer::render(Some(&handle), &input);
                self.metrics.record_render();

                self.state = ResolverState::Valid(handle);
            }
            Err(e) => {
                self.metrics.record_resolution(false, start.elapsed());
                tracing::warn!("Could not resolve CodeChecker ({}): {}", method, e);

                self.rendered.clear();
                self.state = ResolverState::Invalid(e);
            }
        }
    }
}
