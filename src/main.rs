//! codechecker-resolver - command line front end
//!
//! Loads the analyzer configuration of the global scope or of one project,
//! applies at most one edit, then prints the status message and the
//! `CodeChecker analyze` command that would run.
//!
//! # Usage
//!
//! ```text
//! codechecker-resolver show
//! codechecker-resolver set analysis_threads 8 --save
//! codechecker-resolver --project demo --log-file build/compile_commands.json show
//! codechecker-resolver --project demo use-global true --save
//! codechecker-resolver reset
//! ```
//!
//! Runtime settings (preference directory, logging, probe timeout) come from
//! [`AppSettings`]: built-in defaults, then `--settings <file>`, then `CCR_*`
//! environment variables.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};
use codechecker_resolver::config::YamlPreferenceStore;
use codechecker_resolver::services::SystemDiscovery;
use codechecker_resolver::state::{Severity, StateChange};
use codechecker_resolver::{
    APP_NAME, AppSettings, ConfigurationKey, ConfigurationResolver, ProjectScope, SettingsStore,
    VERSION,
};

#[derive(Parser)]
#[command(name = "codechecker-resolver")]
#[command(version, about = "Resolve the CodeChecker analyzer and render its analyze command", long_about = None)]
struct Cli {
    /// Runtime settings file (YAML, TOML or JSON)
    #[arg(long, global = true)]
    settings: Option<Utf8PathBuf>,

    /// Work on this project's configuration instead of the global one
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Compilation log of the project, passed to the analyze command
    #[arg(long, global = true, requires = "project")]
    log_file: Option<Utf8PathBuf>,

    /// Persist the configuration after applying the command
    #[arg(long, global = true)]
    save: bool,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the configuration, status and rendered command (default)
    Show,

    /// Set one configuration value
    Set {
        /// checker_path, analysis_options, analysis_threads, compiler_names or resolution_method
        key: ConfigurationKey,
        value: String,
    },

    /// Make a project use the global configuration (true) or its own (false)
    UseGlobal {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },

    /// Reset the active configuration to the built-in defaults
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = AppSettings::load(cli.settings.as_deref())?;
    let _guard = codechecker_resolver::logging::setup_logging_with_console(
        &settings.log_dir,
        &settings.log_prefix,
        settings.debug_mode,
        settings.console_output || cli.verbose,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let discovery = SystemDiscovery::new().with_probe_timeout(settings.probe_timeout());
    let global = SettingsStore::new(YamlPreferenceStore::global(&settings.preferences_dir));

    let mut resolver = match &cli.project {
        Some(id) => {
            let store = YamlPreferenceStore::project(&settings.preferences_dir, id);
            tracing::info!("Project preferences at {}", store.path());
            let project = ProjectScope::new(id.clone(), SettingsStore::new(store), cli.log_file.clone());
            ConfigurationResolver::for_project(global, project, discovery)
        }
        None => ConfigurationResolver::global(global, discovery),
    };

    let mut changes = resolver.load().context("Failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Show) {
        Commands::Show => {}
        Commands::Set { key, value } => {
            changes.extend(
                resolver
                    .set_field(key, value)
                    .with_context(|| format!("Failed to set {}", key))?,
            );
        }
        Commands::UseGlobal { enabled } => {
            changes.extend(
                resolver
                    .switch_scope(enabled)
                    .context("Failed to switch configuration scope")?,
            );
        }
        Commands::Reset => {
            changes.extend(
                resolver
                    .reset_to_defaults()
                    .context("Failed to reset configuration")?,
            );
        }
    }

    if cli.save {
        changes.extend(resolver.save().context("Failed to save configuration")?);
    }

    for change in &changes {
        tracing::debug!("{:?}", change);
    }

    print_report(&resolver);

    if changes.contains(&StateChange::Saved) {
        println!("Configuration saved.");
    }

    resolver.metrics().log_summary();

    Ok(())
}

fn print_report(resolver: &ConfigurationResolver<SystemDiscovery>) {
    let scope = match resolver.project() {
        Some(project) if resolver.uses_global() => {
            format!("project '{}' (using global configuration)", project.id())
        }
        Some(project) => format!("project '{}'", project.id()),
        None => "global".to_string(),
    };
    println!("Scope: {}", scope);

    for (key, value) in resolver.active_configuration().iter() {
        println!("  {:<18} {}", key, value);
    }

    let status = resolver.current_status_message();
    match status.severity {
        Severity::None => {}
        Severity::Info => println!("{}", status.text),
        Severity::Error => eprintln!("error: {}", status.text),
    }

    let command = resolver.current_rendered_command();
    if !command.is_empty() {
        println!("{}", command);
    }
}
