use crate::models::{AnalyzerHandle, Configuration, ConfigurationKey};
use camino::{Utf8Path, Utf8PathBuf};

/// Analyzer subcommand rendered after the executable
pub const ANALYZE_SUBCOMMAND: &str = "analyze";

/// Flag carrying the number of analysis threads
pub const THREADS_FLAG: &str = "-j";

/// Flag carrying the captured compiler commands
pub const COMPILERS_FLAG: &str = "--compilers";

/// Everything besides the analyzer location needed to render a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderInput {
    /// Raw thread count as typed by the user
    pub threads: String,
    pub compilers: Vec<String>,
    /// Passed through unescaped
    pub extra_options: String,
    pub log_file: Option<Utf8PathBuf>,
}

impl RenderInput {
    pub fn from_configuration(config: &Configuration, log_file: Option<&Utf8Path>) -> Self {
        Self {
            threads: config.get(ConfigurationKey::AnalysisThreads).to_string(),
            compilers: config.compilers(),
            extra_options: config.get(ConfigurationKey::AnalysisOptions).to_string(),
            log_file: log_file.map(Utf8Path::to_path_buf),
        }
    }
}

/// Renders the analysis command shown to the user.
///
/// Rendering is advisory and never executes anything. It is a pure function of
/// its inputs, so it can run on every keystroke.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRenderer;

impl CommandRenderer {
    /// Build the command line.
    ///
    /// Order: executable and subcommand, compile log, thread count, compiler
    /// list, then the extra options verbatim. Optional parts are left out when
    /// unset. Without an analyzer the result is empty.
    pub fn render(analyzer: Option<&AnalyzerHandle>, input: &RenderInput) -> String {
        let Some(analyzer) = analyzer else {
            return String::new();
        };

        let mut parts = vec![
            format!("\"{}\"", analyzer.location()),
            ANALYZE_SUBCOMMAND.to_string(),
        ];

        if let Some(log_file) = &input.log_file {
            parts.push(format!("\"{}\"", log_file));
        }

        if let Some(threads) = parse_thread_count(&input.threads) {
            parts.push(format!("{} {}", THREADS_FLAG, threads));
        }

        if !input.compilers.is_empty() {
            parts.push(format!("{} {}", COMPILERS_FLAG, input.compilers.join(":")));
        }

        let extra = input.extra_options.trim();
        if !extra.is_empty() {
            parts.push(extra.to_string());
        }

        parts.join(" ")
    }
}

/// Parse a thread count. Anything but plain decimal digits reads as unset.
pub fn parse_thread_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        tracing::debug!("Ignoring thread count '{}': not a plain number", raw);
        return None;
    }

    match trimmed.parse::<u32>() {
        Ok(threads) => Some(threads),
        Err(e) => {
            tracing::debug!("Ignoring thread count '{}': {}", raw, e);
            None
        }
    }
}
