use camino::{Utf8Path, Utf8PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Subcommand asking the analyzer for its version
pub const VERSION_SUBCOMMAND: &str = "version";

/// Upper bound for a single version query
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the version sanity probe
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to run {path}: {source}")]
    Spawn {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Version query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Version query exited with status {0}")]
    ExitStatus(i32),

    #[error("Could not parse a version from output: {0:?}")]
    Unparsable(String),
}

/// Runs `<executable> version` with a hard timeout.
///
/// The query runs on a private current-thread tokio runtime, so callers stay
/// synchronous. It must not be called from inside another tokio runtime.
#[derive(Debug, Clone)]
pub struct VersionProbe {
    timeout: Duration,
}

impl VersionProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run the version query and return its standard output.
    pub fn query(&self, executable: &Utf8Path) -> Result<String, ProbeError> {
        let spawn_error = |source| ProbeError::Spawn {
            path: executable.to_path_buf(),
            source,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(spawn_error)?;

        let start = Instant::now();
        tracing::debug!("Probing {} {}", executable, VERSION_SUBCOMMAND);

        let output = runtime.block_on(async {
            let mut cmd = Command::new(executable.as_std_path());
            cmd.arg(VERSION_SUBCOMMAND).kill_on_drop(true);

            timeout(self.timeout, cmd.output()).await
        });

        let output = output
            .map_err(|_| {
                tracing::warn!(
                    "Version probe of {} timed out after {:?}",
                    executable,
                    self.timeout
                );
                ProbeError::Timeout(self.timeout)
            })?
            .map_err(spawn_error)?;

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(
            "Version probe of {} finished in {:.2}s with exit code {}",
            executable,
            start.elapsed().as_secs_f32(),
            exit_code
        );

        if !output.status.success() {
            return Err(ProbeError::ExitStatus(exit_code));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for VersionProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}
