use camino::{Utf8Path, Utf8PathBuf};

/// Name of the analyzer executable looked up on disk
#[cfg(windows)]
pub const ANALYZER_EXECUTABLE: &str = "CodeChecker.exe";

/// Name of the analyzer executable looked up on disk
#[cfg(not(windows))]
pub const ANALYZER_EXECUTABLE: &str = "CodeChecker";

/// A successfully located analyzer installation.
///
/// Created only by [`AnalyzerLocator`](crate::services::AnalyzerLocator) and
/// replaced wholesale whenever resolution runs again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerHandle {
    location: Utf8PathBuf,
    version: String,
}

impl AnalyzerHandle {
    pub fn new(location: Utf8PathBuf, version: impl Into<String>) -> Self {
        Self {
            location,
            version: version.into(),
        }
    }

    /// Canonical absolute path of the executable
    pub fn location(&self) -> &Utf8Path {
        &self.location
    }

    /// Version reported by the sanity probe
    pub fn version(&self) -> &str {
        &self.version
    }
}
