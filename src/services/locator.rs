//! Analyzer discovery.
//!
//! [`AnalyzerLocator`] turns a [`ResolutionMethod`] and a user-supplied path into
//! an [`AnalyzerHandle`]. All process-level access (search path, file
//! permissions, the version query) goes through the [`Discovery`] collaborator,
//! so the locator itself only reads file metadata.
//!
//! Resolution is cheap and read-only. It runs again on every relevant input
//! change so the presentation layer can show the outcome immediately.

use super::probe::{ProbeError, VersionProbe};
use crate::models::{ANALYZER_EXECUTABLE, AnalyzerHandle, ResolutionMethod};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::fs;
use std::time::Duration;
use thiserror::Error;

/// Why an analyzer could not be located
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("CodeChecker not found: {0}")]
    NotFound(String),

    #[error("Invalid CodeChecker installation at {path}: {reason}")]
    InvalidInstallation { path: Utf8PathBuf, reason: String },

    #[error("Malformed CodeChecker path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },
}

/// Process-level discovery collaborator.
#[cfg_attr(test, mockall::automock)]
pub trait Discovery {
    /// Directories of the process search path, in lookup order
    fn search_dirs(&self) -> Vec<Utf8PathBuf>;

    /// Whether `path` is a regular file the current user may execute
    fn is_executable(&self, path: &Utf8Path) -> bool;

    /// Standard output of the analyzer's version query
    fn version_output(&self, executable: &Utf8Path) -> Result<String, ProbeError>;
}

/// Discovery against the real environment: `PATH`, file permissions and a
/// timed subprocess.
#[derive(Debug, Clone, Default)]
pub struct SystemDiscovery {
    search_dirs_override: Option<Vec<Utf8PathBuf>>,
    probe: VersionProbe,
}

impl SystemDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe = VersionProbe::new(timeout);
        self
    }

    /// Use a fixed list of directories instead of `PATH`.
    pub fn with_search_dirs(mut self, dirs: Vec<Utf8PathBuf>) -> Self {
        self.search_dirs_override = Some(dirs);
        self
    }
}

impl Discovery for SystemDiscovery {
    fn search_dirs(&self) -> Vec<Utf8PathBuf> {
        if let Some(dirs) = &self.search_dirs_override {
            return dirs.clone();
        }

        let Some(path_var) = std::env::var_os("PATH") else {
            tracing::debug!("PATH is not set");
            return Vec::new();
        };

        std::env::split_paths(&path_var)
            .filter_map(|dir| match Utf8PathBuf::from_path_buf(dir) {
                Ok(dir) => Some(dir),
                Err(dir) => {
                    tracing::debug!("Skipping non UTF-8 search path entry {}", dir.display());
                    None
                }
            })
            .filter(|dir| !dir.as_str().is_empty())
            .collect()
    }

    fn is_executable(&self, path: &Utf8Path) -> bool {
        let Ok(metadata) = fs::metadata(path) else {
            return false;
        };
        if !metadata.is_file() {
            return false;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            metadata.permissions().mode() & 0o111 != 0
        }

        #[cfg(not(unix))]
        {
            true
        }
    }

    fn version_output(&self, executable: &Utf8Path) -> Result<String, ProbeError> {
        self.probe.query(executable)
    }
}

/// Locates and sanity-checks an analyzer installation.
///
/// # Fields
///
/// - `version_pattern`: matches a dotted version such as `6.19.1` or `6.20.0-rc1`
///   in the output of `CodeChecker version`
pub struct AnalyzerLocator<D: Discovery> {
    discovery: D,
    version_pattern: Regex,
}

impl<D: Discovery> AnalyzerLocator<D> {
    pub fn new(discovery: D) -> Self {
        Self {
            discovery,
            version_pattern: Regex::new(r"\bv?(\d+\.\d+(?:\.\d+)?(?:[-+][0-9A-Za-z.]+)?)")
                .expect("Invalid version regex"),
        }
    }

    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    /// Find the analyzer using `method`.
    ///
    /// `supplied_path` is only read by [`ResolutionMethod::PreBuiltDirectory`].
    /// At most one version query is made per call.
    pub fn locate(
        &self,
        method: ResolutionMethod,
        supplied_path: &str,
    ) -> Result<AnalyzerHandle, LocateError> {
        let candidate = match method {
            ResolutionMethod::SearchPath => self.find_in_search_path()?,
            ResolutionMethod::PreBuiltDirectory => self.find_in_package(supplied_path)?,
        };

        let location = canonical_location(&candidate)?;
        let version = self.probe_version(&location)?;

        tracing::info!("Located CodeChecker {} at {}", version, location);
        Ok(AnalyzerHandle::new(location, version))
    }

    fn find_in_search_path(&self) -> Result<Utf8PathBuf, LocateError> {
        let dirs = self.discovery.search_dirs();

        for dir in &dirs {
            let candidate = dir.join(ANALYZER_EXECUTABLE);
            if self.discovery.is_executable(&candidate) {
                tracing::debug!("Found {} on search path", candidate);
                return Ok(candidate);
            }
        }

        tracing::debug!(
            "{} not found in {} search path directories",
            ANALYZER_EXECUTABLE,
            dirs.len()
        );
        Err(LocateError::NotFound(format!(
            "no executable named {} in any of the {} search path directories",
            ANALYZER_EXECUTABLE,
            dirs.len()
        )))
    }

    fn find_in_package(&self, supplied_path: &str) -> Result<Utf8PathBuf, LocateError> {
        let trimmed = supplied_path.trim();
        if trimmed.is_empty() {
            return Err(LocateError::MalformedPath {
                path: supplied_path.to_string(),
                reason: "no path supplied".to_string(),
            });
        }
        if trimmed.contains('\0') {
            return Err(LocateError::MalformedPath {
                path: supplied_path.to_string(),
                reason: "path contains a NUL byte".to_string(),
            });
        }

        let path = Utf8PathBuf::from(trimmed);
        let metadata = fs::metadata(&path).map_err(|e| LocateError::MalformedPath {
            path: trimmed.to_string(),
            reason: match e.kind() {
                std::io::ErrorKind::NotFound => "path does not exist".to_string(),
                _ => e.to_string(),
            },
        })?;

        if metadata.is_file() {
            if self.discovery.is_executable(&path) {
                return Ok(path);
            }
            return Err(LocateError::NotFound(format!("{} is not executable", path)));
        }

        let candidates = [
            path.join(ANALYZER_EXECUTABLE),
            path.join("bin").join(ANALYZER_EXECUTABLE),
        ];
        candidates
            .into_iter()
            .find(|candidate| self.discovery.is_executable(candidate))
            .ok_or_else(|| {
                LocateError::NotFound(format!(
                    "no executable {} in {} or {}",
                    ANALYZER_EXECUTABLE,
                    path,
                    path.join("bin")
                ))
            })
    }

    fn probe_version(&self, location: &Utf8Path) -> Result<String, LocateError> {
        let invalid = |reason: String| LocateError::InvalidInstallation {
            path: location.to_path_buf(),
            reason,
        };

        let output = self
            .discovery
            .version_output(location)
            .map_err(|e| invalid(e.to_string()))?;

        self.parse_version(&output)
            .ok_or_else(|| invalid(ProbeError::Unparsable(output.trim().to_string()).to_string()))
    }

    /// Extract the version from `CodeChecker version` output.
    ///
    /// Lines mentioning the package version win over any other dotted number.
    pub fn parse_version(&self, output: &str) -> Option<String> {
        let preferred = output
            .lines()
            .filter(|line| line.to_ascii_lowercase().contains("package version"));
        let rest = output.lines();

        preferred
            .chain(rest)
            .find_map(|line| self.version_pattern.captures(line))
            .map(|caps| caps[1].to_string())
    }
}

/// Absolute, symlink-free UTF-8 location of an existing candidate.
fn canonical_location(candidate: &Utf8Path) -> Result<Utf8PathBuf, LocateError> {
    let canonical =
        fs::canonicalize(candidate).map_err(|e| LocateError::InvalidInstallation {
            path: candidate.to_path_buf(),
            reason: e.to_string(),
        })?;

    Utf8PathBuf::from_path_buf(canonical).map_err(|p| LocateError::MalformedPath {
        path: p.display().to_string(),
        reason: "location is not valid UTF-8".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    fn touch(path: &Utf8Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_search_path_not_found() {
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_search_dirs()
            .returning(|| vec![Utf8PathBuf::from("/a"), Utf8PathBuf::from("/b")]);
        discovery.expect_is_executable().returning(|_| false);
        discovery.expect_version_output().never();

        let locator = AnalyzerLocator::new(discovery);
        let err = locator.locate(ResolutionMethod::SearchPath, "").unwrap_err();
        assert!(matches!(err, LocateError::NotFound(_)));
    }

    #[test]
    fn test_search_path_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let first_dir = temp_utf8(&first);
        let second_dir = temp_utf8(&second);
        touch(&first_dir.join(ANALYZER_EXECUTABLE));
        touch(&second_dir.join(ANALYZER_EXECUTABLE));

        let dirs = vec![first_dir.clone(), second_dir];
        let mut discovery = MockDiscovery::new();
        discovery.expect_search_dirs().returning(move || dirs.clone());
        discovery.expect_is_executable().returning(|_| true);
        discovery
            .expect_version_output()
            .times(1)
            .returning(|_| Ok("Base package version | 6.19.1\n".to_string()));

        let locator = AnalyzerLocator::new(discovery);
        let handle = locator
            .locate(ResolutionMethod::SearchPath, "ignored")
            .unwrap();

        let expected = fs::canonicalize(first_dir.join(ANALYZER_EXECUTABLE)).unwrap();
        assert_eq!(handle.location().as_std_path(), expected);
        assert_eq!(handle.version(), "6.19.1");
    }

    #[test]
    fn test_prebuilt_empty_path_is_malformed() {
        let mut discovery = MockDiscovery::new();
        discovery.expect_is_executable().never();

        let locator = AnalyzerLocator::new(discovery);
        let err = locator
            .locate(ResolutionMethod::PreBuiltDirectory, "   ")
            .unwrap_err();
        assert!(matches!(err, LocateError::MalformedPath { .. }));
    }

    #[test]
    fn test_prebuilt_missing_path_is_malformed() {
        let locator = AnalyzerLocator::new(MockDiscovery::new());
        let err = locator
            .locate(ResolutionMethod::PreBuiltDirectory, "/nonexistent/codechecker")
            .unwrap_err();
        assert!(matches!(err, LocateError::MalformedPath { .. }));
    }

    #[test]
    fn test_prebuilt_directory_without_executable() {
        let dir = TempDir::new().unwrap();
        let mut discovery = MockDiscovery::new();
        discovery.expect_is_executable().returning(|_| false);

        let locator = AnalyzerLocator::new(discovery);
        let err = locator
            .locate(ResolutionMethod::PreBuiltDirectory, temp_utf8(&dir).as_str())
            .unwrap_err();
        assert!(matches!(err, LocateError::NotFound(_)));
    }

    #[test]
    fn test_prebuilt_bin_subdirectory() {
        let dir = TempDir::new().unwrap();
        let root = temp_utf8(&dir);
        let executable = root.join("bin").join(ANALYZER_EXECUTABLE);
        touch(&executable);

        let expected = executable.clone();
        let mut discovery = MockDiscovery::new();
        discovery
            .expect_is_executable()
            .returning(move |path| path == expected.as_path());
        discovery
            .expect_version_output()
            .returning(|_| Ok("6.20.0\n".to_string()));

        let locator = AnalyzerLocator::new(discovery);
        let handle = locator
            .locate(ResolutionMethod::PreBuiltDirectory, root.as_str())
            .unwrap();
        assert!(handle.location().ends_with(Utf8Path::new("bin").join(ANALYZER_EXECUTABLE)));
        assert_eq!(handle.version(), "6.20.0");
    }

    #[test]
    fn test_failed_probe_is_invalid_installation() {
        let dir = TempDir::new().unwrap();
        let executable = temp_utf8(&dir).join(ANALYZER_EXECUTABLE);
        touch(&executable);

        let mut discovery = MockDiscovery::new();
        discovery.expect_is_executable().returning(|_| true);
        discovery
            .expect_version_output()
            .times(1)
            .returning(|_| Err(ProbeError::ExitStatus(1)));

        let locator = AnalyzerLocator::new(discovery);
        let err = locator
            .locate(ResolutionMethod::PreBuiltDirectory, executable.as_str())
            .unwrap_err();
        assert!(matches!(err, LocateError::InvalidInstallation { .. }));
    }

    #[test]
    fn test_unparsable_version_is_invalid_installation() {
        let dir = TempDir::new().unwrap();
        let executable = temp_utf8(&dir).join(ANALYZER_EXECUTABLE);
        touch(&executable);

        let mut discovery = MockDiscovery::new();
        discovery.expect_is_executable().returning(|_| true);
        discovery
            .expect_version_output()
            .returning(|_| Ok("usage: CodeChecker [-h]".to_string()));

        let locator = AnalyzerLocator::new(discovery);
        let err = locator
            .locate(ResolutionMethod::PreBuiltDirectory, executable.as_str())
            .unwrap_err();
        match err {
            LocateError::InvalidInstallation { reason, .. } => {
                assert!(reason.contains("Could not parse"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_version_prefers_package_line() {
        let locator = AnalyzerLocator::new(MockDiscovery::new());
        let output = "Kind                 | Version\n\
                      Python 3.8.10\n\
                      Base package version | 6.19.1\n\
                      Package build date   | 2022-03-01T10:00";
        assert_eq!(locator.parse_version(output), Some("6.19.1".to_string()));
        assert_eq!(locator.parse_version("v6.21.0-rc1"), Some("6.21.0-rc1".to_string()));
        assert_eq!(locator.parse_version("no digits here"), None);
    }

    #[test]
    fn test_system_discovery_override_dirs() {
        let discovery =
            SystemDiscovery::new().with_search_dirs(vec![Utf8PathBuf::from("/only/here")]);
        assert_eq!(discovery.search_dirs(), vec![Utf8PathBuf::from("/only/here")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_discovery_checks_mode_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = temp_utf8(&dir).join(ANALYZER_EXECUTABLE);
        touch(&path);

        let discovery = SystemDiscovery::new();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        assert!(!discovery.is_executable(&path));

        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(discovery.is_executable(&path));

        assert!(!discovery.is_executable(&temp_utf8(&dir)));
    }
}
