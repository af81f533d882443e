//! Services module - analyzer discovery and command rendering.
//!
//! Framework-agnostic business logic with no dependency on any presentation layer.
//!
//! # Components
//!
//! - [`AnalyzerLocator`]: finds a CodeChecker installation either on the search path or
//!   inside a pre-built package directory, then runs a single version query as a sanity probe
//! - [`Discovery`]: the process-level collaborator the locator reads through
//!   ([`SystemDiscovery`] for the real environment)
//! - [`VersionProbe`]: runs `CodeChecker version` with a hard timeout
//! - [`CommandRenderer`]: turns a located analyzer and a configuration into the
//!   `CodeChecker analyze ...` command line shown to the user
//!
//! # Usage Example
//!
//! ```ignore
//! use codechecker_resolver::models::{Configuration, ResolutionMethod};
//! use codechecker_resolver::services::{AnalyzerLocator, CommandRenderer, RenderInput, SystemDiscovery};
//!
//! let locator = AnalyzerLocator::new(SystemDiscovery::new());
//! let analyzer = locator.locate(ResolutionMethod::SearchPath, "")?;
//!
//! let config = Configuration::defaults();
//! let input = RenderInput::from_configuration(&config, None);
//! println!("{}", CommandRenderer::render(Some(&analyzer), &input));
//! ```

pub mod command;
pub mod locator;
pub mod probe;

pub use command::{CommandRenderer, RenderInput, parse_thread_count};
pub use locator::{AnalyzerLocator, Discovery, LocateError, SystemDiscovery};
pub use probe::{DEFAULT_PROBE_TIMEOUT, ProbeError, VersionProbe};
