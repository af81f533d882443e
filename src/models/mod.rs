//! Data models for the analyzer configuration resolver.
//!
//! - [`Configuration`]: every [`ConfigurationKey`] mapped to its string value, with defaults
//! - [`ResolutionMethod`]: how the analyzer is found (search path or pre-built package)
//! - [`AnalyzerHandle`]: a located, sanity-checked analyzer installation
//!
//! Snapshots of these types are handed between components by value.

pub mod analyzer;
pub mod configuration;

pub use analyzer::{ANALYZER_EXECUTABLE, AnalyzerHandle};
pub use configuration::{
    Configuration, ConfigurationKey, DEFAULT_ANALYSIS_THREADS, DEFAULT_COMPILER_NAMES,
    PartialConfiguration, ResolutionMethod, parse_compiler_list,
};
