//! Analysis options.
//!
//! Options are read from a `pyzconfig.json` file (camelCase keys, every field
//! optional) and may be overridden by the command line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interpreter version the analyzed code targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PythonVersion {
    pub major: u8,
    pub minor: u8,
}

impl PythonVersion {
    pub const DEFAULT: PythonVersion = PythonVersion {
        major: 3,
        minor: 12,
    };

    pub const fn new(major: u8, minor: u8) -> Self {
        PythonVersion { major, minor }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let (major, minor) = text.trim().split_once('.')?;
        Some(PythonVersion {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }
}

impl Default for PythonVersion {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl TryFrom<String> for PythonVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PythonVersion::parse(&value).ok_or_else(|| format!("invalid python version '{value}'"))
    }
}

impl From<PythonVersion> for String {
    fn from(value: PythonVersion) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PythonPlatform {
    #[default]
    Linux,
    Darwin,
    Windows,
    All,
}

/// Which invalidation policy the program uses after a content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvalidationMode {
    /// Full invalidation only when a module's public symbol set changed.
    #[default]
    PublicSymbols,
    /// Every content change invalidates every unit.
    Always,
    /// Only the transitive dependents of a changed unit are invalidated.
    DependentsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    pub python_version: PythonVersion,
    pub python_platform: PythonPlatform,
    /// Extra directories searched for non-workspace modules.
    pub search_paths: Vec<String>,
    /// Directories absolute imports are resolved against, in order.
    pub execution_roots: Vec<String>,
    pub invalidation: InvalidationMode,
    pub report_unresolved_imports: bool,
    pub max_evaluation_depth: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            python_version: PythonVersion::DEFAULT,
            python_platform: PythonPlatform::default(),
            search_paths: Vec::new(),
            execution_roots: vec![String::new()],
            invalidation: InvalidationMode::default(),
            report_unresolved_imports: true,
            max_evaluation_depth: crate::limits::MAX_EVAL_DEPTH,
        }
    }
}

impl AnalysisOptions {
    /// Parse options from the JSON text of a config file.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod options_tests;
