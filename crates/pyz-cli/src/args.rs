use clap::{Parser, ValueEnum};
use pyz::common::{InvalidationMode, PythonPlatform};
use std::path::PathBuf;

/// CLI arguments for the pyz binary.
#[derive(Parser, Debug)]
#[command(
    name = "pyz",
    version,
    about = "Incremental static analysis for Python sources"
)]
pub struct CliArgs {
    /// Files or directories to check. Defaults to the project directory.
    pub paths: Vec<PathBuf>,

    /// Path to pyzconfig.json or a directory containing it.
    #[arg(short = 'p', long = "project")]
    pub project: Option<PathBuf>,

    /// Print the final configuration instead of checking.
    #[arg(long = "showConfig", alias = "show-config")]
    pub show_config: bool,

    /// Print the files that would be checked and stop.
    #[arg(long = "listFilesOnly", alias = "list-files-only")]
    pub list_files_only: bool,

    // ==================== Environment ====================
    /// Python version the sources target (e.g. 3.12).
    #[arg(long = "pythonVersion", alias = "python-version")]
    pub python_version: Option<String>,

    /// Platform the sources target.
    #[arg(long = "pythonPlatform", alias = "python-platform", value_enum, ignore_case = true)]
    pub python_platform: Option<Platform>,

    /// Extra directories searched for imported modules.
    #[arg(long = "searchPath", alias = "search-path")]
    pub search_paths: Vec<String>,

    /// Glob patterns of files to leave out of the check.
    #[arg(long)]
    pub exclude: Vec<String>,

    // ==================== Analysis ====================
    /// When a content change invalidates every analyzed file.
    #[arg(long, value_enum)]
    pub invalidation: Option<Invalidation>,

    /// Do not report imports that cannot be resolved.
    #[arg(long = "ignoreUnresolvedImports", alias = "ignore-unresolved-imports")]
    pub ignore_unresolved_imports: bool,

    /// Maximum depth of type evaluation before giving up on a chain.
    #[arg(long = "maxEvaluationDepth", alias = "max-evaluation-depth")]
    pub max_evaluation_depth: Option<u32>,

    // ==================== Output ====================
    /// Diagnostic output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Colorize diagnostics. Defaults to on when stdout is a terminal.
    #[arg(long)]
    pub pretty: Option<bool>,

    /// Print pipeline counters after the check.
    #[arg(long)]
    pub stats: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
    All,
}

impl From<Platform> for PythonPlatform {
    fn from(value: Platform) -> Self {
        match value {
            Platform::Linux => PythonPlatform::Linux,
            Platform::Darwin => PythonPlatform::Darwin,
            Platform::Windows => PythonPlatform::Windows,
            Platform::All => PythonPlatform::All,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Invalidation {
    #[value(name = "publicSymbols", alias = "public-symbols")]
    PublicSymbols,
    Always,
    #[value(name = "dependentsOnly", alias = "dependents-only")]
    DependentsOnly,
}

impl From<Invalidation> for InvalidationMode {
    fn from(value: Invalidation) -> Self {
        match value {
            Invalidation::PublicSymbols => InvalidationMode::PublicSymbols,
            Invalidation::Always => InvalidationMode::Always,
            Invalidation::DependentsOnly => InvalidationMode::DependentsOnly,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
