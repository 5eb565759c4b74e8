//! `pyzconfig.json` discovery and the merge of file and command-line
//! options.

use anyhow::{Context, Result, bail};
use pyz::common::{AnalysisOptions, PythonVersion};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::args::CliArgs;

pub const CONFIG_FILE_NAME: &str = "pyzconfig.json";

/// Contents of a `pyzconfig.json`: analysis options plus which files the
/// project covers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(flatten)]
    pub options: AnalysisOptions,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

/// The nearest `pyzconfig.json` in `cwd` or one of its ancestors.
pub fn find_config(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// `--project` may name the config file or its directory.
pub fn resolve_config_path(cwd: &Path, project: Option<&Path>) -> Result<Option<PathBuf>> {
    let Some(project) = project else {
        return Ok(find_config(cwd));
    };
    let project = cwd.join(project);
    let candidate = if project.is_dir() {
        project.join(CONFIG_FILE_NAME)
    } else {
        project
    };
    if !candidate.is_file() {
        bail!("project config not found: {}", candidate.display());
    }
    Ok(Some(candidate))
}

pub fn load_config(path: &Path) -> Result<ProjectConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_config(&text).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn parse_config(text: &str) -> Result<ProjectConfig> {
    Ok(serde_json::from_str(text)?)
}

/// Directory relative program paths are resolved against.
pub fn config_base_dir(cwd: &Path, config_path: Option<&Path>) -> PathBuf {
    config_path
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf())
}

/// Command-line flags override the config file.
pub fn resolve_options(args: &CliArgs, config: Option<&ProjectConfig>) -> Result<AnalysisOptions> {
    let mut options = config.map(|c| c.options.clone()).unwrap_or_default();
    if let Some(version) = &args.python_version {
        options.python_version = PythonVersion::parse(version)
            .with_context(|| format!("invalid --pythonVersion '{version}'"))?;
    }
    if let Some(platform) = args.python_platform {
        options.python_platform = platform.into();
    }
    options.search_paths.extend(args.search_paths.iter().cloned());
    if let Some(mode) = args.invalidation {
        options.invalidation = mode.into();
    }
    if args.ignore_unresolved_imports {
        options.report_unresolved_imports = false;
    }
    if let Some(depth) = args.max_evaluation_depth {
        if depth == 0 {
            bail!("--maxEvaluationDepth must be at least 1");
        }
        options.max_evaluation_depth = depth;
    }
    Ok(options)
}
