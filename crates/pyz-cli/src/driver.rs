//! Discover the files of a project, build a program over them and run a
//! whole-program check.

use anyhow::{Context, Result, bail};
use globset::{Glob, GlobSet, GlobSetBuilder};
use pyz::common::AnalysisOptions;
use pyz::program::{Program, ProgramStats, RealFileSystem, StaticHost};
use pyz::{CancellationToken, Diagnostic, FileDiagnostics};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::args::CliArgs;
use crate::config::{ProjectConfig, config_base_dir, load_config, resolve_config_path, resolve_options};

const SOURCE_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Directories never descended into during discovery.
const SKIPPED_DIRS: &[&str] = &["__pycache__", "node_modules", "site-packages"];

/// Everything a run needs before the program is built.
#[derive(Debug, Clone)]
pub struct Project {
    pub base_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub options: AnalysisOptions,
    /// Program paths (`/`-separated, relative to `base_dir`), sorted.
    pub files: Vec<String>,
}

#[derive(Debug)]
pub struct CheckResult {
    pub files: Vec<FileDiagnostics>,
    pub stats: ProgramStats,
    /// Content each file was checked against, keyed by program path.
    pub sources: FxHashMap<String, String>,
}

impl CheckResult {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|f| f.diagnostics.iter())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics().filter(|d| !d.is_error()).count()
    }
}

pub fn load_project(args: &CliArgs, cwd: &Path) -> Result<Project> {
    let config_path = resolve_config_path(cwd, args.project.as_deref())?;
    let config = match &config_path {
        Some(path) => Some(load_config(path)?),
        None => None,
    };
    let options = resolve_options(args, config.as_ref())?;
    let base_dir = config_base_dir(cwd, config_path.as_deref());

    let mut excludes: Vec<String> = config
        .as_ref()
        .and_then(|c| c.exclude.clone())
        .unwrap_or_default();
    excludes.extend(args.exclude.iter().cloned());
    let exclude = build_glob_set(&excludes)?;

    let inputs = input_roots(args, config.as_ref(), cwd, &base_dir);
    let files = discover_files(&base_dir, &inputs, &exclude)?;
    debug!(
        base = %base_dir.display(),
        files = files.len(),
        config = ?config_path,
        "loaded project"
    );
    Ok(Project {
        base_dir,
        config_path,
        options,
        files,
    })
}

/// Command-line paths win over the config's `include`; with neither, the
/// whole base directory is checked.
fn input_roots(
    args: &CliArgs,
    config: Option<&ProjectConfig>,
    cwd: &Path,
    base_dir: &Path,
) -> Vec<PathBuf> {
    if !args.paths.is_empty() {
        return args.paths.iter().map(|p| cwd.join(p)).collect();
    }
    match config.and_then(|c| c.include.as_ref()) {
        Some(include) if !include.is_empty() => {
            include.iter().map(|p| base_dir.join(p)).collect()
        }
        _ => vec![base_dir.to_path_buf()],
    }
}

pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("invalid exclude pattern '{pattern}'"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn is_hidden_or_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()))
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// `base_dir`-relative program path of `path`, `/`-separated.
pub fn program_path(base_dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Source files below `inputs`, as sorted, de-duplicated program paths.
pub fn discover_files(base_dir: &Path, inputs: &[PathBuf], exclude: &GlobSet) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.exists() {
            bail!("path not found: {}", input.display());
        }
        if !input.starts_with(base_dir) {
            bail!(
                "{} is outside the project directory {}",
                input.display(),
                base_dir.display()
            );
        }
        let walker = WalkDir::new(input)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_hidden_or_skipped(entry));
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", input.display()))?;
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }
            let Some(path) = program_path(base_dir, entry.path()) else {
                continue;
            };
            if exclude.is_match(&path) {
                continue;
            }
            files.push(path);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

pub fn build_program(project: &Project) -> Program {
    let host = StaticHost {
        search_paths: Vec::new(),
        version: project.options.python_version,
        platform: project.options.python_platform,
    };
    let fs = Arc::new(RealFileSystem::new(project.base_dir.clone()));
    let mut program = Program::new(project.options.clone(), fs, Arc::new(host));
    program.set_root_files(project.files.as_slice());
    program
}

/// Check every file of `project`.
pub fn check(project: &Project) -> Result<CheckResult> {
    let mut program = build_program(project);
    let token = CancellationToken::new();
    let files = program
        .check_program(&token)
        .context("whole-program check failed")?;
    let sources = files
        .iter()
        .filter_map(|f| {
            let unit = program.store().get(&f.path)?;
            Some((f.path.clone(), unit.content()?.to_string()))
        })
        .collect();
    let result = CheckResult {
        files,
        stats: program.stats(),
        sources,
    };
    info!(
        files = result.files.len(),
        errors = result.error_count(),
        "check finished"
    );
    Ok(result)
}

pub fn run(args: &CliArgs, cwd: &Path) -> Result<CheckResult> {
    let project = load_project(args, cwd)?;
    check(&project)
}
