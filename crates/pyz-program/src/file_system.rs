//! Boundaries the program reads content and environment through.
//!
//! Paths are program keys: `/`-separated, relative to the workspace root
//! (`pkg/mod.py`). The program never caches content apart from the version
//! it parsed.

use dashmap::DashMap;
use pyz_common::options::{PythonPlatform, PythonVersion};
use std::path::PathBuf;
use tracing::trace;

/// Source of truth for file content.
pub trait FileSystem: Send + Sync {
    fn read(&self, path: &str) -> Option<String>;

    fn exists(&self, path: &str) -> bool;

    /// Ask to be told about changes to `path`. The program does not depend
    /// on notifications arriving.
    fn watch(&self, _path: &str) {}
}

/// Files held in memory, shareable between threads.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    files: DashMap<String, String>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<'s>(files: impl IntoIterator<Item = (&'s str, &'s str)>) -> Self {
        let fs = Self::new();
        for (path, content) in files {
            fs.write(path, content);
        }
        fs
    }

    pub fn write(&self, path: &str, content: &str) {
        self.files.insert(normalize_path(path), content.to_string());
    }

    pub fn remove(&self, path: &str) -> bool {
        self.files.remove(&normalize_path(path)).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read(&self, path: &str) -> Option<String> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

/// The disk, below `root`.
#[derive(Debug, Clone)]
pub struct RealFileSystem {
    root: PathBuf,
}

impl RealFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RealFileSystem { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl FileSystem for RealFileSystem {
    fn read(&self, path: &str) -> Option<String> {
        match std::fs::read_to_string(self.full_path(path)) {
            Ok(content) => Some(content),
            Err(err) => {
                trace!(path, %err, "read failed");
                None
            }
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }
}

/// Interpreter environment: where external modules live and what they
/// target.
pub trait Host: Send + Sync {
    fn search_paths(&self) -> Vec<String>;

    fn python_version(&self) -> PythonVersion {
        PythonVersion::DEFAULT
    }

    fn python_platform(&self) -> PythonPlatform {
        PythonPlatform::default()
    }
}

/// No interpreter available. External imports stay unresolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAccessHost;

impl Host for NoAccessHost {
    fn search_paths(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A host described up front, for tests and configured environments.
#[derive(Debug, Default, Clone)]
pub struct StaticHost {
    pub search_paths: Vec<String>,
    pub version: PythonVersion,
    pub platform: PythonPlatform,
}

impl Host for StaticHost {
    fn search_paths(&self) -> Vec<String> {
        self.search_paths.clone()
    }

    fn python_version(&self) -> PythonVersion {
        self.version
    }

    fn python_platform(&self) -> PythonPlatform {
        self.platform
    }
}

/// `./a//b\c.py` -> `a/b/c.py`.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}

/// Directory part of a program path, empty at the root.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
#[path = "../tests/file_system_tests.rs"]
mod file_system_tests;
