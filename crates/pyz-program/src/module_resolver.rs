//! Import resolution.
//!
//! Relative imports resolve against the importing file's directory.
//! Absolute imports try the importing file's directory, the execution roots
//! in order, then the host's search paths. In each base directory the
//! candidates for `a.b` are `a/b.pyi`, `a/b.py`, `a/b/__init__.pyi` and
//! `a/b/__init__.py`.

use crate::file_system::{join_path, normalize_path, parent_dir};
use tracing::trace;

const SOURCE_EXTENSIONS: [&str; 2] = ["pyi", "py"];

#[derive(Debug, Clone, Default)]
pub struct ModuleResolver {
    execution_roots: Vec<String>,
    search_paths: Vec<String>,
}

impl ModuleResolver {
    pub fn new(execution_roots: &[String], search_paths: &[String]) -> Self {
        ModuleResolver {
            execution_roots: execution_roots.iter().map(|r| normalize_path(r)).collect(),
            search_paths: search_paths.iter().map(|p| normalize_path(p)).collect(),
        }
    }

    /// Path of the module imported as `module` (after `level` leading dots)
    /// from `importer`. `exists` answers for program paths.
    pub fn resolve(
        &self,
        importer: &str,
        module: &str,
        level: u32,
        exists: &dyn Fn(&str) -> bool,
    ) -> Option<String> {
        let parts: Vec<&str> = module.split('.').filter(|p| !p.is_empty()).collect();
        let resolved = if level > 0 {
            let mut dir = parent_dir(importer);
            for _ in 1..level {
                if dir.is_empty() {
                    return None;
                }
                dir = parent_dir(dir);
            }
            find_in(dir, &parts, exists)
        } else {
            if parts.is_empty() {
                return None;
            }
            self.absolute_bases(importer)
                .iter()
                .find_map(|base| find_in(base, &parts, exists))
        };
        trace!(importer, module, level, resolved = ?resolved, "resolved import");
        resolved
    }

    /// `package.name` for the package whose `__init__` file is `package`.
    pub fn resolve_submodule(
        &self,
        package: &str,
        name: &str,
        exists: &dyn Fn(&str) -> bool,
    ) -> Option<String> {
        if !is_package_file(package) {
            return None;
        }
        find_in(parent_dir(package), &[name], exists)
    }

    fn absolute_bases(&self, importer: &str) -> Vec<String> {
        let mut bases = vec![parent_dir(importer).to_string()];
        for base in self.execution_roots.iter().chain(&self.search_paths) {
            if !bases.contains(base) {
                bases.push(base.clone());
            }
        }
        bases
    }

    /// Dotted module name of `path` and whether it is a package.
    ///
    /// The longest execution root or search path containing the file is
    /// stripped first.
    pub fn module_name(&self, path: &str) -> (String, bool) {
        let base = self
            .execution_roots
            .iter()
            .chain(&self.search_paths)
            .filter(|base| !base.is_empty() && path.starts_with(&format!("{base}/")))
            .max_by_key(|base| base.len());
        let relative = match base {
            Some(base) => &path[base.len() + 1..],
            None => path,
        };
        let stem = SOURCE_EXTENSIONS
            .iter()
            .find_map(|ext| relative.strip_suffix(&format!(".{ext}")[..]))
            .unwrap_or(relative);
        let dotted = stem.replace('/', ".");
        if dotted == "__init__" {
            return (String::new(), true);
        }
        match dotted.strip_suffix(".__init__") {
            Some(package) => (package.to_string(), true),
            None => (dotted, false),
        }
    }
}

pub fn is_package_file(path: &str) -> bool {
    SOURCE_EXTENSIONS
        .iter()
        .any(|ext| path == format!("__init__.{ext}") || path.ends_with(&format!("/__init__.{ext}")))
}

/// First existing candidate for `parts` below `base`.
fn find_in(base: &str, parts: &[&str], exists: &dyn Fn(&str) -> bool) -> Option<String> {
    let dir = parts
        .iter()
        .fold(base.to_string(), |dir, part| join_path(&dir, part));
    let mut candidates = Vec::with_capacity(4);
    if !parts.is_empty() {
        for ext in SOURCE_EXTENSIONS {
            candidates.push(format!("{dir}.{ext}"));
        }
    }
    for ext in SOURCE_EXTENSIONS {
        candidates.push(join_path(&dir, &format!("__init__.{ext}")));
    }
    candidates.into_iter().find(|c| exists(c))
}

#[cfg(test)]
#[path = "../tests/module_resolver_tests.rs"]
mod module_resolver_tests;
