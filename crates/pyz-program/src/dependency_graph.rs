//! Import edges between source units, kept in both directions.
//!
//! When file A imports file B:
//! - `dependencies`: A -> {B} (what A imports)
//! - `dependents`: B -> {A} (what imports B)
//!
//! On a change to B, `dependents` gives the transitive closure of units whose
//! bindings and memo tables may have observed B. Import cycles are legal and
//! handled by tracking visited units.

use pyz_common::ids::FileId;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Default, Debug, Clone)]
pub struct DependencyGraph {
    /// file -> files it imports
    dependencies: FxHashMap<FileId, FxHashSet<FileId>>,
    /// file -> files that import it
    dependents: FxHashMap<FileId, FxHashSet<FileId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single edge: `file` imports `imported`.
    pub fn add_dependency(&mut self, file: FileId, imported: FileId) {
        if file == imported {
            return;
        }
        self.dependencies.entry(file).or_default().insert(imported);
        self.dependents.entry(imported).or_default().insert(file);
    }

    /// Every unit that directly or indirectly imports `file`, excluding
    /// `file` itself, in ascending order.
    pub fn get_affected_files(&self, file: FileId) -> Vec<FileId> {
        let mut affected = FxHashSet::default();
        let mut stack = vec![file];

        while let Some(current) = stack.pop() {
            if let Some(deps) = self.dependents.get(&current) {
                for &dep in deps {
                    if dep != file && affected.insert(dep) {
                        stack.push(dep);
                    }
                }
            }
        }

        let mut affected: Vec<FileId> = affected.into_iter().collect();
        affected.sort_unstable();
        affected
    }

    /// Every unit `roots` reach through import edges, roots included.
    pub fn reachable_from(&self, roots: impl IntoIterator<Item = FileId>) -> FxHashSet<FileId> {
        let mut reached = FxHashSet::default();
        let mut stack: Vec<FileId> = roots.into_iter().collect();
        while let Some(current) = stack.pop() {
            if !reached.insert(current) {
                continue;
            }
            if let Some(deps) = self.dependencies.get(&current) {
                stack.extend(deps.iter().copied().filter(|d| !reached.contains(d)));
            }
        }
        reached
    }

    /// Replace the outgoing edges of `file`.
    pub fn update_file(&mut self, file: FileId, imports: &FxHashSet<FileId>) {
        if let Some(old_imports) = self.dependencies.get(&file) {
            for imported in old_imports {
                if let Some(rev) = self.dependents.get_mut(imported) {
                    rev.remove(&file);
                    if rev.is_empty() {
                        self.dependents.remove(imported);
                    }
                }
            }
        }

        let imports: FxHashSet<FileId> = imports.iter().copied().filter(|&i| i != file).collect();
        if imports.is_empty() {
            self.dependencies.remove(&file);
        } else {
            for &imported in &imports {
                self.dependents.entry(imported).or_default().insert(file);
            }
            self.dependencies.insert(file, imports);
        }
    }

    /// Remove `file` and every edge touching it.
    pub fn remove_file(&mut self, file: FileId) {
        if let Some(old_imports) = self.dependencies.remove(&file) {
            for imported in old_imports {
                if let Some(rev) = self.dependents.get_mut(&imported) {
                    rev.remove(&file);
                    if rev.is_empty() {
                        self.dependents.remove(&imported);
                    }
                }
            }
        }

        if let Some(old_dependents) = self.dependents.remove(&file) {
            for dependent in old_dependents {
                if let Some(deps) = self.dependencies.get_mut(&dependent) {
                    // the importer keeps its entry; it still exists
                    deps.remove(&file);
                }
            }
        }
    }

    pub fn get_dependencies(&self, file: FileId) -> Option<&FxHashSet<FileId>> {
        self.dependencies.get(&file)
    }

    pub fn get_dependents(&self, file: FileId) -> Option<&FxHashSet<FileId>> {
        self.dependents.get(&file)
    }

    pub fn contains_file(&self, file: FileId) -> bool {
        self.dependencies.contains_key(&file) || self.dependents.contains_key(&file)
    }

    pub fn file_count(&self) -> usize {
        let mut files = FxHashSet::default();
        files.extend(self.dependencies.keys().copied());
        files.extend(self.dependents.keys().copied());
        files.len()
    }

    pub fn clear(&mut self) {
        self.dependencies.clear();
        self.dependents.clear();
    }
}

#[cfg(test)]
#[path = "../tests/dependency_graph_tests.rs"]
mod dependency_graph_tests;
