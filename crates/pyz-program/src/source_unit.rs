//! Per-file analysis state and the store that owns it.

use crate::dependency_graph::DependencyGraph;
use pyz_binder::{Binding, PublicSymbols};
use pyz_checker::NodeAnalysis;
use pyz_common::diagnostics::Diagnostic;
use pyz_common::ids::FileId;
use pyz_parser::ParseTree;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::Hasher;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StaleReason {
    /// The unit's own content changed; it must be reparsed.
    Content,
    /// Something it imports changed; cleaning and rebinding suffice.
    Dependency,
}

/// Where a unit is in the pipeline.
///
/// `Unseen -> Parsed -> Bound -> Evaluated -> Stale -> ...`, re-entering at
/// the earliest stage the staleness invalidated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnitState {
    Unseen,
    Parsed,
    Bound,
    /// Some of the unit's types are memoized; `complete` once the whole file
    /// was checked.
    Evaluated { complete: bool },
    Stale(StaleReason),
}

impl UnitState {
    pub fn is_bound(self) -> bool {
        matches!(self, UnitState::Bound | UnitState::Evaluated { .. })
    }
}

/// Pipeline runs for one unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitStats {
    pub parses: u32,
    pub binds: u32,
    pub checks: u32,
}

pub(crate) fn fingerprint(content: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(content.as_bytes());
    hasher.write_usize(content.len());
    hasher.finish()
}

/// One file's analysis state.
#[derive(Debug)]
pub struct SourceUnit {
    id: FileId,
    path: String,
    module_name: String,
    is_package: bool,
    /// Content pushed through the program API; wins over the file system.
    pub(crate) overlay: Option<Arc<str>>,
    /// Content the current tree was parsed from.
    pub(crate) content: Option<Arc<str>>,
    pub(crate) fingerprint: Option<u64>,
    version: u64,
    pub(crate) state: UnitState,
    pub(crate) tree: Option<ParseTree<NodeAnalysis>>,
    pub(crate) binding: Option<Arc<Binding>>,
    pub(crate) public_symbols: PublicSymbols,
    pub(crate) syntax_diagnostics: Vec<Diagnostic>,
    pub(crate) bind_diagnostics: Vec<Diagnostic>,
    pub(crate) check_diagnostics: Vec<Diagnostic>,
    /// `(module, level)` -> target, filled as imports are resolved.
    pub(crate) import_cache: FxHashMap<(String, u32), Option<FileId>>,
    pub(crate) stats: UnitStats,
}

impl SourceUnit {
    fn new(id: FileId, path: String, module_name: String, is_package: bool) -> Self {
        SourceUnit {
            id,
            path,
            module_name,
            is_package,
            overlay: None,
            content: None,
            fingerprint: None,
            version: 0,
            state: UnitState::Unseen,
            tree: None,
            binding: None,
            public_symbols: PublicSymbols::default(),
            syntax_diagnostics: Vec::new(),
            bind_diagnostics: Vec::new(),
            check_diagnostics: Vec::new(),
            import_cache: FxHashMap::default(),
            stats: UnitStats::default(),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn is_package(&self) -> bool {
        self.is_package
    }

    /// Bumped on every content update.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn stats(&self) -> UnitStats {
        self.stats
    }

    pub fn tree(&self) -> Option<&ParseTree<NodeAnalysis>> {
        self.tree.as_ref()
    }

    pub fn binding(&self) -> Option<&Arc<Binding>> {
        self.binding.as_ref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Forget everything derived from the binding: memo entries, checker
    /// diagnostics and resolved imports.
    pub(crate) fn discard_evaluation(&mut self) {
        if let Some(tree) = self.tree.as_mut() {
            pyz_parser::clean(tree);
        }
        self.check_diagnostics.clear();
        self.import_cache.clear();
    }
}

/// All source units of a program, keyed by file identity and path.
#[derive(Debug, Default)]
pub struct SourceUnitStore {
    units: FxHashMap<FileId, SourceUnit>,
    by_path: FxHashMap<String, FileId>,
    next_id: u32,
    /// Units whose content changed since the last flush, in update order.
    dirty: Vec<FileId>,
    graph: DependencyGraph,
}

impl SourceUnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&SourceUnit> {
        self.by_path.get(path).and_then(|id| self.units.get(id))
    }

    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn unit(&self, id: FileId) -> Option<&SourceUnit> {
        self.units.get(&id)
    }

    pub(crate) fn unit_mut(&mut self, id: FileId) -> Option<&mut SourceUnit> {
        self.units.get_mut(&id)
    }

    /// Every unit id, ascending.
    pub fn ids(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.units.values()
    }

    pub(crate) fn units_mut(&mut self) -> impl Iterator<Item = &mut SourceUnit> {
        self.units.values_mut()
    }

    /// The unit for `path`, created `Unseen` on first reference. The flag is
    /// `true` when it was created.
    pub fn get_or_create(
        &mut self,
        path: &str,
        module_name: String,
        is_package: bool,
    ) -> (FileId, bool) {
        if let Some(&id) = self.by_path.get(path) {
            return (id, false);
        }
        let id = FileId(self.next_id);
        self.next_id += 1;
        trace!(%id, path, module = %module_name, "created source unit");
        self.units.insert(
            id,
            SourceUnit::new(id, path.to_string(), module_name, is_package),
        );
        self.by_path.insert(path.to_string(), id);
        (id, true)
    }

    /// Replace the content of `id`. The unit is marked content-stale before
    /// this returns and recorded in the dirty set.
    pub fn add_or_update(&mut self, id: FileId, content: &str) -> bool {
        let Some(unit) = self.units.get_mut(&id) else {
            return false;
        };
        unit.overlay = Some(Arc::from(content));
        unit.version += 1;
        debug!(path = %unit.path, version = unit.version, "content updated");
        self.mark_content_stale(id);
        true
    }

    /// Drop the pushed content of `id`; the file system is read again.
    pub fn clear_overlay(&mut self, id: FileId) {
        if let Some(unit) = self.units.get_mut(&id)
            && unit.overlay.take().is_some()
        {
            unit.version += 1;
            self.mark_content_stale(id);
        }
    }

    pub fn mark_content_stale(&mut self, id: FileId) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        unit.state = UnitState::Stale(StaleReason::Content);
        if !self.dirty.contains(&id) {
            self.dirty.push(id);
        }
    }

    pub(crate) fn mark_dependency_stale(&mut self, id: FileId) {
        if let Some(unit) = self.units.get_mut(&id)
            && unit.state != UnitState::Unseen
            && unit.state != UnitState::Stale(StaleReason::Content)
        {
            unit.state = UnitState::Stale(StaleReason::Dependency);
        }
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub(crate) fn take_dirty(&mut self) -> Vec<FileId> {
        std::mem::take(&mut self.dirty)
    }

    pub fn remove(&mut self, id: FileId) -> Option<SourceUnit> {
        let unit = self.units.remove(&id)?;
        self.by_path.remove(&unit.path);
        self.dirty.retain(|&d| d != id);
        self.graph.remove_file(id);
        debug!(path = %unit.path, "removed source unit");
        Some(unit)
    }

    /// Units importing `id` directly.
    pub fn get_dependents(&self, id: FileId) -> Vec<FileId> {
        let mut dependents: Vec<FileId> = self
            .graph
            .get_dependents(id)
            .map(|deps| deps.iter().copied().collect())
            .unwrap_or_default();
        dependents.sort_unstable();
        dependents
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut DependencyGraph {
        &mut self.graph
    }
}

#[cfg(test)]
#[path = "../tests/source_unit_tests.rs"]
mod source_unit_tests;
