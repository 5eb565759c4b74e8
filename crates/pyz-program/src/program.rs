//! The program: source units, their dependency edges and the current
//! analysis generation.
//!
//! Content changes only mark units. The next query flushes the pending
//! changes: content-stale units are reparsed and rebound, the invalidation
//! policy decides how far the change reaches, and the generation is bumped.
//! Everything downstream of a flush is pull-based: dependency-stale units
//! are cleaned and rebound the next time a query or an evaluation touches
//! them.

use crate::file_system::{FileSystem, Host, InMemoryFileSystem, NoAccessHost, normalize_path};
use crate::handles::HandleRegistry;
use crate::invalidation::{InvalidationPolicy, InvalidationScope, policy_for};
use crate::module_resolver::ModuleResolver;
use crate::source_unit::{SourceUnitStore, UnitState, fingerprint};
use pyz_binder::PublicSymbols;
use pyz_common::ids::FileId;
use pyz_common::options::AnalysisOptions;
use pyz_common::position::Position;
use pyz_solver::TypeInterner;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Program-wide counters, used to observe incrementality.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramStats {
    pub generation: u64,
    pub units: usize,
    pub parses: u64,
    pub binds: u64,
    pub checks: u64,
    pub local_invalidations: u64,
    pub full_invalidations: u64,
}

pub struct Program {
    pub(crate) options: AnalysisOptions,
    pub(crate) fs: Arc<dyn FileSystem>,
    host: Arc<dyn Host>,
    pub(crate) resolver: ModuleResolver,
    policy: Box<dyn InvalidationPolicy>,
    pub(crate) store: SourceUnitStore,
    pub(crate) generation: u64,
    pub(crate) interner: Arc<TypeInterner>,
    pub(crate) handles: HandleRegistry,
    roots: Vec<FileId>,
    open: FxHashSet<FileId>,
    /// A unit appeared or disappeared since the last flush.
    pending_full: bool,
    pub(crate) binding_in_progress: FxHashSet<FileId>,
    pub(crate) counters: ProgramStats,
}

impl Program {
    pub fn new(options: AnalysisOptions, fs: Arc<dyn FileSystem>, host: Arc<dyn Host>) -> Self {
        let mut search_paths = options.search_paths.clone();
        search_paths.extend(host.search_paths());
        let resolver = ModuleResolver::new(&options.execution_roots, &search_paths);
        let policy = policy_for(options.invalidation);
        debug!(
            policy = policy.name(),
            version = %host.python_version(),
            "created program"
        );
        Program {
            options,
            fs,
            host,
            resolver,
            policy,
            store: SourceUnitStore::new(),
            generation: 1,
            interner: Arc::new(TypeInterner::new()),
            handles: HandleRegistry::new(1),
            roots: Vec::new(),
            open: FxHashSet::default(),
            pending_full: false,
            binding_in_progress: FxHashSet::default(),
            counters: ProgramStats::default(),
        }
    }

    /// A program over in-memory files with no interpreter. Every file is a
    /// root.
    pub fn in_memory(files: &[(&str, &str)]) -> Self {
        let fs = Arc::new(InMemoryFileSystem::with_files(files.iter().copied()));
        let mut program = Program::new(AnalysisOptions::default(), fs, Arc::new(NoAccessHost));
        let paths: Vec<&str> = files.iter().map(|(path, _)| *path).collect();
        program.set_root_files(&paths);
        program
    }

    pub fn set_invalidation_policy(&mut self, policy: Box<dyn InvalidationPolicy>) {
        self.policy = policy;
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn interner(&self) -> &Arc<TypeInterner> {
        &self.interner
    }

    pub fn store(&self) -> &SourceUnitStore {
        &self.store
    }

    pub fn stats(&self) -> ProgramStats {
        ProgramStats {
            generation: self.generation,
            units: self.store.len(),
            ..self.counters
        }
    }

    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.store.file_id(&normalize_path(path))
    }

    pub fn path_of(&self, file: FileId) -> Option<&str> {
        self.store.unit(file).map(|u| u.path())
    }

    /// Line and character of `offset` in the content `file` was parsed from.
    pub fn position_of(&self, file: FileId, offset: u32) -> Option<Position> {
        let unit = self.store.unit(file)?;
        let tree = unit.tree()?;
        Some(tree.line_map().offset_to_position(offset, unit.content()?))
    }

    // =========================================================================
    // Changes
    // =========================================================================

    pub(crate) fn unit_for_path(&mut self, path: &str) -> FileId {
        let (module_name, is_package) = self.resolver.module_name(path);
        let (id, created) = self.store.get_or_create(path, module_name, is_package);
        if created {
            self.fs.watch(path);
        }
        id
    }

    /// Push new content for `path`. Takes effect at the next query.
    pub fn update_file(&mut self, path: &str, content: &str) -> FileId {
        let path = normalize_path(path);
        let known = self.store.file_id(&path).is_some();
        let id = self.unit_for_path(&path);
        if !known && !self.fs.exists(&path) {
            // a new module may satisfy imports that did not resolve before
            self.pending_full = true;
        }
        self.store.add_or_update(id, content);
        id
    }

    /// The file at `path` changed on disk.
    pub fn notify_changed(&mut self, path: &str) {
        let path = normalize_path(path);
        match self.store.file_id(&path) {
            Some(id) => self.store.mark_content_stale(id),
            None => self.pending_full = true,
        }
    }

    /// Forget `path`. Imports of it stop resolving at the next query.
    pub fn remove_file(&mut self, path: &str) -> bool {
        let Some(id) = self.file_id(path) else {
            return false;
        };
        self.forget_unit(id);
        true
    }

    fn forget_unit(&mut self, id: FileId) {
        self.store.remove(id);
        self.roots.retain(|&r| r != id);
        self.open.remove(&id);
        self.pending_full = true;
    }

    /// Editor content for `path`; kept alive by the open set.
    pub fn open_file(&mut self, path: &str, content: &str) -> FileId {
        let id = self.update_file(path, content);
        self.open.insert(id);
        id
    }

    /// The editor closed `path`; the file system is authoritative again.
    pub fn close_file(&mut self, path: &str) {
        let Some(id) = self.file_id(path) else {
            return;
        };
        self.open.remove(&id);
        self.store.clear_overlay(id);
    }

    pub fn is_open(&self, file: FileId) -> bool {
        self.open.contains(&file)
    }

    pub fn set_root_files<S: AsRef<str>>(&mut self, paths: &[S]) -> Vec<FileId> {
        let roots: Vec<FileId> = paths
            .iter()
            .map(|p| self.unit_for_path(&normalize_path(p.as_ref())))
            .collect();
        self.roots = roots.clone();
        roots
    }

    pub fn root_files(&self) -> &[FileId] {
        &self.roots
    }

    /// Remove units unreachable from the roots and open files through
    /// import edges. Returns how many were removed.
    pub fn collect_garbage(&mut self) -> usize {
        let keep = self
            .store
            .graph()
            .reachable_from(self.roots.iter().chain(self.open.iter()).copied());
        let mut removed = 0;
        for id in self.store.ids() {
            if !keep.contains(&id) {
                self.store.remove(id);
                removed += 1;
            }
        }
        debug!(removed, kept = keep.len(), "collected garbage");
        removed
    }

    pub fn has_pending_changes(&self) -> bool {
        self.pending_full || self.store.has_pending_changes()
    }

    // =========================================================================
    // Flush
    // =========================================================================

    /// Apply pending content changes and start a new generation.
    #[tracing::instrument(level = "debug", skip_all, fields(generation = self.generation))]
    pub fn flush(&mut self) {
        let dirty = self.store.take_dirty();
        if dirty.is_empty() && !self.pending_full {
            return;
        }
        let mut scope = if std::mem::take(&mut self.pending_full) {
            InvalidationScope::Full
        } else {
            InvalidationScope::Local
        };

        // parse every changed unit before binding any, so wildcard imports
        // between changed units see the new content
        let mut reparsed: Vec<(FileId, Option<PublicSymbols>)> = Vec::new();
        for file in dirty {
            let Some(unit) = self.store.unit(file) else {
                continue;
            };
            let before = unit.binding().map(|_| unit.public_symbols.clone());
            let previous = unit.fingerprint.filter(|_| unit.tree().is_some());
            let Some(content) = self.load_content(file) else {
                trace!(%file, "content vanished");
                self.forget_unit(file);
                scope = InvalidationScope::Full;
                continue;
            };
            if previous == Some(fingerprint(&content)) {
                self.restore_unchanged(file);
                continue;
            }
            self.parse_unit(file, content);
            reparsed.push((file, before));
        }

        let mut affected: FxHashSet<FileId> = FxHashSet::default();
        for (file, before) in &reparsed {
            if self.store.unit(*file).map(|u| u.state()) == Some(UnitState::Parsed) {
                self.bind_unit(*file);
            }
            match (before, self.store.unit(*file)) {
                // never bound before: importers may have failed to resolve it
                (None, _) => scope = InvalidationScope::Full,
                (Some(before), Some(unit))
                    if self.policy.scope(before, &unit.public_symbols)
                        == InvalidationScope::Full =>
                {
                    scope = InvalidationScope::Full;
                }
                _ => {}
            }
            affected.extend(self.store.graph().get_affected_files(*file));
        }
        if reparsed.is_empty() && scope == InvalidationScope::Local {
            return;
        }

        self.generation += 1;
        self.handles = self.handles.successor(self.generation);
        let rebuilt: FxHashSet<FileId> = reparsed.iter().map(|(file, _)| *file).collect();
        match scope {
            InvalidationScope::Full => {
                self.interner = Arc::new(TypeInterner::new());
                for id in self.store.ids() {
                    if !rebuilt.contains(&id) {
                        self.store.mark_dependency_stale(id);
                    }
                }
                self.counters.full_invalidations += 1;
            }
            InvalidationScope::Local => {
                for &id in &affected {
                    if !rebuilt.contains(&id) {
                        self.store.mark_dependency_stale(id);
                    }
                }
                let generation = self.generation;
                for unit in self.store.units_mut() {
                    if unit.state.is_bound()
                        && let Some(tree) = unit.tree.as_mut()
                    {
                        tree.analysis.set_stamp(generation);
                    }
                }
                self.counters.local_invalidations += 1;
            }
        }
        debug!(
            generation = self.generation,
            ?scope,
            changed = rebuilt.len(),
            dependents = affected.len(),
            "flushed changes"
        );
    }

    /// The content of `file` did not change after all; return it to the
    /// state it had.
    fn restore_unchanged(&mut self, file: FileId) {
        let Some(unit) = self.store.unit_mut(file) else {
            return;
        };
        unit.state = match (&unit.binding, &unit.tree) {
            (Some(_), Some(tree)) if !tree.is_clean() => UnitState::Evaluated { complete: false },
            (Some(_), _) => UnitState::Bound,
            _ => UnitState::Parsed,
        };
        trace!(path = unit.path(), "content unchanged");
    }
}

#[cfg(test)]
#[path = "../tests/program_tests.rs"]
mod program_tests;

#[cfg(test)]
#[path = "../tests/incremental_tests.rs"]
mod incremental_tests;
