//! Parse and bind stages of a source unit, run on demand.

use crate::program::Program;
use crate::source_unit::{StaleReason, UnitState, fingerprint};
use pyz_binder::{Binding, bind};
use pyz_checker::NodeAnalysis;
use pyz_common::ids::FileId;
use pyz_parser::parse;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, trace};

impl Program {
    /// The overlay of `file`, else its file system content.
    pub(crate) fn load_content(&self, file: FileId) -> Option<Arc<str>> {
        let unit = self.store.unit(file)?;
        unit.overlay
            .clone()
            .or_else(|| self.fs.read(unit.path()).map(Arc::from))
    }

    pub(crate) fn file_exists(&self, path: &str) -> bool {
        self.store.get(path).is_some_and(|u| u.has_overlay()) || self.fs.exists(path)
    }

    /// Bring `file` to at least `Bound`, reparsing or rebinding as its state
    /// requires. `false` when it has no content or is being bound already.
    pub(crate) fn ensure_bound(&mut self, file: FileId) -> bool {
        if self.binding_in_progress.contains(&file) {
            return false;
        }
        let Some(unit) = self.store.unit(file) else {
            return false;
        };
        match unit.state() {
            UnitState::Bound | UnitState::Evaluated { .. } => true,
            UnitState::Parsed => self.bind_unit(file),
            UnitState::Stale(StaleReason::Dependency) => {
                if let Some(unit) = self.store.unit_mut(file) {
                    unit.discard_evaluation();
                }
                self.bind_unit(file)
            }
            UnitState::Unseen | UnitState::Stale(StaleReason::Content) => {
                let Some(content) = self.load_content(file) else {
                    trace!(%file, "no content");
                    return false;
                };
                self.parse_unit(file, content);
                self.bind_unit(file)
            }
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(%file))]
    pub(crate) fn parse_unit(&mut self, file: FileId, content: Arc<str>) {
        let Some(unit) = self.store.unit_mut(file) else {
            return;
        };
        let result = parse::<NodeAnalysis>(&content);
        unit.syntax_diagnostics = result
            .diagnostics
            .iter()
            .map(|d| d.to_diagnostic(unit.path()))
            .collect();
        unit.tree = Some(result.tree);
        unit.fingerprint = Some(fingerprint(&content));
        unit.content = Some(content);
        unit.binding = None;
        unit.bind_diagnostics.clear();
        unit.check_diagnostics.clear();
        unit.import_cache.clear();
        unit.state = UnitState::Parsed;
        unit.stats.parses += 1;
        self.counters.parses += 1;
        debug!(
            path = unit.path(),
            errors = unit.syntax_diagnostics.len(),
            "parsed"
        );
    }

    /// Bind the parsed tree of `file`, resolve its imports and record its
    /// import edges.
    #[tracing::instrument(level = "debug", skip_all, fields(%file))]
    pub(crate) fn bind_unit(&mut self, file: FileId) -> bool {
        let Some(unit) = self.store.unit(file) else {
            return false;
        };
        let Some(tree) = unit.tree() else {
            return false;
        };
        let mut binding = bind(tree);
        let path = unit.path().to_string();

        self.binding_in_progress.insert(file);
        self.add_wildcard_names(file, &mut binding);
        let edges = self.import_edges(file, &binding);
        self.binding_in_progress.remove(&file);

        let public_symbols = binding.public_symbols();
        let diagnostics = binding
            .diagnostics()
            .iter()
            .map(|d| d.to_diagnostic(&path))
            .collect();
        let generation = self.generation;
        let Some(unit) = self.store.unit_mut(file) else {
            return false;
        };
        unit.binding = Some(Arc::new(binding));
        unit.public_symbols = public_symbols;
        unit.bind_diagnostics = diagnostics;
        unit.check_diagnostics.clear();
        unit.state = UnitState::Bound;
        unit.stats.binds += 1;
        if let Some(tree) = unit.tree.as_mut() {
            tree.analysis.set_stamp(generation);
        }
        self.counters.binds += 1;
        debug!(path, imports = edges.len(), "bound");
        self.store.graph_mut().update_file(file, &edges);
        true
    }

    /// Names `from m import *` brings in: the public symbols of `m`, bound
    /// first when needed.
    fn add_wildcard_names(&mut self, file: FileId, binding: &mut Binding) {
        for import in binding.wildcard_imports().to_vec() {
            let Some(record) = binding.imports().get(import as usize) else {
                continue;
            };
            let (module, level) = (record.module.clone(), record.level);
            let Some(target) = self.resolve_import_for(file, &module, level) else {
                continue;
            };
            if !self.ensure_bound(target) {
                trace!(%file, %target, "wildcard target not bound");
                continue;
            }
            let names: Vec<String> = self
                .store
                .unit(target)
                .map(|u| u.public_symbols.iter().map(|(n, _)| n.to_string()).collect())
                .unwrap_or_default();
            binding.add_wildcard_names(import, &names);
        }
    }

    /// Files `binding` imports: every prefix of an absolute import, and the
    /// members of `from` imports that are submodules.
    fn import_edges(&mut self, file: FileId, binding: &Binding) -> FxHashSet<FileId> {
        let mut edges = FxHashSet::default();
        for record in binding.imports() {
            if record.level == 0 {
                for prefix in record.module_prefixes() {
                    edges.extend(self.resolve_import_for(file, &prefix, 0));
                }
            } else {
                edges.extend(self.resolve_import_for(file, &record.module, record.level));
            }
            if record.is_wildcard {
                continue;
            }
            for name in &record.names {
                let submodule = if record.module.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{name}", record.module)
                };
                edges.extend(self.resolve_import_for(file, &submodule, record.level));
            }
        }
        edges.remove(&file);
        edges
    }

    /// Resolve an import of `file`, memoized on the unit until it is
    /// rebound.
    pub(crate) fn resolve_import_for(
        &mut self,
        file: FileId,
        module: &str,
        level: u32,
    ) -> Option<FileId> {
        let unit = self.store.unit(file)?;
        if let Some(&cached) = unit.import_cache.get(&(module.to_string(), level)) {
            return cached;
        }
        let importer = unit.path().to_string();
        let resolved = self
            .resolver
            .resolve(&importer, module, level, &|p| self.file_exists(p));
        let target = resolved.map(|path| self.unit_for_path(&path));
        if let Some(unit) = self.store.unit_mut(file) {
            unit.import_cache.insert((module.to_string(), level), target);
        }
        target
    }
}
