//! The program as the evaluator sees it.

use crate::program::Program;
use crate::source_unit::UnitState;
use pyz_checker::{BoundFile, NodeAnalysis, ProgramView};
use pyz_common::diagnostics::Diagnostic;
use pyz_common::ids::FileId;
use pyz_parser::AnalysisSideTable;
use std::sync::Arc;
use tracing::trace;

impl ProgramView for Program {
    fn bound_file(&mut self, file: FileId) -> Option<BoundFile> {
        if !self.ensure_bound(file) {
            return None;
        }
        let unit = self.store.unit(file)?;
        let tree = unit.tree()?;
        Some(BoundFile {
            file,
            path: Arc::from(unit.path()),
            module_name: Arc::from(unit.module_name()),
            arena: tree.shared_arena(),
            root: tree.root(),
            binding: Arc::clone(unit.binding()?),
        })
    }

    fn analysis_mut(&mut self, file: FileId) -> Option<&mut AnalysisSideTable<NodeAnalysis>> {
        if !self.ensure_bound(file) {
            return None;
        }
        let generation = self.generation;
        let unit = self.store.unit_mut(file)?;
        if unit.state == UnitState::Bound {
            unit.state = UnitState::Evaluated { complete: false };
        }
        let tree = unit.tree.as_mut()?;
        if tree.analysis.stamp() != generation {
            // entries of another generation are never read
            trace!(%file, stamp = tree.analysis.stamp(), generation, "dropping stale memo table");
            tree.analysis.clear();
            tree.analysis.set_stamp(generation);
            unit.check_diagnostics.clear();
            unit.state = UnitState::Evaluated { complete: false };
        }
        Some(&mut tree.analysis)
    }

    fn resolve_import(&mut self, from: FileId, module: &str, level: u32) -> Option<FileId> {
        let target = self.resolve_import_for(from, module, level)?;
        if target != from {
            self.store.graph_mut().add_dependency(from, target);
        }
        Some(target)
    }

    fn resolve_submodule(&mut self, package: FileId, name: &str) -> Option<FileId> {
        let path = self.store.unit(package)?.path().to_string();
        let resolved = self
            .resolver
            .resolve_submodule(&path, name, &|p| self.file_exists(p))?;
        let target = self.unit_for_path(&resolved);
        // attribute access on the package observes the submodule
        self.store.graph_mut().add_dependency(package, target);
        Some(target)
    }

    fn report(&mut self, file: FileId, diagnostic: Diagnostic) {
        let Some(unit) = self.store.unit_mut(file) else {
            return;
        };
        let key = diagnostic.dedup_key();
        if !unit.check_diagnostics.iter().any(|d| d.dedup_key() == key) {
            unit.check_diagnostics.push(diagnostic);
        }
    }
}
