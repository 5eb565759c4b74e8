//! Queries over the current generation.
//!
//! Every query flushes pending changes first, so it observes the latest
//! content of the file and of everything the file depends on.

use crate::cancellation::CancellationToken;
use crate::error::{ProgramError, ProgramResult};
use crate::program::Program;
use crate::source_unit::UnitState;
use pyz_binder::{DeclIndex, Declaration, DeclarationKind, ScopeId};
use pyz_checker::{CheckerOptions, TypeEvaluator, check_source_file};
use pyz_common::diagnostics::Diagnostic;
use pyz_common::ids::{DeclId, FileId};
use pyz_common::limits::MAX_ALIAS_CHAIN;
use pyz_common::position::Position;
use pyz_parser::{NodeData, NodeIndex};
use pyz_solver::TypeId;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Diagnostics of one file from a whole-program check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDiagnostics {
    pub file: FileId,
    pub path: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Program {
    fn checker_options(&self) -> CheckerOptions {
        CheckerOptions::from(&self.options)
    }

    fn not_found(&self, file: FileId) -> ProgramError {
        match self.path_of(file) {
            Some(path) => ProgramError::file_not_found(path),
            None => ProgramError::file_not_found(file.to_string()),
        }
    }

    /// Flush, then bind `file`.
    fn prepare(&mut self, file: FileId) -> ProgramResult<()> {
        self.flush();
        if self.ensure_bound(file) {
            Ok(())
        } else {
            Err(self.not_found(file))
        }
    }

    fn with_evaluator<R>(&mut self, run: impl FnOnce(&mut TypeEvaluator<'_>) -> R) -> R {
        let interner = Arc::clone(&self.interner);
        let options = self.checker_options();
        let mut evaluator = TypeEvaluator::new(self, &interner, options);
        run(&mut evaluator)
    }

    /// The innermost node at `position`, `NONE` outside the tree.
    fn node_at(&self, file: FileId, position: Position) -> Option<NodeIndex> {
        let unit = self.store.unit(file)?;
        let tree = unit.tree()?;
        let offset = tree.line_map().position_to_offset(position, unit.content()?)?;
        let node = tree.node_at_offset(offset);
        (!node.is_none()).then_some(node)
    }

    pub fn declaration(&self, decl: DeclId) -> Option<&Declaration> {
        self.store
            .unit(decl.file)?
            .binding()?
            .declaration(DeclIndex::from(decl))
    }

    /// Declarations the name at `position` refers to. Import aliases are
    /// followed to the declarations in the imported module.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn get_declarations_at(
        &mut self,
        file: FileId,
        position: Position,
    ) -> ProgramResult<Vec<DeclId>> {
        self.prepare(file)?;
        let Some(node) = self.node_at(file, position) else {
            return Ok(Vec::new());
        };
        let Some(unit) = self.store.unit(file) else {
            return Err(self.not_found(file));
        };
        let (Some(tree), Some(binding)) = (unit.tree(), unit.binding().cloned()) else {
            return Err(self.not_found(file));
        };
        let arena = tree.shared_arena();
        let Some(name) = arena.name_text(node).map(str::to_string) else {
            return Ok(Vec::new());
        };

        if let Some(NodeData::Attribute { value, attr }) = arena.data(arena.parent(node))
            && *attr == node
        {
            let value = *value;
            let decls = self.with_evaluator(|ev| {
                let object = ev.expression_type(file, value);
                ev.member_declarations(object, &name)
            });
            return Ok(self.follow_aliases(decls));
        }

        let symbol = match binding.declaration_at(node) {
            Some(index) => binding.declaration(index).map(|d| d.symbol),
            None => {
                let scope = binding.scope_of_name(node).unwrap_or(ScopeId::MODULE);
                binding.resolve_name(scope, &name)
            }
        };
        let decls: Vec<DeclId> = symbol
            .map(|symbol| {
                binding
                    .symbol_declarations(symbol)
                    .iter()
                    .map(|d| d.in_file(file))
                    .collect()
            })
            .unwrap_or_default();
        Ok(self.follow_aliases(decls))
    }

    /// Replace `from m import x` declarations by the declarations of `x` in
    /// `m`, through at most `MAX_ALIAS_CHAIN` hops. Aliases that do not
    /// resolve to a symbol stay as they are.
    fn follow_aliases(&mut self, decls: Vec<DeclId>) -> Vec<DeclId> {
        let mut result = Vec::new();
        let mut pending: Vec<(DeclId, usize)> = decls.into_iter().rev().map(|d| (d, 0)).collect();
        while let Some((decl, hops)) = pending.pop() {
            match self.alias_targets(decl) {
                Some(targets) if hops < MAX_ALIAS_CHAIN && !targets.is_empty() => {
                    pending.extend(targets.into_iter().rev().map(|t| (t, hops + 1)));
                }
                _ => {
                    if !result.contains(&decl) {
                        result.push(decl);
                    }
                }
            }
        }
        result
    }

    fn alias_targets(&mut self, decl: DeclId) -> Option<Vec<DeclId>> {
        let declaration = self.declaration(decl)?;
        if declaration.kind != DeclarationKind::Alias {
            return None;
        }
        let alias = declaration.alias.clone()?;
        let member = alias.member?;
        let target = self.resolve_import_for(decl.file, &alias.module, alias.level)?;
        if !self.ensure_bound(target) {
            return None;
        }
        let binding = Arc::clone(self.store.unit(target)?.binding()?);
        let symbol = binding.module_symbol(&member)?;
        trace!(?decl, %target, member = %member, "followed alias");
        Some(
            binding
                .symbol_declarations(symbol)
                .iter()
                .map(|d| d.in_file(target))
                .collect(),
        )
    }

    /// Type of an expression node, or of the declaration a name node
    /// introduces.
    pub fn get_type_of_node(&mut self, file: FileId, node: NodeIndex) -> ProgramResult<Option<TypeId>> {
        self.prepare(file)?;
        Ok(self.with_evaluator(|ev| ev.type_of_node(file, node)))
    }

    pub fn get_type_at(&mut self, file: FileId, position: Position) -> ProgramResult<Option<TypeId>> {
        self.prepare(file)?;
        let Some(node) = self.node_at(file, position) else {
            return Ok(None);
        };
        Ok(self.with_evaluator(|ev| ev.type_of_node(file, node)))
    }

    /// Type of the module-level symbol `name` of `file`.
    pub fn get_type_of_symbol(&mut self, file: FileId, name: &str) -> ProgramResult<Option<TypeId>> {
        self.prepare(file)?;
        let symbol = self
            .store
            .unit(file)
            .and_then(|u| u.binding())
            .and_then(|b| b.module_symbol(name));
        Ok(symbol.map(|symbol| self.with_evaluator(|ev| ev.symbol_type(file, symbol))))
    }

    pub fn format_type(&self, ty: TypeId) -> String {
        pyz_solver::format_type(&self.interner, ty)
    }

    /// Syntax, binder and type diagnostics of `file`, checking the whole
    /// file first when needed.
    pub fn get_diagnostics(&mut self, file: FileId) -> ProgramResult<Vec<Diagnostic>> {
        self.prepare(file)?;
        self.check_unit(file)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn check_unit(&mut self, file: FileId) -> ProgramResult<Vec<Diagnostic>> {
        if !self.ensure_bound(file) {
            return Err(self.not_found(file));
        }
        let complete = self.store.unit(file).map(|u| u.state())
            == Some(UnitState::Evaluated { complete: true });
        if !complete {
            let interner = Arc::clone(&self.interner);
            let options = self.checker_options();
            check_source_file(self, &interner, options, file);
            if let Some(unit) = self.store.unit_mut(file) {
                unit.state = UnitState::Evaluated { complete: true };
                unit.stats.checks += 1;
            }
            self.counters.checks += 1;
        }
        let Some(unit) = self.store.unit(file) else {
            return Err(self.not_found(file));
        };
        let mut diagnostics: Vec<Diagnostic> = unit
            .syntax_diagnostics
            .iter()
            .chain(&unit.bind_diagnostics)
            .chain(&unit.check_diagnostics)
            .cloned()
            .collect();
        diagnostics.sort_by_key(|d| (d.span.start, d.code));
        debug!(path = unit.path(), count = diagnostics.len(), "diagnostics");
        Ok(diagnostics)
    }

    /// Files a whole-program check visits: the roots, else every unit.
    pub fn check_targets(&self) -> Vec<FileId> {
        if self.root_files().is_empty() {
            self.store.ids()
        } else {
            self.root_files().to_vec()
        }
    }

    /// Check every target file, polling `token` between files. Files checked
    /// before a cancellation keep their results.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn check_program(&mut self, token: &CancellationToken) -> ProgramResult<Vec<FileDiagnostics>> {
        self.flush();
        let mut results = Vec::new();
        for file in self.check_targets() {
            token.check()?;
            match self.check_file_diagnostics(file) {
                Ok(result) => results.push(result),
                Err(ProgramError::FileNotFound { path }) => warn!(path, "skipping unreadable file"),
                Err(err) => return Err(err),
            }
        }
        debug!(files = results.len(), "checked program");
        Ok(results)
    }

    /// One step of a whole-program check.
    pub(crate) fn check_file_diagnostics(&mut self, file: FileId) -> ProgramResult<FileDiagnostics> {
        self.flush();
        let diagnostics = self.check_unit(file)?;
        Ok(FileDiagnostics {
            file,
            path: self.path_of(file).unwrap_or_default().to_string(),
            diagnostics,
        })
    }

    // =========================================================================
    // Handles
    // =========================================================================

    /// Handle for `decl`, valid until the next generation.
    pub fn register_declaration(&mut self, decl: DeclId) -> Option<String> {
        self.flush();
        self.declaration(decl)?;
        self.handles.register_declaration(decl)
    }

    pub fn resolve_declaration_handle(&mut self, handle: &str) -> Option<DeclId> {
        self.flush();
        let decl = self.handles.declaration(handle)?;
        self.declaration(decl).map(|_| decl)
    }

    pub fn register_type(&mut self, ty: TypeId) -> Option<String> {
        self.flush();
        self.handles.register_type(ty)
    }

    pub fn resolve_type_handle(&mut self, handle: &str) -> Option<TypeId> {
        self.flush();
        self.handles.type_of(handle)
    }
}
