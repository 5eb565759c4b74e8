//! Evaluator state: file cache, in-progress stack and memo access.

use crate::{BoundFile, CheckerOptions, NodeAnalysis, ProgramView};
use pyz_binder::{DeclIndex, Declaration};
use pyz_common::diagnostics::{Diagnostic, codes};
use pyz_common::ids::{DeclId, FileId};
use pyz_common::position::TextSpan;
use pyz_parser::{AnalysisSideTable, NodeIndex};
use pyz_solver::type_queries::recursive_decl;
use pyz_solver::{ClassKey, TypeId, TypeInterner};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

/// Stack space kept free before `stacker` switches to a fresh segment.
const RED_ZONE: usize = 128 * 1024;
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Identity of one memoized computation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EvalKey {
    /// Type of an expression node.
    Node(FileId, NodeIndex),
    /// Declared or inferred type of a declaration.
    Decl(DeclId),
    /// Inferred return type of a `FunctionDef` or `Lambda` node.
    Return(FileId, NodeIndex),
}

/// One computation in progress.
#[derive(Copy, Clone, Debug)]
struct Frame {
    key: EvalKey,
    /// Lowest stack position this computation observed as in progress.
    /// A frame whose result depended on a frame below it is incomplete and
    /// must not be cached. Position 0 poisons the whole stack.
    lowest: usize,
}

pub struct TypeEvaluator<'a> {
    pub(crate) view: &'a mut dyn ProgramView,
    pub(crate) interner: &'a TypeInterner,
    pub(crate) options: CheckerOptions,
    files: FxHashMap<FileId, BoundFile>,
    stack: Vec<Frame>,
    positions: FxHashMap<EvalKey, usize>,
    /// Return keys that were requested while already in progress.
    pub(crate) reentered: FxHashSet<EvalKey>,
    /// Seed answers for in-progress return inference, used in place of
    /// `UNKNOWN` by re-entrant requests.
    pub(crate) provisional: FxHashMap<EvalKey, TypeId>,
    /// Resolved direct bases of declared classes, filled lazily.
    pub(crate) class_bases: FxHashMap<DeclId, Vec<ClassKey>>,
}

impl<'a> TypeEvaluator<'a> {
    pub fn new(
        view: &'a mut dyn ProgramView,
        interner: &'a TypeInterner,
        options: CheckerOptions,
    ) -> Self {
        TypeEvaluator {
            view,
            interner,
            options,
            files: FxHashMap::default(),
            stack: Vec::new(),
            positions: FxHashMap::default(),
            reentered: FxHashSet::default(),
            provisional: FxHashMap::default(),
            class_bases: FxHashMap::default(),
        }
    }

    pub fn interner(&self) -> &TypeInterner {
        self.interner
    }

    // =========================================================================
    // Files and declarations
    // =========================================================================

    /// Bound state of `file`, pulled from the program once per evaluator.
    pub(crate) fn bound(&mut self, file: FileId) -> Option<BoundFile> {
        if let Some(bound) = self.files.get(&file) {
            return Some(bound.clone());
        }
        let bound = self.view.bound_file(file)?;
        self.files.insert(file, bound.clone());
        Some(bound)
    }

    pub(crate) fn declaration(&mut self, decl: DeclId) -> Option<Declaration> {
        let bound = self.bound(decl.file)?;
        bound.binding.declaration(DeclIndex::from(decl)).cloned()
    }

    pub(crate) fn node_span(&mut self, file: FileId, node: NodeIndex) -> TextSpan {
        self.bound(file)
            .map(|b| b.arena.span(node))
            .unwrap_or_default()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn report(&mut self, file: FileId, span: TextSpan, code: u32, args: &[&str]) {
        let path = self
            .bound(file)
            .map(|b| b.path.to_string())
            .unwrap_or_default();
        trace!(%file, code, start = span.start, "evaluator diagnostic");
        self.view
            .report(file, Diagnostic::from_code(path, span, code, args));
    }

    pub(crate) fn report_at(&mut self, file: FileId, node: NodeIndex, code: u32, args: &[&str]) {
        let span = self.node_span(file, node);
        self.report(file, span, code, args);
    }

    pub(crate) fn format(&self, ty: TypeId) -> String {
        pyz_solver::format_type(self.interner, ty)
    }

    // =========================================================================
    // Memoization
    // =========================================================================

    fn table(&mut self, file: FileId) -> Option<&mut AnalysisSideTable<NodeAnalysis>> {
        self.view.analysis_mut(file)
    }

    fn memo_site(&mut self, key: EvalKey) -> Option<(FileId, NodeIndex)> {
        match key {
            EvalKey::Node(file, node) | EvalKey::Return(file, node) => Some((file, node)),
            EvalKey::Decl(decl) => {
                let node = self.declaration(decl)?.node;
                Some((decl.file, node))
            }
        }
    }

    fn memo_get(&mut self, key: EvalKey) -> Option<TypeId> {
        let (file, node) = self.memo_site(key)?;
        let entry = self.table(file)?.get(node)?;
        match key {
            EvalKey::Node(..) => entry.expr_type,
            EvalKey::Return(..) => entry.return_type,
            EvalKey::Decl(decl) => entry
                .decl_types
                .iter()
                .find(|(index, _)| index.0 == decl.index)
                .map(|&(_, ty)| ty),
        }
    }

    fn memo_put(&mut self, key: EvalKey, ty: TypeId) {
        let Some((file, node)) = self.memo_site(key) else {
            return;
        };
        let Some(table) = self.table(file) else {
            return;
        };
        let entry = table.entry_or_default(node);
        match key {
            EvalKey::Node(..) => entry.expr_type = Some(ty),
            EvalKey::Return(..) => entry.return_type = Some(ty),
            EvalKey::Decl(decl) => {
                let index = DeclIndex::from(decl);
                match entry.decl_types.iter_mut().find(|(i, _)| *i == index) {
                    Some(slot) => slot.1 = ty,
                    None => entry.decl_types.push((index, ty)),
                }
            }
        }
    }

    /// Run `compute` for `key` unless a memoized result exists.
    ///
    /// A re-entrant request for a key already on the stack returns the
    /// key's placeholder and marks every frame above it incomplete. Only
    /// complete results are written to the memo table.
    pub(crate) fn memoized(
        &mut self,
        key: EvalKey,
        compute: impl FnOnce(&mut Self) -> TypeId,
    ) -> TypeId {
        if let Some(ty) = self.memo_get(key) {
            trace!(?key, "memo hit");
            return ty;
        }
        if let Some(&position) = self.positions.get(&key) {
            trace!(?key, position, "re-entrant evaluation");
            if matches!(key, EvalKey::Return(..)) {
                self.reentered.insert(key);
            }
            if let Some(top) = self.stack.last_mut() {
                top.lowest = top.lowest.min(position);
            }
            return self.placeholder(key);
        }
        if self.stack.len() >= self.options.max_depth as usize {
            self.report_too_deep(key);
            if let Some(top) = self.stack.last_mut() {
                top.lowest = 0;
            }
            return TypeId::UNKNOWN;
        }

        // positions start at 1 so that 0 can poison the stack
        let position = self.stack.len() + 1;
        self.stack.push(Frame {
            key,
            lowest: position,
        });
        self.positions.insert(key, position);

        let result = stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || compute(self));

        self.positions.remove(&key);
        let frame = self.stack.pop();
        debug_assert_eq!(frame.map(|f| f.key), Some(key), "unbalanced evaluation stack");
        let lowest = frame.map_or(position, |f| f.lowest);
        if let Some(parent) = self.stack.last_mut() {
            parent.lowest = parent.lowest.min(lowest);
        }
        let result = self.finalize(key, result);
        if lowest >= position {
            self.memo_put(key, result);
        } else {
            trace!(?key, "incomplete result not cached");
        }
        result
    }

    fn placeholder(&mut self, key: EvalKey) -> TypeId {
        match key {
            EvalKey::Decl(decl) => match self.declaration(decl) {
                Some(declaration) => self.interner.recursive(decl, &declaration.name),
                None => TypeId::UNKNOWN,
            },
            EvalKey::Return(..) => self
                .provisional
                .get(&key)
                .copied()
                .unwrap_or(TypeId::UNKNOWN),
            EvalKey::Node(..) => TypeId::UNKNOWN,
        }
    }

    /// A declaration whose value is nothing but a reference to itself is
    /// unknown; self-references nested inside a structure are kept.
    fn finalize(&mut self, key: EvalKey, result: TypeId) -> TypeId {
        let EvalKey::Decl(decl) = key else {
            return result;
        };
        let interner = self.interner;
        let members = interner.union_members(result);
        let is_self = |ty: TypeId| recursive_decl(interner, ty) == Some(decl);
        if !members.iter().any(|&m| is_self(m)) {
            return result;
        }
        let rest: Vec<TypeId> = members.into_iter().filter(|&m| !is_self(m)).collect();
        if rest.is_empty() {
            TypeId::UNKNOWN
        } else {
            interner.union(rest)
        }
    }

    fn report_too_deep(&mut self, key: EvalKey) {
        let Some((file, node)) = self.memo_site(key) else {
            return;
        };
        trace!(?key, depth = self.stack.len(), "evaluation too deep");
        self.report_at(file, node, codes::EVALUATION_TOO_DEEP, &[]);
    }
}
