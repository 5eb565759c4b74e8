//! Name binder for the pyz analysis engine.
//!
//! The binder walks a parse tree once and produces a [`Binding`]: a scope
//! arena with parent back-links, a symbol table per scope, one flat
//! declaration table for the file, the file's import records and binder
//! diagnostics. A binding is never patched; rebinding replaces it.

use bitflags::bitflags;
use indexmap::IndexMap;
use pyz_common::diagnostics::Diagnostic;
use pyz_common::ids::{DeclId, FileId};
use pyz_common::position::TextSpan;
use pyz_parser::NodeIndex;
use serde::Serialize;
use smallvec::SmallVec;

mod binding;
pub use binding::{Binding, PublicSymbols};

mod state;
mod state_binding;
pub use state::BinderState;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The module scope is always the first scope of a binding.
    pub const MODULE: ScopeId = ScopeId(0);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

/// Index into a binding's declaration table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclIndex(pub u32);

impl DeclIndex {
    pub fn in_file(self, file: FileId) -> DeclId {
        DeclId::new(file, self.0)
    }
}

impl From<DeclId> for DeclIndex {
    fn from(id: DeclId) -> Self {
        DeclIndex(id.index)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
    Lambda,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Back-link for lookup only.
    pub parent: Option<ScopeId>,
    /// The `Module`, `ClassDef`, `FunctionDef` or `Lambda` node.
    pub node: NodeIndex,
    pub symbols: IndexMap<String, SymbolId>,
    /// `self.x` assignments found in methods; class scopes only.
    pub instance_symbols: IndexMap<String, SymbolId>,
    /// `return` statements directly inside this function.
    pub returns: Vec<NodeIndex>,
    pub globals: Vec<String>,
    pub nonlocals: Vec<String>,
}

impl Scope {
    pub(crate) fn new(kind: ScopeKind, parent: Option<ScopeId>, node: NodeIndex) -> Self {
        Scope {
            kind,
            parent,
            node,
            symbols: IndexMap::new(),
            instance_symbols: IndexMap::new(),
            returns: Vec::new(),
            globals: Vec::new(),
            nonlocals: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub scope: ScopeId,
    /// Ordered by source position.
    pub declarations: SmallVec<[DeclIndex; 2]>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DeclarationKind {
    Variable,
    Parameter,
    Function,
    Class,
    /// `from m import x`
    Alias,
    /// `import a.b`
    ModuleAlias,
    /// `self.x = ...` inside a method.
    InstanceAttribute,
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeclFlags: u8 {
        /// Carries an explicit annotation.
        const ANNOTATED = 1 << 0;
        /// Inside an if/while/for/try branch of its scope.
        const CONDITIONAL = 1 << 1;
        /// Part of the module's public interface.
        const EXPORTED = 1 << 2;
        /// Type comes from inference only.
        const INFERRED_ONLY = 1 << 3;
        /// Introduced by `from m import *`.
        const WILDCARD = 1 << 4;
    }
}

/// Where an import declaration points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasTarget {
    /// Index into `Binding::imports`.
    pub import: u32,
    /// Dotted module the alias refers to, relative to `level`.
    pub module: String,
    pub level: u32,
    /// Imported member; `None` when the alias names the module itself.
    pub member: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    /// The name node introducing the symbol (or the import node for
    /// wildcard imports).
    pub node: NodeIndex,
    /// The statement or definition owning the declaration: `FunctionDef`,
    /// `ClassDef`, `Parameter`, `Assign`, `AnnAssign`, `AugAssign`, `For`,
    /// `WithItem`, `ExceptHandler`, `ImportAlias` or `ImportFrom`.
    pub owner: NodeIndex,
    pub scope: ScopeId,
    pub symbol: SymbolId,
    pub flags: DeclFlags,
    pub span: TextSpan,
    /// Annotation expression, `NONE` unless `ANNOTATED`.
    pub annotation: NodeIndex,
    pub alias: Option<AliasTarget>,
}

impl Declaration {
    pub fn is_annotated(&self) -> bool {
        self.flags.contains(DeclFlags::ANNOTATED)
    }

    pub fn is_conditional(&self) -> bool {
        self.flags.contains(DeclFlags::CONDITIONAL)
    }

    pub fn is_exported(&self) -> bool {
        self.flags.contains(DeclFlags::EXPORTED)
    }
}

/// One `import` / `from ... import` occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportRecord {
    /// Dotted module name, without leading dots.
    pub module: String,
    /// Number of leading dots.
    pub level: u32,
    pub node: NodeIndex,
    pub span: TextSpan,
    /// Names imported by `from m import a, b`; empty for plain imports.
    pub names: Vec<String>,
    pub is_wildcard: bool,
}

impl ImportRecord {
    /// `a`, `a.b`, `a.b.c` for module `a.b.c`; implicitly imported packages
    /// come first.
    pub fn module_prefixes(&self) -> Vec<String> {
        let mut prefixes = Vec::new();
        let mut current = String::new();
        for part in self.module.split('.').filter(|p| !p.is_empty()) {
            if !current.is_empty() {
                current.push('.');
            }
            current.push_str(part);
            prefixes.push(current.clone());
        }
        prefixes
    }
}

/// A scope-structure problem found while binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindDiagnostic {
    pub code: u32,
    pub span: TextSpan,
    pub arg: Option<String>,
}

impl BindDiagnostic {
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        let args: Vec<&str> = self.arg.as_deref().into_iter().collect();
        Diagnostic::from_code(file, self.span, self.code, &args)
    }
}

/// Bind a parse tree.
pub fn bind<A>(tree: &pyz_parser::ParseTree<A>) -> Binding {
    BinderState::new(tree.arena()).bind_module(tree.root())
}

#[cfg(test)]
#[path = "../tests/binder_tests.rs"]
mod binder_tests;

#[cfg(test)]
#[path = "../tests/binding_queries_tests.rs"]
mod binding_queries_tests;
