use crate::state::is_public_name;
use crate::{
    AliasTarget, BindDiagnostic, DeclFlags, DeclIndex, Declaration, DeclarationKind, ImportRecord,
    Scope, ScopeId, ScopeKind, Symbol, SymbolId,
};
use pyz_parser::NodeIndex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::trace;

/// The result of binding one file.
///
/// All cross references are indices into the binding's own tables, so the
/// whole value is dropped and rebuilt when the file is rebound.
#[derive(Clone, Debug, Default)]
pub struct Binding {
    pub(crate) scopes: Vec<Scope>,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) declarations: Vec<Declaration>,
    pub(crate) imports: Vec<ImportRecord>,
    pub(crate) diagnostics: Vec<BindDiagnostic>,
    pub(crate) node_declarations: FxHashMap<NodeIndex, DeclIndex>,
    pub(crate) name_scopes: FxHashMap<NodeIndex, ScopeId>,
    pub(crate) definition_scopes: FxHashMap<NodeIndex, ScopeId>,
    pub(crate) dunder_all: Option<Vec<String>>,
    pub(crate) wildcard_imports: Vec<u32>,
}

/// Exported names of a module and the kind of their last declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublicSymbols(BTreeMap<String, DeclarationKind>);

impl PublicSymbols {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<DeclarationKind> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DeclarationKind)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Binding {
    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn declaration(&self, index: DeclIndex) -> Option<&Declaration> {
        self.declarations.get(index.0 as usize)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    pub fn diagnostics(&self) -> &[BindDiagnostic] {
        &self.diagnostics
    }

    pub fn dunder_all(&self) -> Option<&[String]> {
        self.dunder_all.as_deref()
    }

    /// Indices into [`Binding::imports`] of `from m import *` records.
    pub fn wildcard_imports(&self) -> &[u32] {
        &self.wildcard_imports
    }

    /// Declaration introduced by the name node `node`, if any.
    pub fn declaration_at(&self, node: NodeIndex) -> Option<DeclIndex> {
        self.node_declarations.get(&node).copied()
    }

    /// Scope a `Name` node was used or declared in.
    pub fn scope_of_name(&self, node: NodeIndex) -> Option<ScopeId> {
        self.name_scopes.get(&node).copied()
    }

    /// Scope opened by a `Module`, `ClassDef`, `FunctionDef` or `Lambda` node.
    pub fn scope_of_definition(&self, node: NodeIndex) -> Option<ScopeId> {
        self.definition_scopes.get(&node).copied()
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope)?.symbols.get(name).copied()
    }

    pub fn lookup_instance(&self, class_scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(class_scope)?.instance_symbols.get(name).copied()
    }

    /// Resolve `name` as seen from `scope`.
    ///
    /// Class scopes are only searched when they are the starting scope;
    /// names declared `global` jump straight to the module scope.
    pub fn resolve_name(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let start = self.scope(scope)?;
        if start.globals.iter().any(|g| g == name) {
            return self.lookup_local(ScopeId::MODULE, name);
        }
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.scope(id)?;
            if (id == scope || data.kind != ScopeKind::Class)
                && let Some(&symbol) = data.symbols.get(name)
            {
                return Some(symbol);
            }
            current = data.parent;
        }
        None
    }

    pub fn module_symbol(&self, name: &str) -> Option<SymbolId> {
        self.lookup_local(ScopeId::MODULE, name)
    }

    pub fn symbol_declarations(&self, symbol: SymbolId) -> &[DeclIndex] {
        self.symbol(symbol)
            .map(|s| s.declarations.as_slice())
            .unwrap_or(&[])
    }

    pub fn public_symbols(&self) -> PublicSymbols {
        let mut map = BTreeMap::new();
        let Some(module) = self.scope(ScopeId::MODULE) else {
            return PublicSymbols(map);
        };
        for (name, &symbol) in &module.symbols {
            let last = self
                .symbol_declarations(symbol)
                .iter()
                .rev()
                .filter_map(|&d| self.declaration(d))
                .find(|d| d.is_exported());
            if let Some(decl) = last {
                map.insert(name.clone(), decl.kind);
            }
        }
        PublicSymbols(map)
    }

    /// Add the names a `from m import *` record brings into the module scope,
    /// once the program has resolved `m`.
    ///
    /// Names that are already declared after the import keep their later
    /// declarations; the wildcard alias is inserted at the import's position.
    pub fn add_wildcard_names(&mut self, import: u32, names: &[String]) {
        let Some(record) = self.imports.get(import as usize) else {
            return;
        };
        let (node, span, module, level) = (
            record.node,
            record.span,
            record.module.clone(),
            record.level,
        );
        let dunder_all = self.dunder_all.clone();
        trace!(module = %module, count = names.len(), "adding wildcard names");

        for name in names {
            let symbol = match self.module_symbol(name) {
                Some(existing) => existing,
                None => {
                    let id = SymbolId(self.symbols.len() as u32);
                    self.symbols.push(Symbol {
                        name: name.clone(),
                        scope: ScopeId::MODULE,
                        declarations: SmallVec::new(),
                    });
                    if let Some(scope) = self.scopes.get_mut(ScopeId::MODULE.0 as usize) {
                        scope.symbols.insert(name.clone(), id);
                    }
                    id
                }
            };
            let mut flags = DeclFlags::WILDCARD;
            if is_public_name(name, dunder_all.as_deref()) {
                flags |= DeclFlags::EXPORTED;
            }
            let index = DeclIndex(self.declarations.len() as u32);
            self.declarations.push(Declaration {
                kind: DeclarationKind::Alias,
                name: name.clone(),
                node,
                owner: node,
                scope: ScopeId::MODULE,
                symbol,
                flags,
                span,
                annotation: NodeIndex::NONE,
                alias: Some(AliasTarget {
                    import,
                    module: module.clone(),
                    level,
                    member: Some(name.clone()),
                }),
            });

            let declarations = &self.declarations;
            if let Some(sym) = self.symbols.get_mut(symbol.0 as usize) {
                let at = sym
                    .declarations
                    .iter()
                    .position(|d| {
                        declarations
                            .get(d.0 as usize)
                            .is_some_and(|d| d.span.start > span.start)
                    })
                    .unwrap_or(sym.declarations.len());
                sym.declarations.insert(at, index);
            }
        }
    }
}
