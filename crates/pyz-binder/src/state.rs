//! Binder state: scope stack, symbol declaration and diagnostics.

use crate::binding::Binding;
use crate::{
    AliasTarget, BindDiagnostic, DeclFlags, DeclIndex, Declaration, DeclarationKind, ImportRecord,
    Scope, ScopeId, ScopeKind, Symbol, SymbolId,
};
use pyz_common::position::TextSpan;
use pyz_parser::{NodeArena, NodeIndex};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

/// Per-scope traversal context.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub(crate) scope: ScopeId,
    /// Depth of if/while/for/try branches inside this scope.
    pub(crate) conditional_depth: u32,
    pub(crate) loop_depth: u32,
    /// Name of the receiver parameter and the class it belongs to, when the
    /// frame is a method body.
    pub(crate) receiver: Option<(String, ScopeId)>,
}

pub struct BinderState<'a> {
    pub(crate) arena: &'a NodeArena,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) declarations: Vec<Declaration>,
    pub(crate) imports: Vec<ImportRecord>,
    pub(crate) diagnostics: Vec<BindDiagnostic>,
    pub(crate) node_declarations: FxHashMap<NodeIndex, DeclIndex>,
    pub(crate) name_scopes: FxHashMap<NodeIndex, ScopeId>,
    pub(crate) definition_scopes: FxHashMap<NodeIndex, ScopeId>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) dunder_all: Option<Vec<String>>,
    pub(crate) wildcard_imports: Vec<u32>,
}

impl<'a> BinderState<'a> {
    pub fn new(arena: &'a NodeArena) -> Self {
        BinderState {
            arena,
            scopes: Vec::new(),
            symbols: Vec::new(),
            declarations: Vec::new(),
            imports: Vec::new(),
            diagnostics: Vec::new(),
            node_declarations: FxHashMap::default(),
            name_scopes: FxHashMap::default(),
            definition_scopes: FxHashMap::default(),
            frames: Vec::new(),
            dunder_all: None,
            wildcard_imports: Vec::new(),
        }
    }

    /// Bind the module rooted at `root` and hand back the finished binding.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn bind_module(mut self, root: NodeIndex) -> Binding {
        self.enter_scope(ScopeKind::Module, root, None);
        if let Some(pyz_parser::NodeData::Module { body }) = self.arena.data(root) {
            self.bind_statements(body);
        }
        self.exit_scope();
        self.finish()
    }

    fn finish(mut self) -> Binding {
        // function bodies bound through `global` may append out of order
        for symbol in &mut self.symbols {
            let decls = &self.declarations;
            symbol
                .declarations
                .sort_by_key(|d| decls.get(d.0 as usize).map(|d| d.span.start).unwrap_or(0));
        }
        self.mark_exports();
        debug!(
            scopes = self.scopes.len(),
            declarations = self.declarations.len(),
            imports = self.imports.len(),
            diagnostics = self.diagnostics.len(),
            "bound module"
        );
        Binding {
            scopes: self.scopes,
            symbols: self.symbols,
            declarations: self.declarations,
            imports: self.imports,
            diagnostics: self.diagnostics,
            node_declarations: self.node_declarations,
            name_scopes: self.name_scopes,
            definition_scopes: self.definition_scopes,
            dunder_all: self.dunder_all,
            wildcard_imports: self.wildcard_imports,
        }
    }

    fn mark_exports(&mut self) {
        let dunder_all = self.dunder_all.take();
        for decl in &mut self.declarations {
            if decl.scope != ScopeId::MODULE || decl.kind == DeclarationKind::InstanceAttribute {
                continue;
            }
            if is_public_name(&decl.name, dunder_all.as_deref()) {
                decl.flags |= DeclFlags::EXPORTED;
            }
        }
        self.dunder_all = dunder_all;
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub(crate) fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn current_frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub(crate) fn current_scope(&self) -> ScopeId {
        self.current_frame()
            .map(|f| f.scope)
            .unwrap_or(ScopeId::MODULE)
    }

    pub(crate) fn scope_kind(&self, id: ScopeId) -> Option<ScopeKind> {
        self.scopes.get(id.0 as usize).map(|s| s.kind)
    }

    pub(crate) fn enter_scope(
        &mut self,
        kind: ScopeKind,
        node: NodeIndex,
        receiver: Option<(String, ScopeId)>,
    ) -> ScopeId {
        let parent = self.frames.last().map(|f| f.scope);
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, parent, node));
        self.definition_scopes.insert(node, id);
        self.frames.push(Frame {
            scope: id,
            conditional_depth: 0,
            loop_depth: 0,
            receiver,
        });
        id
    }

    pub(crate) fn exit_scope(&mut self) {
        self.frames.pop();
    }

    /// Scope a new binding of `name` in the current scope really lands in,
    /// honoring `global` and `nonlocal` statements.
    fn target_scope(&self, name: &str) -> ScopeId {
        let current = self.current_scope();
        let Some(scope) = self.scopes.get(current.0 as usize) else {
            return current;
        };
        if scope.globals.iter().any(|g| g == name) {
            return ScopeId::MODULE;
        }
        if scope.nonlocals.iter().any(|n| n == name) {
            let mut next = scope.parent;
            while let Some(id) = next {
                let Some(candidate) = self.scopes.get(id.0 as usize) else {
                    break;
                };
                if candidate.kind == ScopeKind::Function && candidate.symbols.contains_key(name)
                {
                    return id;
                }
                next = candidate.parent;
            }
        }
        current
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Declare the name carried by the `Name` node `name_node`.
    pub(crate) fn declare(
        &mut self,
        name_node: NodeIndex,
        kind: DeclarationKind,
        owner: NodeIndex,
        annotation: NodeIndex,
        alias: Option<AliasTarget>,
    ) -> Option<DeclIndex> {
        let name = self.arena.name_text(name_node)?.to_string();
        let scope = self.target_scope(&name);
        let span = self.arena.span(name_node);
        let index = self.add_declaration(
            scope, false, name, kind, name_node, owner, span, annotation, alias,
        );
        self.node_declarations.insert(name_node, index);
        self.name_scopes.insert(name_node, self.current_scope());
        Some(index)
    }

    /// Declare `self.<attr>` on the class owning the current method.
    pub(crate) fn declare_instance_attribute(
        &mut self,
        class_scope: ScopeId,
        attr_node: NodeIndex,
        owner: NodeIndex,
        annotation: NodeIndex,
    ) -> Option<DeclIndex> {
        let name = self.arena.name_text(attr_node)?.to_string();
        let span = self.arena.span(attr_node);
        let index = self.add_declaration(
            class_scope,
            true,
            name,
            DeclarationKind::InstanceAttribute,
            attr_node,
            owner,
            span,
            annotation,
            None,
        );
        self.node_declarations.insert(attr_node, index);
        Some(index)
    }

    #[allow(clippy::too_many_arguments)]
    fn add_declaration(
        &mut self,
        scope: ScopeId,
        instance: bool,
        name: String,
        kind: DeclarationKind,
        node: NodeIndex,
        owner: NodeIndex,
        span: TextSpan,
        annotation: NodeIndex,
        alias: Option<AliasTarget>,
    ) -> DeclIndex {
        let symbol = self.symbol_for(scope, &name, instance);
        let mut flags = DeclFlags::empty();
        if annotation.is_some() {
            flags |= DeclFlags::ANNOTATED;
        } else if matches!(
            kind,
            DeclarationKind::Variable | DeclarationKind::InstanceAttribute
        ) {
            flags |= DeclFlags::INFERRED_ONLY;
        }
        // a conditional branch only counts inside the declaring scope
        if scope == self.current_scope()
            && self.current_frame().is_some_and(|f| f.conditional_depth > 0)
        {
            flags |= DeclFlags::CONDITIONAL;
        }

        let index = DeclIndex(self.declarations.len() as u32);
        self.declarations.push(Declaration {
            kind,
            name,
            node,
            owner,
            scope,
            symbol,
            flags,
            span,
            annotation,
            alias,
        });
        if let Some(sym) = self.symbols.get_mut(symbol.0 as usize) {
            sym.declarations.push(index);
        }
        index
    }

    fn symbol_for(&mut self, scope: ScopeId, name: &str, instance: bool) -> SymbolId {
        let next = SymbolId(self.symbols.len() as u32);
        let Some(scope_data) = self.scopes.get_mut(scope.0 as usize) else {
            return next;
        };
        let table = if instance {
            &mut scope_data.instance_symbols
        } else {
            &mut scope_data.symbols
        };
        if let Some(&existing) = table.get(name) {
            return existing;
        }
        table.insert(name.to_string(), next);
        self.symbols.push(Symbol {
            name: name.to_string(),
            scope,
            declarations: SmallVec::new(),
        });
        next
    }

    pub(crate) fn record_name_use(&mut self, name_node: NodeIndex) {
        self.name_scopes.insert(name_node, self.current_scope());
    }

    pub(crate) fn error(&mut self, code: u32, span: TextSpan, arg: Option<&str>) {
        self.diagnostics.push(BindDiagnostic {
            code,
            span,
            arg: arg.map(str::to_string),
        });
    }
}

/// Whether a module-level name belongs to the public interface.
pub(crate) fn is_public_name(name: &str, dunder_all: Option<&[String]>) -> bool {
    if let Some(all) = dunder_all
        && all.iter().any(|n| n == name)
    {
        return true;
    }
    !name.starts_with('_')
}
