//! Declaration types, name resolution and return inference.

use crate::builtins::{builtin_type, lookup_builtin};
use crate::state::{EvalKey, TypeEvaluator};
use crate::BoundFile;
use pyz_binder::{DeclIndex, Declaration, DeclarationKind, ScopeId, ScopeKind, SymbolId};
use pyz_common::diagnostics::codes;
use pyz_common::ids::{DeclId, FileId};
use pyz_parser::node::ParamKind as NodeParamKind;
use pyz_parser::{NodeArena, NodeData, NodeIndex};
use pyz_solver::type_queries::{class_object_inner, instance_parts, iteration_element};
use pyz_solver::{BuiltinClass, ClassKey, FunctionShape, ParamInfo, ParamKind, TypeData, TypeId};
use tracing::trace;

/// Decorators that change how a method binds rather than wrapping it.
pub(crate) const BINDING_DECORATORS: [&str; 3] = ["staticmethod", "classmethod", "property"];

/// Whether `decorator` is one of `BINDING_DECORATORS` or a property
/// `setter`.
pub(crate) fn is_binding_decorator(arena: &NodeArena, decorator: NodeIndex) -> bool {
    decorator_names(arena, &[decorator])
        .first()
        .is_some_and(|n| BINDING_DECORATORS.contains(&n.as_str()) || n == "setter")
}

/// Simple names of the decorators in `decorators` (`x.setter` gives `setter`).
pub(crate) fn decorator_names(arena: &NodeArena, decorators: &[NodeIndex]) -> Vec<String> {
    decorators
        .iter()
        .filter_map(|&d| match arena.data(d) {
            Some(NodeData::Name { .. }) => arena.name_text(d).map(str::to_string),
            Some(NodeData::Attribute { attr, .. }) => arena.name_text(*attr).map(str::to_string),
            _ => None,
        })
        .collect()
}

impl<'a> TypeEvaluator<'a> {
    // =========================================================================
    // Declarations
    // =========================================================================

    /// Declared or inferred type of `decl`.
    pub fn declaration_type(&mut self, decl: DeclId) -> TypeId {
        self.memoized(EvalKey::Decl(decl), |this| this.compute_declaration_type(decl))
    }

    fn compute_declaration_type(&mut self, decl: DeclId) -> TypeId {
        let Some(declaration) = self.declaration(decl) else {
            return TypeId::UNKNOWN;
        };
        let file = decl.file;
        trace!(name = %declaration.name, kind = ?declaration.kind, "declaration type");
        match declaration.kind {
            DeclarationKind::Variable | DeclarationKind::InstanceAttribute => {
                if declaration.is_annotated() {
                    self.annotation_type(file, declaration.annotation)
                } else {
                    self.inferred_variable_type(file, &declaration)
                }
            }
            DeclarationKind::Parameter => self.parameter_type(file, &declaration),
            DeclarationKind::Function => self.function_type(decl, &declaration),
            DeclarationKind::Class => self
                .interner
                .class_object(self.interner.declared_instance(decl, &declaration.name)),
            DeclarationKind::Alias => self.alias_type(file, &declaration),
            DeclarationKind::ModuleAlias => self.module_alias_type(file, &declaration),
        }
    }

    fn inferred_variable_type(&mut self, file: FileId, declaration: &Declaration) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let arena = bound.arena.clone();
        let target_node = declaration.node;
        match arena.data(declaration.owner) {
            Some(NodeData::Assign { targets, value }) => {
                let value_type = self.expression_type(file, *value);
                targets
                    .iter()
                    .find_map(|&t| self.destructure(&arena, t, target_node, value_type))
                    .unwrap_or(TypeId::UNKNOWN)
            }
            Some(NodeData::AnnAssign { value, .. }) => self.expression_type(file, *value),
            Some(NodeData::AugAssign { target, op, value }) => {
                let (target, op, value) = (*target, *op, *value);
                let prior = match arena.data(target) {
                    Some(NodeData::Name { .. }) => {
                        let position = arena.span(declaration.owner).start;
                        self.name_type_at(file, target, position)
                    }
                    _ => self.expression_type(file, target),
                };
                let right = self.expression_type(file, value);
                self.binary_operation(file, declaration.owner, op, prior, right)
            }
            Some(NodeData::For { target, iter, .. }) => {
                let (target, iter) = (*target, *iter);
                let iterable = self.expression_type(file, iter);
                let element = self.element_type(iterable);
                self.destructure(&arena, target, target_node, element)
                    .unwrap_or(TypeId::UNKNOWN)
            }
            Some(NodeData::WithItem { context, target }) => {
                let (context, target) = (*context, *target);
                let manager = self.expression_type(file, context);
                let entered = self.entered_type(manager);
                self.destructure(&arena, target, target_node, entered)
                    .unwrap_or(TypeId::UNKNOWN)
            }
            Some(NodeData::ExceptHandler { type_expr, .. }) => {
                let caught = self.expression_type(file, *type_expr);
                self.exception_instance_type(caught)
            }
            _ => TypeId::UNKNOWN,
        }
    }

    /// Type reaching `wanted` when a value of type `ty` is assigned to `target`.
    fn destructure(
        &mut self,
        arena: &NodeArena,
        target: NodeIndex,
        wanted: NodeIndex,
        ty: TypeId,
    ) -> Option<TypeId> {
        match arena.data(target)? {
            NodeData::Name { .. } => (target == wanted).then_some(ty),
            NodeData::Attribute { attr, .. } => (*attr == wanted).then_some(ty),
            NodeData::Starred { value } => self.destructure(arena, *value, wanted, ty),
            NodeData::Tuple { elts } | NodeData::List { elts } => {
                let fixed = self.fixed_tuple_elements(ty);
                let has_star = elts
                    .iter()
                    .any(|&e| matches!(arena.data(e), Some(NodeData::Starred { .. })));
                let element = self.element_type(ty);
                for (i, &elt) in elts.iter().enumerate() {
                    let elt_type = match arena.data(elt) {
                        Some(NodeData::Starred { .. }) => self.interner.list_of(element),
                        _ => match &fixed {
                            Some(elements) if !has_star && elements.len() == elts.len() => {
                                elements[i]
                            }
                            _ => element,
                        },
                    };
                    if let Some(found) = self.destructure(arena, elt, wanted, elt_type) {
                        return Some(found);
                    }
                }
                None
            }
            _ => None,
        }
    }

    /// Element types of a fixed-length tuple.
    fn fixed_tuple_elements(&self, ty: TypeId) -> Option<Vec<TypeId>> {
        let (class, args) = instance_parts(self.interner, ty)?;
        if class.builtin() != Some(BuiltinClass::Tuple) || args.contains(&TypeId::ELLIPSIS) {
            return None;
        }
        Some(args)
    }

    /// Element produced by iterating over `ty`.
    pub(crate) fn element_type(&mut self, ty: TypeId) -> TypeId {
        if self.is_declared_instance(ty)
            && let Some(iter) = self.lookup_member(ty, "__iter__")
        {
            let iterator = self.callable_return(iter);
            return match self.lookup_member(iterator, "__next__") {
                Some(next) => self.callable_return(next),
                None => TypeId::UNKNOWN,
            };
        }
        iteration_element(self.interner, ty).unwrap_or(TypeId::UNKNOWN)
    }

    pub(crate) fn is_declared_instance(&self, ty: TypeId) -> bool {
        matches!(
            instance_parts(self.interner, ty),
            Some((ClassKey::Declared(_), _))
        )
    }

    /// Value bound by `with manager as x`.
    fn entered_type(&mut self, manager: TypeId) -> TypeId {
        if !self.is_declared_instance(manager) {
            return manager;
        }
        match self.lookup_member(manager, "__enter__") {
            Some(enter) => self.callable_return(enter),
            None => TypeId::UNKNOWN,
        }
    }

    /// Instance caught by `except <caught> as e`.
    fn exception_instance_type(&mut self, caught: TypeId) -> TypeId {
        if let Some(inner) = class_object_inner(self.interner, caught) {
            return inner;
        }
        match self.interner.lookup(caught) {
            Some(TypeData::Instance { class, args })
                if class.builtin() == Some(BuiltinClass::Tuple) =>
            {
                let members: Vec<TypeId> = args
                    .iter()
                    .filter(|&&a| a != TypeId::ELLIPSIS)
                    .map(|&a| class_object_inner(self.interner, a).unwrap_or(TypeId::UNKNOWN))
                    .collect();
                self.interner.union(members)
            }
            _ => TypeId::UNKNOWN,
        }
    }

    fn parameter_type(&mut self, file: FileId, declaration: &Declaration) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let arena = bound.arena.clone();
        let Some(&NodeData::Parameter {
            kind,
            annotation,
            default,
            ..
        }) = arena.data(declaration.owner)
        else {
            return TypeId::UNKNOWN;
        };

        let declared = if annotation.is_some() {
            Some(self.annotation_type(file, annotation))
        } else {
            None
        };
        match kind {
            NodeParamKind::VarArgs => {
                let element = declared.unwrap_or(TypeId::UNKNOWN);
                return self.interner.tuple_of(&[element, TypeId::ELLIPSIS]);
            }
            NodeParamKind::KwArgs => {
                let value = declared.unwrap_or(TypeId::UNKNOWN);
                return self.interner.dict_of(TypeId::STR, value);
            }
            _ => {}
        }
        if let Some(declared) = declared {
            return declared;
        }
        if let Some(receiver) = self.receiver_type(&bound, declaration.owner) {
            return receiver;
        }
        if default.is_some() {
            let ty = self.expression_type(file, default);
            if ty != TypeId::NONE {
                return ty;
            }
        }
        TypeId::UNKNOWN
    }

    /// Type of the implicit first parameter of a method.
    fn receiver_type(&mut self, bound: &BoundFile, param: NodeIndex) -> Option<TypeId> {
        let arena = &bound.arena;
        let function = arena.parent(param);
        let Some(NodeData::FunctionDef {
            decorators, params, ..
        }) = arena.data(function)
        else {
            return None;
        };
        if params.first() != Some(&param) {
            return None;
        }
        let decorators = decorator_names(arena, decorators);
        if decorators.iter().any(|d| d == "staticmethod") {
            return None;
        }
        let (class_decl, name) = self.enclosing_class(bound, function)?;
        let instance = self.interner.declared_instance(class_decl, &name);
        if decorators.iter().any(|d| d == "classmethod") {
            Some(self.interner.class_object(instance))
        } else {
            Some(instance)
        }
    }

    /// Class whose body directly defines `definition`.
    pub(crate) fn enclosing_class(
        &self,
        bound: &BoundFile,
        definition: NodeIndex,
    ) -> Option<(DeclId, String)> {
        let binding = &bound.binding;
        let own_scope = binding.scope_of_definition(definition)?;
        let parent = binding.scope(own_scope)?.parent?;
        let parent_scope = binding.scope(parent)?;
        if parent_scope.kind != ScopeKind::Class {
            return None;
        }
        let Some(NodeData::ClassDef { name, .. }) = bound.arena.data(parent_scope.node) else {
            return None;
        };
        let decl = binding.declaration_at(*name)?;
        let declaration = binding.declaration(decl)?;
        Some((decl.in_file(bound.file), declaration.name.clone()))
    }

    fn function_type(&mut self, decl: DeclId, declaration: &Declaration) -> TypeId {
        let file = decl.file;
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let arena = bound.arena.clone();
        let Some(NodeData::FunctionDef {
            decorators,
            params,
            returns,
            ..
        }) = arena.data(declaration.owner)
        else {
            return TypeId::UNKNOWN;
        };

        let params = self.parameter_infos(file, &arena, params);
        let ret = returns.is_some().then(|| self.annotation_type(file, *returns));
        let function = self.interner.function(FunctionShape {
            name: declaration.name.clone(),
            params,
            ret,
            decl: Some(decl),
        });

        // decorators apply bottom-up
        let mut result = function;
        for &decorator in decorators.iter().rev() {
            if is_binding_decorator(&arena, decorator) {
                continue;
            }
            let wrapper = self.expression_type(file, decorator);
            result = self.callable_return(wrapper);
        }
        result
    }

    pub(crate) fn parameter_infos(
        &mut self,
        file: FileId,
        arena: &NodeArena,
        params: &[NodeIndex],
    ) -> Vec<ParamInfo> {
        let mut infos = Vec::with_capacity(params.len());
        let mut keyword_only = false;
        for &param in params {
            let Some(&NodeData::Parameter {
                kind,
                name,
                annotation,
                default,
            }) = arena.data(param)
            else {
                continue;
            };
            let kind = match kind {
                NodeParamKind::KeywordMarker => {
                    keyword_only = true;
                    continue;
                }
                NodeParamKind::PositionalMarker => continue,
                NodeParamKind::Normal if keyword_only => ParamKind::KeywordOnly,
                NodeParamKind::Normal => ParamKind::Positional,
                NodeParamKind::VarArgs => {
                    keyword_only = true;
                    ParamKind::VarArgs
                }
                NodeParamKind::KwArgs => ParamKind::KwArgs,
            };
            let ty = if annotation.is_some() {
                self.annotation_type(file, annotation)
            } else {
                TypeId::UNKNOWN
            };
            infos.push(ParamInfo {
                name: arena.name_text(name).unwrap_or_default().to_string(),
                kind,
                ty,
                has_default: default.is_some(),
            });
        }
        infos
    }

    // =========================================================================
    // Imports
    // =========================================================================

    fn alias_type(&mut self, file: FileId, declaration: &Declaration) -> TypeId {
        let Some(alias) = declaration.alias.as_ref() else {
            return TypeId::UNKNOWN;
        };
        let Some(target) = self.view.resolve_import(file, &alias.module, alias.level) else {
            return TypeId::UNKNOWN;
        };
        match &alias.member {
            Some(member) => self
                .module_member_type(target, member)
                .unwrap_or(TypeId::UNKNOWN),
            None => self.module_type(target),
        }
    }

    fn module_alias_type(&mut self, file: FileId, declaration: &Declaration) -> TypeId {
        let Some(alias) = declaration.alias.as_ref() else {
            return TypeId::UNKNOWN;
        };
        match self.view.resolve_import(file, &alias.module, alias.level) {
            Some(target) => self.module_type(target),
            None => TypeId::UNKNOWN,
        }
    }

    pub(crate) fn module_type(&mut self, file: FileId) -> TypeId {
        match self.bound(file) {
            Some(bound) => self.interner.module(file, &bound.module_name),
            None => TypeId::UNKNOWN,
        }
    }

    /// `module.name`: a module-level symbol, else a submodule.
    pub(crate) fn module_member_type(&mut self, module: FileId, name: &str) -> Option<TypeId> {
        let bound = self.bound(module)?;
        if let Some(symbol) = bound.binding.module_symbol(name) {
            return Some(self.symbol_type(module, symbol));
        }
        let submodule = self.view.resolve_submodule(module, name)?;
        Some(self.module_type(submodule))
    }

    // =========================================================================
    // Symbols and names
    // =========================================================================

    /// Type of `symbol` as seen from outside its scope: the last annotated
    /// declaration, else the union of every declaration.
    pub fn symbol_type(&mut self, file: FileId, symbol: SymbolId) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let decls = bound.binding.symbol_declarations(symbol);
        if let Some(annotated) = self.last_annotated(&bound, decls) {
            return self.declaration_type(annotated.in_file(file));
        }
        let types: Vec<TypeId> = decls
            .iter()
            .map(|&d| self.declaration_type(d.in_file(file)))
            .collect();
        if types.is_empty() {
            TypeId::UNKNOWN
        } else {
            self.interner.union(types)
        }
    }

    /// Declared type of a symbol that has an annotation somewhere.
    pub(crate) fn declared_symbol_type(&mut self, file: FileId, symbol: SymbolId) -> Option<TypeId> {
        let bound = self.bound(file)?;
        let annotated = self.last_annotated(&bound, bound.binding.symbol_declarations(symbol))?;
        Some(self.declaration_type(annotated.in_file(file)))
    }

    fn last_annotated(&self, bound: &BoundFile, decls: &[DeclIndex]) -> Option<DeclIndex> {
        decls.iter().rev().copied().find(|&d| {
            bound
                .binding
                .declaration(d)
                .is_some_and(Declaration::is_annotated)
        })
    }

    /// Type of the `Name` reference `node`.
    pub(crate) fn name_type(&mut self, file: FileId, node: NodeIndex) -> TypeId {
        let position = self.node_span(file, node).start;
        self.name_type_at(file, node, position)
    }

    /// Type of the `Name` node `node` read at source offset `position`.
    fn name_type_at(&mut self, file: FileId, node: NodeIndex, position: u32) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let Some(name) = bound.arena.name_text(node) else {
            return TypeId::UNKNOWN;
        };
        let scope = bound
            .binding
            .scope_of_name(node)
            .unwrap_or(ScopeId::MODULE);
        if let Some(symbol) = bound.binding.resolve_name(scope, name) {
            return self.reference_type(&bound, scope, symbol, position);
        }
        if let Some(builtin) = lookup_builtin(name) {
            return builtin_type(self.interner, builtin);
        }
        let name = name.to_string();
        self.report_at(file, node, codes::UNDEFINED_NAME, &[&name]);
        TypeId::UNKNOWN
    }

    /// Type of `symbol` read from `scope` at `position`.
    ///
    /// Inside the declaring scope the declarations preceding the reference
    /// decide: the last unconditional one together with any conditional
    /// ones after it.
    fn reference_type(
        &mut self,
        bound: &BoundFile,
        scope: ScopeId,
        symbol: SymbolId,
        position: u32,
    ) -> TypeId {
        let file = bound.file;
        let binding = &bound.binding;
        let decls = binding.symbol_declarations(symbol);
        if let Some(annotated) = self.last_annotated(bound, decls) {
            return self.declaration_type(annotated.in_file(file));
        }

        let same_scope = binding.symbol(symbol).is_some_and(|s| s.scope == scope);
        let mut chosen: Vec<DeclIndex> = Vec::new();
        if same_scope {
            for &index in decls {
                let Some(declaration) = binding.declaration(index) else {
                    continue;
                };
                if !precedes(&bound.arena, declaration, position) {
                    continue;
                }
                if !declaration.is_conditional() {
                    chosen.clear();
                }
                chosen.push(index);
            }
        }
        if chosen.is_empty() {
            chosen = decls.to_vec();
        }
        let types: Vec<TypeId> = chosen
            .into_iter()
            .map(|d| self.declaration_type(d.in_file(file)))
            .collect();
        self.interner.union(types)
    }

    // =========================================================================
    // Return inference
    // =========================================================================

    /// Return type of the function declared by `decl`, inferred from its
    /// body when unannotated.
    pub(crate) fn function_return(&mut self, shape: &FunctionShape) -> TypeId {
        if let Some(ret) = shape.ret {
            return ret;
        }
        let Some(decl) = shape.decl else {
            return TypeId::UNKNOWN;
        };
        match self.declaration(decl) {
            Some(declaration) => self.inferred_return_type(decl.file, declaration.owner),
            None => TypeId::UNKNOWN,
        }
    }

    /// Union of the values a `FunctionDef` or `Lambda` returns.
    pub(crate) fn inferred_return_type(&mut self, file: FileId, function: NodeIndex) -> TypeId {
        self.memoized(EvalKey::Return(file, function), |this| {
            this.compute_return_type(file, function)
        })
    }

    fn compute_return_type(&mut self, file: FileId, function: NodeIndex) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let arena = bound.arena.clone();
        let body = match arena.data(function) {
            Some(NodeData::Lambda { body, .. }) => return self.expression_type(file, *body),
            Some(NodeData::FunctionDef { body, .. }) => body,
            _ => return TypeId::UNKNOWN,
        };
        let returns = bound
            .binding
            .scope_of_definition(function)
            .and_then(|s| bound.binding.scope(s))
            .map(|s| s.returns.clone())
            .unwrap_or_default();
        if returns.is_empty() {
            return TypeId::NONE;
        }

        let falls_through = !always_exits(&arena, body);
        let key = EvalKey::Return(file, function);
        let (types, settled) = self.join_returns(file, &arena, &returns, key, falls_through);
        if settled.len() == types.len() {
            return self.interner.union(types);
        }
        // Some returns went through this function again. Seed the recursive
        // calls with the returns that did not and evaluate once more.
        if settled.is_empty() {
            return TypeId::UNKNOWN;
        }
        let seed = self.interner.union(settled);
        trace!(%file, ?function, seed = %self.format(seed), "re-inferring recursive return");
        self.provisional.insert(key, seed);
        let (types, _) = self.join_returns(file, &arena, &returns, key, falls_through);
        self.provisional.remove(&key);
        self.interner.union(types)
    }

    /// Types of every return statement, and the subset of them whose
    /// evaluation did not re-enter `key`.
    fn join_returns(
        &mut self,
        file: FileId,
        arena: &NodeArena,
        returns: &[NodeIndex],
        key: EvalKey,
        falls_through: bool,
    ) -> (Vec<TypeId>, Vec<TypeId>) {
        let mut types = Vec::with_capacity(returns.len() + 1);
        let mut settled = Vec::with_capacity(returns.len() + 1);
        for &ret in returns {
            let ty = match arena.data(ret) {
                Some(NodeData::Return { value }) if value.is_some() => {
                    self.reentered.remove(&key);
                    let ty = self.expression_type(file, *value);
                    if self.reentered.remove(&key) {
                        types.push(ty);
                        continue;
                    }
                    ty
                }
                _ => TypeId::NONE,
            };
            types.push(ty);
            settled.push(ty);
        }
        if falls_through {
            types.push(TypeId::NONE);
            settled.push(TypeId::NONE);
        }
        (types, settled)
    }
}

/// Whether `declaration` is in effect at `position` of its own scope.
fn precedes(arena: &NodeArena, declaration: &Declaration, position: u32) -> bool {
    match arena.data(declaration.owner) {
        Some(
            NodeData::Assign { .. } | NodeData::AnnAssign { .. } | NodeData::AugAssign { .. },
        ) => arena.span(declaration.owner).end <= position,
        _ => declaration.span.start <= position,
    }
}

/// Whether control can never fall off the end of `body`.
fn always_exits(arena: &NodeArena, body: &[NodeIndex]) -> bool {
    let Some(&last) = body.last() else {
        return false;
    };
    match arena.data(last) {
        Some(NodeData::Return { .. } | NodeData::Raise { .. }) => true,
        Some(NodeData::If { body, orelse, .. }) => {
            always_exits(arena, body) && always_exits(arena, orelse)
        }
        Some(NodeData::With { body, .. }) => always_exits(arena, body),
        Some(NodeData::Try {
            body,
            handlers,
            finalbody,
            ..
        }) => {
            let handlers_exit = handlers.iter().all(|&h| match arena.data(h) {
                Some(NodeData::ExceptHandler { body, .. }) => always_exits(arena, body),
                _ => false,
            });
            (always_exits(arena, body) && handlers_exit) || always_exits(arena, finalbody)
        }
        _ => false,
    }
}
