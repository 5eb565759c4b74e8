//! Attribute access, class hierarchy and assignability.

use crate::builtins::builtin_method;
use crate::state::TypeEvaluator;
use crate::state_declarations::decorator_names;
use crate::BoundFile;
use pyz_binder::{DeclarationKind, ScopeId, SymbolId};
use pyz_common::diagnostics::codes;
use pyz_common::ids::{DeclId, FileId};
use pyz_parser::{NodeData, NodeIndex};
use pyz_solver::type_queries::{class_object_inner, declared_classes, instance_parts};
use pyz_solver::{
    ClassHierarchy, ClassKey, DeclaredClass, TypeData, TypeId, is_assignable, mro,
};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Declared bases resolved so far, viewed as a class hierarchy.
struct BaseTable<'b>(&'b FxHashMap<DeclId, Vec<ClassKey>>);

impl ClassHierarchy for BaseTable<'_> {
    fn declared_bases(&self, class: &DeclaredClass) -> Vec<ClassKey> {
        self.0.get(&class.decl).cloned().unwrap_or_default()
    }
}

/// How a class attribute was reached.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Access {
    Instance,
    Class,
}

impl<'a> TypeEvaluator<'a> {
    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Direct bases of a declared class, from its `class C(...)` header.
    fn declared_bases(&mut self, class: &DeclaredClass) -> Vec<ClassKey> {
        if let Some(bases) = self.class_bases.get(&class.decl) {
            return bases.clone();
        }
        // seed the entry so that `class A(A)` does not loop
        self.class_bases.insert(class.decl, Vec::new());

        let file = class.decl.file;
        let mut bases = Vec::new();
        if let Some((bound, node)) = self.class_definition(class.decl)
            && let Some(NodeData::ClassDef { bases: exprs, .. }) = bound.arena.data(node)
        {
            for &expr in exprs {
                if matches!(bound.arena.data(expr), Some(NodeData::Argument { name, .. }) if name.is_some())
                {
                    continue;
                }
                let base = self.expression_type(file, expr);
                let Some(inner) = class_object_inner(self.interner, base) else {
                    continue;
                };
                if let Some((key, _)) = instance_parts(self.interner, inner)
                    && !bases.contains(&key)
                {
                    bases.push(key);
                }
            }
        }
        trace!(class = %class.name, count = bases.len(), "resolved class bases");
        self.class_bases.insert(class.decl, bases.clone());
        bases
    }

    /// Resolve bases for `class` and every declared class above it.
    fn prepare_hierarchy(&mut self, class: &ClassKey) {
        let ClassKey::Declared(start) = class else {
            return;
        };
        let mut pending = vec![start.clone()];
        let mut seen: Vec<DeclId> = Vec::new();
        while let Some(current) = pending.pop() {
            if seen.contains(&current.decl) {
                continue;
            }
            seen.push(current.decl);
            for base in self.declared_bases(&current) {
                if let ClassKey::Declared(declared) = base {
                    pending.push(declared);
                }
            }
        }
    }

    pub(crate) fn class_mro(&mut self, class: &ClassKey) -> Vec<ClassKey> {
        self.prepare_hierarchy(class);
        mro(&BaseTable(&self.class_bases), class)
    }

    /// Whether a value of type `source` may be stored where `target` is
    /// expected.
    pub(crate) fn assignable(&mut self, source: TypeId, target: TypeId) -> bool {
        if self.is_placeholder(source) || self.is_placeholder(target) {
            return true;
        }
        let mut classes = declared_classes(self.interner, source);
        classes.extend(declared_classes(self.interner, target));
        for class in classes {
            self.prepare_hierarchy(&ClassKey::Declared(class));
        }
        is_assignable(self.interner, &BaseTable(&self.class_bases), source, target)
    }

    /// The `ClassDef` node of a declared class and its file.
    fn class_definition(&mut self, decl: DeclId) -> Option<(BoundFile, NodeIndex)> {
        let declaration = self.declaration(decl)?;
        if declaration.kind != DeclarationKind::Class {
            return None;
        }
        let bound = self.bound(decl.file)?;
        Some((bound, declaration.owner))
    }

    fn class_scope(&mut self, decl: DeclId) -> Option<(BoundFile, ScopeId)> {
        let (bound, node) = self.class_definition(decl)?;
        let scope = bound.binding.scope_of_definition(node)?;
        Some((bound, scope))
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// `object.name`, reporting an unknown attribute at `site`.
    pub(crate) fn member_access(
        &mut self,
        file: FileId,
        site: NodeIndex,
        object: TypeId,
        name: &str,
    ) -> TypeId {
        if let Some(ty) = self.lookup_member(object, name) {
            return ty;
        }
        let text = self.format(object);
        self.report_at(file, site, codes::UNKNOWN_ATTRIBUTE, &[name, &text]);
        TypeId::UNKNOWN
    }

    /// `object.name` without reporting. `None` when the attribute does not
    /// exist on some member of `object`.
    pub(crate) fn lookup_member(&mut self, object: TypeId, name: &str) -> Option<TypeId> {
        if matches!(object, TypeId::UNKNOWN | TypeId::ANY | TypeId::NEVER) {
            return Some(object);
        }
        match self.interner.lookup(object)? {
            TypeData::Recursive { .. } => Some(TypeId::UNKNOWN),
            TypeData::Union(members) => {
                let mut found = Vec::with_capacity(members.len());
                for member in members {
                    found.push(self.lookup_member(member, name)?);
                }
                Some(self.interner.union(found))
            }
            TypeData::Instance { class, args } => self.instance_member(object, &class, &args, name),
            TypeData::ClassObject(inner) => self.class_object_member(object, inner, name),
            TypeData::Module { file, .. } => self.module_member_type(file, name),
            TypeData::Function(_) | TypeData::BoundMethod { .. } => {
                (name == "__name__").then_some(TypeId::STR)
            }
            TypeData::Unknown | TypeData::Never | TypeData::Any => Some(object),
        }
    }

    fn instance_member(
        &mut self,
        receiver: TypeId,
        class: &ClassKey,
        args: &[TypeId],
        name: &str,
    ) -> Option<TypeId> {
        for key in self.class_mro(class) {
            match &key {
                ClassKey::Builtin(builtin) => {
                    let args = if key == *class { args } else { &[] };
                    if let Some(method) =
                        builtin_method(self.interner, *builtin, args, receiver, name)
                    {
                        return Some(method);
                    }
                }
                ClassKey::Declared(declared) => {
                    if let Some(ty) =
                        self.declared_class_member(declared.decl, name, receiver, Access::Instance)
                    {
                        return Some(ty);
                    }
                }
            }
        }
        (name == "__class__").then(|| self.interner.class_object(receiver))
    }

    fn class_object_member(&mut self, object: TypeId, inner: TypeId, name: &str) -> Option<TypeId> {
        if name == "__name__" {
            return Some(TypeId::STR);
        }
        let (class, args) = instance_parts(self.interner, inner)?;
        for key in self.class_mro(&class) {
            match &key {
                ClassKey::Builtin(builtin) => {
                    let args = if key == class { args.as_slice() } else { &[] };
                    if let Some(method) = builtin_method(self.interner, *builtin, args, inner, name)
                    {
                        return Some(method);
                    }
                }
                ClassKey::Declared(declared) => {
                    if let Some(ty) =
                        self.declared_class_member(declared.decl, name, object, Access::Class)
                    {
                        return Some(ty);
                    }
                }
            }
        }
        None
    }

    /// Attribute `name` defined by the body (or methods, for instances) of
    /// the declared class `decl`.
    fn declared_class_member(
        &mut self,
        decl: DeclId,
        name: &str,
        receiver: TypeId,
        access: Access,
    ) -> Option<TypeId> {
        let (bound, scope) = self.class_scope(decl)?;
        if let Some(symbol) = bound.binding.lookup_local(scope, name) {
            return Some(self.bind_attribute(&bound, symbol, receiver, access));
        }
        if access == Access::Instance
            && let Some(symbol) = bound.binding.lookup_instance(scope, name)
        {
            return Some(self.symbol_type(bound.file, symbol));
        }
        None
    }

    /// Declarations `object.name` resolves to: the module-level symbol of a
    /// module, else the symbol of the first class in the MRO defining it.
    /// Builtin members have none.
    pub fn member_declarations(&mut self, object: TypeId, name: &str) -> Vec<DeclId> {
        let (class, access) = match self.interner.lookup(object) {
            Some(TypeData::Module { file, .. }) => {
                let Some(bound) = self.bound(file) else {
                    return Vec::new();
                };
                return bound
                    .binding
                    .module_symbol(name)
                    .map(|symbol| {
                        bound
                            .binding
                            .symbol_declarations(symbol)
                            .iter()
                            .map(|d| d.in_file(file))
                            .collect()
                    })
                    .unwrap_or_default();
            }
            Some(TypeData::Union(members)) => {
                let mut found: Vec<DeclId> = Vec::new();
                for member in members {
                    for decl in self.member_declarations(member, name) {
                        if !found.contains(&decl) {
                            found.push(decl);
                        }
                    }
                }
                return found;
            }
            Some(TypeData::Instance { class, .. }) => (class, Access::Instance),
            Some(TypeData::ClassObject(inner)) => match instance_parts(self.interner, inner) {
                Some((class, _)) => (class, Access::Class),
                None => return Vec::new(),
            },
            _ => return Vec::new(),
        };
        for key in self.class_mro(&class) {
            let ClassKey::Declared(declared) = key else {
                continue;
            };
            let Some((bound, scope)) = self.class_scope(declared.decl) else {
                continue;
            };
            let symbol = bound.binding.lookup_local(scope, name).or_else(|| {
                (access == Access::Instance)
                    .then(|| bound.binding.lookup_instance(scope, name))
                    .flatten()
            });
            if let Some(symbol) = symbol {
                return bound
                    .binding
                    .symbol_declarations(symbol)
                    .iter()
                    .map(|d| d.in_file(bound.file))
                    .collect();
            }
        }
        Vec::new()
    }

    /// Class attribute as seen through `receiver`: methods bind, properties
    /// evaluate to their return type.
    fn bind_attribute(
        &mut self,
        bound: &BoundFile,
        symbol: SymbolId,
        receiver: TypeId,
        access: Access,
    ) -> TypeId {
        let ty = self.symbol_type(bound.file, symbol);
        let Some(shape) = pyz_solver::type_queries::function_shape_of(self.interner, ty) else {
            return ty;
        };
        let decorators = bound
            .binding
            .symbol_declarations(symbol)
            .last()
            .and_then(|&d| bound.binding.declaration(d))
            .filter(|d| d.kind == DeclarationKind::Function)
            .and_then(|d| match bound.arena.data(d.owner) {
                Some(NodeData::FunctionDef { decorators, .. }) => {
                    Some(decorator_names(&bound.arena, decorators))
                }
                _ => None,
            })
            .unwrap_or_default();
        let has = |name: &str| decorators.iter().any(|d| d == name);

        if has("staticmethod") {
            return ty;
        }
        if has("classmethod") {
            let class_object = match access {
                Access::Instance => self.interner.class_object(receiver),
                Access::Class => receiver,
            };
            return self.interner.bound_method(ty, class_object);
        }
        if has("property") {
            return match access {
                Access::Instance => self.function_return(&shape),
                Access::Class => ty,
            };
        }
        match access {
            Access::Instance => self.interner.bound_method(ty, receiver),
            Access::Class => ty,
        }
    }
}
