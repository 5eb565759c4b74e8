//! Small classification helpers over interned types.

use crate::intern::TypeInterner;
use crate::types::{BuiltinClass, ClassKey, DeclaredClass, FunctionShape, TypeData, TypeId};
use pyz_common::ids::{DeclId, FileId};
use std::sync::Arc;

pub fn is_union(interner: &TypeInterner, id: TypeId) -> bool {
    matches!(interner.lookup(id), Some(TypeData::Union(_)))
}

/// Class and type arguments of an instance type.
pub fn instance_parts(interner: &TypeInterner, id: TypeId) -> Option<(ClassKey, Vec<TypeId>)> {
    match interner.lookup(id)? {
        TypeData::Instance { class, args } => Some((class, args.to_vec())),
        _ => None,
    }
}

pub fn builtin_class(interner: &TypeInterner, id: TypeId) -> Option<BuiltinClass> {
    instance_parts(interner, id).and_then(|(class, _)| class.builtin())
}

/// Instance type a class object (or type form) produces.
pub fn class_object_inner(interner: &TypeInterner, id: TypeId) -> Option<TypeId> {
    match interner.lookup(id)? {
        TypeData::ClassObject(inner) => Some(inner),
        _ => None,
    }
}

pub fn function_shape_of(interner: &TypeInterner, id: TypeId) -> Option<Arc<FunctionShape>> {
    match interner.lookup(id)? {
        TypeData::Function(shape) => interner.function_shape(shape),
        _ => None,
    }
}

pub fn module_file(interner: &TypeInterner, id: TypeId) -> Option<FileId> {
    match interner.lookup(id)? {
        TypeData::Module { file, .. } => Some(file),
        _ => None,
    }
}

pub fn recursive_decl(interner: &TypeInterner, id: TypeId) -> Option<DeclId> {
    match interner.lookup(id)? {
        TypeData::Recursive { decl, .. } => Some(decl),
        _ => None,
    }
}

/// Whether `id` mentions `Recursive(decl)` anywhere in its structure.
pub fn references_declaration(interner: &TypeInterner, id: TypeId, decl: DeclId) -> bool {
    let mut stack = vec![id];
    let mut seen = rustc_hash::FxHashSet::default();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        match interner.lookup(current) {
            Some(TypeData::Recursive { decl: d, .. }) if d == decl => return true,
            Some(TypeData::Instance { args, .. }) => stack.extend(args),
            Some(TypeData::ClassObject(inner)) => stack.push(inner),
            Some(TypeData::Union(members)) => stack.extend(members),
            Some(TypeData::BoundMethod { function, receiver }) => {
                stack.push(function);
                stack.push(receiver);
            }
            Some(TypeData::Function(shape)) => {
                if let Some(shape) = interner.function_shape(shape) {
                    stack.extend(shape.params.iter().map(|p| p.ty));
                    stack.extend(shape.ret);
                }
            }
            _ => {}
        }
    }
    false
}

/// Element type produced by iterating a value of type `id`.
///
/// `None` when the type is known not to be iterable.
pub fn iteration_element(interner: &TypeInterner, id: TypeId) -> Option<TypeId> {
    if matches!(id, TypeId::UNKNOWN | TypeId::ANY) {
        return Some(id);
    }
    match interner.lookup(id)? {
        TypeData::Union(members) => {
            let mut elements = Vec::with_capacity(members.len());
            for member in members {
                elements.push(iteration_element(interner, member)?);
            }
            Some(interner.union(elements))
        }
        TypeData::Instance {
            class: ClassKey::Builtin(class),
            args,
        } => match class {
            BuiltinClass::Str => Some(TypeId::STR),
            BuiltinClass::Bytes | BuiltinClass::Range => Some(TypeId::INT),
            BuiltinClass::List | BuiltinClass::Set | BuiltinClass::Dict => {
                Some(args.first().copied().unwrap_or(TypeId::UNKNOWN))
            }
            BuiltinClass::Tuple => Some(
                interner.union(args.iter().copied().filter(|&a| a != TypeId::ELLIPSIS)),
            ),
            _ => None,
        },
        // user classes may define `__iter__`; the evaluator does not model it
        TypeData::Instance { .. } | TypeData::Recursive { .. } => Some(TypeId::UNKNOWN),
        _ => None,
    }
}

/// Every declared class mentioned anywhere in `id`.
pub fn declared_classes(interner: &TypeInterner, id: TypeId) -> Vec<DeclaredClass> {
    let mut out: Vec<DeclaredClass> = Vec::new();
    let mut stack = vec![id];
    let mut seen = rustc_hash::FxHashSet::default();
    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        match interner.lookup(current) {
            Some(TypeData::Instance { class, args }) => {
                if let ClassKey::Declared(declared) = class
                    && !out.contains(&declared)
                {
                    out.push(declared);
                }
                stack.extend(args);
            }
            Some(TypeData::ClassObject(inner)) => stack.push(inner),
            Some(TypeData::Union(members)) => stack.extend(members),
            Some(TypeData::BoundMethod { receiver, .. }) => stack.push(receiver),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/type_queries_tests.rs"]
mod type_queries_tests;
