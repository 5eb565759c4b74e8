//! Class hierarchy walks and assignability.

use crate::intern::TypeInterner;
use crate::recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{BuiltinClass, ClassKey, DeclaredClass, TypeData, TypeId};
use tracing::trace;

/// Source of base classes for classes declared in source files.
///
/// The solver knows the builtin hierarchy itself; the evaluator implements
/// this for declared classes.
pub trait ClassHierarchy {
    /// Direct bases of `class`, left to right. An empty list means `object`.
    fn declared_bases(&self, class: &DeclaredClass) -> Vec<ClassKey>;
}

/// Hierarchy with no declared classes beyond `object` as the implicit base.
pub struct BuiltinHierarchy;

impl ClassHierarchy for BuiltinHierarchy {
    fn declared_bases(&self, _class: &DeclaredClass) -> Vec<ClassKey> {
        Vec::new()
    }
}

fn direct_bases(hierarchy: &dyn ClassHierarchy, class: &ClassKey) -> Vec<ClassKey> {
    match class {
        ClassKey::Builtin(builtin) => builtin.base().map(ClassKey::Builtin).into_iter().collect(),
        ClassKey::Declared(declared) => {
            let bases = hierarchy.declared_bases(declared);
            if bases.is_empty() {
                vec![ClassKey::Builtin(BuiltinClass::Object)]
            } else {
                bases
            }
        }
    }
}

/// Method resolution order: depth-first, left to right, first occurrence
/// wins, `object` last.
pub fn mro(hierarchy: &dyn ClassHierarchy, class: &ClassKey) -> Vec<ClassKey> {
    let mut order = Vec::new();
    let mut depth = DepthCounter::with_profile(RecursionProfile::MroWalk);
    collect_mro(hierarchy, class, &mut order, &mut depth);
    let object = ClassKey::Builtin(BuiltinClass::Object);
    order.retain(|c| *c != object);
    order.push(object);
    order
}

fn collect_mro(
    hierarchy: &dyn ClassHierarchy,
    class: &ClassKey,
    order: &mut Vec<ClassKey>,
    depth: &mut DepthCounter,
) {
    if order.contains(class) || !depth.enter() {
        return;
    }
    order.push(class.clone());
    for base in direct_bases(hierarchy, class) {
        collect_mro(hierarchy, &base, order, depth);
    }
    depth.leave();
}

pub fn is_subclass(hierarchy: &dyn ClassHierarchy, sub: &ClassKey, sup: &ClassKey) -> bool {
    sub == sup || mro(hierarchy, sub).contains(sup)
}

/// Implicit numeric promotion: `int` is accepted where `float` or `complex`
/// is expected, `float` where `complex` is.
fn promotes(source: BuiltinClass, target: BuiltinClass) -> bool {
    matches!(
        (source, target),
        (BuiltinClass::Int, BuiltinClass::Float)
            | (BuiltinClass::Int, BuiltinClass::Complex)
            | (BuiltinClass::Float, BuiltinClass::Complex)
            | (BuiltinClass::Bool, BuiltinClass::Float)
            | (BuiltinClass::Bool, BuiltinClass::Complex)
    )
}

pub struct AssignabilityChecker<'a> {
    interner: &'a TypeInterner,
    hierarchy: &'a dyn ClassHierarchy,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> AssignabilityChecker<'a> {
    pub fn new(interner: &'a TypeInterner, hierarchy: &'a dyn ClassHierarchy) -> Self {
        AssignabilityChecker {
            interner,
            hierarchy,
            guard: RecursionGuard::with_profile(RecursionProfile::Assignability),
        }
    }

    /// Whether a value of type `source` may be used where `target` is
    /// expected. `Unknown` and `Any` are compatible in both directions.
    pub fn is_assignable(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target
            || matches!(source, TypeId::UNKNOWN | TypeId::ANY | TypeId::NEVER)
            || matches!(target, TypeId::UNKNOWN | TypeId::ANY | TypeId::OBJECT)
        {
            return true;
        }
        match self.guard.enter((source, target)) {
            RecursionResult::Entered => {
                let result = self.check(source, target);
                self.guard.leave((source, target));
                result
            }
            // assume compatible while the pair is being compared
            RecursionResult::Cycle => true,
            RecursionResult::DepthExceeded => {
                trace!(%source, %target, "assignability depth exceeded");
                false
            }
        }
    }

    fn check(&mut self, source: TypeId, target: TypeId) -> bool {
        let (Some(source_data), Some(target_data)) =
            (self.interner.lookup(source), self.interner.lookup(target))
        else {
            return false;
        };
        if matches!(source_data, TypeData::Recursive { .. })
            || matches!(target_data, TypeData::Recursive { .. })
        {
            return true;
        }
        if let TypeData::Union(members) = &source_data {
            return members.iter().all(|&m| self.is_assignable(m, target));
        }
        if let TypeData::Union(members) = &target_data {
            return members.iter().any(|&m| self.is_assignable(source, m));
        }

        match (&source_data, &target_data) {
            (
                TypeData::Instance {
                    class: source_class,
                    args: source_args,
                },
                TypeData::Instance {
                    class: target_class,
                    args: target_args,
                },
            ) => {
                if let (Some(s), Some(t)) = (source_class.builtin(), target_class.builtin())
                    && promotes(s, t)
                {
                    return true;
                }
                if !is_subclass(self.hierarchy, source_class, target_class) {
                    return false;
                }
                if target_args.is_empty() || source_class != target_class {
                    return true;
                }
                if source_class.builtin() == Some(BuiltinClass::Tuple) {
                    return self.tuple_assignable(source_args, target_args);
                }
                source_args
                    .iter()
                    .zip(target_args.iter())
                    .all(|(&s, &t)| self.is_assignable(s, t))
            }
            (TypeData::ClassObject(inner_source), TypeData::ClassObject(inner_target)) => {
                self.is_assignable(*inner_source, *inner_target)
            }
            (TypeData::ClassObject(inner), TypeData::Instance { class, args })
                if class.builtin() == Some(BuiltinClass::Type) =>
            {
                args.first()
                    .is_none_or(|&expected| self.is_assignable(*inner, expected))
            }
            (
                TypeData::Function(_) | TypeData::BoundMethod { .. } | TypeData::ClassObject(_),
                TypeData::Function(_) | TypeData::BoundMethod { .. },
            ) => true,
            (TypeData::Module { file: a, .. }, TypeData::Module { file: b, .. }) => a == b,
            _ => false,
        }
    }

    /// `tuple[T, ...]` accepts any fixed tuple whose elements fit `T`.
    fn tuple_assignable(&mut self, source: &[TypeId], target: &[TypeId]) -> bool {
        let variadic = |args: &[TypeId]| args.len() == 2 && args[1] == TypeId::ELLIPSIS;
        match (variadic(source), variadic(target)) {
            (_, true) => source
                .iter()
                .filter(|&&s| s != TypeId::ELLIPSIS)
                .all(|&s| self.is_assignable(s, target[0])),
            (true, false) => false,
            (false, false) => {
                source.len() == target.len()
                    && source
                        .iter()
                        .zip(target.iter())
                        .all(|(&s, &t)| self.is_assignable(s, t))
            }
        }
    }
}

/// One-shot assignability check.
pub fn is_assignable(
    interner: &TypeInterner,
    hierarchy: &dyn ClassHierarchy,
    source: TypeId,
    target: TypeId,
) -> bool {
    AssignabilityChecker::new(interner, hierarchy).is_assignable(source, target)
}

#[cfg(test)]
#[path = "../tests/relation_tests.rs"]
mod relation_tests;
