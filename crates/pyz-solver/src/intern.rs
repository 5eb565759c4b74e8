//! Structural type interning.
//!
//! The interner is append-only and shareable (`&self` everywhere), so the
//! evaluator can hand out `TypeId`s while it holds other borrows. A program
//! creates a fresh interner on every generation bump.

use crate::types::{
    BuiltinClass, ClassKey, DeclaredClass, FunctionShape, FunctionShapeId, TypeArgs, TypeData,
    TypeId,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use pyz_common::ids::{DeclId, FileId};
use pyz_common::limits::MAX_UNION_MEMBERS;
use rustc_hash::FxBuildHasher;
use smallvec::smallvec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::trace;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

pub struct TypeInterner {
    instance_id: u64,
    by_data: DashMap<TypeData, TypeId, FxBuildHasher>,
    by_id: DashMap<TypeId, TypeData, FxBuildHasher>,
    next_id: AtomicU32,
    shapes: DashMap<FunctionShapeId, Arc<FunctionShape>, FxBuildHasher>,
    shape_ids: DashMap<Arc<FunctionShape>, FunctionShapeId, FxBuildHasher>,
    next_shape: AtomicU32,
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = TypeInterner {
            instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst),
            by_data: DashMap::with_hasher(FxBuildHasher),
            by_id: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU32::new(0),
            shapes: DashMap::with_hasher(FxBuildHasher),
            shape_ids: DashMap::with_hasher(FxBuildHasher),
            next_shape: AtomicU32::new(0),
        };
        let builtin = |class| TypeData::Instance {
            class: ClassKey::Builtin(class),
            args: TypeArgs::new(),
        };
        // order must match the TypeId constants
        let intrinsics = [
            TypeData::Unknown,
            TypeData::Never,
            TypeData::Any,
            builtin(BuiltinClass::NoneType),
            builtin(BuiltinClass::Object),
            builtin(BuiltinClass::Int),
            builtin(BuiltinClass::Float),
            builtin(BuiltinClass::Complex),
            builtin(BuiltinClass::Str),
            builtin(BuiltinClass::Bytes),
            builtin(BuiltinClass::Bool),
            builtin(BuiltinClass::Ellipsis),
        ];
        for data in intrinsics {
            interner.intern(data);
        }
        debug_assert_eq!(interner.len() as u32, TypeId::FIRST_USER);
        trace!(instance_id = interner.instance_id, "TypeInterner::new");
        interner
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(existing) = self.by_data.get(&data) {
            return *existing;
        }
        match self.by_data.entry(data) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = TypeId(self.next_id.fetch_add(1, Ordering::SeqCst));
                self.by_id.insert(id, entry.key().clone());
                entry.insert(id);
                id
            }
        }
    }

    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.by_id.get(&id).map(|r| r.clone())
    }

    pub fn intern_function_shape(&self, shape: FunctionShape) -> FunctionShapeId {
        let shape = Arc::new(shape);
        if let Some(existing) = self.shape_ids.get(&shape) {
            return *existing;
        }
        match self.shape_ids.entry(shape) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = FunctionShapeId(self.next_shape.fetch_add(1, Ordering::SeqCst));
                self.shapes.insert(id, Arc::clone(entry.key()));
                entry.insert(id);
                id
            }
        }
    }

    pub fn function_shape(&self, id: FunctionShapeId) -> Option<Arc<FunctionShape>> {
        self.shapes.get(&id).map(|r| Arc::clone(&r))
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn instance(&self, class: ClassKey, args: TypeArgs) -> TypeId {
        self.intern(TypeData::Instance { class, args })
    }

    pub fn builtin_instance(&self, class: BuiltinClass, args: TypeArgs) -> TypeId {
        self.instance(ClassKey::Builtin(class), args)
    }

    pub fn declared_instance(&self, decl: DeclId, name: &str) -> TypeId {
        self.instance(
            ClassKey::Declared(DeclaredClass {
                decl,
                name: name.to_string(),
            }),
            TypeArgs::new(),
        )
    }

    pub fn list_of(&self, element: TypeId) -> TypeId {
        self.builtin_instance(BuiltinClass::List, smallvec![element])
    }

    pub fn set_of(&self, element: TypeId) -> TypeId {
        self.builtin_instance(BuiltinClass::Set, smallvec![element])
    }

    pub fn dict_of(&self, key: TypeId, value: TypeId) -> TypeId {
        self.builtin_instance(BuiltinClass::Dict, smallvec![key, value])
    }

    pub fn tuple_of(&self, elements: &[TypeId]) -> TypeId {
        self.builtin_instance(BuiltinClass::Tuple, elements.iter().copied().collect())
    }

    pub fn class_object(&self, instance: TypeId) -> TypeId {
        self.intern(TypeData::ClassObject(instance))
    }

    pub fn function(&self, shape: FunctionShape) -> TypeId {
        let id = self.intern_function_shape(shape);
        self.intern(TypeData::Function(id))
    }

    pub fn bound_method(&self, function: TypeId, receiver: TypeId) -> TypeId {
        self.intern(TypeData::BoundMethod { function, receiver })
    }

    pub fn module(&self, file: FileId, name: &str) -> TypeId {
        self.intern(TypeData::Module {
            file,
            name: name.to_string(),
        })
    }

    pub fn recursive(&self, decl: DeclId, name: &str) -> TypeId {
        self.intern(TypeData::Recursive {
            decl,
            name: name.to_string(),
        })
    }

    // =========================================================================
    // Unions
    // =========================================================================

    /// Build a normalized union.
    ///
    /// Members are flattened and deduplicated in first-seen order. `Never`
    /// members are dropped, an `Unknown` member makes the whole union
    /// `Unknown`, and `Any` absorbs every other member.
    pub fn union(&self, members: impl IntoIterator<Item = TypeId>) -> TypeId {
        let mut flat: Vec<TypeId> = Vec::new();
        let mut saw_any = false;
        for member in members {
            match member {
                TypeId::UNKNOWN => return TypeId::UNKNOWN,
                TypeId::NEVER => continue,
                TypeId::ANY => {
                    saw_any = true;
                    continue;
                }
                _ => {}
            }
            if let Some(TypeData::Union(inner)) = self.lookup(member) {
                for t in inner {
                    if !flat.contains(&t) {
                        flat.push(t);
                    }
                }
            } else if !flat.contains(&member) {
                flat.push(member);
            }
        }
        if saw_any {
            return TypeId::ANY;
        }
        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            n if n > MAX_UNION_MEMBERS => {
                trace!(members = n, "union widened to Unknown");
                TypeId::UNKNOWN
            }
            _ => self.intern(TypeData::Union(flat)),
        }
    }

    pub fn union2(&self, a: TypeId, b: TypeId) -> TypeId {
        if a == b {
            return a;
        }
        self.union([a, b])
    }

    /// Members of a union, or the type itself.
    pub fn union_members(&self, id: TypeId) -> Vec<TypeId> {
        match self.lookup(id) {
            Some(TypeData::Union(members)) => members,
            _ => vec![id],
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInterner")
            .field("instance_id", &self.instance_id)
            .field("types", &self.by_id.len())
            .field("function_shapes", &self.shapes.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod intern_tests;
