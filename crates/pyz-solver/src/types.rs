//! Type representation.
//!
//! A type is a `TypeId` into a [`TypeInterner`](crate::TypeInterner).
//! Structurally equal `TypeData` values intern to the same id, so `TypeId`
//! equality is type equality. Intrinsic types are pre-interned at fixed ids.

use pyz_common::ids::{DeclId, FileId};
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const UNKNOWN: TypeId = TypeId(0);
    pub const NEVER: TypeId = TypeId(1);
    pub const ANY: TypeId = TypeId(2);
    pub const NONE: TypeId = TypeId(3);
    pub const OBJECT: TypeId = TypeId(4);
    pub const INT: TypeId = TypeId(5);
    pub const FLOAT: TypeId = TypeId(6);
    pub const COMPLEX: TypeId = TypeId(7);
    pub const STR: TypeId = TypeId(8);
    pub const BYTES: TypeId = TypeId(9);
    pub const BOOL: TypeId = TypeId(10);
    pub const ELLIPSIS: TypeId = TypeId(11);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_USER: u32 = 12;

    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_USER
    }

    pub const fn is_unknown(self) -> bool {
        self.0 == Self::UNKNOWN.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Classes known without any source file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BuiltinClass {
    Object,
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    Bool,
    NoneType,
    Ellipsis,
    List,
    Tuple,
    Dict,
    Set,
    Type,
    Range,
    BaseException,
    Exception,
    ValueError,
    TypeError,
    KeyError,
    IndexError,
    AttributeError,
    RuntimeError,
    NotImplementedError,
}

impl BuiltinClass {
    pub const ALL: [BuiltinClass; 24] = [
        BuiltinClass::Object,
        BuiltinClass::Int,
        BuiltinClass::Float,
        BuiltinClass::Complex,
        BuiltinClass::Str,
        BuiltinClass::Bytes,
        BuiltinClass::Bool,
        BuiltinClass::NoneType,
        BuiltinClass::Ellipsis,
        BuiltinClass::List,
        BuiltinClass::Tuple,
        BuiltinClass::Dict,
        BuiltinClass::Set,
        BuiltinClass::Type,
        BuiltinClass::Range,
        BuiltinClass::BaseException,
        BuiltinClass::Exception,
        BuiltinClass::ValueError,
        BuiltinClass::TypeError,
        BuiltinClass::KeyError,
        BuiltinClass::IndexError,
        BuiltinClass::AttributeError,
        BuiltinClass::RuntimeError,
        BuiltinClass::NotImplementedError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinClass::Object => "object",
            BuiltinClass::Int => "int",
            BuiltinClass::Float => "float",
            BuiltinClass::Complex => "complex",
            BuiltinClass::Str => "str",
            BuiltinClass::Bytes => "bytes",
            BuiltinClass::Bool => "bool",
            BuiltinClass::NoneType => "None",
            BuiltinClass::Ellipsis => "ellipsis",
            BuiltinClass::List => "list",
            BuiltinClass::Tuple => "tuple",
            BuiltinClass::Dict => "dict",
            BuiltinClass::Set => "set",
            BuiltinClass::Type => "type",
            BuiltinClass::Range => "range",
            BuiltinClass::BaseException => "BaseException",
            BuiltinClass::Exception => "Exception",
            BuiltinClass::ValueError => "ValueError",
            BuiltinClass::TypeError => "TypeError",
            BuiltinClass::KeyError => "KeyError",
            BuiltinClass::IndexError => "IndexError",
            BuiltinClass::AttributeError => "AttributeError",
            BuiltinClass::RuntimeError => "RuntimeError",
            BuiltinClass::NotImplementedError => "NotImplementedError",
        }
    }

    /// Number of type arguments the class takes when subscripted;
    /// `None` for a variadic `tuple`. `tuple[T, ...]` is stored as the two
    /// arguments `T` and `ellipsis`.
    pub fn arity(self) -> Option<usize> {
        match self {
            BuiltinClass::List | BuiltinClass::Set | BuiltinClass::Type => Some(1),
            BuiltinClass::Dict => Some(2),
            BuiltinClass::Tuple => None,
            _ => Some(0),
        }
    }

    pub fn from_name(name: &str) -> Option<BuiltinClass> {
        BuiltinClass::ALL.into_iter().find(|c| c.name() == name && *c != BuiltinClass::NoneType)
    }

    /// Direct base class; `None` only for `object`.
    pub fn base(self) -> Option<BuiltinClass> {
        match self {
            BuiltinClass::Object => None,
            BuiltinClass::Bool => Some(BuiltinClass::Int),
            BuiltinClass::Exception => Some(BuiltinClass::BaseException),
            BuiltinClass::ValueError
            | BuiltinClass::TypeError
            | BuiltinClass::AttributeError
            | BuiltinClass::RuntimeError
            | BuiltinClass::KeyError
            | BuiltinClass::IndexError => Some(BuiltinClass::Exception),
            BuiltinClass::NotImplementedError => Some(BuiltinClass::RuntimeError),
            _ => Some(BuiltinClass::Object),
        }
    }
}

/// A class declared in source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclaredClass {
    pub decl: DeclId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ClassKey {
    Builtin(BuiltinClass),
    Declared(DeclaredClass),
}

impl ClassKey {
    pub fn name(&self) -> &str {
        match self {
            ClassKey::Builtin(class) => class.name(),
            ClassKey::Declared(class) => &class.name,
        }
    }

    pub fn builtin(&self) -> Option<BuiltinClass> {
        match self {
            ClassKey::Builtin(class) => Some(*class),
            ClassKey::Declared(_) => None,
        }
    }
}

pub type TypeArgs = SmallVec<[TypeId; 2]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ParamKind {
    Positional,
    VarArgs,
    KeywordOnly,
    KwArgs,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ParamInfo {
    pub name: String,
    pub kind: ParamKind,
    pub ty: TypeId,
    pub has_default: bool,
}

/// Index into the interner's function shape table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FunctionShapeId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionShape {
    pub name: String,
    pub params: Vec<ParamInfo>,
    /// Declared return type. `None` means the return type is inferred from
    /// the body of `decl` on demand.
    pub ret: Option<TypeId>,
    pub decl: Option<DeclId>,
}

impl FunctionShape {
    pub fn positional_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Positional)
            .count()
    }

    pub fn required_positional_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Positional && !p.has_default)
            .count()
    }

    pub fn has_var_args(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VarArgs)
    }

    pub fn has_kw_args(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::KwArgs)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeData {
    Unknown,
    Never,
    Any,
    Instance {
        class: ClassKey,
        args: TypeArgs,
    },
    /// The class object whose instances have type `inner`. Also the value
    /// of type-form expressions such as `list[int]`.
    ClassObject(TypeId),
    Function(FunctionShapeId),
    BoundMethod {
        function: TypeId,
        receiver: TypeId,
    },
    /// Normalized: flat, deduplicated, at least two members.
    Union(Vec<TypeId>),
    Module {
        file: FileId,
        name: String,
    },
    /// Reference to a declaration whose evaluation was still in progress
    /// when this type was built.
    Recursive {
        decl: DeclId,
        name: String,
    },
}
