//! The implicit builtins scope.
//!
//! Names that resolve in no scope of the file fall back to this table
//! before they are reported as undefined.

use once_cell::sync::Lazy;
use pyz_solver::{BuiltinClass, FunctionShape, ParamInfo, ParamKind, TypeId, TypeInterner};
use rustc_hash::FxHashMap;

type Params = &'static [(&'static str, ParamKind, bool)];

/// A builtin function with a fixed return type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuiltinFunction {
    pub name: &'static str,
    /// Name, kind and whether the parameter has a default. Parameter types
    /// are unchecked.
    pub params: Params,
    pub ret: TypeId,
}

impl BuiltinFunction {
    pub fn to_type(self, interner: &TypeInterner) -> TypeId {
        interner.function(shape(self.name, self.params, self.ret))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuiltinSymbol {
    Class(BuiltinClass),
    Function(BuiltinFunction),
    /// A value every module sees, such as `__name__`.
    Value(TypeId),
}

const OBJ: Params = &[("obj", ParamKind::Positional, false)];
const FUNCTION: Params = &[("function", ParamKind::Positional, false)];

const FUNCTIONS: &[BuiltinFunction] = &[
    BuiltinFunction {
        name: "len",
        params: OBJ,
        ret: TypeId::INT,
    },
    BuiltinFunction {
        name: "print",
        params: &[
            ("values", ParamKind::VarArgs, false),
            ("sep", ParamKind::KeywordOnly, true),
            ("end", ParamKind::KeywordOnly, true),
        ],
        ret: TypeId::NONE,
    },
    BuiltinFunction {
        name: "isinstance",
        params: &[
            ("obj", ParamKind::Positional, false),
            ("class_or_tuple", ParamKind::Positional, false),
        ],
        ret: TypeId::BOOL,
    },
    BuiltinFunction {
        name: "issubclass",
        params: &[
            ("cls", ParamKind::Positional, false),
            ("class_or_tuple", ParamKind::Positional, false),
        ],
        ret: TypeId::BOOL,
    },
    BuiltinFunction {
        name: "callable",
        params: OBJ,
        ret: TypeId::BOOL,
    },
    BuiltinFunction {
        name: "repr",
        params: OBJ,
        ret: TypeId::STR,
    },
    BuiltinFunction {
        name: "hash",
        params: OBJ,
        ret: TypeId::INT,
    },
    BuiltinFunction {
        name: "id",
        params: OBJ,
        ret: TypeId::INT,
    },
    BuiltinFunction {
        name: "chr",
        params: &[("i", ParamKind::Positional, false)],
        ret: TypeId::STR,
    },
    BuiltinFunction {
        name: "ord",
        params: &[("c", ParamKind::Positional, false)],
        ret: TypeId::INT,
    },
    BuiltinFunction {
        name: "input",
        params: &[("prompt", ParamKind::Positional, true)],
        ret: TypeId::STR,
    },
    BuiltinFunction {
        name: "staticmethod",
        params: FUNCTION,
        ret: TypeId::UNKNOWN,
    },
    BuiltinFunction {
        name: "classmethod",
        params: FUNCTION,
        ret: TypeId::UNKNOWN,
    },
    BuiltinFunction {
        name: "property",
        params: FUNCTION,
        ret: TypeId::UNKNOWN,
    },
    BuiltinFunction {
        name: "abs",
        params: &[("x", ParamKind::Positional, false)],
        ret: TypeId::UNKNOWN,
    },
];

static BUILTINS: Lazy<FxHashMap<&'static str, BuiltinSymbol>> = Lazy::new(|| {
    let mut table = FxHashMap::default();
    for class in BuiltinClass::ALL {
        if matches!(class, BuiltinClass::NoneType | BuiltinClass::Ellipsis) {
            continue;
        }
        table.insert(class.name(), BuiltinSymbol::Class(class));
    }
    for function in FUNCTIONS {
        table.insert(function.name, BuiltinSymbol::Function(*function));
    }
    table.insert("__name__", BuiltinSymbol::Value(TypeId::STR));
    table.insert("__file__", BuiltinSymbol::Value(TypeId::STR));
    table.insert("__doc__", BuiltinSymbol::Value(TypeId::STR));
    table.insert("Ellipsis", BuiltinSymbol::Value(TypeId::ELLIPSIS));
    table
});

pub fn lookup_builtin(name: &str) -> Option<BuiltinSymbol> {
    BUILTINS.get(name).copied()
}

/// Type of a builtin name.
pub fn builtin_type(interner: &TypeInterner, symbol: BuiltinSymbol) -> TypeId {
    match symbol {
        BuiltinSymbol::Class(class) => {
            interner.class_object(interner.builtin_instance(class, Default::default()))
        }
        BuiltinSymbol::Function(function) => function.to_type(interner),
        BuiltinSymbol::Value(ty) => ty,
    }
}

// =============================================================================
// Methods of builtin classes
// =============================================================================

/// Return type of a builtin method, in terms of the receiver.
#[derive(Copy, Clone, Debug)]
enum Returns {
    Fixed(TypeId),
    /// The receiver's n-th type argument.
    Arg(usize),
    /// The receiver's n-th type argument or `None`.
    OptionalArg(usize),
    /// `list` of the receiver's n-th type argument.
    ListOfArg(usize),
    /// `list[tuple[K, V]]` of a `dict[K, V]` receiver.
    Items,
    Receiver,
    StrList,
}

struct BuiltinMethod {
    class: BuiltinClass,
    name: &'static str,
    params: Params,
    returns: Returns,
}

const fn method(
    class: BuiltinClass,
    name: &'static str,
    params: Params,
    returns: Returns,
) -> BuiltinMethod {
    BuiltinMethod {
        class,
        name,
        params,
        returns,
    }
}

const NONE: Params = &[];
const ITEM: Params = &[("item", ParamKind::Positional, false)];
const STR_ARG: Params = &[("text", ParamKind::Positional, false)];

static METHODS: &[BuiltinMethod] = &[
    method(BuiltinClass::Str, "upper", NONE, Returns::Fixed(TypeId::STR)),
    method(BuiltinClass::Str, "lower", NONE, Returns::Fixed(TypeId::STR)),
    method(BuiltinClass::Str, "strip", NONE, Returns::Fixed(TypeId::STR)),
    method(BuiltinClass::Str, "lstrip", NONE, Returns::Fixed(TypeId::STR)),
    method(BuiltinClass::Str, "rstrip", NONE, Returns::Fixed(TypeId::STR)),
    method(BuiltinClass::Str, "title", NONE, Returns::Fixed(TypeId::STR)),
    method(
        BuiltinClass::Str,
        "replace",
        &[
            ("old", ParamKind::Positional, false),
            ("new", ParamKind::Positional, false),
        ],
        Returns::Fixed(TypeId::STR),
    ),
    method(
        BuiltinClass::Str,
        "format",
        &[
            ("args", ParamKind::VarArgs, false),
            ("kwargs", ParamKind::KwArgs, false),
        ],
        Returns::Fixed(TypeId::STR),
    ),
    method(
        BuiltinClass::Str,
        "split",
        &[("sep", ParamKind::Positional, true)],
        Returns::StrList,
    ),
    method(
        BuiltinClass::Str,
        "join",
        &[("iterable", ParamKind::Positional, false)],
        Returns::Fixed(TypeId::STR),
    ),
    method(BuiltinClass::Str, "startswith", STR_ARG, Returns::Fixed(TypeId::BOOL)),
    method(BuiltinClass::Str, "endswith", STR_ARG, Returns::Fixed(TypeId::BOOL)),
    method(BuiltinClass::Str, "isdigit", NONE, Returns::Fixed(TypeId::BOOL)),
    method(BuiltinClass::Str, "find", STR_ARG, Returns::Fixed(TypeId::INT)),
    method(BuiltinClass::Str, "count", STR_ARG, Returns::Fixed(TypeId::INT)),
    method(BuiltinClass::Str, "encode", NONE, Returns::Fixed(TypeId::BYTES)),
    method(BuiltinClass::Bytes, "decode", NONE, Returns::Fixed(TypeId::STR)),
    method(BuiltinClass::Int, "bit_length", NONE, Returns::Fixed(TypeId::INT)),
    method(BuiltinClass::Float, "is_integer", NONE, Returns::Fixed(TypeId::BOOL)),
    method(BuiltinClass::List, "append", ITEM, Returns::Fixed(TypeId::NONE)),
    method(
        BuiltinClass::List,
        "extend",
        &[("iterable", ParamKind::Positional, false)],
        Returns::Fixed(TypeId::NONE),
    ),
    method(
        BuiltinClass::List,
        "insert",
        &[
            ("index", ParamKind::Positional, false),
            ("item", ParamKind::Positional, false),
        ],
        Returns::Fixed(TypeId::NONE),
    ),
    method(
        BuiltinClass::List,
        "pop",
        &[("index", ParamKind::Positional, true)],
        Returns::Arg(0),
    ),
    method(BuiltinClass::List, "remove", ITEM, Returns::Fixed(TypeId::NONE)),
    method(BuiltinClass::List, "index", ITEM, Returns::Fixed(TypeId::INT)),
    method(BuiltinClass::List, "count", ITEM, Returns::Fixed(TypeId::INT)),
    method(BuiltinClass::List, "sort", NONE, Returns::Fixed(TypeId::NONE)),
    method(BuiltinClass::List, "reverse", NONE, Returns::Fixed(TypeId::NONE)),
    method(BuiltinClass::List, "clear", NONE, Returns::Fixed(TypeId::NONE)),
    method(BuiltinClass::List, "copy", NONE, Returns::Receiver),
    method(
        BuiltinClass::Dict,
        "get",
        &[
            ("key", ParamKind::Positional, false),
            ("default", ParamKind::Positional, true),
        ],
        Returns::OptionalArg(1),
    ),
    method(BuiltinClass::Dict, "keys", NONE, Returns::ListOfArg(0)),
    method(BuiltinClass::Dict, "values", NONE, Returns::ListOfArg(1)),
    method(BuiltinClass::Dict, "items", NONE, Returns::Items),
    method(
        BuiltinClass::Dict,
        "pop",
        &[("key", ParamKind::Positional, false)],
        Returns::Arg(1),
    ),
    method(
        BuiltinClass::Dict,
        "setdefault",
        &[
            ("key", ParamKind::Positional, false),
            ("default", ParamKind::Positional, true),
        ],
        Returns::Arg(1),
    ),
    method(
        BuiltinClass::Dict,
        "update",
        &[("other", ParamKind::Positional, false)],
        Returns::Fixed(TypeId::NONE),
    ),
    method(BuiltinClass::Dict, "clear", NONE, Returns::Fixed(TypeId::NONE)),
    method(BuiltinClass::Dict, "copy", NONE, Returns::Receiver),
    method(BuiltinClass::Set, "add", ITEM, Returns::Fixed(TypeId::NONE)),
    method(BuiltinClass::Set, "remove", ITEM, Returns::Fixed(TypeId::NONE)),
    method(BuiltinClass::Set, "discard", ITEM, Returns::Fixed(TypeId::NONE)),
    method(
        BuiltinClass::Set,
        "union",
        &[("other", ParamKind::Positional, false)],
        Returns::Receiver,
    ),
    method(BuiltinClass::Set, "copy", NONE, Returns::Receiver),
];

/// Look up `name` on an instance of a builtin class, walking its bases.
///
/// The result is a function type without the receiver parameter.
pub fn builtin_method(
    interner: &TypeInterner,
    class: BuiltinClass,
    args: &[TypeId],
    receiver: TypeId,
    name: &str,
) -> Option<TypeId> {
    let mut current = Some(class);
    while let Some(class) = current {
        if let Some(found) = METHODS.iter().find(|m| m.class == class && m.name == name) {
            let ret = method_return(interner, found.returns, args, receiver);
            return Some(interner.function(shape(found.name, found.params, ret)));
        }
        current = class.base();
    }
    None
}

fn method_return(
    interner: &TypeInterner,
    returns: Returns,
    args: &[TypeId],
    receiver: TypeId,
) -> TypeId {
    let arg = |n: usize| args.get(n).copied().unwrap_or(TypeId::UNKNOWN);
    match returns {
        Returns::Fixed(ty) => ty,
        Returns::Arg(n) => arg(n),
        Returns::OptionalArg(n) => interner.union2(arg(n), TypeId::NONE),
        Returns::ListOfArg(n) => interner.list_of(arg(n)),
        Returns::Items => interner.list_of(interner.tuple_of(&[arg(0), arg(1)])),
        Returns::Receiver => receiver,
        Returns::StrList => interner.list_of(TypeId::STR),
    }
}

fn shape(name: &str, params: Params, ret: TypeId) -> FunctionShape {
    FunctionShape {
        name: name.to_string(),
        params: params
            .iter()
            .map(|&(name, kind, has_default)| ParamInfo {
                name: name.to_string(),
                kind,
                ty: TypeId::UNKNOWN,
                has_default,
            })
            .collect(),
        ret: Some(ret),
        decl: None,
    }
}

#[cfg(test)]
#[path = "../tests/builtins_tests.rs"]
mod builtins_tests;
