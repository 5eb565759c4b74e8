use super::*;
use pyz_solver::format_type;

#[test]
fn test_builtin_classes_and_functions_resolve() {
    assert_eq!(lookup_builtin("int"), Some(BuiltinSymbol::Class(BuiltinClass::Int)));
    assert_eq!(
        lookup_builtin("ValueError"),
        Some(BuiltinSymbol::Class(BuiltinClass::ValueError))
    );
    assert!(matches!(
        lookup_builtin("len"),
        Some(BuiltinSymbol::Function(BuiltinFunction { ret: TypeId::INT, .. }))
    ));
    for decorator in ["staticmethod", "classmethod", "property"] {
        assert!(matches!(
            lookup_builtin(decorator),
            Some(BuiltinSymbol::Function(BuiltinFunction { name, .. })) if name == decorator
        ));
    }
    assert_eq!(lookup_builtin("__name__"), Some(BuiltinSymbol::Value(TypeId::STR)));
    assert_eq!(lookup_builtin("None"), None);
    assert_eq!(lookup_builtin("ellipsis"), None);
    assert_eq!(lookup_builtin("undefined_thing"), None);
}

#[test]
fn test_builtin_type_of_class_is_class_object() {
    let interner = TypeInterner::new();
    let ty = builtin_type(&interner, BuiltinSymbol::Class(BuiltinClass::Str));
    assert_eq!(format_type(&interner, ty), "type[str]");
    let print = lookup_builtin("print").expect("print");
    assert_eq!(
        format_type(&interner, builtin_type(&interner, print)),
        "(*values, sep = ..., end = ...) -> None"
    );
}

#[test]
fn test_methods_follow_receiver_arguments() {
    let interner = TypeInterner::new();
    let receiver = interner.dict_of(TypeId::STR, TypeId::INT);
    let get = builtin_method(
        &interner,
        BuiltinClass::Dict,
        &[TypeId::STR, TypeId::INT],
        receiver,
        "get",
    )
    .expect("dict.get");
    assert_eq!(
        format_type(&interner, get),
        "(key, default = ...) -> int | None"
    );
    let items = builtin_method(
        &interner,
        BuiltinClass::Dict,
        &[TypeId::STR, TypeId::INT],
        receiver,
        "items",
    )
    .expect("dict.items");
    assert_eq!(format_type(&interner, items), "() -> list[tuple[str, int]]");
}

#[test]
fn test_methods_walk_builtin_bases() {
    let interner = TypeInterner::new();
    let found = builtin_method(&interner, BuiltinClass::Bool, &[], TypeId::BOOL, "bit_length");
    assert!(found.is_some());
    assert!(builtin_method(&interner, BuiltinClass::Int, &[], TypeId::INT, "upper").is_none());
}
