use super::*;

#[test]
fn test_numeric_tower() {
    let interner = TypeInterner::new();
    let op = |op, l, r| binary_op_type(&interner, op, l, r);
    assert_eq!(op(BinaryOp::Add, TypeId::INT, TypeId::INT), Some(TypeId::INT));
    assert_eq!(op(BinaryOp::Add, TypeId::INT, TypeId::FLOAT), Some(TypeId::FLOAT));
    assert_eq!(op(BinaryOp::Div, TypeId::INT, TypeId::INT), Some(TypeId::FLOAT));
    assert_eq!(op(BinaryOp::Mult, TypeId::BOOL, TypeId::BOOL), Some(TypeId::INT));
    assert_eq!(op(BinaryOp::BitAnd, TypeId::BOOL, TypeId::BOOL), Some(TypeId::BOOL));
    assert_eq!(op(BinaryOp::LShift, TypeId::FLOAT, TypeId::INT), None);
    assert_eq!(op(BinaryOp::Sub, TypeId::COMPLEX, TypeId::INT), Some(TypeId::COMPLEX));
}

#[test]
fn test_sequences() {
    let interner = TypeInterner::new();
    assert_eq!(
        binary_op_type(&interner, BinaryOp::Add, TypeId::STR, TypeId::STR),
        Some(TypeId::STR)
    );
    assert_eq!(
        binary_op_type(&interner, BinaryOp::Mult, TypeId::STR, TypeId::INT),
        Some(TypeId::STR)
    );
    assert_eq!(
        binary_op_type(&interner, BinaryOp::Add, TypeId::STR, TypeId::INT),
        None
    );
    let ints = interner.list_of(TypeId::INT);
    let strs = interner.list_of(TypeId::STR);
    let joined = binary_op_type(&interner, BinaryOp::Add, ints, strs);
    assert_eq!(
        joined,
        Some(interner.list_of(interner.union([TypeId::INT, TypeId::STR])))
    );
    let left = interner.tuple_of(&[TypeId::INT]);
    let right = interner.tuple_of(&[TypeId::STR]);
    assert_eq!(
        binary_op_type(&interner, BinaryOp::Add, left, right),
        Some(interner.tuple_of(&[TypeId::INT, TypeId::STR]))
    );
}

#[test]
fn test_unknown_propagates_and_unions_distribute() {
    let interner = TypeInterner::new();
    assert_eq!(
        binary_op_type(&interner, BinaryOp::Add, TypeId::UNKNOWN, TypeId::STR),
        Some(TypeId::UNKNOWN)
    );
    let num = interner.union([TypeId::INT, TypeId::FLOAT]);
    assert_eq!(
        binary_op_type(&interner, BinaryOp::Add, num, TypeId::INT),
        Some(num)
    );
    let mixed = interner.union([TypeId::INT, TypeId::STR]);
    assert_eq!(binary_op_type(&interner, BinaryOp::Add, mixed, TypeId::INT), None);
}

#[test]
fn test_type_form_union() {
    let interner = TypeInterner::new();
    let int_class = interner.class_object(TypeId::INT);
    let form = binary_op_type(&interner, BinaryOp::BitOr, int_class, TypeId::NONE);
    assert_eq!(
        form,
        Some(interner.class_object(interner.union([TypeId::INT, TypeId::NONE])))
    );
}

#[test]
fn test_unary_ops() {
    let interner = TypeInterner::new();
    assert_eq!(unary_op_type(&interner, UnaryOp::Not, TypeId::STR), Some(TypeId::BOOL));
    assert_eq!(unary_op_type(&interner, UnaryOp::Neg, TypeId::BOOL), Some(TypeId::INT));
    assert_eq!(unary_op_type(&interner, UnaryOp::Neg, TypeId::FLOAT), Some(TypeId::FLOAT));
    assert_eq!(unary_op_type(&interner, UnaryOp::Invert, TypeId::FLOAT), None);
    assert_eq!(unary_op_type(&interner, UnaryOp::Neg, TypeId::STR), None);
}
