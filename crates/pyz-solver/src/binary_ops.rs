//! Builtin operator table.
//!
//! Operands that are user-declared classes are handled by the evaluator
//! through their special methods; this table only covers builtin classes.
//! `None` means the combination is unsupported.

use crate::intern::TypeInterner;
use crate::types::{BuiltinClass, ClassKey, TypeData, TypeId};
use pyz_parser::node::{BinaryOp, UnaryOp};
use smallvec::smallvec;

fn builtin_of(interner: &TypeInterner, id: TypeId) -> Option<(BuiltinClass, Vec<TypeId>)> {
    match interner.lookup(id)? {
        TypeData::Instance {
            class: ClassKey::Builtin(class),
            args,
        } => Some((class, args.to_vec())),
        _ => None,
    }
}

/// Numeric tower position: `bool` and `int` share a rank.
fn numeric_rank(class: BuiltinClass) -> Option<u8> {
    match class {
        BuiltinClass::Bool | BuiltinClass::Int => Some(0),
        BuiltinClass::Float => Some(1),
        BuiltinClass::Complex => Some(2),
        _ => None,
    }
}

fn numeric_type(rank: u8) -> TypeId {
    match rank {
        0 => TypeId::INT,
        1 => TypeId::FLOAT,
        _ => TypeId::COMPLEX,
    }
}

/// Result type of `left <op> right`, distributing over unions.
pub fn binary_op_type(
    interner: &TypeInterner,
    op: BinaryOp,
    left: TypeId,
    right: TypeId,
) -> Option<TypeId> {
    if left == TypeId::UNKNOWN || right == TypeId::UNKNOWN {
        return Some(TypeId::UNKNOWN);
    }
    if left == TypeId::ANY || right == TypeId::ANY {
        return Some(TypeId::ANY);
    }
    if op == BinaryOp::BitOr
        && let Some(form) = type_form_union(interner, left, right)
    {
        return Some(form);
    }
    let left_members = interner.union_members(left);
    let right_members = interner.union_members(right);
    if left_members.len() > 1 || right_members.len() > 1 {
        let mut results = Vec::new();
        for &l in &left_members {
            for &r in &right_members {
                results.push(simple_binary_op(interner, op, l, r)?);
            }
        }
        return Some(interner.union(results));
    }
    simple_binary_op(interner, op, left, right)
}

/// `int | None` and `A | B` evaluated on class objects produce a type form.
fn type_form_union(interner: &TypeInterner, left: TypeId, right: TypeId) -> Option<TypeId> {
    let as_form = |id: TypeId| match interner.lookup(id) {
        Some(TypeData::ClassObject(inner)) => Some(inner),
        _ if id == TypeId::NONE => Some(TypeId::NONE),
        _ => None,
    };
    let (l, r) = (as_form(left)?, as_form(right)?);
    if left == TypeId::NONE && right == TypeId::NONE {
        return None;
    }
    Some(interner.class_object(interner.union2(l, r)))
}

fn simple_binary_op(
    interner: &TypeInterner,
    op: BinaryOp,
    left: TypeId,
    right: TypeId,
) -> Option<TypeId> {
    let (lc, largs) = builtin_of(interner, left)?;
    let (rc, rargs) = builtin_of(interner, right)?;

    if let (Some(lr), Some(rr)) = (numeric_rank(lc), numeric_rank(rc)) {
        let rank = lr.max(rr);
        return match op {
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mult
            | BinaryOp::Mod
            | BinaryOp::FloorDiv
            | BinaryOp::Pow => Some(numeric_type(rank)),
            BinaryOp::Div => Some(numeric_type(rank.max(1))),
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
                if lc == BuiltinClass::Bool && rc == BuiltinClass::Bool =>
            {
                Some(TypeId::BOOL)
            }
            BinaryOp::LShift
            | BinaryOp::RShift
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
                if rank == 0 =>
            {
                Some(TypeId::INT)
            }
            _ => None,
        };
    }

    let is_int = |c: BuiltinClass| matches!(c, BuiltinClass::Int | BuiltinClass::Bool);
    match (op, lc, rc) {
        (BinaryOp::Add, BuiltinClass::Str, BuiltinClass::Str) => Some(TypeId::STR),
        (BinaryOp::Mod, BuiltinClass::Str, _) => Some(TypeId::STR),
        (BinaryOp::Mult, BuiltinClass::Str, c) if is_int(c) => Some(TypeId::STR),
        (BinaryOp::Mult, c, BuiltinClass::Str) if is_int(c) => Some(TypeId::STR),
        (BinaryOp::Add, BuiltinClass::Bytes, BuiltinClass::Bytes) => Some(TypeId::BYTES),
        (BinaryOp::Mod, BuiltinClass::Bytes, _) => Some(TypeId::BYTES),
        (BinaryOp::Mult, BuiltinClass::Bytes, c) if is_int(c) => Some(TypeId::BYTES),
        (BinaryOp::Add, BuiltinClass::List, BuiltinClass::List) => {
            let l = largs.first().copied().unwrap_or(TypeId::UNKNOWN);
            let r = rargs.first().copied().unwrap_or(TypeId::UNKNOWN);
            Some(interner.list_of(interner.union2(l, r)))
        }
        (BinaryOp::Mult, BuiltinClass::List, c) if is_int(c) => Some(left),
        (BinaryOp::Mult, c, BuiltinClass::List) if is_int(c) => Some(right),
        (BinaryOp::Add, BuiltinClass::Tuple, BuiltinClass::Tuple) => {
            let mut elements = largs;
            elements.extend(rargs);
            Some(interner.tuple_of(&elements))
        }
        (
            BinaryOp::BitOr | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::Sub,
            BuiltinClass::Set,
            BuiltinClass::Set,
        ) => {
            let l = largs.first().copied().unwrap_or(TypeId::UNKNOWN);
            let r = rargs.first().copied().unwrap_or(TypeId::UNKNOWN);
            let element = if op == BinaryOp::BitOr {
                interner.union2(l, r)
            } else {
                l
            };
            Some(interner.builtin_instance(BuiltinClass::Set, smallvec![element]))
        }
        (BinaryOp::BitOr, BuiltinClass::Dict, BuiltinClass::Dict) => {
            let key = interner.union2(
                largs.first().copied().unwrap_or(TypeId::UNKNOWN),
                rargs.first().copied().unwrap_or(TypeId::UNKNOWN),
            );
            let value = interner.union2(
                largs.get(1).copied().unwrap_or(TypeId::UNKNOWN),
                rargs.get(1).copied().unwrap_or(TypeId::UNKNOWN),
            );
            Some(interner.dict_of(key, value))
        }
        _ => None,
    }
}

/// Result type of a unary operator; `not` always yields `bool`.
pub fn unary_op_type(interner: &TypeInterner, op: UnaryOp, operand: TypeId) -> Option<TypeId> {
    if op == UnaryOp::Not {
        return Some(TypeId::BOOL);
    }
    if operand == TypeId::UNKNOWN || operand == TypeId::ANY {
        return Some(operand);
    }
    let members = interner.union_members(operand);
    let mut results = Vec::with_capacity(members.len());
    for member in members {
        let (class, _) = builtin_of(interner, member)?;
        let rank = numeric_rank(class)?;
        let result = match op {
            UnaryOp::Invert if rank == 0 => TypeId::INT,
            UnaryOp::Invert => return None,
            _ => numeric_type(rank),
        };
        results.push(result);
    }
    Some(interner.union(results))
}

#[cfg(test)]
#[path = "../tests/binary_ops_tests.rs"]
mod binary_ops_tests;
