//! Parse tree node definitions.
//!
//! Nodes live in a flat `NodeArena` and refer to each other by `NodeIndex`.
//! A node never owns analysis results; those are kept in the tree's
//! `AnalysisSideTable`, keyed by `NodeIndex`.

use pyz_common::interner::Atom;
use pyz_common::position::TextSpan;
use serde::Serialize;
use smallvec::SmallVec;

/// Index of a node in its tree's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub type NodeList = Vec<NodeIndex>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mult => "*",
            BinaryOp::MatMult => "@",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
        }
    }

    /// Name of the special method implementing the operator on the left operand.
    pub fn dunder(self) -> &'static str {
        match self {
            BinaryOp::Add => "__add__",
            BinaryOp::Sub => "__sub__",
            BinaryOp::Mult => "__mul__",
            BinaryOp::MatMult => "__matmul__",
            BinaryOp::Div => "__truediv__",
            BinaryOp::FloorDiv => "__floordiv__",
            BinaryOp::Mod => "__mod__",
            BinaryOp::Pow => "__pow__",
            BinaryOp::LShift => "__lshift__",
            BinaryOp::RShift => "__rshift__",
            BinaryOp::BitOr => "__or__",
            BinaryOp::BitXor => "__xor__",
            BinaryOp::BitAnd => "__and__",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Invert => "~",
            UnaryOp::Not => "not",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    True,
    False,
    None,
    Ellipsis,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Normal,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
    /// A bare `*` separating keyword-only parameters.
    KeywordMarker,
    /// A bare `/` ending positional-only parameters.
    PositionalMarker,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Positional,
    Keyword,
    /// `*value`
    Unpack,
    /// `**value`
    UnpackDict,
}

/// The shape of a node. Optional children use `NodeIndex::NONE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Module {
        body: NodeList,
    },

    // Statements
    ExprStmt {
        expr: NodeIndex,
    },
    Assign {
        targets: NodeList,
        value: NodeIndex,
    },
    AnnAssign {
        target: NodeIndex,
        annotation: NodeIndex,
        value: NodeIndex,
    },
    AugAssign {
        target: NodeIndex,
        op: BinaryOp,
        value: NodeIndex,
    },
    Pass,
    Break,
    Continue,
    Return {
        value: NodeIndex,
    },
    Raise {
        exc: NodeIndex,
        cause: NodeIndex,
    },
    Assert {
        test: NodeIndex,
        msg: NodeIndex,
    },
    Del {
        targets: NodeList,
    },
    Global {
        names: NodeList,
    },
    Nonlocal {
        names: NodeList,
    },
    If {
        test: NodeIndex,
        body: NodeList,
        orelse: NodeList,
    },
    While {
        test: NodeIndex,
        body: NodeList,
        orelse: NodeList,
    },
    For {
        target: NodeIndex,
        iter: NodeIndex,
        body: NodeList,
        orelse: NodeList,
    },
    Try {
        body: NodeList,
        handlers: NodeList,
        orelse: NodeList,
        finalbody: NodeList,
    },
    ExceptHandler {
        type_expr: NodeIndex,
        name: NodeIndex,
        body: NodeList,
    },
    With {
        items: NodeList,
        body: NodeList,
    },
    WithItem {
        context: NodeIndex,
        target: NodeIndex,
    },
    FunctionDef {
        decorators: NodeList,
        name: NodeIndex,
        params: NodeList,
        returns: NodeIndex,
        body: NodeList,
    },
    Parameter {
        kind: ParamKind,
        name: NodeIndex,
        annotation: NodeIndex,
        default: NodeIndex,
    },
    ClassDef {
        decorators: NodeList,
        name: NodeIndex,
        bases: NodeList,
        body: NodeList,
    },
    Import {
        names: NodeList,
    },
    ImportFrom {
        /// Dotted module path as `Name` nodes; empty for `from . import x`.
        module: NodeList,
        level: u32,
        names: NodeList,
        is_wildcard: bool,
    },
    ImportAlias {
        /// Dotted path as `Name` nodes.
        path: NodeList,
        asname: NodeIndex,
    },

    // Expressions
    Name {
        id: Atom,
    },
    Constant {
        kind: ConstantKind,
        /// Decoded value of string literals; `None` for other constants.
        value: Option<String>,
    },
    BinOp {
        left: NodeIndex,
        op: BinaryOp,
        right: NodeIndex,
    },
    BoolOp {
        op: BoolOp,
        values: NodeList,
    },
    UnaryOp {
        op: UnaryOp,
        operand: NodeIndex,
    },
    Compare {
        left: NodeIndex,
        ops: Vec<CompareOp>,
        comparators: NodeList,
    },
    Call {
        func: NodeIndex,
        args: NodeList,
    },
    Argument {
        kind: ArgKind,
        name: NodeIndex,
        value: NodeIndex,
    },
    Attribute {
        value: NodeIndex,
        attr: NodeIndex,
    },
    Subscript {
        value: NodeIndex,
        index: NodeIndex,
    },
    Slice {
        lower: NodeIndex,
        upper: NodeIndex,
        step: NodeIndex,
    },
    Tuple {
        elts: NodeList,
    },
    List {
        elts: NodeList,
    },
    Set {
        elts: NodeList,
    },
    Dict {
        /// `NONE` keys mark `**mapping` entries.
        keys: NodeList,
        values: NodeList,
    },
    IfExp {
        test: NodeIndex,
        body: NodeIndex,
        orelse: NodeIndex,
    },
    Lambda {
        params: NodeList,
        body: NodeIndex,
    },
    Starred {
        value: NodeIndex,
    },

    /// Placeholder for input the parser could not make sense of.
    Error,
}

impl NodeData {
    /// Children in source order, skipping absent optional children.
    pub fn children(&self) -> SmallVec<[NodeIndex; 8]> {
        let mut out: SmallVec<[NodeIndex; 8]> = SmallVec::new();
        let mut one = |idx: NodeIndex| {
            if idx.is_some() {
                out.push(idx);
            }
        };
        match self {
            NodeData::Module { body } => body.iter().copied().for_each(&mut one),
            NodeData::ExprStmt { expr } => one(*expr),
            NodeData::Assign { targets, value } => {
                targets.iter().copied().for_each(&mut one);
                one(*value);
            }
            NodeData::AnnAssign {
                target,
                annotation,
                value,
            } => {
                one(*target);
                one(*annotation);
                one(*value);
            }
            NodeData::AugAssign { target, value, .. } => {
                one(*target);
                one(*value);
            }
            NodeData::Pass | NodeData::Break | NodeData::Continue | NodeData::Error => {}
            NodeData::Return { value } => one(*value),
            NodeData::Raise { exc, cause } => {
                one(*exc);
                one(*cause);
            }
            NodeData::Assert { test, msg } => {
                one(*test);
                one(*msg);
            }
            NodeData::Del { targets } => targets.iter().copied().for_each(&mut one),
            NodeData::Global { names } | NodeData::Nonlocal { names } => {
                names.iter().copied().for_each(&mut one)
            }
            NodeData::If { test, body, orelse } | NodeData::While { test, body, orelse } => {
                one(*test);
                body.iter().copied().for_each(&mut one);
                orelse.iter().copied().for_each(&mut one);
            }
            NodeData::For {
                target,
                iter,
                body,
                orelse,
            } => {
                one(*target);
                one(*iter);
                body.iter().copied().for_each(&mut one);
                orelse.iter().copied().for_each(&mut one);
            }
            NodeData::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                for list in [body, handlers, orelse, finalbody] {
                    list.iter().copied().for_each(&mut one);
                }
            }
            NodeData::ExceptHandler {
                type_expr,
                name,
                body,
            } => {
                one(*type_expr);
                one(*name);
                body.iter().copied().for_each(&mut one);
            }
            NodeData::With { items, body } => {
                items.iter().copied().for_each(&mut one);
                body.iter().copied().for_each(&mut one);
            }
            NodeData::WithItem { context, target } => {
                one(*context);
                one(*target);
            }
            NodeData::FunctionDef {
                decorators,
                name,
                params,
                returns,
                body,
                ..
            } => {
                decorators.iter().copied().for_each(&mut one);
                one(*name);
                params.iter().copied().for_each(&mut one);
                one(*returns);
                body.iter().copied().for_each(&mut one);
            }
            NodeData::Parameter {
                name,
                annotation,
                default,
                ..
            } => {
                one(*name);
                one(*annotation);
                one(*default);
            }
            NodeData::ClassDef {
                decorators,
                name,
                bases,
                body,
            } => {
                decorators.iter().copied().for_each(&mut one);
                one(*name);
                bases.iter().copied().for_each(&mut one);
                body.iter().copied().for_each(&mut one);
            }
            NodeData::Import { names } => names.iter().copied().for_each(&mut one),
            NodeData::ImportFrom { module, names, .. } => {
                module.iter().copied().for_each(&mut one);
                names.iter().copied().for_each(&mut one);
            }
            NodeData::ImportAlias { path, asname } => {
                path.iter().copied().for_each(&mut one);
                one(*asname);
            }
            NodeData::Name { .. } | NodeData::Constant { .. } => {}
            NodeData::BinOp { left, right, .. } => {
                one(*left);
                one(*right);
            }
            NodeData::BoolOp { values, .. } => values.iter().copied().for_each(&mut one),
            NodeData::UnaryOp { operand, .. } => one(*operand),
            NodeData::Compare {
                left, comparators, ..
            } => {
                one(*left);
                comparators.iter().copied().for_each(&mut one);
            }
            NodeData::Call { func, args } => {
                one(*func);
                args.iter().copied().for_each(&mut one);
            }
            NodeData::Argument { name, value, .. } => {
                one(*name);
                one(*value);
            }
            NodeData::Attribute { value, attr } => {
                one(*value);
                one(*attr);
            }
            NodeData::Subscript { value, index } => {
                one(*value);
                one(*index);
            }
            NodeData::Slice { lower, upper, step } => {
                one(*lower);
                one(*upper);
                one(*step);
            }
            NodeData::Tuple { elts } | NodeData::List { elts } | NodeData::Set { elts } => {
                elts.iter().copied().for_each(&mut one)
            }
            NodeData::Dict { keys, values } => {
                for (key, value) in keys.iter().zip(values.iter()) {
                    one(*key);
                    one(*value);
                }
            }
            NodeData::IfExp { test, body, orelse } => {
                one(*body);
                one(*test);
                one(*orelse);
            }
            NodeData::Lambda { params, body } => {
                params.iter().copied().for_each(&mut one);
                one(*body);
            }
            NodeData::Starred { value } => one(*value),
        }
        out
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeData::ExprStmt { .. }
                | NodeData::Assign { .. }
                | NodeData::AnnAssign { .. }
                | NodeData::AugAssign { .. }
                | NodeData::Pass
                | NodeData::Break
                | NodeData::Continue
                | NodeData::Return { .. }
                | NodeData::Raise { .. }
                | NodeData::Assert { .. }
                | NodeData::Del { .. }
                | NodeData::Global { .. }
                | NodeData::Nonlocal { .. }
                | NodeData::If { .. }
                | NodeData::While { .. }
                | NodeData::For { .. }
                | NodeData::Try { .. }
                | NodeData::With { .. }
                | NodeData::FunctionDef { .. }
                | NodeData::ClassDef { .. }
                | NodeData::Import { .. }
                | NodeData::ImportFrom { .. }
        )
    }

    /// Short kind name used in logs and the CLI's tree dump.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeData::Module { .. } => "Module",
            NodeData::ExprStmt { .. } => "ExprStmt",
            NodeData::Assign { .. } => "Assign",
            NodeData::AnnAssign { .. } => "AnnAssign",
            NodeData::AugAssign { .. } => "AugAssign",
            NodeData::Pass => "Pass",
            NodeData::Break => "Break",
            NodeData::Continue => "Continue",
            NodeData::Return { .. } => "Return",
            NodeData::Raise { .. } => "Raise",
            NodeData::Assert { .. } => "Assert",
            NodeData::Del { .. } => "Del",
            NodeData::Global { .. } => "Global",
            NodeData::Nonlocal { .. } => "Nonlocal",
            NodeData::If { .. } => "If",
            NodeData::While { .. } => "While",
            NodeData::For { .. } => "For",
            NodeData::Try { .. } => "Try",
            NodeData::ExceptHandler { .. } => "ExceptHandler",
            NodeData::With { .. } => "With",
            NodeData::WithItem { .. } => "WithItem",
            NodeData::FunctionDef { .. } => "FunctionDef",
            NodeData::Parameter { .. } => "Parameter",
            NodeData::ClassDef { .. } => "ClassDef",
            NodeData::Import { .. } => "Import",
            NodeData::ImportFrom { .. } => "ImportFrom",
            NodeData::ImportAlias { .. } => "ImportAlias",
            NodeData::Name { .. } => "Name",
            NodeData::Constant { .. } => "Constant",
            NodeData::BinOp { .. } => "BinOp",
            NodeData::BoolOp { .. } => "BoolOp",
            NodeData::UnaryOp { .. } => "UnaryOp",
            NodeData::Compare { .. } => "Compare",
            NodeData::Call { .. } => "Call",
            NodeData::Argument { .. } => "Argument",
            NodeData::Attribute { .. } => "Attribute",
            NodeData::Subscript { .. } => "Subscript",
            NodeData::Slice { .. } => "Slice",
            NodeData::Tuple { .. } => "Tuple",
            NodeData::List { .. } => "List",
            NodeData::Set { .. } => "Set",
            NodeData::Dict { .. } => "Dict",
            NodeData::IfExp { .. } => "IfExp",
            NodeData::Lambda { .. } => "Lambda",
            NodeData::Starred { .. } => "Starred",
            NodeData::Error => "Error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub data: NodeData,
    pub span: TextSpan,
    /// `NONE` for the module root.
    pub parent: NodeIndex,
}
