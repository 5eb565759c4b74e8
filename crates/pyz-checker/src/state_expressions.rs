//! Expression evaluation, type forms and operators.

use crate::builtins::{builtin_type, lookup_builtin};
use crate::state::{EvalKey, TypeEvaluator};
use pyz_common::diagnostics::codes;
use pyz_common::ids::FileId;
use pyz_parser::node::{BinaryOp, ConstantKind, UnaryOp};
use pyz_parser::{NodeData, NodeIndex};
use pyz_solver::binary_ops::{binary_op_type, unary_op_type};
use pyz_solver::type_queries::{class_object_inner, instance_parts, recursive_decl};
use pyz_solver::{BuiltinClass, ClassKey, FunctionShape, ParamInfo, TypeData, TypeId};

impl<'a> TypeEvaluator<'a> {
    /// Type of the expression rooted at `node`.
    pub fn expression_type(&mut self, file: FileId, node: NodeIndex) -> TypeId {
        if node.is_none() {
            return TypeId::UNKNOWN;
        }
        self.memoized(EvalKey::Node(file, node), |this| {
            this.compute_expression_type(file, node)
        })
    }

    /// Type of any node a caller may point at: expressions, declaration
    /// names, and the name parts of attributes and definitions.
    ///
    /// `None` for statements and for names that carry no value of their own
    /// (keyword argument names, module paths in imports).
    pub fn type_of_node(&mut self, file: FileId, node: NodeIndex) -> Option<TypeId> {
        let bound = self.bound(file)?;
        if let Some(decl) = bound.binding.declaration_at(node) {
            return Some(self.declaration_type(decl.in_file(file)));
        }
        let arena = bound.arena.clone();
        let data = arena.data(node)?;
        if data.is_statement() {
            return None;
        }
        match data {
            NodeData::Module { .. }
            | NodeData::ExceptHandler { .. }
            | NodeData::WithItem { .. }
            | NodeData::ImportAlias { .. }
            | NodeData::Parameter { .. } => None,
            NodeData::Name { .. } => {
                let parent = arena.parent(node);
                match arena.data(parent) {
                    Some(NodeData::Attribute { attr, .. }) if *attr == node => {
                        Some(self.expression_type(file, parent))
                    }
                    Some(NodeData::Argument { name, .. }) if *name == node => None,
                    Some(
                        NodeData::ImportAlias { .. }
                        | NodeData::ImportFrom { .. }
                        | NodeData::Global { .. }
                        | NodeData::Nonlocal { .. },
                    ) => None,
                    _ => Some(self.expression_type(file, node)),
                }
            }
            _ => Some(self.expression_type(file, node)),
        }
    }

    fn compute_expression_type(&mut self, file: FileId, node: NodeIndex) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let arena = bound.arena.clone();
        let Some(data) = arena.data(node) else {
            return TypeId::UNKNOWN;
        };
        let interner = self.interner;
        match data {
            NodeData::Name { .. } => match bound.binding.declaration_at(node) {
                Some(decl) => self.declaration_type(decl.in_file(file)),
                None => self.name_type(file, node),
            },
            NodeData::Constant { kind, .. } => constant_type(*kind),
            NodeData::BinOp { left, op, right } => {
                let (op, left, right) = (*op, *left, *right);
                let l = self.expression_type(file, left);
                let r = self.expression_type(file, right);
                self.binary_operation(file, node, op, l, r)
            }
            NodeData::BoolOp { values, .. } => {
                let types: Vec<TypeId> = values
                    .iter()
                    .map(|&v| self.expression_type(file, v))
                    .collect();
                interner.union(types)
            }
            NodeData::UnaryOp { op, operand } => {
                let operand_type = self.expression_type(file, *operand);
                self.unary_operation(*op, operand_type)
            }
            NodeData::Compare {
                left, comparators, ..
            } => {
                self.expression_type(file, *left);
                for &c in comparators {
                    self.expression_type(file, c);
                }
                TypeId::BOOL
            }
            NodeData::Call { func, args } => self.call_type(file, *func, args),
            NodeData::Argument { value, .. } => self.expression_type(file, *value),
            NodeData::Attribute { value, attr } => {
                let object = self.expression_type(file, *value);
                let name = arena.name_text(*attr).unwrap_or_default();
                self.member_access(file, *attr, object, name)
            }
            NodeData::Subscript { value, index } => {
                self.subscript_type(file, node, *value, *index)
            }
            NodeData::Slice { lower, upper, step } => {
                for part in [*lower, *upper, *step] {
                    self.expression_type(file, part);
                }
                TypeId::UNKNOWN
            }
            NodeData::Tuple { elts } => self.tuple_display(file, elts),
            NodeData::List { elts } => {
                let element = self.display_element(file, elts);
                interner.list_of(element)
            }
            NodeData::Set { elts } => {
                let element = self.display_element(file, elts);
                interner.set_of(element)
            }
            NodeData::Dict { keys, values } => self.dict_display(file, keys, values),
            NodeData::IfExp { test, body, orelse } => {
                self.expression_type(file, *test);
                let body = self.expression_type(file, *body);
                let orelse = self.expression_type(file, *orelse);
                interner.union2(body, orelse)
            }
            NodeData::Lambda { params, .. } => {
                let params = self.lambda_parameters(file, params);
                let ret = self.inferred_return_type(file, node);
                interner.function(FunctionShape {
                    name: "lambda".to_string(),
                    params,
                    ret: Some(ret),
                    decl: None,
                })
            }
            NodeData::Starred { value } => self.expression_type(file, *value),
            _ => TypeId::UNKNOWN,
        }
    }

    fn lambda_parameters(&mut self, file: FileId, params: &[NodeIndex]) -> Vec<ParamInfo> {
        let Some(bound) = self.bound(file) else {
            return Vec::new();
        };
        // defaults are evaluated where the lambda is written
        for &param in params {
            if let Some(NodeData::Parameter { default, .. }) = bound.arena.data(param) {
                self.expression_type(file, *default);
            }
        }
        self.parameter_infos(file, &bound.arena, params)
    }

    fn tuple_display(&mut self, file: FileId, elts: &[NodeIndex]) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let mut elements = Vec::with_capacity(elts.len());
        let mut variadic = false;
        for &elt in elts {
            let ty = self.expression_type(file, elt);
            if matches!(bound.arena.data(elt), Some(NodeData::Starred { .. })) {
                variadic = true;
                elements.push(self.element_type(ty));
            } else {
                elements.push(ty);
            }
        }
        if variadic {
            let element = self.interner.union(elements);
            return self.interner.tuple_of(&[element, TypeId::ELLIPSIS]);
        }
        self.interner.tuple_of(&elements)
    }

    /// Union of the elements of a list or set display; `Unknown` when empty.
    fn display_element(&mut self, file: FileId, elts: &[NodeIndex]) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        if elts.is_empty() {
            return TypeId::UNKNOWN;
        }
        let mut types = Vec::with_capacity(elts.len());
        for &elt in elts {
            let ty = self.expression_type(file, elt);
            if matches!(bound.arena.data(elt), Some(NodeData::Starred { .. })) {
                types.push(self.element_type(ty));
            } else {
                types.push(ty);
            }
        }
        self.interner.union(types)
    }

    fn dict_display(&mut self, file: FileId, keys: &[NodeIndex], values: &[NodeIndex]) -> TypeId {
        if values.is_empty() {
            return self.interner.dict_of(TypeId::UNKNOWN, TypeId::UNKNOWN);
        }
        let mut key_types = Vec::with_capacity(keys.len());
        let mut value_types = Vec::with_capacity(values.len());
        for (&key, &value) in keys.iter().zip(values) {
            let value_type = self.expression_type(file, value);
            if key.is_none() {
                // `**mapping`
                match instance_parts(self.interner, value_type) {
                    Some((ClassKey::Builtin(BuiltinClass::Dict), args)) if args.len() == 2 => {
                        key_types.push(args[0]);
                        value_types.push(args[1]);
                    }
                    _ => {
                        key_types.push(TypeId::UNKNOWN);
                        value_types.push(TypeId::UNKNOWN);
                    }
                }
                continue;
            }
            key_types.push(self.expression_type(file, key));
            value_types.push(value_type);
        }
        let key = self.interner.union(key_types);
        let value = self.interner.union(value_types);
        self.interner.dict_of(key, value)
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// `left <op> right`, through special methods for declared classes.
    pub(crate) fn binary_operation(
        &mut self,
        file: FileId,
        node: NodeIndex,
        op: BinaryOp,
        left: TypeId,
        right: TypeId,
    ) -> TypeId {
        if left == TypeId::NEVER || right == TypeId::NEVER {
            return TypeId::NEVER;
        }
        if self.is_placeholder(left) || self.is_placeholder(right) {
            return TypeId::UNKNOWN;
        }
        if self.is_declared_instance(left) {
            if let Some(method) = self.lookup_member(left, op.dunder()) {
                return self.callable_return(method);
            }
        } else if let Some(result) = binary_op_type(self.interner, op, left, right) {
            return result;
        }
        let (l, r) = (self.format(left), self.format(right));
        self.report_at(file, node, codes::UNSUPPORTED_OPERATOR, &[op.symbol(), &l, &r]);
        TypeId::UNKNOWN
    }

    fn unary_operation(&mut self, op: UnaryOp, operand: TypeId) -> TypeId {
        if self.is_placeholder(operand) {
            return if op == UnaryOp::Not {
                TypeId::BOOL
            } else {
                TypeId::UNKNOWN
            };
        }
        if op != UnaryOp::Not && self.is_declared_instance(operand) {
            let dunder = match op {
                UnaryOp::Neg => "__neg__",
                UnaryOp::Pos => "__pos__",
                _ => "__invert__",
            };
            return match self.lookup_member(operand, dunder) {
                Some(method) => self.callable_return(method),
                None => TypeId::UNKNOWN,
            };
        }
        unary_op_type(self.interner, op, operand).unwrap_or(TypeId::UNKNOWN)
    }

    /// A type standing in for a computation still in progress.
    pub(crate) fn is_placeholder(&self, ty: TypeId) -> bool {
        if recursive_decl(self.interner, ty).is_some() {
            return true;
        }
        self.interner
            .union_members(ty)
            .iter()
            .any(|&m| recursive_decl(self.interner, m).is_some())
    }

    // =========================================================================
    // Subscripts and type forms
    // =========================================================================

    fn subscript_type(
        &mut self,
        file: FileId,
        node: NodeIndex,
        value: NodeIndex,
        index: NodeIndex,
    ) -> TypeId {
        let object = self.expression_type(file, value);
        if let Some(inner) = class_object_inner(self.interner, object) {
            return self.specialize(file, node, object, inner, index);
        }
        self.expression_type(file, index);
        let is_slice = self
            .bound(file)
            .is_some_and(|b| matches!(b.arena.data(index), Some(NodeData::Slice { .. })));

        let members = self.interner.union_members(object);
        let mut results = Vec::with_capacity(members.len());
        for member in members {
            match self.subscript_member(member, is_slice) {
                Some(ty) => results.push(ty),
                None => {
                    let text = self.format(object);
                    self.report_at(file, node, codes::NOT_SUBSCRIPTABLE, &[&text]);
                    return TypeId::UNKNOWN;
                }
            }
        }
        self.interner.union(results)
    }

    fn subscript_member(&mut self, object: TypeId, is_slice: bool) -> Option<TypeId> {
        if matches!(object, TypeId::UNKNOWN | TypeId::ANY | TypeId::NEVER) {
            return Some(object);
        }
        match self.interner.lookup(object)? {
            TypeData::Recursive { .. } => Some(TypeId::UNKNOWN),
            TypeData::Instance {
                class: ClassKey::Builtin(class),
                args,
            } => {
                let arg = |n: usize| args.get(n).copied().unwrap_or(TypeId::UNKNOWN);
                match class {
                    BuiltinClass::List if is_slice => Some(object),
                    BuiltinClass::List => Some(arg(0)),
                    BuiltinClass::Tuple if is_slice => {
                        let element = self.element_type(object);
                        Some(self.interner.tuple_of(&[element, TypeId::ELLIPSIS]))
                    }
                    BuiltinClass::Tuple => Some(self.element_type(object)),
                    BuiltinClass::Dict => Some(arg(1)),
                    BuiltinClass::Str => Some(TypeId::STR),
                    BuiltinClass::Bytes if is_slice => Some(TypeId::BYTES),
                    BuiltinClass::Bytes | BuiltinClass::Range => Some(TypeId::INT),
                    _ => None,
                }
            }
            TypeData::Instance { .. } => {
                let method = self.lookup_member(object, "__getitem__")?;
                Some(self.callable_return(method))
            }
            _ => None,
        }
    }

    /// `list[int]`, `dict[str, int]`, `type[A]`: the class object of a
    /// specialized builtin class.
    fn specialize(
        &mut self,
        file: FileId,
        node: NodeIndex,
        object: TypeId,
        inner: TypeId,
        index: NodeIndex,
    ) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let parts: Vec<NodeIndex> = match bound.arena.data(index) {
            Some(NodeData::Tuple { elts }) => elts.to_vec(),
            _ => vec![index],
        };
        let mut args = Vec::with_capacity(parts.len());
        for part in parts {
            let form = self.expression_type(file, part);
            args.push(self.type_form_arg(form));
        }

        let class = match instance_parts(self.interner, inner) {
            Some((ClassKey::Builtin(class), existing)) if existing.is_empty() => class,
            _ => {
                let text = self.format(object);
                self.report_at(file, node, codes::NOT_SUBSCRIPTABLE, &[&text]);
                return TypeId::UNKNOWN;
            }
        };
        let specialized = match class {
            BuiltinClass::Type => {
                let arg = args.first().copied().unwrap_or(TypeId::UNKNOWN);
                self.interner.class_object(arg)
            }
            BuiltinClass::Tuple => self.interner.tuple_of(&args),
            _ => match class.arity() {
                Some(arity) => {
                    args.resize(arity, TypeId::UNKNOWN);
                    self.interner.builtin_instance(class, args.into_iter().collect())
                }
                None => {
                    let text = self.format(object);
                    self.report_at(file, node, codes::NOT_SUBSCRIPTABLE, &[&text]);
                    return TypeId::UNKNOWN;
                }
            },
        };
        self.interner.class_object(specialized)
    }

    /// Instance type denoted by a type-form value.
    fn type_form_arg(&self, form: TypeId) -> TypeId {
        if let Some(inner) = class_object_inner(self.interner, form) {
            return inner;
        }
        match form {
            TypeId::NONE | TypeId::ELLIPSIS | TypeId::UNKNOWN | TypeId::ANY => form,
            _ if recursive_decl(self.interner, form).is_some() => form,
            _ => TypeId::UNKNOWN,
        }
    }

    /// Type denoted by the annotation expression `node`.
    pub(crate) fn annotation_type(&mut self, file: FileId, node: NodeIndex) -> TypeId {
        if node.is_none() {
            return TypeId::UNKNOWN;
        }
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        if let Some(NodeData::Constant {
            kind: ConstantKind::Str,
            value: Some(text),
        }) = bound.arena.data(node)
        {
            return self.forward_reference(file, text.trim());
        }
        let form = self.expression_type(file, node);
        self.type_form_arg(form)
    }

    /// A quoted annotation, resolved against module scope.
    fn forward_reference(&mut self, file: FileId, text: &str) -> TypeId {
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let mut parts = text.split('.');
        let Some(first) = parts.next() else {
            return TypeId::UNKNOWN;
        };
        let mut current = match bound.binding.module_symbol(first) {
            Some(symbol) => self.symbol_type(file, symbol),
            None => match lookup_builtin(first) {
                Some(builtin) => builtin_type(self.interner, builtin),
                None => TypeId::UNKNOWN,
            },
        };
        for part in parts {
            current = self.lookup_member(current, part).unwrap_or(TypeId::UNKNOWN);
        }
        self.type_form_arg(current)
    }
}

fn constant_type(kind: ConstantKind) -> TypeId {
    match kind {
        ConstantKind::Int => TypeId::INT,
        ConstantKind::Float => TypeId::FLOAT,
        ConstantKind::Complex => TypeId::COMPLEX,
        ConstantKind::Str => TypeId::STR,
        ConstantKind::Bytes => TypeId::BYTES,
        ConstantKind::True | ConstantKind::False => TypeId::BOOL,
        ConstantKind::None => TypeId::NONE,
        ConstantKind::Ellipsis => TypeId::ELLIPSIS,
    }
}
