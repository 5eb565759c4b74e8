//! Call evaluation and argument checking.

use crate::state::TypeEvaluator;
use pyz_common::diagnostics::codes;
use pyz_common::ids::FileId;
use pyz_parser::node::ArgKind;
use pyz_parser::{NodeData, NodeIndex};
use pyz_solver::type_queries::{function_shape_of, instance_parts};
use pyz_solver::{BuiltinClass, ClassKey, FunctionShape, ParamKind, TypeData, TypeId};
use rustc_hash::FxHashSet;
use tracing::trace;

/// An evaluated call argument.
#[derive(Clone, Debug)]
pub(crate) struct CallArgument {
    pub kind: ArgKind,
    pub name: Option<String>,
    pub ty: TypeId,
    pub node: NodeIndex,
}

impl<'a> TypeEvaluator<'a> {
    pub(crate) fn call_type(
        &mut self,
        file: FileId,
        func: NodeIndex,
        args: &[NodeIndex],
    ) -> TypeId {
        let callee = self.expression_type(file, func);
        let Some(bound) = self.bound(file) else {
            return TypeId::UNKNOWN;
        };
        let mut arguments = Vec::with_capacity(args.len());
        for &arg in args {
            let (kind, name) = match bound.arena.data(arg) {
                Some(NodeData::Argument { kind, name, .. }) => (
                    *kind,
                    bound.arena.name_text(*name).map(str::to_string),
                ),
                _ => (ArgKind::Positional, None),
            };
            arguments.push(CallArgument {
                kind,
                name,
                ty: self.expression_type(file, arg),
                node: arg,
            });
        }
        trace!(callee = %self.format(callee), args = arguments.len(), "evaluating call");
        self.call_result(file, func, callee, &arguments)
    }

    /// Result of calling a value of type `callee`. Problems are reported at
    /// `site` (the callee expression) or at the offending argument.
    fn call_result(
        &mut self,
        file: FileId,
        site: NodeIndex,
        callee: TypeId,
        args: &[CallArgument],
    ) -> TypeId {
        if matches!(callee, TypeId::UNKNOWN | TypeId::ANY) {
            return callee;
        }
        let Some(data) = self.interner.lookup(callee) else {
            return TypeId::UNKNOWN;
        };
        match data {
            TypeData::Unknown | TypeData::Any | TypeData::Recursive { .. } => TypeId::UNKNOWN,
            TypeData::Never => TypeId::NEVER,
            TypeData::Union(members) => {
                let results: Vec<TypeId> = members
                    .into_iter()
                    .map(|m| self.call_result(file, site, m, args))
                    .collect();
                self.interner.union(results)
            }
            TypeData::ClassObject(inner) => self.construct(file, site, inner, args),
            TypeData::Function(shape_id) => match self.interner.function_shape(shape_id) {
                Some(shape) => {
                    self.check_arguments(file, site, &shape, 0, args);
                    self.function_return(&shape)
                }
                None => TypeId::UNKNOWN,
            },
            TypeData::BoundMethod { function, .. } => {
                match function_shape_of(self.interner, function) {
                    Some(shape) => {
                        self.check_arguments(file, site, &shape, 1, args);
                        self.function_return(&shape)
                    }
                    None => TypeId::UNKNOWN,
                }
            }
            TypeData::Instance { .. } => match self.lookup_member(callee, "__call__") {
                Some(method) if self.is_declared_instance(callee) => {
                    self.call_result(file, site, method, args)
                }
                _ => self.not_callable(file, site, callee),
            },
            TypeData::Module { .. } => self.not_callable(file, site, callee),
        }
    }

    fn not_callable(&mut self, file: FileId, site: NodeIndex, callee: TypeId) -> TypeId {
        let text = self.format(callee);
        self.report_at(file, site, codes::NOT_CALLABLE, &[&text]);
        TypeId::UNKNOWN
    }

    /// `C(...)`: builtin conversions, or a declared class through its
    /// `__init__`.
    fn construct(
        &mut self,
        file: FileId,
        site: NodeIndex,
        instance: TypeId,
        args: &[CallArgument],
    ) -> TypeId {
        let Some((class, existing)) = instance_parts(self.interner, instance) else {
            // `type[X]` values such as `type(None)`
            return TypeId::UNKNOWN;
        };
        let builtin = match &class {
            ClassKey::Builtin(builtin) => *builtin,
            ClassKey::Declared(_) => return self.construct_declared(file, site, instance, &class, args),
        };
        if !existing.is_empty() {
            return instance;
        }
        let first = args
            .iter()
            .find(|a| a.kind == ArgKind::Positional)
            .map(|a| a.ty);
        let interner = self.interner;
        match builtin {
            BuiltinClass::List => {
                let element = first.map_or(TypeId::UNKNOWN, |t| self.element_type(t));
                interner.list_of(element)
            }
            BuiltinClass::Set => {
                let element = first.map_or(TypeId::UNKNOWN, |t| self.element_type(t));
                interner.set_of(element)
            }
            BuiltinClass::Tuple => match first {
                Some(iterable) => {
                    let element = self.element_type(iterable);
                    interner.tuple_of(&[element, TypeId::ELLIPSIS])
                }
                None => interner.tuple_of(&[]),
            },
            BuiltinClass::Dict => interner.dict_of(TypeId::UNKNOWN, TypeId::UNKNOWN),
            BuiltinClass::Type => match first {
                Some(value) if instance_parts(interner, value).is_some() => {
                    interner.class_object(value)
                }
                _ => TypeId::UNKNOWN,
            },
            _ => instance,
        }
    }

    fn construct_declared(
        &mut self,
        file: FileId,
        site: NodeIndex,
        instance: TypeId,
        class: &ClassKey,
        args: &[CallArgument],
    ) -> TypeId {
        match self.lookup_member(instance, "__init__") {
            Some(init) => {
                if let Some(TypeData::BoundMethod { function, .. }) = self.interner.lookup(init)
                    && let Some(shape) = function_shape_of(self.interner, function)
                {
                    self.check_arguments(file, site, &shape, 1, args);
                }
            }
            None => {
                // only `object.__init__` remains, which takes no arguments
                let builtin_base = self
                    .class_mro(class)
                    .iter()
                    .any(|k| matches!(k, ClassKey::Builtin(b) if *b != BuiltinClass::Object));
                let unpacked = args
                    .iter()
                    .any(|a| matches!(a.kind, ArgKind::Unpack | ArgKind::UnpackDict));
                if !builtin_base && !unpacked && !args.is_empty() {
                    let got = args.len().to_string();
                    self.report_at(file, site, codes::ARGUMENT_COUNT_MISMATCH, &["0", &got]);
                }
            }
        }
        instance
    }

    /// Check `args` against the parameters of `shape`, skipping the first
    /// `skip` parameters (the bound receiver).
    pub(crate) fn check_arguments(
        &mut self,
        file: FileId,
        site: NodeIndex,
        shape: &FunctionShape,
        skip: usize,
        args: &[CallArgument],
    ) {
        let params = shape.params.get(skip..).unwrap_or(&[]);
        let unpacked = args
            .iter()
            .any(|a| matches!(a.kind, ArgKind::Unpack | ArgKind::UnpackDict));
        let positional_params: Vec<usize> = params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == ParamKind::Positional)
            .map(|(i, _)| i)
            .collect();
        let var_args = params.iter().find(|p| p.kind == ParamKind::VarArgs);
        let kw_args = params.iter().find(|p| p.kind == ParamKind::KwArgs);

        let mut bound: FxHashSet<usize> = FxHashSet::default();
        let positional: Vec<&CallArgument> = args
            .iter()
            .filter(|a| a.kind == ArgKind::Positional)
            .collect();
        let mut too_many = false;
        for (i, arg) in positional.iter().enumerate() {
            if let Some(&index) = positional_params.get(i) {
                bound.insert(index);
                let param = &params[index];
                self.check_argument_type(file, arg, &param.name, param.ty);
            } else if let Some(rest) = var_args {
                self.check_argument_type(file, arg, &rest.name, rest.ty);
            } else {
                too_many = true;
            }
        }
        if too_many && !unpacked {
            let expected = positional_params.len().to_string();
            let got = positional.len().to_string();
            self.report_at(file, site, codes::ARGUMENT_COUNT_MISMATCH, &[&expected, &got]);
            return;
        }

        for arg in args.iter().filter(|a| a.kind == ArgKind::Keyword) {
            let Some(name) = arg.name.as_deref() else {
                continue;
            };
            let found = params.iter().position(|p| {
                p.name == name && matches!(p.kind, ParamKind::Positional | ParamKind::KeywordOnly)
            });
            match found {
                Some(index) => {
                    bound.insert(index);
                    let param = &params[index];
                    self.check_argument_type(file, arg, &param.name, param.ty);
                }
                None => match kw_args {
                    Some(rest) => self.check_argument_type(file, arg, &rest.name, rest.ty),
                    None => self.report_at(file, arg.node, codes::UNKNOWN_KEYWORD_ARGUMENT, &[name]),
                },
            }
        }

        if unpacked {
            return;
        }
        let missing = params.iter().enumerate().any(|(i, p)| {
            matches!(p.kind, ParamKind::Positional | ParamKind::KeywordOnly)
                && !p.has_default
                && !bound.contains(&i)
        });
        if missing {
            let expected = params
                .iter()
                .filter(|p| p.kind == ParamKind::Positional && !p.has_default)
                .count()
                .to_string();
            let got = positional.len().to_string();
            self.report_at(file, site, codes::ARGUMENT_COUNT_MISMATCH, &[&expected, &got]);
        }
    }

    fn check_argument_type(&mut self, file: FileId, arg: &CallArgument, param: &str, expected: TypeId) {
        if expected == TypeId::UNKNOWN || self.assignable(arg.ty, expected) {
            return;
        }
        let (actual, wanted) = (self.format(arg.ty), self.format(expected));
        self.report_at(
            file,
            arg.node,
            codes::ARGUMENT_TYPE_MISMATCH,
            &[&actual, param, &wanted],
        );
    }

    /// What calling `callee` produces, without checking arguments.
    pub(crate) fn callable_return(&mut self, callee: TypeId) -> TypeId {
        match self.interner.lookup(callee) {
            Some(TypeData::Function(shape_id)) => match self.interner.function_shape(shape_id) {
                Some(shape) => self.function_return(&shape),
                None => TypeId::UNKNOWN,
            },
            Some(TypeData::BoundMethod { function, .. }) => self.callable_return(function),
            Some(TypeData::ClassObject(inner)) => inner,
            Some(TypeData::Union(members)) => {
                let results: Vec<TypeId> = members
                    .into_iter()
                    .map(|m| self.callable_return(m))
                    .collect();
                self.interner.union(results)
            }
            Some(TypeData::Any) => TypeId::ANY,
            _ => TypeId::UNKNOWN,
        }
    }
}
