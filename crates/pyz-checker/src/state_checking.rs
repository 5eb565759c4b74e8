//! Whole-file checking: visits every statement so that each expression is
//! evaluated once and every diagnostic is reported.

use crate::BoundFile;
use crate::state::TypeEvaluator;
use crate::state_declarations::is_binding_decorator;
use pyz_common::diagnostics::codes;
use pyz_common::ids::FileId;
use pyz_parser::{NodeArena, NodeData, NodeIndex};
use pyz_solver::TypeId;
use tracing::debug;

impl<'a> TypeEvaluator<'a> {
    pub fn check_file(&mut self, file: FileId) {
        let Some(bound) = self.bound(file) else {
            return;
        };
        debug!(path = %bound.path, "checking file");
        self.check_imports(&bound);
        let arena = bound.arena.clone();
        if let Some(NodeData::Module { body }) = arena.data(bound.root) {
            self.check_block(file, &arena, body, NodeIndex::NONE);
        }
    }

    fn check_imports(&mut self, bound: &BoundFile) {
        let file = bound.file;
        for record in bound.binding.imports() {
            let Some(target) = self.view.resolve_import(file, &record.module, record.level) else {
                if self.options.report_unresolved_imports {
                    let name = format!("{}{}", ".".repeat(record.level as usize), record.module);
                    self.report(file, record.span, codes::UNRESOLVED_IMPORT, &[&name]);
                }
                continue;
            };
            if record.is_wildcard {
                continue;
            }
            let Some(NodeData::ImportFrom { names, .. }) = bound.arena.data(record.node) else {
                continue;
            };
            for &alias in names {
                let Some(NodeData::ImportAlias { path, .. }) = bound.arena.data(alias) else {
                    continue;
                };
                let member = bound.arena.dotted_text(path);
                if self.module_member_type(target, &member).is_none() {
                    self.report_at(file, alias, codes::UNKNOWN_IMPORT_SYMBOL, &[&member]);
                }
            }
        }
    }

    fn check_block(
        &mut self,
        file: FileId,
        arena: &NodeArena,
        body: &[NodeIndex],
        function: NodeIndex,
    ) {
        for &stmt in body {
            self.check_statement(file, arena, stmt, function);
        }
    }

    /// `function` is the innermost enclosing `FunctionDef`, `NONE` at module
    /// and class level.
    fn check_statement(
        &mut self,
        file: FileId,
        arena: &NodeArena,
        stmt: NodeIndex,
        function: NodeIndex,
    ) {
        let Some(data) = arena.data(stmt) else {
            return;
        };
        match data {
            NodeData::ExprStmt { expr } => {
                self.expression_type(file, *expr);
            }
            NodeData::Assign { targets, value } => {
                let value_type = self.expression_type(file, *value);
                for &target in targets {
                    self.check_target(file, arena, target, *value, value_type);
                }
            }
            NodeData::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let declared = self.annotation_type(file, *annotation);
                self.visit_target(file, arena, *target);
                if value.is_some() {
                    let value_type = self.expression_type(file, *value);
                    self.check_assignment(file, *value, value_type, declared);
                }
            }
            NodeData::AugAssign { target, value, op } => {
                match arena.data(*target) {
                    Some(NodeData::Name { .. }) => {
                        self.expression_type(file, *value);
                        let result = self
                            .type_of_node(file, *target)
                            .unwrap_or(TypeId::UNKNOWN);
                        self.check_declared_target(file, *target, *value, result);
                    }
                    _ => {
                        let left = self.expression_type(file, *target);
                        let right = self.expression_type(file, *value);
                        self.binary_operation(file, stmt, *op, left, right);
                    }
                }
            }
            NodeData::Return { value } => {
                let returned = if value.is_some() {
                    self.expression_type(file, *value)
                } else {
                    TypeId::NONE
                };
                self.check_return(file, arena, stmt, *value, returned, function);
            }
            NodeData::Raise { exc, cause } => {
                self.expression_type(file, *exc);
                self.expression_type(file, *cause);
            }
            NodeData::Assert { test, msg } => {
                self.expression_type(file, *test);
                self.expression_type(file, *msg);
            }
            NodeData::Del { targets } => {
                for &target in targets {
                    self.visit_target(file, arena, target);
                }
            }
            NodeData::If { test, body, orelse } | NodeData::While { test, body, orelse } => {
                self.expression_type(file, *test);
                self.check_block(file, arena, body, function);
                self.check_block(file, arena, orelse, function);
            }
            NodeData::For {
                target,
                iter,
                body,
                orelse,
            } => {
                self.expression_type(file, *iter);
                self.visit_target(file, arena, *target);
                self.check_block(file, arena, body, function);
                self.check_block(file, arena, orelse, function);
            }
            NodeData::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.check_block(file, arena, body, function);
                for &handler in handlers {
                    if let Some(NodeData::ExceptHandler {
                        type_expr,
                        name,
                        body,
                    }) = arena.data(handler)
                    {
                        self.expression_type(file, *type_expr);
                        self.visit_target(file, arena, *name);
                        self.check_block(file, arena, body, function);
                    }
                }
                self.check_block(file, arena, orelse, function);
                self.check_block(file, arena, finalbody, function);
            }
            NodeData::With { items, body } => {
                for &item in items {
                    if let Some(NodeData::WithItem { context, target }) = arena.data(item) {
                        self.expression_type(file, *context);
                        self.visit_target(file, arena, *target);
                    }
                }
                self.check_block(file, arena, body, function);
            }
            NodeData::FunctionDef {
                decorators,
                name,
                params,
                returns,
                body,
            } => {
                for &decorator in decorators {
                    // `x.setter` reads the property, not a callable
                    if !is_binding_decorator(arena, decorator) {
                        self.expression_type(file, decorator);
                    }
                }
                for &param in params {
                    if let Some(NodeData::Parameter { name, default, .. }) = arena.data(param) {
                        self.expression_type(file, *default);
                        self.visit_target(file, arena, *name);
                    }
                }
                if returns.is_some() {
                    self.annotation_type(file, *returns);
                }
                self.visit_target(file, arena, *name);
                self.check_block(file, arena, body, stmt);
            }
            NodeData::ClassDef {
                decorators,
                name,
                bases,
                body,
            } => {
                for &decorator in decorators {
                    self.expression_type(file, decorator);
                }
                for &base in bases {
                    self.expression_type(file, base);
                }
                self.visit_target(file, arena, *name);
                self.check_block(file, arena, body, NodeIndex::NONE);
            }
            NodeData::Import { names } | NodeData::ImportFrom { names, .. } => {
                for &alias in names {
                    if let Some(NodeData::ImportAlias { path, asname }) = arena.data(alias) {
                        let declared = if asname.is_some() {
                            *asname
                        } else {
                            path.first().copied().unwrap_or(NodeIndex::NONE)
                        };
                        self.visit_target(file, arena, declared);
                    }
                }
            }
            _ => {}
        }
    }

    /// Evaluate the declarations a target introduces, and the expressions
    /// it reads (`obj` in `obj.x = ...`, `a` and `i` in `a[i] = ...`).
    fn visit_target(&mut self, file: FileId, arena: &NodeArena, target: NodeIndex) {
        let Some(data) = arena.data(target) else {
            return;
        };
        match data {
            NodeData::Name { .. } => {
                self.type_of_node(file, target);
            }
            NodeData::Attribute { value, attr } => {
                self.expression_type(file, *value);
                self.type_of_declared(file, *attr);
            }
            NodeData::Subscript { value, index } => {
                self.expression_type(file, *value);
                self.expression_type(file, *index);
            }
            NodeData::Tuple { elts } | NodeData::List { elts } => {
                for &elt in elts {
                    self.visit_target(file, arena, elt);
                }
            }
            NodeData::Starred { value } => self.visit_target(file, arena, *value),
            _ => {
                self.expression_type(file, target);
            }
        }
    }

    fn type_of_declared(&mut self, file: FileId, node: NodeIndex) {
        let Some(bound) = self.bound(file) else {
            return;
        };
        if let Some(decl) = bound.binding.declaration_at(node) {
            self.declaration_type(decl.in_file(file));
        }
    }

    /// Assignment `target = <value>`: plain names are checked against the
    /// declared type of their symbol.
    fn check_target(
        &mut self,
        file: FileId,
        arena: &NodeArena,
        target: NodeIndex,
        value: NodeIndex,
        value_type: TypeId,
    ) {
        self.visit_target(file, arena, target);
        if matches!(arena.data(target), Some(NodeData::Name { .. })) {
            self.check_declared_target(file, target, value, value_type);
        }
    }

    fn check_declared_target(
        &mut self,
        file: FileId,
        target: NodeIndex,
        value: NodeIndex,
        value_type: TypeId,
    ) {
        let Some(bound) = self.bound(file) else {
            return;
        };
        let Some(declaration) = bound
            .binding
            .declaration_at(target)
            .and_then(|d| bound.binding.declaration(d))
        else {
            return;
        };
        if declaration.is_annotated() {
            return;
        }
        if let Some(declared) = self.declared_symbol_type(file, declaration.symbol) {
            self.check_assignment(file, value, value_type, declared);
        }
    }

    fn check_assignment(&mut self, file: FileId, site: NodeIndex, source: TypeId, target: TypeId) {
        if self.assignable(source, target) {
            return;
        }
        let (s, t) = (self.format(source), self.format(target));
        self.report_at(file, site, codes::ASSIGNMENT_TYPE_MISMATCH, &[&s, &t]);
    }

    fn check_return(
        &mut self,
        file: FileId,
        arena: &NodeArena,
        stmt: NodeIndex,
        value: NodeIndex,
        returned: TypeId,
        function: NodeIndex,
    ) {
        let Some(NodeData::FunctionDef { returns, .. }) = arena.data(function) else {
            return;
        };
        if returns.is_none() {
            return;
        }
        let declared = self.annotation_type(file, *returns);
        if self.assignable(returned, declared) {
            return;
        }
        let site = if value.is_some() { value } else { stmt };
        let (r, d) = (self.format(returned), self.format(declared));
        self.report_at(file, site, codes::RETURN_TYPE_MISMATCH, &[&r, &d]);
    }
}
