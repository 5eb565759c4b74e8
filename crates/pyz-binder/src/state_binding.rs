//! Binder statement and expression walk.

use crate::state::BinderState;
use crate::{AliasTarget, DeclarationKind, ImportRecord, ScopeKind};
use pyz_common::diagnostics::codes;
use pyz_parser::node::{ConstantKind, ParamKind};
use pyz_parser::{NodeData, NodeIndex};
use rustc_hash::FxHashSet;
use tracing::trace;

impl<'a> BinderState<'a> {
    pub(crate) fn bind_statements(&mut self, statements: &[NodeIndex]) {
        for &stmt in statements {
            self.bind_statement(stmt);
        }
    }

    fn bind_conditional(&mut self, statements: &[NodeIndex], is_loop: bool) {
        if let Some(frame) = self.current_frame_mut() {
            frame.conditional_depth += 1;
            if is_loop {
                frame.loop_depth += 1;
            }
        }
        self.bind_statements(statements);
        if let Some(frame) = self.current_frame_mut() {
            frame.conditional_depth -= 1;
            if is_loop {
                frame.loop_depth -= 1;
            }
        }
    }

    fn bind_statement(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(node) = arena.get(idx) else {
            return;
        };
        match &node.data {
            NodeData::ExprStmt { expr } => {
                self.bind_expression(*expr);
                self.collect_dunder_all_mutation(*expr);
            }
            NodeData::Assign { targets, value } => {
                self.bind_expression(*value);
                for &target in targets {
                    self.bind_target(target, idx, NodeIndex::NONE);
                }
                if self.current_scope() == crate::ScopeId::MODULE
                    && targets.iter().any(|&t| arena.name_text(t) == Some("__all__"))
                {
                    self.dunder_all = Some(self.string_list(*value));
                }
            }
            NodeData::AnnAssign {
                target,
                annotation,
                value,
            } => {
                self.bind_expression(*annotation);
                self.bind_expression(*value);
                self.bind_target(*target, idx, *annotation);
            }
            NodeData::AugAssign { target, value, .. } => {
                self.bind_expression(*value);
                if arena.name_text(*target).is_some() {
                    self.declare(*target, DeclarationKind::Variable, idx, NodeIndex::NONE, None);
                    if self.current_scope() == crate::ScopeId::MODULE
                        && arena.name_text(*target) == Some("__all__")
                    {
                        let mut names = self.dunder_all.take().unwrap_or_default();
                        names.extend(self.string_list(*value));
                        self.dunder_all = Some(names);
                    }
                } else {
                    self.bind_expression(*target);
                }
            }
            NodeData::Return { value } => {
                let scope = self.current_scope();
                if self.scope_kind(scope) == Some(ScopeKind::Function) {
                    if let Some(s) = self.scopes.get_mut(scope.0 as usize) {
                        s.returns.push(idx);
                    }
                } else {
                    self.error(codes::RETURN_OUTSIDE_FUNCTION, node.span, None);
                }
                self.bind_expression(*value);
            }
            NodeData::Break | NodeData::Continue => {
                if self.current_frame().is_some_and(|f| f.loop_depth == 0) {
                    let keyword = if matches!(node.data, NodeData::Break) {
                        "break"
                    } else {
                        "continue"
                    };
                    self.error(codes::LOOP_CONTROL_OUTSIDE_LOOP, node.span, Some(keyword));
                }
            }
            NodeData::Pass | NodeData::Error => {}
            NodeData::Raise { .. } | NodeData::Assert { .. } | NodeData::Del { .. } => {
                for child in node.data.children() {
                    self.bind_expression(child);
                }
            }
            NodeData::Global { names } => {
                let scope = self.current_scope();
                for &name in names {
                    if let Some(text) = arena.name_text(name)
                        && let Some(s) = self.scopes.get_mut(scope.0 as usize)
                    {
                        s.globals.push(text.to_string());
                    }
                }
            }
            NodeData::Nonlocal { names } => {
                let scope = self.current_scope();
                if scope == crate::ScopeId::MODULE {
                    self.error(codes::NONLOCAL_AT_MODULE_LEVEL, node.span, None);
                    return;
                }
                for &name in names {
                    if let Some(text) = arena.name_text(name)
                        && let Some(s) = self.scopes.get_mut(scope.0 as usize)
                    {
                        s.nonlocals.push(text.to_string());
                    }
                }
            }
            NodeData::If { test, body, orelse } => {
                self.bind_expression(*test);
                self.bind_conditional(body, false);
                self.bind_conditional(orelse, false);
            }
            NodeData::While { test, body, orelse } => {
                self.bind_expression(*test);
                self.bind_conditional(body, true);
                self.bind_conditional(orelse, false);
            }
            NodeData::For {
                target,
                iter,
                body,
                orelse,
            } => {
                self.bind_expression(*iter);
                if let Some(frame) = self.current_frame_mut() {
                    frame.conditional_depth += 1;
                }
                self.bind_target(*target, idx, NodeIndex::NONE);
                if let Some(frame) = self.current_frame_mut() {
                    frame.conditional_depth -= 1;
                }
                self.bind_conditional(body, true);
                self.bind_conditional(orelse, false);
            }
            NodeData::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.bind_conditional(body, false);
                for &handler in handlers {
                    self.bind_except_handler(handler);
                }
                self.bind_conditional(orelse, false);
                self.bind_statements(finalbody);
            }
            NodeData::With { items, body } => {
                for &item in items {
                    if let Some(NodeData::WithItem { context, target }) = arena.data(item) {
                        self.bind_expression(*context);
                        self.bind_target(*target, item, NodeIndex::NONE);
                    }
                }
                self.bind_statements(body);
            }
            NodeData::FunctionDef { .. } => self.bind_function(idx),
            NodeData::ClassDef { .. } => self.bind_class(idx),
            NodeData::Import { names } => self.bind_import(names),
            NodeData::ImportFrom { .. } => self.bind_import_from(idx),
            // expressions never appear in statement position
            _ => self.bind_expression(idx),
        }
    }

    fn bind_except_handler(&mut self, handler: NodeIndex) {
        let Some(NodeData::ExceptHandler {
            type_expr,
            name,
            body,
        }) = self.arena.data(handler)
        else {
            return;
        };
        self.bind_expression(*type_expr);
        if let Some(frame) = self.current_frame_mut() {
            frame.conditional_depth += 1;
        }
        if name.is_some() {
            self.declare(*name, DeclarationKind::Variable, handler, NodeIndex::NONE, None);
        }
        if let Some(frame) = self.current_frame_mut() {
            frame.conditional_depth -= 1;
        }
        self.bind_conditional(body, false);
    }

    /// Bind an assignment target owned by `owner`.
    fn bind_target(&mut self, target: NodeIndex, owner: NodeIndex, annotation: NodeIndex) {
        let arena = self.arena;
        let Some(data) = arena.data(target) else {
            return;
        };
        match data {
            NodeData::Name { .. } => {
                self.declare(target, DeclarationKind::Variable, owner, annotation, None);
            }
            NodeData::Tuple { elts } | NodeData::List { elts } => {
                for &elt in elts {
                    self.bind_target(elt, owner, NodeIndex::NONE);
                }
            }
            NodeData::Starred { value } => self.bind_target(*value, owner, NodeIndex::NONE),
            NodeData::Attribute { value, attr } => {
                self.bind_expression(*value);
                let receiver = self.current_frame().and_then(|f| f.receiver.clone());
                if let Some((receiver_name, class_scope)) = receiver
                    && arena.name_text(*value) == Some(receiver_name.as_str())
                {
                    self.declare_instance_attribute(class_scope, *attr, owner, annotation);
                }
            }
            _ => self.bind_expression(target),
        }
    }

    pub(crate) fn bind_expression(&mut self, idx: NodeIndex) {
        if idx.is_none() {
            return;
        }
        let arena = self.arena;
        let Some(data) = arena.data(idx) else {
            return;
        };
        match data {
            NodeData::Name { .. } => self.record_name_use(idx),
            NodeData::Attribute { value, .. } => self.bind_expression(*value),
            NodeData::Argument { value, .. } => self.bind_expression(*value),
            NodeData::Lambda { params, body } => {
                self.bind_parameter_defaults(params);
                self.enter_scope(ScopeKind::Lambda, idx, None);
                self.declare_parameters(params);
                self.bind_expression(*body);
                self.exit_scope();
            }
            _ => {
                for child in data.children() {
                    self.bind_expression(child);
                }
            }
        }
    }

    fn bind_parameter_defaults(&mut self, params: &[NodeIndex]) {
        for &param in params {
            if let Some(NodeData::Parameter {
                annotation,
                default,
                ..
            }) = self.arena.data(param)
            {
                self.bind_expression(*annotation);
                self.bind_expression(*default);
            }
        }
    }

    fn declare_parameters(&mut self, params: &[NodeIndex]) {
        let mut seen = FxHashSet::default();
        for &param in params {
            let Some(NodeData::Parameter {
                name, annotation, ..
            }) = self.arena.data(param)
            else {
                continue;
            };
            let Some(text) = self.arena.name_text(*name) else {
                continue;
            };
            if !seen.insert(text) {
                let span = self.arena.span(*name);
                self.error(codes::DUPLICATE_PARAMETER, span, Some(text));
                continue;
            }
            self.declare(*name, DeclarationKind::Parameter, param, *annotation, None);
        }
    }

    fn bind_function(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(NodeData::FunctionDef {
            decorators,
            name,
            params,
            returns,
            body,
        }) = arena.data(idx)
        else {
            return;
        };
        for &decorator in decorators {
            self.bind_expression(decorator);
        }
        self.bind_parameter_defaults(params);
        self.bind_expression(*returns);
        self.declare(*name, DeclarationKind::Function, idx, NodeIndex::NONE, None);

        let enclosing = self.current_scope();
        let is_static = decorators
            .iter()
            .any(|&d| arena.name_text(d) == Some("staticmethod"));
        let receiver = if self.scope_kind(enclosing) == Some(ScopeKind::Class) && !is_static {
            params.iter().find_map(|&p| match arena.data(p) {
                Some(NodeData::Parameter {
                    kind: ParamKind::Normal,
                    name,
                    ..
                }) => arena.name_text(*name).map(|n| (n.to_string(), enclosing)),
                _ => None,
            })
        } else {
            None
        };

        trace!(name = ?arena.name_text(*name), "binding function");
        self.enter_scope(ScopeKind::Function, idx, receiver);
        self.declare_parameters(params);
        self.bind_statements(body);
        self.exit_scope();
    }

    fn bind_class(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(NodeData::ClassDef {
            decorators,
            name,
            bases,
            body,
        }) = arena.data(idx)
        else {
            return;
        };
        for &decorator in decorators {
            self.bind_expression(decorator);
        }
        for &base in bases {
            self.bind_expression(base);
        }
        self.declare(*name, DeclarationKind::Class, idx, NodeIndex::NONE, None);
        self.enter_scope(ScopeKind::Class, idx, None);
        self.bind_statements(body);
        self.exit_scope();
    }

    fn bind_import(&mut self, names: &[NodeIndex]) {
        let arena = self.arena;
        for &alias in names {
            let Some(NodeData::ImportAlias { path, asname }) = arena.data(alias) else {
                continue;
            };
            let module = arena.dotted_text(path);
            let import = self.imports.len() as u32;
            self.imports.push(ImportRecord {
                module: module.clone(),
                level: 0,
                node: alias,
                span: arena.span(alias),
                names: Vec::new(),
                is_wildcard: false,
            });
            let (name_node, bound_module) = if asname.is_some() {
                (*asname, module)
            } else {
                let first = path.first().copied().unwrap_or(NodeIndex::NONE);
                (first, arena.name_text(first).unwrap_or("").to_string())
            };
            let target = AliasTarget {
                import,
                module: bound_module,
                level: 0,
                member: None,
            };
            self.declare(
                name_node,
                DeclarationKind::ModuleAlias,
                alias,
                NodeIndex::NONE,
                Some(target),
            );
        }
    }

    fn bind_import_from(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(NodeData::ImportFrom {
            module,
            level,
            names,
            is_wildcard,
        }) = arena.data(idx)
        else {
            return;
        };
        let module_name = arena.dotted_text(module);
        let import = self.imports.len() as u32;
        let mut imported = Vec::with_capacity(names.len());
        for &alias in names {
            if let Some(NodeData::ImportAlias { path, .. }) = arena.data(alias) {
                imported.push(arena.dotted_text(path));
            }
        }
        self.imports.push(ImportRecord {
            module: module_name.clone(),
            level: *level,
            node: idx,
            span: arena.span(idx),
            names: imported,
            is_wildcard: *is_wildcard,
        });
        if *is_wildcard {
            self.wildcard_imports.push(import);
            return;
        }
        for &alias in names {
            let Some(NodeData::ImportAlias { path, asname }) = arena.data(alias) else {
                continue;
            };
            let member = path.first().copied().unwrap_or(NodeIndex::NONE);
            let name_node = if asname.is_some() { *asname } else { member };
            let target = AliasTarget {
                import,
                module: module_name.clone(),
                level: *level,
                member: arena.name_text(member).map(str::to_string),
            };
            self.declare(
                name_node,
                DeclarationKind::Alias,
                alias,
                NodeIndex::NONE,
                Some(target),
            );
        }
    }

    /// `__all__.append("x")` / `__all__.extend([...])` at module level.
    fn collect_dunder_all_mutation(&mut self, expr: NodeIndex) {
        if self.current_scope() != crate::ScopeId::MODULE {
            return;
        }
        let arena = self.arena;
        let Some(NodeData::Call { func, args }) = arena.data(expr) else {
            return;
        };
        let Some(NodeData::Attribute { value, attr }) = arena.data(*func) else {
            return;
        };
        if arena.name_text(*value) != Some("__all__") {
            return;
        }
        let Some(NodeData::Argument { value: arg, .. }) =
            args.first().and_then(|&a| arena.data(a))
        else {
            return;
        };
        let added = match arena.name_text(*attr) {
            Some("append") => match arena.data(*arg) {
                Some(NodeData::Constant {
                    kind: ConstantKind::Str,
                    value: Some(v),
                }) => vec![v.clone()],
                _ => return,
            },
            Some("extend") => self.string_list(*arg),
            _ => return,
        };
        self.dunder_all.get_or_insert_with(Vec::new).extend(added);
    }

    /// String constants of a list/tuple display, as used by `__all__`.
    fn string_list(&self, idx: NodeIndex) -> Vec<String> {
        let elts = match self.arena.data(idx) {
            Some(NodeData::List { elts }) | Some(NodeData::Tuple { elts }) => elts,
            _ => return Vec::new(),
        };
        elts.iter()
            .filter_map(|&e| match self.arena.data(e) {
                Some(NodeData::Constant {
                    kind: ConstantKind::Str,
                    value: Some(v),
                }) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }
}
