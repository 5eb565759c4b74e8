//! Parser state - statement parsing methods.

use crate::node::*;
use crate::state::ParserState;
use pyz_common::diagnostics::codes;
use pyz_common::position::TextSpan;
use pyz_scanner::SyntaxKind;

impl<'a> ParserState<'a> {
    /// Parse a whole module. The root always spans the entire source.
    pub fn parse_source_file(&mut self) -> NodeIndex {
        let mut body = Vec::new();
        loop {
            match self.kind() {
                SyntaxKind::EndOfFile => break,
                SyntaxKind::Newline | SyntaxKind::Dedent => {
                    self.bump();
                }
                SyntaxKind::Indent => self.parse_unexpected_indent(&mut body),
                _ => self.parse_statement(&mut body),
            }
        }
        let end = self.source.len() as u32;
        self.arena
            .add(NodeData::Module { body }, TextSpan::new(0, end))
    }

    fn parse_unexpected_indent(&mut self, out: &mut NodeList) {
        let span = self.current().span;
        self.error(codes::UNEXPECTED_INDENT, span, None);
        self.bump();
        self.parse_statements_until_dedent(out);
        self.eat(SyntaxKind::Dedent);
    }

    fn parse_statements_until_dedent(&mut self, out: &mut NodeList) {
        loop {
            match self.kind() {
                SyntaxKind::EndOfFile | SyntaxKind::Dedent => return,
                SyntaxKind::Newline => {
                    self.bump();
                }
                SyntaxKind::Indent => self.parse_unexpected_indent(out),
                _ => self.parse_statement(out),
            }
        }
    }

    /// Parse one statement; a simple-statement line may yield several.
    fn parse_statement(&mut self, out: &mut NodeList) {
        let stmt = match self.kind() {
            SyntaxKind::IfKeyword => self.parse_if(),
            SyntaxKind::WhileKeyword => self.parse_while(),
            SyntaxKind::ForKeyword => self.parse_for(),
            SyntaxKind::TryKeyword => self.parse_try(),
            SyntaxKind::WithKeyword => self.parse_with(),
            SyntaxKind::DefKeyword => self.parse_function(Vec::new(), self.start()),
            SyntaxKind::ClassKeyword => self.parse_class(Vec::new(), self.start()),
            SyntaxKind::At => self.parse_decorated(),
            _ => {
                self.parse_simple_line(out);
                return;
            }
        };
        out.push(stmt);
    }

    /// `simple_stmt (';' simple_stmt)* [';'] NEWLINE`
    fn parse_simple_line(&mut self, out: &mut NodeList) {
        let errors_before = self.diagnostic_count();
        loop {
            out.push(self.parse_simple_statement());
            if !self.eat(SyntaxKind::Semicolon) || self.at_end_of_line() {
                break;
            }
        }
        if !self.at_end_of_line() {
            if self.diagnostic_count() == errors_before {
                let token = self.current();
                let text = self.token_text(token);
                self.error(codes::UNEXPECTED_TOKEN, token.span, Some(text));
            }
            self.skip_to_end_of_line();
        }
        self.eat(SyntaxKind::Newline);
    }

    /// Body of a compound statement after its `:`.
    fn parse_block(&mut self) -> NodeList {
        let mut body = Vec::new();
        if !self.eat(SyntaxKind::Newline) {
            if self.at_end_of_line() {
                let span = self.current().span;
                self.error(codes::EXPECTED_INDENTED_BLOCK, span, None);
            } else {
                self.parse_simple_line(&mut body);
            }
            return body;
        }
        if !self.eat(SyntaxKind::Indent) {
            let span = self.current().span;
            self.error(codes::EXPECTED_INDENTED_BLOCK, span, None);
            return body;
        }
        self.parse_statements_until_dedent(&mut body);
        self.eat(SyntaxKind::Dedent);
        body
    }

    fn parse_colon_block(&mut self) -> NodeList {
        if !self.expect(SyntaxKind::Colon) {
            self.skip_to_end_of_line();
        }
        self.parse_block()
    }

    fn parse_if(&mut self) -> NodeIndex {
        // also entered on `elif`
        let start = self.start();
        self.bump();
        let test = self.parse_expression();
        let body = self.parse_colon_block();
        let orelse = match self.kind() {
            SyntaxKind::ElifKeyword => vec![self.parse_if()],
            SyntaxKind::ElseKeyword => {
                self.bump();
                self.parse_colon_block()
            }
            _ => Vec::new(),
        };
        self.finish_node(NodeData::If { test, body, orelse }, start)
    }

    fn parse_else_block(&mut self) -> NodeList {
        if self.eat(SyntaxKind::ElseKeyword) {
            self.parse_colon_block()
        } else {
            Vec::new()
        }
    }

    fn parse_while(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        let test = self.parse_expression();
        let body = self.parse_colon_block();
        let orelse = self.parse_else_block();
        self.finish_node(NodeData::While { test, body, orelse }, start)
    }

    fn parse_for(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        let target = self.parse_target_list();
        self.check_assignment_target(target);
        self.expect(SyntaxKind::InKeyword);
        let iter = self.parse_star_expressions();
        let body = self.parse_colon_block();
        let orelse = self.parse_else_block();
        self.finish_node(
            NodeData::For {
                target,
                iter,
                body,
                orelse,
            },
            start,
        )
    }

    fn parse_try(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        let body = self.parse_colon_block();
        let mut handlers = Vec::new();
        while self.at(SyntaxKind::ExceptKeyword) {
            let handler_start = self.start();
            self.bump();
            let type_expr = if self.at(SyntaxKind::Colon) {
                NodeIndex::NONE
            } else {
                self.parse_expression()
            };
            let name = if self.eat(SyntaxKind::AsKeyword) {
                self.parse_name()
            } else {
                NodeIndex::NONE
            };
            let handler_body = self.parse_colon_block();
            handlers.push(self.finish_node(
                NodeData::ExceptHandler {
                    type_expr,
                    name,
                    body: handler_body,
                },
                handler_start,
            ));
        }
        let orelse = self.parse_else_block();
        let finalbody = if self.eat(SyntaxKind::FinallyKeyword) {
            self.parse_colon_block()
        } else {
            Vec::new()
        };
        if handlers.is_empty() && finalbody.is_empty() {
            let span = self.current().span;
            self.error(codes::EXPECTED_TOKEN, span, Some("except"));
        }
        self.finish_node(
            NodeData::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            start,
        )
    }

    fn parse_with(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        let mut items = Vec::new();
        loop {
            let item_start = self.start();
            let context = self.parse_expression();
            let target = if self.eat(SyntaxKind::AsKeyword) {
                let target = self.parse_bitor();
                self.check_assignment_target(target);
                target
            } else {
                NodeIndex::NONE
            };
            items.push(self.finish_node(NodeData::WithItem { context, target }, item_start));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        let body = self.parse_colon_block();
        self.finish_node(NodeData::With { items, body }, start)
    }

    fn parse_decorated(&mut self) -> NodeIndex {
        let start = self.start();
        let mut decorators = Vec::new();
        while self.eat(SyntaxKind::At) {
            decorators.push(self.parse_expression());
            if !self.eat(SyntaxKind::Newline) {
                let span = self.current().span;
                self.error(codes::EXPECTED_TOKEN, span, Some("<newline>"));
                self.skip_to_end_of_line();
                self.eat(SyntaxKind::Newline);
            }
        }
        match self.kind() {
            SyntaxKind::DefKeyword => self.parse_function(decorators, start),
            SyntaxKind::ClassKeyword => self.parse_class(decorators, start),
            _ => {
                let span = self.current().span;
                self.error(codes::EXPECTED_TOKEN, span, Some("def"));
                self.error_node(start)
            }
        }
    }

    fn parse_function(&mut self, decorators: NodeList, start: u32) -> NodeIndex {
        self.bump();
        let name = self.parse_name();
        let params = if self.expect(SyntaxKind::OpenParen) {
            let params = self.parse_parameters(SyntaxKind::CloseParen, true);
            self.expect(SyntaxKind::CloseParen);
            params
        } else {
            Vec::new()
        };
        let returns = if self.eat(SyntaxKind::Arrow) {
            self.parse_expression()
        } else {
            NodeIndex::NONE
        };
        let body = self.parse_colon_block();
        self.finish_node(
            NodeData::FunctionDef {
                decorators,
                name,
                params,
                returns,
                body,
            },
            start,
        )
    }

    fn parse_class(&mut self, decorators: NodeList, start: u32) -> NodeIndex {
        self.bump();
        let name = self.parse_name();
        let bases = if self.eat(SyntaxKind::OpenParen) {
            let bases = self.parse_arguments(SyntaxKind::CloseParen);
            self.expect(SyntaxKind::CloseParen);
            bases
        } else {
            Vec::new()
        };
        let body = self.parse_colon_block();
        self.finish_node(
            NodeData::ClassDef {
                decorators,
                name,
                bases,
                body,
            },
            start,
        )
    }

    fn parse_simple_statement(&mut self) -> NodeIndex {
        let start = self.start();
        match self.kind() {
            SyntaxKind::PassKeyword => {
                self.bump();
                self.finish_node(NodeData::Pass, start)
            }
            SyntaxKind::BreakKeyword => {
                self.bump();
                self.finish_node(NodeData::Break, start)
            }
            SyntaxKind::ContinueKeyword => {
                self.bump();
                self.finish_node(NodeData::Continue, start)
            }
            SyntaxKind::ReturnKeyword => {
                self.bump();
                let value = if self.is_expression_start() {
                    self.parse_star_expressions()
                } else {
                    NodeIndex::NONE
                };
                self.finish_node(NodeData::Return { value }, start)
            }
            SyntaxKind::RaiseKeyword => {
                self.bump();
                let exc = if self.is_expression_start() {
                    self.parse_expression()
                } else {
                    NodeIndex::NONE
                };
                let cause = if exc.is_some() && self.eat(SyntaxKind::FromKeyword) {
                    self.parse_expression()
                } else {
                    NodeIndex::NONE
                };
                self.finish_node(NodeData::Raise { exc, cause }, start)
            }
            SyntaxKind::AssertKeyword => {
                self.bump();
                let test = self.parse_expression();
                let msg = if self.eat(SyntaxKind::Comma) {
                    self.parse_expression()
                } else {
                    NodeIndex::NONE
                };
                self.finish_node(NodeData::Assert { test, msg }, start)
            }
            SyntaxKind::DelKeyword => {
                self.bump();
                let target = self.parse_target_list();
                self.check_assignment_target(target);
                let targets = match self.arena.data(target) {
                    Some(NodeData::Tuple { elts }) => elts.clone(),
                    _ => vec![target],
                };
                self.finish_node(NodeData::Del { targets }, start)
            }
            SyntaxKind::GlobalKeyword | SyntaxKind::NonlocalKeyword => {
                let is_global = self.at(SyntaxKind::GlobalKeyword);
                self.bump();
                let mut names = vec![self.parse_name()];
                while self.eat(SyntaxKind::Comma) {
                    names.push(self.parse_name());
                }
                let data = if is_global {
                    NodeData::Global { names }
                } else {
                    NodeData::Nonlocal { names }
                };
                self.finish_node(data, start)
            }
            SyntaxKind::ImportKeyword => self.parse_import(),
            SyntaxKind::FromKeyword => self.parse_from_import(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_dotted_name(&mut self) -> NodeList {
        let mut parts = vec![self.parse_name()];
        while self.eat(SyntaxKind::Dot) {
            parts.push(self.parse_name());
        }
        parts
    }

    fn parse_import(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        let mut names = Vec::new();
        loop {
            let alias_start = self.start();
            let path = self.parse_dotted_name();
            let asname = if self.eat(SyntaxKind::AsKeyword) {
                self.parse_name()
            } else {
                NodeIndex::NONE
            };
            names.push(self.finish_node(NodeData::ImportAlias { path, asname }, alias_start));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.finish_node(NodeData::Import { names }, start)
    }

    fn parse_from_import(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        let mut level = 0;
        loop {
            match self.kind() {
                SyntaxKind::Dot => level += 1,
                SyntaxKind::Ellipsis => level += 3,
                _ => break,
            }
            self.bump();
        }
        let module = if level == 0 || self.at(SyntaxKind::Name) {
            self.parse_dotted_name()
        } else {
            Vec::new()
        };
        self.expect(SyntaxKind::ImportKeyword);

        let mut names = Vec::new();
        let mut is_wildcard = false;
        if self.eat(SyntaxKind::Star) {
            is_wildcard = true;
        } else {
            let parenthesized = self.eat(SyntaxKind::OpenParen);
            while self.at(SyntaxKind::Name) {
                let alias_start = self.start();
                let path = vec![self.parse_name()];
                let asname = if self.eat(SyntaxKind::AsKeyword) {
                    self.parse_name()
                } else {
                    NodeIndex::NONE
                };
                names.push(self.finish_node(NodeData::ImportAlias { path, asname }, alias_start));
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            if names.is_empty() {
                let span = self.current().span;
                self.error(codes::EXPECTED_NAME, span, None);
            }
            if parenthesized {
                self.expect(SyntaxKind::CloseParen);
            }
        }
        self.finish_node(
            NodeData::ImportFrom {
                module,
                level,
                names,
                is_wildcard,
            },
            start,
        )
    }

    /// Expression statement, or an assignment in one of its three forms.
    fn parse_expression_statement(&mut self) -> NodeIndex {
        let start = self.start();
        let first = self.parse_star_expressions();

        if self.eat(SyntaxKind::Colon) {
            if !matches!(
                self.arena.data(first),
                Some(NodeData::Name { .. } | NodeData::Attribute { .. } | NodeData::Subscript { .. })
            ) {
                let span = self.arena.span(first);
                self.error(codes::INVALID_ASSIGNMENT_TARGET, span, None);
            }
            let annotation = self.parse_expression();
            let value = if self.eat(SyntaxKind::Equals) {
                self.parse_star_expressions()
            } else {
                NodeIndex::NONE
            };
            return self.finish_node(
                NodeData::AnnAssign {
                    target: first,
                    annotation,
                    value,
                },
                start,
            );
        }

        if let Some(op) = self.kind().augmented_operator().and_then(augmented_binary_op) {
            self.bump();
            if !matches!(
                self.arena.data(first),
                Some(NodeData::Name { .. } | NodeData::Attribute { .. } | NodeData::Subscript { .. })
            ) {
                let span = self.arena.span(first);
                self.error(codes::INVALID_ASSIGNMENT_TARGET, span, None);
            }
            let value = self.parse_star_expressions();
            return self.finish_node(
                NodeData::AugAssign {
                    target: first,
                    op,
                    value,
                },
                start,
            );
        }

        if !self.at(SyntaxKind::Equals) {
            return self.finish_node(NodeData::ExprStmt { expr: first }, start);
        }

        let mut targets = vec![first];
        let mut value = NodeIndex::NONE;
        while self.eat(SyntaxKind::Equals) {
            let rhs = self.parse_star_expressions();
            if self.at(SyntaxKind::Equals) {
                targets.push(rhs);
            } else {
                value = rhs;
            }
        }
        for target in targets.clone() {
            self.check_assignment_target(target);
        }
        self.finish_node(NodeData::Assign { targets, value }, start)
    }
}

fn augmented_binary_op(kind: SyntaxKind) -> Option<BinaryOp> {
    use SyntaxKind::*;
    Some(match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Star => BinaryOp::Mult,
        DoubleStar => BinaryOp::Pow,
        Slash => BinaryOp::Div,
        DoubleSlash => BinaryOp::FloorDiv,
        Percent => BinaryOp::Mod,
        Pipe => BinaryOp::BitOr,
        Ampersand => BinaryOp::BitAnd,
        Caret => BinaryOp::BitXor,
        LeftShift => BinaryOp::LShift,
        RightShift => BinaryOp::RShift,
        At => BinaryOp::MatMult,
        _ => return None,
    })
}
