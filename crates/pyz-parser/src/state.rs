//! Parser state: token cursor, diagnostics and expression parsing.
//!
//! The parser is a recursive-descent parser over the scanner's token stream.
//! It never fails: on malformed input it records a `ParseDiagnostic`, emits an
//! `Error` node, and resynchronizes at the next logical line.

use crate::node::*;
use crate::node_arena::NodeArena;
use pyz_common::diagnostics::{Diagnostic, codes};
use pyz_common::limits::MAX_PARSE_DEPTH;
use pyz_common::position::TextSpan;
use pyz_scanner::{ScanDiagnostic, SyntaxKind, Token};

/// A syntax problem found while scanning or parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub code: u32,
    pub arg: Option<String>,
}

impl ParseDiagnostic {
    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.start, self.start + self.length)
    }

    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        let args: Vec<&str> = self.arg.as_deref().into_iter().collect();
        Diagnostic::from_code(file, self.span(), self.code, &args)
    }
}

impl From<ScanDiagnostic> for ParseDiagnostic {
    fn from(diag: ScanDiagnostic) -> Self {
        ParseDiagnostic {
            start: diag.span.start,
            length: diag.span.len(),
            code: diag.code,
            arg: diag.arg,
        }
    }
}

pub struct ParserState<'a> {
    pub(crate) source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// End offset of the last consumed token.
    prev_end: u32,
    pub(crate) arena: NodeArena,
    pub(crate) parse_diagnostics: Vec<ParseDiagnostic>,
    depth: u32,
}

impl<'a> ParserState<'a> {
    pub fn new(source: &'a str) -> Self {
        let scanned = pyz_scanner::scan(source);
        ParserState {
            source,
            tokens: scanned.tokens,
            pos: 0,
            prev_end: 0,
            arena: NodeArena::with_capacity(source.len()),
            parse_diagnostics: scanned.diagnostics.into_iter().map(Into::into).collect(),
            depth: 0,
        }
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    pub(crate) fn current(&self) -> Token {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .copied()
            .unwrap_or(Token {
                kind: SyntaxKind::EndOfFile,
                span: TextSpan::default(),
            })
    }

    #[inline]
    pub(crate) fn kind(&self) -> SyntaxKind {
        self.current().kind
    }

    pub(crate) fn peek_kind(&self, ahead: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EndOfFile)
    }

    #[inline]
    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn at_end_of_line(&self) -> bool {
        matches!(
            self.kind(),
            SyntaxKind::Newline | SyntaxKind::EndOfFile | SyntaxKind::Dedent | SyntaxKind::Indent
        )
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.current();
        match token.kind {
            SyntaxKind::EndOfFile => {}
            // layout tokens never extend a node's span
            SyntaxKind::Newline | SyntaxKind::Indent | SyntaxKind::Dedent => self.pos += 1,
            _ => {
                self.pos += 1;
                self.prev_end = token.span.end;
            }
        }
        token
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        let span = self.current().span;
        self.error(codes::EXPECTED_TOKEN, span, Some(kind.text()));
        false
    }

    #[inline]
    pub(crate) fn start(&self) -> u32 {
        self.current().span.start
    }

    #[inline]
    pub(crate) fn prev_end(&self) -> u32 {
        self.prev_end
    }

    pub(crate) fn token_text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    pub(crate) fn error(&mut self, code: u32, span: TextSpan, arg: Option<&str>) {
        // one report per offset keeps recovery from cascading
        if self
            .parse_diagnostics
            .last()
            .is_some_and(|d| d.start == span.start && d.code == code)
        {
            return;
        }
        self.parse_diagnostics.push(ParseDiagnostic {
            start: span.start,
            length: span.len(),
            code,
            arg: arg.map(str::to_string),
        });
    }

    pub(crate) fn diagnostic_count(&self) -> usize {
        self.parse_diagnostics.len()
    }

    pub(crate) fn finish_node(&mut self, data: NodeData, start: u32) -> NodeIndex {
        let end = self.prev_end.max(start);
        self.arena.add(data, TextSpan::new(start, end))
    }

    pub(crate) fn error_node(&mut self, start: u32) -> NodeIndex {
        self.finish_node(NodeData::Error, start)
    }

    /// Skip to the end of the logical line without consuming the `Newline`.
    pub(crate) fn skip_to_end_of_line(&mut self) {
        while !self.at_end_of_line() {
            self.bump();
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(crate) fn is_expression_start(&self) -> bool {
        use SyntaxKind::*;
        matches!(
            self.kind(),
            Name | Int
                | Float
                | Complex
                | String
                | Bytes
                | TrueKeyword
                | FalseKeyword
                | NoneKeyword
                | Ellipsis
                | OpenParen
                | OpenBracket
                | OpenBrace
                | Minus
                | Plus
                | Tilde
                | NotKeyword
                | LambdaKeyword
                | Star
        )
    }

    /// `expression: lambda | or_test ['if' or_test 'else' expression]`
    pub(crate) fn parse_expression(&mut self) -> NodeIndex {
        if self.depth >= MAX_PARSE_DEPTH {
            let start = self.start();
            let span = self.current().span;
            self.error(codes::EXPECTED_EXPRESSION, span, None);
            self.skip_to_end_of_line();
            return self.error_node(start);
        }
        self.depth += 1;
        let result = self.parse_expression_inner();
        self.depth -= 1;
        result
    }

    fn parse_expression_inner(&mut self) -> NodeIndex {
        if self.at(SyntaxKind::LambdaKeyword) {
            return self.parse_lambda();
        }
        let start = self.start();
        let body = self.parse_or_test();
        if !self.at(SyntaxKind::IfKeyword) {
            return body;
        }
        self.bump();
        let test = self.parse_or_test();
        self.expect(SyntaxKind::ElseKeyword);
        let orelse = self.parse_expression();
        self.finish_node(NodeData::IfExp { test, body, orelse }, start)
    }

    /// `star_expression: '*' bitwise_or | expression`
    pub(crate) fn parse_star_or_expression(&mut self) -> NodeIndex {
        if self.at(SyntaxKind::Star) {
            let start = self.start();
            self.bump();
            let value = self.parse_bitor();
            return self.finish_node(NodeData::Starred { value }, start);
        }
        self.parse_expression()
    }

    /// Comma-separated expressions; more than one (or a trailing comma) forms
    /// a tuple without parentheses.
    pub(crate) fn parse_star_expressions(&mut self) -> NodeIndex {
        let start = self.start();
        let first = self.parse_star_or_expression();
        if !self.at(SyntaxKind::Comma) {
            return first;
        }
        let mut elts = vec![first];
        while self.eat(SyntaxKind::Comma) {
            if !self.is_expression_start() {
                break;
            }
            elts.push(self.parse_star_or_expression());
        }
        self.finish_node(NodeData::Tuple { elts }, start)
    }

    /// Assignment targets of `for` and `del`; stops before `in`.
    pub(crate) fn parse_target_list(&mut self) -> NodeIndex {
        let start = self.start();
        let first = self.parse_star_target();
        if !self.at(SyntaxKind::Comma) {
            return first;
        }
        let mut elts = vec![first];
        while self.eat(SyntaxKind::Comma) {
            if !self.is_expression_start() {
                break;
            }
            elts.push(self.parse_star_target());
        }
        self.finish_node(NodeData::Tuple { elts }, start)
    }

    fn parse_star_target(&mut self) -> NodeIndex {
        if self.at(SyntaxKind::Star) {
            let start = self.start();
            self.bump();
            let value = self.parse_bitor();
            return self.finish_node(NodeData::Starred { value }, start);
        }
        self.parse_bitor()
    }

    fn parse_lambda(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        let params = self.parse_parameters(SyntaxKind::Colon, false);
        self.expect(SyntaxKind::Colon);
        let body = self.parse_expression();
        self.finish_node(NodeData::Lambda { params, body }, start)
    }

    fn parse_or_test(&mut self) -> NodeIndex {
        self.parse_bool_chain(SyntaxKind::OrKeyword, BoolOp::Or)
    }

    fn parse_and_test(&mut self) -> NodeIndex {
        self.parse_bool_chain(SyntaxKind::AndKeyword, BoolOp::And)
    }

    fn parse_bool_chain(&mut self, keyword: SyntaxKind, op: BoolOp) -> NodeIndex {
        let start = self.start();
        let operand = |p: &mut Self| match op {
            BoolOp::Or => p.parse_and_test(),
            BoolOp::And => p.parse_not_test(),
        };
        let first = operand(self);
        if !self.at(keyword) {
            return first;
        }
        let mut values = vec![first];
        while self.eat(keyword) {
            values.push(operand(self));
        }
        self.finish_node(NodeData::BoolOp { op, values }, start)
    }

    fn parse_not_test(&mut self) -> NodeIndex {
        if self.at(SyntaxKind::NotKeyword) {
            let start = self.start();
            self.bump();
            let operand = self.parse_not_test();
            return self.finish_node(
                NodeData::UnaryOp {
                    op: UnaryOp::Not,
                    operand,
                },
                start,
            );
        }
        self.parse_comparison()
    }

    fn compare_op(&self) -> Option<(CompareOp, usize)> {
        use SyntaxKind::*;
        Some(match self.kind() {
            Less => (CompareOp::Lt, 1),
            Greater => (CompareOp::Gt, 1),
            LessEquals => (CompareOp::LtE, 1),
            GreaterEquals => (CompareOp::GtE, 1),
            EqualsEquals => (CompareOp::Eq, 1),
            NotEquals => (CompareOp::NotEq, 1),
            InKeyword => (CompareOp::In, 1),
            NotKeyword if self.peek_kind(1) == InKeyword => (CompareOp::NotIn, 2),
            IsKeyword if self.peek_kind(1) == NotKeyword => (CompareOp::IsNot, 2),
            IsKeyword => (CompareOp::Is, 1),
            _ => return None,
        })
    }

    fn parse_comparison(&mut self) -> NodeIndex {
        let start = self.start();
        let left = self.parse_bitor();
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some((op, width)) = self.compare_op() {
            for _ in 0..width {
                self.bump();
            }
            ops.push(op);
            comparators.push(self.parse_bitor());
        }
        if ops.is_empty() {
            return left;
        }
        self.finish_node(
            NodeData::Compare {
                left,
                ops,
                comparators,
            },
            start,
        )
    }

    fn binary_op(kind: SyntaxKind, level: u8) -> Option<BinaryOp> {
        use SyntaxKind::*;
        Some(match (level, kind) {
            (0, Pipe) => BinaryOp::BitOr,
            (1, Caret) => BinaryOp::BitXor,
            (2, Ampersand) => BinaryOp::BitAnd,
            (3, LeftShift) => BinaryOp::LShift,
            (3, RightShift) => BinaryOp::RShift,
            (4, Plus) => BinaryOp::Add,
            (4, Minus) => BinaryOp::Sub,
            (5, Star) => BinaryOp::Mult,
            (5, Slash) => BinaryOp::Div,
            (5, DoubleSlash) => BinaryOp::FloorDiv,
            (5, Percent) => BinaryOp::Mod,
            (5, At) => BinaryOp::MatMult,
            _ => return None,
        })
    }

    pub(crate) fn parse_bitor(&mut self) -> NodeIndex {
        self.parse_binary_level(0)
    }

    /// Left-associative binary levels: `|`, `^`, `&`, shifts, `+ -`, `* / // % @`.
    fn parse_binary_level(&mut self, level: u8) -> NodeIndex {
        let start = self.start();
        let operand = |p: &mut Self| {
            if level == 5 {
                p.parse_factor()
            } else {
                p.parse_binary_level(level + 1)
            }
        };
        let mut left = operand(self);
        while let Some(op) = Self::binary_op(self.kind(), level) {
            self.bump();
            let right = operand(self);
            left = self.finish_node(NodeData::BinOp { left, op, right }, start);
        }
        left
    }

    fn parse_factor(&mut self) -> NodeIndex {
        let op = match self.kind() {
            SyntaxKind::Minus => UnaryOp::Neg,
            SyntaxKind::Plus => UnaryOp::Pos,
            SyntaxKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        let start = self.start();
        self.bump();
        let operand = self.parse_factor();
        self.finish_node(NodeData::UnaryOp { op, operand }, start)
    }

    fn parse_power(&mut self) -> NodeIndex {
        let start = self.start();
        let left = self.parse_primary();
        if !self.eat(SyntaxKind::DoubleStar) {
            return left;
        }
        let right = self.parse_factor();
        self.finish_node(
            NodeData::BinOp {
                left,
                op: BinaryOp::Pow,
                right,
            },
            start,
        )
    }

    fn parse_primary(&mut self) -> NodeIndex {
        let start = self.start();
        let mut expr = self.parse_atom();
        loop {
            match self.kind() {
                SyntaxKind::OpenParen => {
                    self.bump();
                    let args = self.parse_arguments(SyntaxKind::CloseParen);
                    self.expect(SyntaxKind::CloseParen);
                    expr = self.finish_node(NodeData::Call { func: expr, args }, start);
                }
                SyntaxKind::OpenBracket => {
                    self.bump();
                    let index = self.parse_subscript_index();
                    self.expect(SyntaxKind::CloseBracket);
                    expr = self.finish_node(NodeData::Subscript { value: expr, index }, start);
                }
                SyntaxKind::Dot => {
                    self.bump();
                    let attr = self.parse_name();
                    expr = self.finish_node(NodeData::Attribute { value: expr, attr }, start);
                }
                _ => return expr,
            }
        }
    }

    /// A `Name` node, or an `Error` node after reporting a missing name.
    pub(crate) fn parse_name(&mut self) -> NodeIndex {
        let token = self.current();
        if token.kind != SyntaxKind::Name {
            self.error(codes::EXPECTED_NAME, token.span, None);
            let at = self.prev_end;
            return self.arena.add(NodeData::Error, TextSpan::new(at, at));
        }
        self.bump();
        let id = self.arena.intern(self.token_text(token));
        self.arena.add(NodeData::Name { id }, token.span)
    }

    /// Call arguments (and class bases) up to, but not including, `close`.
    pub(crate) fn parse_arguments(&mut self, close: SyntaxKind) -> NodeList {
        let mut args = Vec::new();
        while !self.at(close) && !self.at(SyntaxKind::EndOfFile) {
            let start = self.start();
            let (kind, name) = match self.kind() {
                SyntaxKind::Star => {
                    self.bump();
                    (ArgKind::Unpack, NodeIndex::NONE)
                }
                SyntaxKind::DoubleStar => {
                    self.bump();
                    (ArgKind::UnpackDict, NodeIndex::NONE)
                }
                SyntaxKind::Name if self.peek_kind(1) == SyntaxKind::Equals => {
                    let name = self.parse_name();
                    self.bump();
                    (ArgKind::Keyword, name)
                }
                _ => (ArgKind::Positional, NodeIndex::NONE),
            };
            if !self.is_expression_start() {
                let span = self.current().span;
                self.error(codes::EXPECTED_EXPRESSION, span, None);
                break;
            }
            let value = self.parse_expression();
            args.push(self.finish_node(NodeData::Argument { kind, name, value }, start));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        args
    }

    fn parse_subscript_index(&mut self) -> NodeIndex {
        let start = self.start();
        let first = self.parse_slice_item();
        if !self.at(SyntaxKind::Comma) {
            return first;
        }
        let mut elts = vec![first];
        while self.eat(SyntaxKind::Comma) {
            if self.at(SyntaxKind::CloseBracket) {
                break;
            }
            elts.push(self.parse_slice_item());
        }
        self.finish_node(NodeData::Tuple { elts }, start)
    }

    fn parse_slice_item(&mut self) -> NodeIndex {
        let start = self.start();
        let lower = if self.at(SyntaxKind::Colon) {
            NodeIndex::NONE
        } else {
            self.parse_star_or_expression()
        };
        if !self.eat(SyntaxKind::Colon) {
            return lower;
        }
        let optional = |p: &mut Self| {
            if p.is_expression_start() {
                p.parse_expression()
            } else {
                NodeIndex::NONE
            }
        };
        let upper = optional(self);
        let step = if self.eat(SyntaxKind::Colon) {
            optional(self)
        } else {
            NodeIndex::NONE
        };
        self.finish_node(NodeData::Slice { lower, upper, step }, start)
    }

    fn parse_atom(&mut self) -> NodeIndex {
        let token = self.current();
        let start = token.span.start;
        let constant = |kind| NodeData::Constant { kind, value: None };
        match token.kind {
            SyntaxKind::Name => self.parse_name(),
            SyntaxKind::Int | SyntaxKind::Float | SyntaxKind::Complex => {
                self.bump();
                let kind = match token.kind {
                    SyntaxKind::Int => ConstantKind::Int,
                    SyntaxKind::Float => ConstantKind::Float,
                    _ => ConstantKind::Complex,
                };
                self.finish_node(constant(kind), start)
            }
            SyntaxKind::String | SyntaxKind::Bytes => self.parse_strings(),
            SyntaxKind::TrueKeyword => {
                self.bump();
                self.finish_node(constant(ConstantKind::True), start)
            }
            SyntaxKind::FalseKeyword => {
                self.bump();
                self.finish_node(constant(ConstantKind::False), start)
            }
            SyntaxKind::NoneKeyword => {
                self.bump();
                self.finish_node(constant(ConstantKind::None), start)
            }
            SyntaxKind::Ellipsis => {
                self.bump();
                self.finish_node(constant(ConstantKind::Ellipsis), start)
            }
            SyntaxKind::OpenParen => self.parse_paren(),
            SyntaxKind::OpenBracket => {
                self.bump();
                let elts = self.parse_display_elements(SyntaxKind::CloseBracket);
                self.expect(SyntaxKind::CloseBracket);
                self.finish_node(NodeData::List { elts }, start)
            }
            SyntaxKind::OpenBrace => self.parse_brace(),
            _ => {
                self.error(codes::EXPECTED_EXPRESSION, token.span, None);
                if !self.at_end_of_line() && !matches!(
                    token.kind,
                    SyntaxKind::CloseParen | SyntaxKind::CloseBracket | SyntaxKind::CloseBrace
                ) {
                    self.bump();
                }
                self.error_node(start)
            }
        }
    }

    /// Adjacent string literals concatenate into one constant.
    fn parse_strings(&mut self) -> NodeIndex {
        let start = self.start();
        let kind = if self.at(SyntaxKind::Bytes) {
            ConstantKind::Bytes
        } else {
            ConstantKind::Str
        };
        let mut value = String::new();
        while matches!(self.kind(), SyntaxKind::String | SyntaxKind::Bytes) {
            let token = self.bump();
            value.push_str(&decode_string_literal(self.token_text(token)));
        }
        self.finish_node(
            NodeData::Constant {
                kind,
                value: Some(value),
            },
            start,
        )
    }

    fn parse_paren(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        if self.eat(SyntaxKind::CloseParen) {
            return self.finish_node(NodeData::Tuple { elts: Vec::new() }, start);
        }
        let first = self.parse_star_or_expression();
        if self.eat(SyntaxKind::CloseParen) {
            return first;
        }
        if !self.at(SyntaxKind::Comma) {
            self.expect(SyntaxKind::CloseParen);
            return first;
        }
        let mut elts = vec![first];
        while self.eat(SyntaxKind::Comma) {
            if self.at(SyntaxKind::CloseParen) {
                break;
            }
            elts.push(self.parse_star_or_expression());
        }
        self.expect(SyntaxKind::CloseParen);
        self.finish_node(NodeData::Tuple { elts }, start)
    }

    fn parse_display_elements(&mut self, close: SyntaxKind) -> NodeList {
        let mut elts = Vec::new();
        while !self.at(close) && self.is_expression_start() {
            elts.push(self.parse_star_or_expression());
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        elts
    }

    fn parse_brace(&mut self) -> NodeIndex {
        let start = self.start();
        self.bump();
        if self.eat(SyntaxKind::CloseBrace) {
            return self.finish_node(
                NodeData::Dict {
                    keys: Vec::new(),
                    values: Vec::new(),
                },
                start,
            );
        }
        // `{**m}` is a dict; otherwise the first entry decides between dict and set
        let is_dict = self.at(SyntaxKind::DoubleStar);
        let first_key = if is_dict {
            NodeIndex::NONE
        } else {
            self.parse_star_or_expression()
        };
        if !is_dict && !self.at(SyntaxKind::Colon) {
            let mut elts = vec![first_key];
            while self.eat(SyntaxKind::Comma) {
                if !self.is_expression_start() {
                    break;
                }
                elts.push(self.parse_star_or_expression());
            }
            self.expect(SyntaxKind::CloseBrace);
            return self.finish_node(NodeData::Set { elts }, start);
        }

        let mut keys = Vec::new();
        let mut values = Vec::new();
        let mut pending_key = Some(first_key);
        loop {
            let key = match pending_key.take() {
                Some(key) => key,
                None if self.at(SyntaxKind::DoubleStar) => NodeIndex::NONE,
                None if self.is_expression_start() => self.parse_expression(),
                None => break,
            };
            if key.is_none() {
                self.expect(SyntaxKind::DoubleStar);
                values.push(self.parse_bitor());
            } else {
                self.expect(SyntaxKind::Colon);
                values.push(self.parse_expression());
            }
            keys.push(key);
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseBrace);
        self.finish_node(NodeData::Dict { keys, values }, start)
    }

    /// Parameters of a `def` (annotations allowed) or `lambda`, up to `close`.
    pub(crate) fn parse_parameters(&mut self, close: SyntaxKind, annotated: bool) -> NodeList {
        let mut params = Vec::new();
        while !self.at(close) && !self.at_end_of_line() {
            let start = self.start();
            let kind = match self.kind() {
                SyntaxKind::Star => {
                    self.bump();
                    if self.at(SyntaxKind::Name) {
                        ParamKind::VarArgs
                    } else {
                        ParamKind::KeywordMarker
                    }
                }
                SyntaxKind::DoubleStar => {
                    self.bump();
                    ParamKind::KwArgs
                }
                SyntaxKind::Slash => {
                    self.bump();
                    ParamKind::PositionalMarker
                }
                SyntaxKind::Name => ParamKind::Normal,
                _ => {
                    let span = self.current().span;
                    self.error(codes::EXPECTED_NAME, span, None);
                    break;
                }
            };
            let name = match kind {
                ParamKind::KeywordMarker | ParamKind::PositionalMarker => NodeIndex::NONE,
                _ => self.parse_name(),
            };
            let annotation = if annotated && name.is_some() && self.eat(SyntaxKind::Colon) {
                self.parse_expression()
            } else {
                NodeIndex::NONE
            };
            let default = if kind == ParamKind::Normal && self.eat(SyntaxKind::Equals) {
                self.parse_expression()
            } else {
                NodeIndex::NONE
            };
            params.push(self.finish_node(
                NodeData::Parameter {
                    kind,
                    name,
                    annotation,
                    default,
                },
                start,
            ));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        params
    }

    /// Report targets that cannot be assigned to.
    pub(crate) fn check_assignment_target(&mut self, target: NodeIndex) {
        let Some(node) = self.arena.get(target) else {
            return;
        };
        let span = node.span;
        match &node.data {
            NodeData::Name { .. } | NodeData::Attribute { .. } | NodeData::Subscript { .. } => {}
            NodeData::Error => {}
            NodeData::Tuple { elts } | NodeData::List { elts } => {
                for elt in elts.clone() {
                    self.check_assignment_target(elt);
                }
            }
            NodeData::Starred { value } => {
                let value = *value;
                self.check_assignment_target(value);
            }
            _ => self.error(codes::INVALID_ASSIGNMENT_TARGET, span, None),
        }
    }
}

/// Decode the value of a single string literal token, prefix and quotes
/// included. Escape sequences are decoded unless the literal is raw.
pub fn decode_string_literal(text: &str) -> String {
    let prefix_len = text
        .find(['"', '\''])
        .unwrap_or(text.len());
    let raw = text[..prefix_len].bytes().any(|b| b | 0x20 == b'r');
    let body = &text[prefix_len..];
    let quote_len = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        3
    } else {
        1
    };
    let inner_end = if body.len() >= 2 * quote_len
        && body.get(body.len() - quote_len..) == body.get(..quote_len)
    {
        body.len() - quote_len
    } else {
        body.len()
    };
    let inner = body.get(quote_len.min(inner_end)..inner_end).unwrap_or("");
    if raw {
        return inner.to_string();
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
