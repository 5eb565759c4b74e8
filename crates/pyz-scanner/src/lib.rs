//! Tokenizer for the pyz analysis engine.
//!
//! This crate provides the lexical analysis phase:
//! - `SyntaxKind` - Token types
//! - `ScannerState` - Tokenizer producing a flat token stream with synthesized
//!   `Newline`, `Indent` and `Dedent` tokens
//!
//! The scanner never fails: invalid characters become `Unknown` tokens and
//! every problem is recorded as a `ScanDiagnostic`.

mod syntax_kind;
pub use syntax_kind::SyntaxKind;

use pyz_common::diagnostics::codes;
use pyz_common::position::TextSpan;
use smallvec::SmallVec;

const TAB_SIZE: u32 = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: TextSpan,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.span.start as usize..self.span.end as usize)
            .unwrap_or("")
    }
}

/// A problem found while scanning, expressed as a diagnostic code plus an
/// optional message argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanDiagnostic {
    pub code: u32,
    pub span: TextSpan,
    pub arg: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<ScanDiagnostic>,
}

pub struct ScannerState<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<ScanDiagnostic>,
    indents: SmallVec<[u32; 16]>,
    /// Open brackets with their offsets; non-empty means implicit line joining.
    brackets: SmallVec<[(u8, u32); 16]>,
    at_line_start: bool,
}

impl<'a> ScannerState<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut indents = SmallVec::new();
        indents.push(0);
        ScannerState {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::with_capacity(source.len() / 4),
            diagnostics: Vec::new(),
            indents,
            brackets: SmallVec::new(),
            at_line_start: true,
        }
    }

    /// Scan the whole source into tokens. The stream always ends with
    /// `Newline` (when the last logical line had tokens), the pending
    /// `Dedent`s, and `EndOfFile`.
    pub fn scan_all(mut self) -> ScanResult {
        while self.pos < self.bytes.len() {
            if self.at_line_start && self.brackets.is_empty() {
                if self.scan_indentation() {
                    continue;
                }
                self.at_line_start = false;
            }
            self.scan_token();
        }
        self.finish();
        ScanResult {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    fn finish(&mut self) {
        let end = self.bytes.len() as u32;
        for &(bracket, offset) in self.brackets.iter().rev() {
            self.diagnostics.push(ScanDiagnostic {
                code: codes::UNCLOSED_BRACKET,
                span: TextSpan::new(offset, offset + 1),
                arg: Some((bracket as char).to_string()),
            });
        }
        if self.line_has_tokens() {
            self.push(SyntaxKind::Newline, end, end);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(SyntaxKind::Dedent, end, end);
        }
        self.push(SyntaxKind::EndOfFile, end, end);
    }

    fn line_has_tokens(&self) -> bool {
        matches!(
            self.tokens.last(),
            Some(t) if !matches!(t.kind, SyntaxKind::Newline | SyntaxKind::Indent | SyntaxKind::Dedent)
        )
    }

    fn push(&mut self, kind: SyntaxKind, start: u32, end: u32) {
        self.tokens.push(Token {
            kind,
            span: TextSpan::new(start, end),
        });
    }

    fn peek(&self, ahead: usize) -> u8 {
        self.bytes.get(self.pos + ahead).copied().unwrap_or(0)
    }

    /// Measure leading whitespace of a physical line and emit layout tokens.
    /// Returns true when the line was blank or comment-only and was skipped.
    fn scan_indentation(&mut self) -> bool {
        let line_start = self.pos;
        let mut column = 0u32;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b' ' => column += 1,
                b'\t' => column = (column / TAB_SIZE + 1) * TAB_SIZE,
                b'\x0c' => column = 0,
                _ => break,
            }
            self.pos += 1;
        }

        match self.peek(0) {
            b'#' => {
                self.skip_comment();
                self.skip_newline();
                return true;
            }
            b'\n' | b'\r' => {
                self.skip_newline();
                return true;
            }
            0 if self.pos >= self.bytes.len() => return true,
            _ => {}
        }

        let top = *self.indents.last().unwrap_or(&0);
        let here = self.pos as u32;
        if column > top {
            self.indents.push(column);
            self.push(SyntaxKind::Indent, line_start as u32, here);
        } else if column < top {
            while self.indents.len() > 1 && *self.indents.last().unwrap_or(&0) > column {
                self.indents.pop();
                self.push(SyntaxKind::Dedent, here, here);
            }
            if *self.indents.last().unwrap_or(&0) != column {
                self.diagnostics.push(ScanDiagnostic {
                    code: codes::INCONSISTENT_DEDENT,
                    span: TextSpan::new(line_start as u32, here),
                    arg: None,
                });
            }
        }
        false
    }

    fn skip_comment(&mut self) {
        while self.pos < self.bytes.len() && !matches!(self.bytes[self.pos], b'\n' | b'\r') {
            self.pos += 1;
        }
    }

    fn skip_newline(&mut self) {
        if self.peek(0) == b'\r' {
            self.pos += 1;
        }
        if self.peek(0) == b'\n' {
            self.pos += 1;
        }
    }

    fn scan_token(&mut self) {
        let start = self.pos;
        let c = self.bytes[self.pos];
        match c {
            b' ' | b'\t' | b'\x0c' => {
                self.pos += 1;
            }
            b'#' => self.skip_comment(),
            b'\n' | b'\r' => {
                self.skip_newline();
                if self.brackets.is_empty() {
                    if self.line_has_tokens() {
                        self.push(SyntaxKind::Newline, start as u32, self.pos as u32);
                    }
                    self.at_line_start = true;
                }
            }
            b'\\' if matches!(self.peek(1), b'\n' | b'\r') => {
                self.pos += 1;
                self.skip_newline();
            }
            b'0'..=b'9' => self.scan_number(),
            b'.' if self.peek(1).is_ascii_digit() => self.scan_number(),
            b'"' | b'\'' => self.scan_string(start, 0),
            _ if is_identifier_start(c) || c >= 0x80 => self.scan_identifier_or_string(),
            _ => self.scan_operator(),
        }
    }

    fn scan_identifier_or_string(&mut self) {
        let start = self.pos;
        // String prefixes: r, b, u, f and their two-letter combinations.
        let prefix_len = string_prefix_len(&self.bytes[self.pos..]);
        if prefix_len > 0 && matches!(self.peek(prefix_len), b'"' | b'\'') {
            self.scan_string(start, prefix_len);
            return;
        }

        let rest = &self.source[self.pos..];
        let mut len = 0;
        let mut valid = true;
        for (i, ch) in rest.char_indices() {
            let ok = if i == 0 {
                ch == '_' || ch.is_alphabetic()
            } else {
                ch == '_' || ch.is_alphanumeric()
            };
            if !ok {
                if i == 0 {
                    valid = false;
                    len = ch.len_utf8();
                }
                break;
            }
            len = i + ch.len_utf8();
        }
        self.pos += len.max(1);
        let end = self.pos as u32;
        if !valid {
            self.diagnostics.push(ScanDiagnostic {
                code: codes::INVALID_CHARACTER,
                span: TextSpan::new(start as u32, end),
                arg: None,
            });
            self.push(SyntaxKind::Unknown, start as u32, end);
            return;
        }
        let text = &self.source[start..self.pos];
        let kind = SyntaxKind::keyword(text).unwrap_or(SyntaxKind::Name);
        self.push(kind, start as u32, end);
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        let mut kind = SyntaxKind::Int;
        if self.peek(0) == b'0' && matches!(self.peek(1) | 0x20, b'x' | b'o' | b'b') {
            self.pos += 2;
            while self.peek(0).is_ascii_hexdigit() || self.peek(0) == b'_' {
                self.pos += 1;
            }
        } else {
            self.eat_digits();
            if self.peek(0) == b'.' {
                kind = SyntaxKind::Float;
                self.pos += 1;
                self.eat_digits();
            }
            if matches!(self.peek(0), b'e' | b'E')
                && (self.peek(1).is_ascii_digit()
                    || (matches!(self.peek(1), b'+' | b'-') && self.peek(2).is_ascii_digit()))
            {
                kind = SyntaxKind::Float;
                self.pos += 2;
                self.eat_digits();
            }
            if matches!(self.peek(0), b'j' | b'J') {
                kind = SyntaxKind::Complex;
                self.pos += 1;
            }
        }
        self.push(kind, start as u32, self.pos as u32);
    }

    fn eat_digits(&mut self) {
        while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
            self.pos += 1;
        }
    }

    fn scan_string(&mut self, start: usize, prefix_len: usize) {
        let is_bytes = self.bytes[start..start + prefix_len]
            .iter()
            .any(|b| b | 0x20 == b'b');
        self.pos = start + prefix_len;
        let quote = self.bytes[self.pos];
        let triple = self.peek(1) == quote && self.peek(2) == quote;
        self.pos += if triple { 3 } else { 1 };

        let mut terminated = false;
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            if c == b'\\' {
                // raw strings still cannot end with an escaped quote
                self.pos += 2;
                continue;
            }
            if c == quote {
                if !triple {
                    self.pos += 1;
                    terminated = true;
                    break;
                }
                if self.peek(1) == quote && self.peek(2) == quote {
                    self.pos += 3;
                    terminated = true;
                    break;
                }
            }
            if !triple && matches!(c, b'\n' | b'\r') {
                break;
            }
            self.pos += 1;
        }
        self.pos = self.pos.min(self.bytes.len());

        if !terminated {
            self.diagnostics.push(ScanDiagnostic {
                code: codes::UNTERMINATED_STRING,
                span: TextSpan::new(start as u32, self.pos as u32),
                arg: None,
            });
        }
        let kind = if is_bytes {
            SyntaxKind::Bytes
        } else {
            SyntaxKind::String
        };
        self.push(kind, start as u32, self.pos as u32);
    }

    fn scan_operator(&mut self) {
        use SyntaxKind::*;
        let start = self.pos;
        let (c0, c1, c2) = (self.peek(0), self.peek(1), self.peek(2));
        let (kind, len) = match (c0, c1, c2) {
            (b'*', b'*', b'=') => (DoubleStarEquals, 3),
            (b'/', b'/', b'=') => (DoubleSlashEquals, 3),
            (b'<', b'<', b'=') => (LeftShiftEquals, 3),
            (b'>', b'>', b'=') => (RightShiftEquals, 3),
            (b'.', b'.', b'.') => (Ellipsis, 3),
            (b'*', b'*', _) => (DoubleStar, 2),
            (b'/', b'/', _) => (DoubleSlash, 2),
            (b'<', b'<', _) => (LeftShift, 2),
            (b'>', b'>', _) => (RightShift, 2),
            (b'<', b'=', _) => (LessEquals, 2),
            (b'>', b'=', _) => (GreaterEquals, 2),
            (b'=', b'=', _) => (EqualsEquals, 2),
            (b'!', b'=', _) => (NotEquals, 2),
            (b'-', b'>', _) => (Arrow, 2),
            (b':', b'=', _) => (ColonEquals, 2),
            (b'+', b'=', _) => (PlusEquals, 2),
            (b'-', b'=', _) => (MinusEquals, 2),
            (b'*', b'=', _) => (StarEquals, 2),
            (b'/', b'=', _) => (SlashEquals, 2),
            (b'%', b'=', _) => (PercentEquals, 2),
            (b'|', b'=', _) => (PipeEquals, 2),
            (b'&', b'=', _) => (AmpersandEquals, 2),
            (b'^', b'=', _) => (CaretEquals, 2),
            (b'@', b'=', _) => (AtEquals, 2),
            (b'(', _, _) => (OpenParen, 1),
            (b')', _, _) => (CloseParen, 1),
            (b'[', _, _) => (OpenBracket, 1),
            (b']', _, _) => (CloseBracket, 1),
            (b'{', _, _) => (OpenBrace, 1),
            (b'}', _, _) => (CloseBrace, 1),
            (b':', _, _) => (Colon, 1),
            (b',', _, _) => (Comma, 1),
            (b';', _, _) => (Semicolon, 1),
            (b'.', _, _) => (Dot, 1),
            (b'@', _, _) => (At, 1),
            (b'=', _, _) => (Equals, 1),
            (b'+', _, _) => (Plus, 1),
            (b'-', _, _) => (Minus, 1),
            (b'*', _, _) => (Star, 1),
            (b'/', _, _) => (Slash, 1),
            (b'%', _, _) => (Percent, 1),
            (b'|', _, _) => (Pipe, 1),
            (b'&', _, _) => (Ampersand, 1),
            (b'^', _, _) => (Caret, 1),
            (b'~', _, _) => (Tilde, 1),
            (b'<', _, _) => (Less, 1),
            (b'>', _, _) => (Greater, 1),
            _ => (Unknown, 1),
        };

        match kind {
            OpenParen | OpenBracket | OpenBrace => self.brackets.push((c0, start as u32)),
            CloseParen | CloseBracket | CloseBrace => {
                self.brackets.pop();
            }
            Unknown => self.diagnostics.push(ScanDiagnostic {
                code: codes::INVALID_CHARACTER,
                span: TextSpan::new(start as u32, (start + len) as u32),
                arg: None,
            }),
            _ => {}
        }
        self.pos += len;
        self.push(kind, start as u32, self.pos as u32);
    }
}

fn is_identifier_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}

fn string_prefix_len(bytes: &[u8]) -> usize {
    let lower = |i: usize| bytes.get(i).map(|b| b | 0x20).unwrap_or(0);
    match (lower(0), lower(1)) {
        (b'r', b'b') | (b'b', b'r') | (b'r', b'f') | (b'f', b'r') => 2,
        (b'r' | b'b' | b'u' | b'f', _) => 1,
        _ => 0,
    }
}

/// Convenience wrapper around [`ScannerState::scan_all`].
pub fn scan(source: &str) -> ScanResult {
    ScannerState::new(source).scan_all()
}

#[cfg(test)]
#[path = "../tests/scanner_tests.rs"]
mod scanner_tests;
