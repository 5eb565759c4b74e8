use crate::position::TextSpan;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Information,
}

/// Which part of the fault taxonomy produced a diagnostic.
///
/// Stale handles and fatal faults are not diagnostics: the first is a
/// "not found" lookup result, the second surfaces as `ProgramError::Fatal`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FaultKind {
    /// Malformed input; analysis continues with a best-effort tree.
    Syntax,
    /// Scope-structure errors found by the binder.
    Binding,
    /// A symbol or import could not be resolved; the type becomes unknown.
    Resolution,
    /// Type mismatches reported by the evaluator.
    Type,
    /// Evaluation hit a depth limit; the type becomes unknown.
    CycleGuard,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub kind: FaultKind,
    pub message: &'static str,
}

pub mod codes {
    // Syntax
    pub const UNEXPECTED_TOKEN: u32 = 1001;
    pub const EXPECTED_EXPRESSION: u32 = 1002;
    pub const EXPECTED_INDENTED_BLOCK: u32 = 1003;
    pub const UNEXPECTED_INDENT: u32 = 1004;
    pub const INCONSISTENT_DEDENT: u32 = 1005;
    pub const UNTERMINATED_STRING: u32 = 1006;
    pub const UNCLOSED_BRACKET: u32 = 1007;
    pub const INVALID_CHARACTER: u32 = 1008;
    pub const INVALID_ASSIGNMENT_TARGET: u32 = 1009;
    pub const EXPECTED_NAME: u32 = 1010;
    pub const EXPECTED_TOKEN: u32 = 1011;

    // Binding
    pub const DUPLICATE_PARAMETER: u32 = 2001;
    pub const RETURN_OUTSIDE_FUNCTION: u32 = 2002;
    pub const NONLOCAL_AT_MODULE_LEVEL: u32 = 2003;
    pub const LOOP_CONTROL_OUTSIDE_LOOP: u32 = 2004;

    // Resolution
    pub const UNDEFINED_NAME: u32 = 3001;
    pub const UNRESOLVED_IMPORT: u32 = 3002;
    pub const UNKNOWN_IMPORT_SYMBOL: u32 = 3003;
    pub const UNKNOWN_ATTRIBUTE: u32 = 3004;

    // Type
    pub const ARGUMENT_TYPE_MISMATCH: u32 = 4001;
    pub const ARGUMENT_COUNT_MISMATCH: u32 = 4002;
    pub const UNSUPPORTED_OPERATOR: u32 = 4003;
    pub const NOT_CALLABLE: u32 = 4004;
    pub const NOT_SUBSCRIPTABLE: u32 = 4005;
    pub const ASSIGNMENT_TYPE_MISMATCH: u32 = 4006;
    pub const UNKNOWN_KEYWORD_ARGUMENT: u32 = 4007;
    pub const RETURN_TYPE_MISMATCH: u32 = 4008;

    // Cycle guard
    pub const EVALUATION_TOO_DEEP: u32 = 5001;
}

use DiagnosticCategory::{Error, Warning};
use FaultKind::{Binding, CycleGuard, Resolution, Syntax, Type};

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    msg(codes::UNEXPECTED_TOKEN, Error, Syntax, "Unexpected token '{0}'"),
    msg(codes::EXPECTED_EXPRESSION, Error, Syntax, "Expected expression"),
    msg(codes::EXPECTED_INDENTED_BLOCK, Error, Syntax, "Expected indented block"),
    msg(codes::UNEXPECTED_INDENT, Error, Syntax, "Unexpected indentation"),
    msg(codes::INCONSISTENT_DEDENT, Error, Syntax, "Unindent not expected"),
    msg(codes::UNTERMINATED_STRING, Error, Syntax, "String literal is unterminated"),
    msg(codes::UNCLOSED_BRACKET, Error, Syntax, "'{0}' was not closed"),
    msg(codes::INVALID_CHARACTER, Error, Syntax, "Invalid character in identifier"),
    msg(codes::INVALID_ASSIGNMENT_TARGET, Error, Syntax, "Expression cannot be assignment target"),
    msg(codes::EXPECTED_NAME, Error, Syntax, "Expected name"),
    msg(codes::EXPECTED_TOKEN, Error, Syntax, "Expected '{0}'"),
    msg(codes::DUPLICATE_PARAMETER, Error, Binding, "Duplicate parameter '{0}'"),
    msg(codes::RETURN_OUTSIDE_FUNCTION, Error, Binding, "'return' can be used only within a function"),
    msg(codes::NONLOCAL_AT_MODULE_LEVEL, Error, Binding, "Nonlocal declaration not allowed at module level"),
    msg(codes::LOOP_CONTROL_OUTSIDE_LOOP, Error, Binding, "'{0}' can be used only within a loop"),
    msg(codes::UNDEFINED_NAME, Error, Resolution, "'{0}' is not defined"),
    msg(codes::UNRESOLVED_IMPORT, Error, Resolution, "Import '{0}' could not be resolved"),
    msg(codes::UNKNOWN_IMPORT_SYMBOL, Error, Resolution, "'{0}' is unknown import symbol"),
    msg(codes::UNKNOWN_ATTRIBUTE, Error, Resolution, "Cannot access attribute '{0}' for type '{1}'"),
    msg(codes::ARGUMENT_TYPE_MISMATCH, Error, Type, "Argument of type '{0}' cannot be assigned to parameter '{1}' of type '{2}'"),
    msg(codes::ARGUMENT_COUNT_MISMATCH, Error, Type, "Expected {0} positional arguments, got {1}"),
    msg(codes::UNSUPPORTED_OPERATOR, Error, Type, "Operator '{0}' not supported for types '{1}' and '{2}'"),
    msg(codes::NOT_CALLABLE, Error, Type, "Object of type '{0}' is not callable"),
    msg(codes::NOT_SUBSCRIPTABLE, Error, Type, "Object of type '{0}' is not subscriptable"),
    msg(codes::ASSIGNMENT_TYPE_MISMATCH, Error, Type, "Type '{0}' is not assignable to declared type '{1}'"),
    msg(codes::UNKNOWN_KEYWORD_ARGUMENT, Error, Type, "No parameter named '{0}'"),
    msg(codes::RETURN_TYPE_MISMATCH, Error, Type, "Type '{0}' is not assignable to return type '{1}'"),
    msg(codes::EVALUATION_TOO_DEEP, Warning, CycleGuard, "Type evaluation exceeded maximum depth"),
];

const fn msg(
    code: u32,
    category: DiagnosticCategory,
    kind: FaultKind,
    message: &'static str,
) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category,
        kind,
        message,
    }
}

pub fn get_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub kind: FaultKind,
    pub code: u32,
    pub file: String,
    pub span: TextSpan,
    pub message_text: String,
}

impl Diagnostic {
    /// Build a diagnostic from the message table.
    ///
    /// Unknown codes still produce a diagnostic so a typo can never drop a
    /// report on the floor.
    pub fn from_code(file: impl Into<String>, span: TextSpan, code: u32, args: &[&str]) -> Self {
        match get_message(code) {
            Some(m) => Self {
                category: m.category,
                kind: m.kind,
                code,
                file: file.into(),
                span,
                message_text: format_message(m.message, args),
            },
            None => Self {
                category: DiagnosticCategory::Error,
                kind: FaultKind::Type,
                code,
                file: file.into(),
                span,
                message_text: args.join(" "),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Key used to de-duplicate diagnostics reported more than once for the
    /// same site (for example when an incomplete evaluation is retried).
    pub fn dedup_key(&self) -> (u32, u32, u32) {
        (self.span.start, self.span.len(), self.code)
    }
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod diagnostics_tests;
