use super::*;

#[test]
fn test_from_code_formats_arguments() {
    let diag = Diagnostic::from_code("a.py", TextSpan::new(3, 6), codes::UNDEFINED_NAME, &["foo"]);
    assert_eq!(diag.message_text, "'foo' is not defined");
    assert_eq!(diag.kind, FaultKind::Resolution);
    assert!(diag.is_error());
    assert_eq!(diag.dedup_key(), (3, 3, codes::UNDEFINED_NAME));
}

#[test]
fn test_cycle_guard_is_a_warning() {
    let diag = Diagnostic::from_code("a.py", TextSpan::new(0, 1), codes::EVALUATION_TOO_DEEP, &[]);
    assert_eq!(diag.category, DiagnosticCategory::Warning);
    assert_eq!(diag.kind, FaultKind::CycleGuard);
}

#[test]
fn test_message_codes_are_unique() {
    let mut seen = rustc_hash::FxHashSet::default();
    for m in DIAGNOSTIC_MESSAGES {
        assert!(seen.insert(m.code), "duplicate code {}", m.code);
    }
}

#[test]
fn test_format_message_multiple_placeholders() {
    let text = format_message("Operator '{0}' not supported for '{1}' and '{2}'", &["+", "int", "str"]);
    assert_eq!(text, "Operator '+' not supported for 'int' and 'str'");
}
