use crate::reporter::Reporter;
use pyz::common::TextSpan;
use pyz::common::diagnostics::codes;
use pyz::Diagnostic;

fn undefined_name(file: &str, start: u32, end: u32) -> Diagnostic {
    Diagnostic::from_code(file, TextSpan::new(start, end), codes::UNDEFINED_NAME, &["zzz"])
}

#[test]
fn test_plain_diagnostic_with_snippet() {
    let mut reporter = Reporter::new(false);
    reporter.add_source("main.py", "x = 1\ny = zzz\n");
    let text = reporter.format_diagnostic(&undefined_name("main.py", 10, 13));
    assert_eq!(
        text,
        "main.py:2:5 - error P3001: 'zzz' is not defined\n    2   y = zzz\n            ~~~"
    );
}

#[test]
fn test_unknown_source_falls_back_to_file_name() {
    let mut reporter = Reporter::new(false);
    let text = reporter.format_diagnostic(&undefined_name("other.py", 0, 3));
    assert_eq!(text, "other.py - error P3001: 'zzz' is not defined");
}

#[test]
fn test_render_separates_diagnostics() {
    let mut reporter = Reporter::new(false);
    reporter.add_source("main.py", "zzz\nzzz\n");
    let text = reporter.render(&[
        undefined_name("main.py", 0, 3),
        undefined_name("main.py", 4, 7),
    ]);
    assert_eq!(text.matches("P3001").count(), 2);
    assert!(text.contains("main.py:1:1"));
    assert!(text.contains("main.py:2:1"));
}

#[test]
fn test_summary_pluralizes() {
    let reporter = Reporter::new(false);
    assert_eq!(
        reporter.format_summary(1, 0, 2),
        "Found 1 error and 0 warnings in 2 files."
    );
    assert_eq!(
        reporter.format_summary(3, 1, 1),
        "Found 3 errors and 1 warning in 1 file."
    );
}
