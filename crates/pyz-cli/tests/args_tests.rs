use crate::args::{CliArgs, Invalidation, OutputFormat, Platform};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_defaults() {
    let args = CliArgs::try_parse_from(["pyz"]).expect("parse");
    assert!(args.paths.is_empty());
    assert!(args.project.is_none());
    assert_eq!(args.format, OutputFormat::Text);
    assert!(args.pretty.is_none());
    assert!(!args.stats);
}

#[test]
fn test_paths_and_camel_case_flags() {
    let args = CliArgs::try_parse_from([
        "pyz",
        "src",
        "main.py",
        "--pythonVersion",
        "3.11",
        "--pythonPlatform",
        "darwin",
        "--searchPath",
        "vendor",
        "--searchPath",
        "stubs",
        "--invalidation",
        "dependentsOnly",
    ])
    .expect("parse");
    assert_eq!(args.paths, vec![PathBuf::from("src"), PathBuf::from("main.py")]);
    assert_eq!(args.python_version.as_deref(), Some("3.11"));
    assert_eq!(args.python_platform, Some(Platform::Darwin));
    assert_eq!(args.search_paths, vec!["vendor", "stubs"]);
    assert_eq!(args.invalidation, Some(Invalidation::DependentsOnly));
}

#[test]
fn test_kebab_case_aliases() {
    let args = CliArgs::try_parse_from([
        "pyz",
        "--python-version",
        "3.10",
        "--ignore-unresolved-imports",
        "--max-evaluation-depth",
        "50",
        "--format",
        "json",
    ])
    .expect("parse");
    assert_eq!(args.python_version.as_deref(), Some("3.10"));
    assert!(args.ignore_unresolved_imports);
    assert_eq!(args.max_evaluation_depth, Some(50));
    assert_eq!(args.format, OutputFormat::Json);
}

#[test]
fn test_unknown_invalidation_mode_is_rejected() {
    assert!(CliArgs::try_parse_from(["pyz", "--invalidation", "sometimes"]).is_err());
}
