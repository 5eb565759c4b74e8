use super::*;

#[test]
fn test_empty_config_uses_defaults() {
    let options = AnalysisOptions::from_json("{}").expect("valid config");
    assert_eq!(options, AnalysisOptions::default());
    assert_eq!(options.python_version, PythonVersion::new(3, 12));
    assert_eq!(options.invalidation, InvalidationMode::PublicSymbols);
}

#[test]
fn test_camel_case_fields() {
    let options = AnalysisOptions::from_json(
        r#"{
            "pythonVersion": "3.9",
            "pythonPlatform": "Windows",
            "searchPaths": ["typings"],
            "invalidation": "dependentsOnly",
            "reportUnresolvedImports": false
        }"#,
    )
    .expect("valid config");
    assert_eq!(options.python_version, PythonVersion::new(3, 9));
    assert_eq!(options.python_platform, PythonPlatform::Windows);
    assert_eq!(options.search_paths, vec!["typings".to_string()]);
    assert_eq!(options.invalidation, InvalidationMode::DependentsOnly);
    assert!(!options.report_unresolved_imports);
}

#[test]
fn test_invalid_version_is_rejected() {
    assert!(AnalysisOptions::from_json(r#"{"pythonVersion": "three"}"#).is_err());
    assert_eq!(PythonVersion::parse("3.11"), Some(PythonVersion::new(3, 11)));
    assert_eq!(PythonVersion::new(3, 8).to_string(), "3.8");
}
