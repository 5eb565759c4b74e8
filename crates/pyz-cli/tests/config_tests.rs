use crate::args::CliArgs;
use crate::config::*;
use clap::Parser;
use pyz::common::{InvalidationMode, PythonPlatform, PythonVersion};

#[test]
fn test_parse_config_flattens_options() {
    let config = parse_config(
        r#"{
            "pythonVersion": "3.9",
            "searchPaths": ["vendor"],
            "invalidation": "always",
            "include": ["src"],
            "exclude": ["**/generated/**"]
        }"#,
    )
    .expect("config");
    assert_eq!(config.options.python_version, PythonVersion::new(3, 9));
    assert_eq!(config.options.search_paths, vec!["vendor"]);
    assert_eq!(config.options.invalidation, InvalidationMode::Always);
    assert!(config.options.report_unresolved_imports);
    assert_eq!(config.include, Some(vec!["src".to_string()]));
    assert_eq!(config.exclude, Some(vec!["**/generated/**".to_string()]));
}

#[test]
fn test_parse_config_rejects_bad_version() {
    assert!(parse_config(r#"{ "pythonVersion": "three" }"#).is_err());
}

#[test]
fn test_command_line_overrides_config() {
    let config = parse_config(r#"{ "pythonVersion": "3.9", "searchPaths": ["vendor"] }"#)
        .expect("config");
    let args = CliArgs::try_parse_from([
        "pyz",
        "--pythonVersion",
        "3.13",
        "--pythonPlatform",
        "windows",
        "--searchPath",
        "extra",
        "--ignoreUnresolvedImports",
    ])
    .expect("args");
    let options = resolve_options(&args, Some(&config)).expect("options");
    assert_eq!(options.python_version, PythonVersion::new(3, 13));
    assert_eq!(options.python_platform, PythonPlatform::Windows);
    assert_eq!(options.search_paths, vec!["vendor", "extra"]);
    assert!(!options.report_unresolved_imports);
}

#[test]
fn test_invalid_overrides_fail() {
    let args = CliArgs::try_parse_from(["pyz", "--pythonVersion", "latest"]).expect("args");
    assert!(resolve_options(&args, None).is_err());
    let args = CliArgs::try_parse_from(["pyz", "--maxEvaluationDepth", "0"]).expect("args");
    assert!(resolve_options(&args, None).is_err());
}

#[test]
fn test_find_config_walks_up() {
    let dir = tempfile::tempdir().expect("temp dir");
    let nested = dir.path().join("a").join("b");
    std::fs::create_dir_all(&nested).expect("mkdir");
    assert_ne!(find_config(&nested), Some(dir.path().join(CONFIG_FILE_NAME)));

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{}").expect("write");
    assert_eq!(find_config(&nested), Some(dir.path().join(CONFIG_FILE_NAME)));
    assert_eq!(
        config_base_dir(&nested, Some(&dir.path().join(CONFIG_FILE_NAME))),
        dir.path()
    );
}

#[test]
fn test_project_flag_accepts_directory_or_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&config, "{}").expect("write");

    let from_dir = resolve_config_path(dir.path(), Some(dir.path())).expect("dir");
    assert_eq!(from_dir, Some(config.clone()));
    let from_file = resolve_config_path(dir.path(), Some(&config)).expect("file");
    assert_eq!(from_file, Some(config));
    assert!(resolve_config_path(dir.path(), Some(&dir.path().join("missing.json"))).is_err());
}
