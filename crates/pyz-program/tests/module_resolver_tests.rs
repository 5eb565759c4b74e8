use super::*;

fn exists_in(files: &'static [&'static str]) -> impl Fn(&str) -> bool {
    move |path| files.iter().any(|f| *f == path)
}

#[test]
fn test_candidate_order_prefers_stubs_then_modules() {
    let resolver = ModuleResolver::new(&[String::new()], &[]);
    let exists = exists_in(&["m.py", "m.pyi", "m/__init__.py"]);
    assert_eq!(
        resolver.resolve("main.py", "m", 0, &exists),
        Some("m.pyi".to_string())
    );

    let exists = exists_in(&["m/__init__.py", "m/__init__.pyi"]);
    assert_eq!(
        resolver.resolve("main.py", "m", 0, &exists),
        Some("m/__init__.pyi".to_string())
    );
}

#[test]
fn test_absolute_imports_try_importer_dir_then_roots_then_search_paths() {
    let resolver = ModuleResolver::new(&["src".to_string()], &["site".to_string()]);
    let exists = exists_in(&["app/util.py", "src/util.py", "site/ext.py"]);
    assert_eq!(
        resolver.resolve("app/main.py", "util", 0, &exists),
        Some("app/util.py".to_string())
    );
    assert_eq!(
        resolver.resolve("other/main.py", "util", 0, &exists),
        Some("src/util.py".to_string())
    );
    assert_eq!(
        resolver.resolve("app/main.py", "ext", 0, &exists),
        Some("site/ext.py".to_string())
    );
    assert_eq!(resolver.resolve("app/main.py", "missing", 0, &exists), None);
}

#[test]
fn test_relative_imports() {
    let resolver = ModuleResolver::new(&[String::new()], &[]);
    let exists = exists_in(&["pkg/__init__.py", "pkg/util.py", "pkg/sub/mod.py", "top.py"]);
    assert_eq!(
        resolver.resolve("pkg/sub/mod.py", "util", 2, &exists),
        Some("pkg/util.py".to_string())
    );
    assert_eq!(
        resolver.resolve("pkg/util.py", "", 1, &exists),
        Some("pkg/__init__.py".to_string())
    );
    assert_eq!(resolver.resolve("top.py", "x", 2, &exists), None);
}

#[test]
fn test_dotted_modules_and_submodules() {
    let resolver = ModuleResolver::new(&[String::new()], &[]);
    let exists = exists_in(&["a/__init__.py", "a/b.py"]);
    assert_eq!(
        resolver.resolve("main.py", "a.b", 0, &exists),
        Some("a/b.py".to_string())
    );
    assert_eq!(
        resolver.resolve_submodule("a/__init__.py", "b", &exists),
        Some("a/b.py".to_string())
    );
    assert_eq!(resolver.resolve_submodule("a/b.py", "c", &exists), None);
}

#[test]
fn test_module_names() {
    let resolver = ModuleResolver::new(&["src".to_string()], &["lib/site".to_string()]);
    assert_eq!(resolver.module_name("src/pkg/mod.py"), ("pkg.mod".to_string(), false));
    assert_eq!(resolver.module_name("src/pkg/__init__.py"), ("pkg".to_string(), true));
    assert_eq!(resolver.module_name("lib/site/ext.pyi"), ("ext".to_string(), false));
    assert_eq!(resolver.module_name("tool.py"), ("tool".to_string(), false));
    assert!(is_package_file("__init__.py"));
    assert!(!is_package_file("my__init__.py"));
}
