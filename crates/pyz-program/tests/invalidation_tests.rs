use super::*;
use pyz_binder::bind;
use pyz_parser::parse;

fn exports(source: &str) -> PublicSymbols {
    let tree = parse::<()>(source).tree;
    bind(&tree).public_symbols()
}

#[test]
fn test_body_changes_stay_local() {
    let before = exports("def f(x: int) -> int:\n    return x\n");
    let after = exports("def f(x: int) -> str:\n    return 'changed'\n");
    assert_eq!(PublicSymbolPolicy.scope(&before, &after), InvalidationScope::Local);
}

#[test]
fn test_export_changes_are_full() {
    let base = exports("def f():\n    pass\n");
    let added = exports("def f():\n    pass\ng = 1\n");
    let kind_changed = exports("f = 1\n");
    assert_eq!(PublicSymbolPolicy.scope(&base, &added), InvalidationScope::Full);
    assert_eq!(PublicSymbolPolicy.scope(&base, &kind_changed), InvalidationScope::Full);
    assert_eq!(PublicSymbolPolicy.scope(&added, &base), InvalidationScope::Full);
}

#[test]
fn test_private_names_do_not_count() {
    let before = exports("x = 1\n");
    let after = exports("x = 1\n_helper = 2\n");
    assert_eq!(PublicSymbolPolicy.scope(&before, &after), InvalidationScope::Local);
}

#[test]
fn test_fixed_policies_ignore_symbols() {
    let a = exports("a = 1\n");
    let b = exports("b = 1\n");
    assert_eq!(AlwaysFull.scope(&a, &a), InvalidationScope::Full);
    assert_eq!(DependentsOnly.scope(&a, &b), InvalidationScope::Local);
}

#[test]
fn test_policy_for_mode() {
    assert_eq!(policy_for(InvalidationMode::PublicSymbols).name(), "publicSymbols");
    assert_eq!(policy_for(InvalidationMode::Always).name(), "always");
    assert_eq!(policy_for(InvalidationMode::DependentsOnly).name(), "dependentsOnly");
}
