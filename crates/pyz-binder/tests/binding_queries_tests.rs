use super::*;
use pyz_parser::{NodeData, ParseTree, parse};

fn bind_source(source: &str) -> (ParseTree, Binding) {
    let tree = parse::<()>(source).tree;
    let binding = bind(&tree);
    (tree, binding)
}

/// Index of the `n`th `Name` node spelling `text`, in preorder.
fn nth_name(tree: &ParseTree, text: &str, n: usize) -> pyz_parser::NodeIndex {
    let mut found = Vec::new();
    tree.arena().walk(tree.root(), |idx, node| {
        if let NodeData::Name { .. } = node.data
            && tree.arena().name_text(idx) == Some(text)
        {
            found.push(idx);
        }
    });
    found[n]
}

#[test]
fn test_resolve_name_walks_enclosing_scopes() {
    let (tree, binding) = bind_source(
        "\
limit = 10
def outer():
    step = 1
    def inner():
        return limit + step
",
    );
    let use_of_step = nth_name(&tree, "step", 1);
    let scope = binding.scope_of_name(use_of_step).expect("use scope");
    assert_eq!(binding.scope(scope).map(|s| s.kind), Some(ScopeKind::Function));

    let step = binding.resolve_name(scope, "step").expect("step resolves");
    assert_ne!(binding.symbol(step).map(|s| s.scope), Some(ScopeId::MODULE));
    let limit = binding.resolve_name(scope, "limit").expect("limit resolves");
    assert_eq!(binding.symbol(limit).map(|s| s.scope), Some(ScopeId::MODULE));
    assert!(binding.resolve_name(scope, "missing").is_none());
}

#[test]
fn test_class_scope_is_skipped_from_methods() {
    let (tree, binding) = bind_source(
        "\
size = 'module'
class Box:
    size = 3
    width = size
    def area(self):
        return size
",
    );
    let in_class = nth_name(&tree, "size", 2);
    let class_scope = binding.scope_of_name(in_class).expect("class scope");
    let from_class = binding.resolve_name(class_scope, "size").expect("size");
    assert_eq!(binding.symbol(from_class).map(|s| s.scope), Some(class_scope));

    let in_method = nth_name(&tree, "size", 3);
    let method_scope = binding.scope_of_name(in_method).expect("method scope");
    let from_method = binding.resolve_name(method_scope, "size").expect("size");
    assert_eq!(
        binding.symbol(from_method).map(|s| s.scope),
        Some(ScopeId::MODULE)
    );
}

#[test]
fn test_global_lookup_goes_to_module() {
    let (tree, binding) = bind_source(
        "\
def f():
    global x
    x = 1
    return x
def g():
    x = 2
    return x
",
    );
    let use_in_f = nth_name(&tree, "x", 2);
    let f_scope = binding.scope_of_name(use_in_f).expect("f scope");
    let resolved = binding.resolve_name(f_scope, "x").expect("x");
    assert_eq!(binding.symbol(resolved).map(|s| s.scope), Some(ScopeId::MODULE));

    let use_in_g = nth_name(&tree, "x", 4);
    let g_scope = binding.scope_of_name(use_in_g).expect("g scope");
    let resolved = binding.resolve_name(g_scope, "x").expect("x");
    assert_eq!(binding.symbol(resolved).map(|s| s.scope), Some(g_scope));
}

#[test]
fn test_declaration_at_maps_name_nodes() {
    let (tree, binding) = bind_source("total = 0\ntotal = total + 1\n");
    let first = nth_name(&tree, "total", 0);
    let decl = binding.declaration_at(first).expect("declaration");
    assert_eq!(binding.declaration(decl).map(|d| d.name.as_str()), Some("total"));

    let read = nth_name(&tree, "total", 2);
    assert!(binding.declaration_at(read).is_none());
    assert_eq!(binding.scope_of_name(read), Some(ScopeId::MODULE));
}

#[test]
fn test_attribute_and_keyword_names_are_not_uses() {
    let (tree, binding) = bind_source("obj.field\ncall(key=1)\n");
    let field = nth_name(&tree, "field", 0);
    assert!(binding.scope_of_name(field).is_none());
    let key = nth_name(&tree, "key", 0);
    assert!(binding.scope_of_name(key).is_none());
    let obj = nth_name(&tree, "obj", 0);
    assert_eq!(binding.scope_of_name(obj), Some(ScopeId::MODULE));
}

#[test]
fn test_public_symbols_tracks_exported_kinds() {
    let (_, before) = bind_source("def api(): pass\n_helper = 1\nVALUE = 2\n");
    let public = before.public_symbols();
    assert_eq!(public.len(), 2);
    assert!(public.contains("api"));
    assert!(!public.contains("_helper"));
    assert_eq!(public.kind("VALUE"), Some(DeclarationKind::Variable));

    let (_, body_edit) = bind_source("def api(): return 3\n_helper = 1\nVALUE = 2\n");
    assert_eq!(body_edit.public_symbols(), public);

    let (_, kind_change) = bind_source("class api: pass\n_helper = 1\nVALUE = 2\n");
    assert_ne!(kind_change.public_symbols(), public);
}

#[test]
fn test_add_wildcard_names_inserts_in_position_order() {
    let (_, mut binding) = bind_source("helper = 0\nfrom util import *\nlater = helper\n");
    let import = binding.wildcard_imports()[0];
    binding.add_wildcard_names(import, &["helper".to_string(), "_hidden".to_string()]);

    let helper = binding.module_symbol("helper").expect("helper");
    let kinds: Vec<DeclarationKind> = binding
        .symbol_declarations(helper)
        .iter()
        .filter_map(|&d| binding.declaration(d))
        .map(|d| d.kind)
        .collect();
    assert_eq!(kinds, vec![DeclarationKind::Variable, DeclarationKind::Alias]);

    let hidden = binding.module_symbol("_hidden").expect("_hidden");
    let decl = binding
        .declaration(binding.symbol_declarations(hidden)[0])
        .expect("wildcard decl");
    assert!(decl.flags.contains(DeclFlags::WILDCARD));
    assert!(!decl.is_exported());
    assert_eq!(
        decl.alias.as_ref().and_then(|a| a.member.as_deref()),
        Some("_hidden")
    );
    assert!(binding.public_symbols().contains("helper"));
}

#[test]
fn test_add_wildcard_names_ignores_unknown_import() {
    let (_, mut binding) = bind_source("x = 1\n");
    binding.add_wildcard_names(7, &["y".to_string()]);
    assert!(binding.module_symbol("y").is_none());
}
