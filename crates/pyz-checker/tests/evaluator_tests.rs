use super::*;
use crate::support::TestProgram;
use pyz_common::diagnostics::codes;

#[test]
fn test_literal_and_arithmetic_types() {
    let mut program = TestProgram::single(
        "\
x = 1
y = x + 2.0
z = 'a' * 3
b = not x
n = None
t = (1, 'a')
",
    );
    assert_eq!(program.symbol("main.py", "x"), "int");
    assert_eq!(program.symbol("main.py", "y"), "float");
    assert_eq!(program.symbol("main.py", "z"), "str");
    assert_eq!(program.symbol("main.py", "b"), "bool");
    assert_eq!(program.symbol("main.py", "n"), "None");
    assert_eq!(program.symbol("main.py", "t"), "tuple[int, str]");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_container_displays() {
    let mut program = TestProgram::single(
        "\
a = [1, 2]
b = {'k': 1.5}
c = {1, 'x'}
d = []
e = (*a, 3)
",
    );
    assert_eq!(program.symbol("main.py", "a"), "list[int]");
    assert_eq!(program.symbol("main.py", "b"), "dict[str, float]");
    assert_eq!(program.symbol("main.py", "c"), "set[int | str]");
    assert_eq!(program.symbol("main.py", "d"), "list[Unknown]");
    assert_eq!(program.symbol("main.py", "e"), "tuple[int, ...]");
}

#[test]
fn test_self_referential_alias_is_finite_and_memoized() {
    let mut program = TestProgram::single("A = list[A]\n");
    assert_eq!(program.symbol("main.py", "A"), "type[list[A]]");

    let file = program.file("main.py");
    let symbol = program.files[0].binding.module_symbol("A").expect("symbol");
    let first = program.with_evaluator(|ev| ev.symbol_type(file, symbol));
    let second = program.with_evaluator(|ev| ev.symbol_type(file, symbol));
    assert_eq!(first, second);
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_memo_entries_are_written_to_the_tree() {
    let mut program = TestProgram::single("x = 1\ny = x\n");
    assert!(program.files[0].tree.is_clean());
    program.check("main.py");
    assert!(!program.files[0].tree.is_clean());

    let node = program.node_for("main.py", "x");
    let entry = program.files[0].tree.analysis.get(node).cloned();
    assert_eq!(entry.and_then(|e| e.expr_type), Some(TypeId::INT));
}

#[test]
fn test_mutual_recursion_terminates() {
    let mut program = TestProgram::single(
        "\
def f():
    return g()
def g():
    return f()
r = f()
",
    );
    assert_eq!(program.symbol("main.py", "r"), "Unknown");
    let reported = program.codes("main.py");
    assert!(!reported.contains(&codes::EVALUATION_TOO_DEEP));
}

#[test]
fn test_mutually_recursive_arithmetic_is_unknown_not_never() {
    let mut program = TestProgram::single(
        "\
def f(n: int):
    return g(n) + 1
def g(n: int):
    return f(n) + 1
x = f(1)
y = x
",
    );
    assert_eq!(program.symbol("main.py", "x"), "Unknown");
    assert_eq!(program.symbol("main.py", "y"), "Unknown");
    assert_eq!(program.symbol("main.py", "x"), "Unknown");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_recursive_return_seeds_from_base_case() {
    let mut program = TestProgram::single(
        "\
def count(items: list[str], n: int):
    if n == 0:
        return ''
    return count(items, n - 1) + items[0]
s = count(['a'], 2)
",
    );
    assert_eq!(program.symbol("main.py", "s"), "str");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_recursive_function_return_is_inferred() {
    let mut program = TestProgram::single(
        "\
def fact(n: int):
    if n <= 1:
        return 1
    return n * fact(n - 1)
r = fact(5)
",
    );
    assert_eq!(program.symbol("main.py", "r"), "int");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_depth_limit_reports_warning() {
    let mut source = String::from("x0 = 1\n");
    for i in 1..40 {
        source.push_str(&format!("x{i} = x{}\n", i - 1));
    }
    let mut program = TestProgram::single(&source);
    program.options.max_depth = 10;

    assert_eq!(program.symbol("main.py", "x39"), "Unknown");
    let file = program.file("main.py");
    let reported = program.diagnostics.get(&file).cloned().unwrap_or_default();
    assert!(reported.iter().any(|d| d.code == codes::EVALUATION_TOO_DEEP));
    assert!(reported.iter().all(|d| !d.is_error()));
}

#[test]
fn test_undefined_name() {
    let mut program = TestProgram::single("y = missing + 1\n");
    assert_eq!(program.messages("main.py"), vec!["'missing' is not defined"]);
    assert_eq!(program.symbol("main.py", "y"), "Unknown");
}

#[test]
fn test_builtins_resolve() {
    let mut program = TestProgram::single(
        "\
n = len([1])
s = str(n)
r = range(3)
f = float
",
    );
    assert_eq!(program.symbol("main.py", "n"), "int");
    assert_eq!(program.symbol("main.py", "s"), "str");
    assert_eq!(program.symbol("main.py", "r"), "range");
    assert_eq!(program.symbol("main.py", "f"), "type[float]");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_unsupported_operator() {
    let mut program = TestProgram::single("v = 1 + 'a'\n");
    assert_eq!(
        program.messages("main.py"),
        vec!["Operator '+' not supported for types 'int' and 'str'"]
    );
}

#[test]
fn test_subscripts() {
    let mut program = TestProgram::single(
        "\
xs = [1, 2]
d = {'a': 1.0}
a = xs[0]
b = d['a']
c = 'abc'[1:]
e = xs[1:]
bad = 3[0]
",
    );
    assert_eq!(program.symbol("main.py", "a"), "int");
    assert_eq!(program.symbol("main.py", "b"), "float");
    assert_eq!(program.symbol("main.py", "c"), "str");
    assert_eq!(program.symbol("main.py", "e"), "list[int]");
    assert_eq!(program.codes("main.py"), vec![codes::NOT_SUBSCRIPTABLE]);
}

#[test]
fn test_type_forms_in_annotations() {
    let mut program = TestProgram::single(
        "\
a: list[int] = []
b: dict[str, int | None] = {}
c: 'Node'
class Node:
    pass
",
    );
    assert_eq!(program.symbol("main.py", "a"), "list[int]");
    assert_eq!(program.symbol("main.py", "b"), "dict[str, int | None]");
    assert_eq!(program.symbol("main.py", "c"), "Node");
}

#[test]
fn test_lambda_type() {
    let mut program = TestProgram::single("f = lambda x, y=1: 'r'\nv = f(0)\n");
    assert_eq!(program.symbol("main.py", "f"), "(x, y = ...) -> str");
    assert_eq!(program.symbol("main.py", "v"), "str");
}
