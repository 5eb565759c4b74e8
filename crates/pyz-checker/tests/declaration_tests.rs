use super::*;
use crate::support::TestProgram;
use pyz_common::diagnostics::codes;

#[test]
fn test_last_unconditional_declaration_wins_in_scope() {
    let mut program = TestProgram::single(
        "\
def f():
    v = 1
    v = 'a'
    return v
r = f()
",
    );
    assert_eq!(program.symbol("main.py", "r"), "str");
}

#[test]
fn test_conditional_declarations_join() {
    let mut program = TestProgram::single(
        "\
def pick(flag: bool):
    if flag:
        v = 1
    else:
        v = 'text'
    return v
r = pick(True)
",
    );
    assert_eq!(program.symbol("main.py", "r"), "int | str");
}

#[test]
fn test_conditional_after_unconditional_keeps_both() {
    let mut program = TestProgram::single(
        "\
def f(flag: bool):
    v = 1
    if flag:
        v = 'a'
    return v
r = f(False)
",
    );
    assert_eq!(program.symbol("main.py", "r"), "int | str");
}

#[test]
fn test_outside_reference_sees_all_declarations() {
    let mut program = TestProgram::single(
        "\
x = 1
x = 'a'
def f():
    return x
r = f()
",
    );
    assert_eq!(program.symbol("main.py", "x"), "int | str");
    assert_eq!(program.symbol("main.py", "r"), "int | str");
}

#[test]
fn test_annotation_overrides_inference() {
    let mut program = TestProgram::single(
        "\
x: float = 1
x = 2
y = x
",
    );
    assert_eq!(program.symbol("main.py", "x"), "float");
    assert_eq!(program.symbol("main.py", "y"), "float");
}

#[test]
fn test_tuple_destructuring() {
    let mut program = TestProgram::single(
        "\
a, b = 1, 'x'
first, *rest = [1, 2, 3]
(c, d), e = (1.0, True), None
",
    );
    assert_eq!(program.symbol("main.py", "a"), "int");
    assert_eq!(program.symbol("main.py", "b"), "str");
    assert_eq!(program.symbol("main.py", "first"), "int");
    assert_eq!(program.symbol("main.py", "rest"), "list[int]");
    assert_eq!(program.symbol("main.py", "c"), "float");
    assert_eq!(program.symbol("main.py", "d"), "bool");
    assert_eq!(program.symbol("main.py", "e"), "None");
}

#[test]
fn test_loop_and_with_targets() {
    let mut program = TestProgram::single(
        "\
for i in range(3):
    pass
for k, v in {'a': 1}.items():
    pass
for ch in 'abc':
    pass
class Manager:
    def __enter__(self) -> int:
        return 1
with Manager() as m:
    pass
",
    );
    assert_eq!(program.symbol("main.py", "i"), "int");
    assert_eq!(program.symbol("main.py", "k"), "str");
    assert_eq!(program.symbol("main.py", "v"), "int");
    assert_eq!(program.symbol("main.py", "ch"), "str");
    assert_eq!(program.symbol("main.py", "m"), "int");
}

#[test]
fn test_except_handler_binds_instance() {
    let mut program = TestProgram::single(
        "\
try:
    pass
except (KeyError, IndexError) as err:
    pass
try:
    pass
except ValueError as single:
    pass
",
    );
    assert_eq!(program.symbol("main.py", "err"), "KeyError | IndexError");
    assert_eq!(program.symbol("main.py", "single"), "ValueError");
}

#[test]
fn test_augmented_assignment() {
    let mut program = TestProgram::single(
        "\
total = 0
total += 1.5
words = ['a']
words += ['b']
",
    );
    assert_eq!(program.symbol("main.py", "total"), "int | float");
    assert_eq!(program.symbol("main.py", "words"), "list[str]");
}

#[test]
fn test_parameters() {
    let mut program = TestProgram::single(
        "\
class C:
    def method(self, *args: int, **kwargs: str):
        return self
    @classmethod
    def make(cls):
        return cls
def f(x=3, y=None):
    return x
",
    );
    assert_eq!(program.reveal("main.py", "args: int"), "tuple[int, ...]");
    assert_eq!(program.reveal("main.py", "kwargs"), "dict[str, str]");
    assert_eq!(program.reveal("main.py", "self"), "C");
    assert_eq!(program.reveal("main.py", "cls"), "type[C]");
    assert_eq!(program.reveal("main.py", "x"), "int");
    assert_eq!(program.reveal("main.py", "y"), "Unknown");
}

#[test]
fn test_function_declaration_type() {
    let mut program = TestProgram::single(
        "\
def f(a: int, b: str = 'x', *, c: float) -> bool:
    return True
def g(a):
    return [a]
",
    );
    assert_eq!(
        program.symbol("main.py", "f"),
        "(a: int, b: str = ..., c: float) -> bool"
    );
    assert_eq!(program.symbol("main.py", "g"), "(a) -> Unknown");
}

#[test]
fn test_return_inference() {
    let mut program = TestProgram::single(
        "\
def none():
    pass
def maybe(flag: bool):
    if flag:
        return 1
def both(flag: bool):
    if flag:
        return 1
    else:
        raise ValueError()
a = none()
b = maybe(True)
c = both(True)
",
    );
    assert_eq!(program.symbol("main.py", "a"), "None");
    assert_eq!(program.symbol("main.py", "b"), "int | None");
    assert_eq!(program.symbol("main.py", "c"), "int");
}

#[test]
fn test_cross_file_import() {
    let mut program = TestProgram::new(&[
        ("a.py", "def get() -> int:\n    return 1\nVALUE = 'v'\n"),
        (
            "b.py",
            "from a import get, VALUE\nimport a\nx = get()\ny = a.VALUE\nz = VALUE\n",
        ),
    ]);
    assert_eq!(program.symbol("b.py", "x"), "int");
    assert_eq!(program.symbol("b.py", "y"), "str");
    assert_eq!(program.symbol("b.py", "z"), "str");
    assert_eq!(program.symbol("b.py", "a"), "Module(\"a\")");
    assert!(program.check("b.py").is_empty());
}

#[test]
fn test_relative_and_package_imports() {
    let mut program = TestProgram::new(&[
        ("pkg/__init__.py", "NAME = 'pkg'\n"),
        ("pkg/util.py", "def helper() -> float:\n    return 1.0\n"),
        (
            "pkg/main.py",
            "from . import util\nfrom .util import helper\nfrom . import NAME\nv = helper()\nw = util.helper()\n",
        ),
    ]);
    assert_eq!(program.symbol("pkg/main.py", "util"), "Module(\"pkg.util\")");
    assert_eq!(program.symbol("pkg/main.py", "v"), "float");
    assert_eq!(program.symbol("pkg/main.py", "w"), "float");
    assert_eq!(program.symbol("pkg/main.py", "NAME"), "str");
    assert!(program.check("pkg/main.py").is_empty());
}

#[test]
fn test_wildcard_import() {
    let mut program = TestProgram::new(&[
        ("lib.py", "__all__ = ['shown']\nshown = 1\nhidden = 2\n"),
        ("app.py", "from lib import *\nv = shown\n"),
    ]);
    assert_eq!(program.symbol("app.py", "v"), "int");
    assert!(program.check("app.py").is_empty());
}

#[test]
fn test_import_problems() {
    let mut program = TestProgram::new(&[
        ("a.py", "x = 1\n"),
        ("b.py", "import missing\nfrom a import y\nv = y\n"),
    ]);
    assert_eq!(
        program.codes("b.py"),
        vec![codes::UNRESOLVED_IMPORT, codes::UNKNOWN_IMPORT_SYMBOL]
    );
    assert_eq!(program.symbol("b.py", "v"), "Unknown");
}

#[test]
fn test_unresolved_imports_can_be_silenced() {
    let mut program = TestProgram::single("import missing\n");
    program.options.report_unresolved_imports = false;
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_instance_attributes() {
    let mut program = TestProgram::single(
        "\
class Point:
    def __init__(self, x: int):
        self.x = x
        self.label: str = 'p'
p = Point(1)
a = p.x
b = p.label
",
    );
    assert_eq!(program.symbol("main.py", "a"), "int");
    assert_eq!(program.symbol("main.py", "b"), "str");
    assert!(program.check("main.py").is_empty());
}
