use super::*;
use crate::support::TestProgram;
use pyz_common::diagnostics::codes;

#[test]
fn test_methods_bind_to_instances() {
    let mut program = TestProgram::single(
        "\
class C:
    def method(self, x: int) -> str:
        return 'r'
c = C()
bound = c.method
raw = C.method
r = c.method(1)
",
    );
    assert_eq!(program.symbol("main.py", "bound"), "(x: int) -> str");
    assert_eq!(program.symbol("main.py", "raw"), "(self, x: int) -> str");
    assert_eq!(program.symbol("main.py", "r"), "str");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_static_class_and_property_members() {
    let mut program = TestProgram::single(
        "\
class C:
    @staticmethod
    def build(n: int) -> int:
        return n
    @classmethod
    def create(cls):
        return cls()
    @property
    def size(self) -> float:
        return 1.0
c = C()
a = C.build(1)
b = c.build(2)
d = C.create()
e = c.create()
f = c.size
",
    );
    assert_eq!(program.symbol("main.py", "a"), "int");
    assert_eq!(program.symbol("main.py", "b"), "int");
    assert_eq!(program.symbol("main.py", "d"), "C");
    assert_eq!(program.symbol("main.py", "e"), "C");
    assert_eq!(program.symbol("main.py", "f"), "float");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_binding_decorators_are_not_undefined_names() {
    let mut program = TestProgram::single(
        "\
class T:
    @property
    def v(self) -> int:
        return 1
    @v.setter
    def v(self, value: int) -> None:
        pass
    @staticmethod
    def make() -> int:
        return 0
",
    );
    let reported = program.codes("main.py");
    assert!(!reported.contains(&codes::UNDEFINED_NAME), "{reported:?}");
    assert!(!reported.contains(&codes::UNKNOWN_ATTRIBUTE), "{reported:?}");
}

#[test]
fn test_inherited_members_follow_depth_first_mro() {
    let mut program = TestProgram::single(
        "\
class Base:
    kind = 'base'
    def name(self) -> str:
        return 'b'
class Left(Base):
    def name(self) -> int:
        return 1
class Right(Base):
    kind = 2
class Both(Left, Right):
    pass
x = Both()
n = x.name()
k = x.kind
",
    );
    assert_eq!(program.symbol("main.py", "n"), "int");
    // `Base` is reached through `Left` before `Right` is visited
    assert_eq!(program.symbol("main.py", "k"), "str");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_unknown_attribute_is_reported() {
    let mut program = TestProgram::single(
        "\
class C:
    pass
c = C()
v = c.nope
",
    );
    assert_eq!(
        program.messages("main.py"),
        vec!["Cannot access attribute 'nope' for type 'C'"]
    );
    assert_eq!(program.symbol("main.py", "v"), "Unknown");
}

#[test]
fn test_attribute_on_union_requires_every_member() {
    let mut program = TestProgram::single(
        "\
def pick(flag: bool):
    if flag:
        return 'a'
    return None
v = pick(True).upper()
",
    );
    assert_eq!(program.codes("main.py"), vec![codes::UNKNOWN_ATTRIBUTE]);
}

#[test]
fn test_module_attributes() {
    let mut program = TestProgram::new(&[
        ("util.py", "LIMIT = 10\ndef go() -> str:\n    return 'x'\n"),
        ("main.py", "import util\na = util.LIMIT\nb = util.go()\nc = util.absent\n"),
    ]);
    assert_eq!(program.symbol("main.py", "a"), "int");
    assert_eq!(program.symbol("main.py", "b"), "str");
    assert_eq!(
        program.messages("main.py"),
        vec!["Cannot access attribute 'absent' for type 'Module(\"util\")'"]
    );
}

#[test]
fn test_builtin_methods() {
    let mut program = TestProgram::single(
        "\
s = 'a'.upper()
parts = 'a b'.split()
xs = [1]
append = xs.append
d = {'k': 1.0}
g = d.get('k')
ks = d.keys()
",
    );
    assert_eq!(program.symbol("main.py", "s"), "str");
    assert_eq!(program.symbol("main.py", "parts"), "list[str]");
    assert_eq!(program.symbol("main.py", "append"), "(item) -> None");
    assert_eq!(program.symbol("main.py", "g"), "float | None");
    assert_eq!(program.symbol("main.py", "ks"), "list[str]");
    assert!(program.check("main.py").is_empty());
}

#[test]
fn test_class_object_attributes() {
    let mut program = TestProgram::single(
        "\
class C:
    count = 0
n = C.__name__
k = C.count
t = C().__class__
",
    );
    assert_eq!(program.symbol("main.py", "n"), "str");
    assert_eq!(program.symbol("main.py", "k"), "int");
    assert_eq!(program.symbol("main.py", "t"), "type[C]");
}

#[test]
fn test_member_declarations_walk_the_mro() {
    let mut program = TestProgram::single(
        "\
class Base:
    def shared(self) -> int:
        return 1
class Child(Base):
    def __init__(self) -> None:
        self.own = 'x'
c = Child()
",
    );
    let file = program.file("main.py");
    let node = program.node_for("main.py", "c");
    let (inherited, instance, missing) = program.with_evaluator(|ev| {
        let object = ev.type_of_node(file, node).unwrap_or(TypeId::UNKNOWN);
        (
            ev.member_declarations(object, "shared"),
            ev.member_declarations(object, "own"),
            ev.member_declarations(object, "absent"),
        )
    });
    let binding = &program.files[0].binding;
    assert_eq!(inherited.len(), 1);
    let declaration = binding
        .declaration(pyz_binder::DeclIndex(inherited[0].index))
        .expect("declaration");
    assert_eq!(declaration.name, "shared");
    assert_eq!(instance.len(), 1);
    assert_eq!(
        binding
            .declaration(pyz_binder::DeclIndex(instance[0].index))
            .map(|d| d.kind),
        Some(pyz_binder::DeclarationKind::InstanceAttribute)
    );
    assert!(missing.is_empty());
}
