use super::*;
use crate::cancellation::CancellationToken;
use crate::error::ProgramError;
use crate::file_system::{RealFileSystem, StaticHost};
use pyz_binder::DeclarationKind;
use pyz_common::diagnostics::{FaultKind, codes};

fn file(program: &Program, path: &str) -> FileId {
    program
        .file_id(path)
        .unwrap_or_else(|| panic!("no file {path}"))
}

fn type_of(program: &mut Program, path: &str, name: &str) -> String {
    let id = file(program, path);
    let ty = program
        .get_type_of_symbol(id, name)
        .expect("query")
        .unwrap_or_else(|| panic!("no symbol {name} in {path}"));
    program.format_type(ty)
}

fn codes_of(program: &mut Program, path: &str) -> Vec<u32> {
    let id = file(program, path);
    program
        .get_diagnostics(id)
        .expect("diagnostics")
        .iter()
        .map(|d| d.code)
        .collect()
}

#[test]
fn test_types_flow_across_files() {
    let mut program = Program::in_memory(&[
        ("a.py", "def f(x: int) -> int: return x\n"),
        ("b.py", "from a import f\ny = f(1)\n"),
    ]);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");
    assert!(codes_of(&mut program, "a.py").is_empty());
    assert!(codes_of(&mut program, "b.py").is_empty());

    let stats = program.stats();
    assert_eq!(stats.units, 2);
    assert_eq!(stats.parses, 2);
    assert_eq!(stats.generation, 1);
}

#[test]
fn test_relative_imports_and_packages() {
    let mut program = Program::in_memory(&[
        ("pkg/__init__.py", "VERSION = '1'\n"),
        ("pkg/a.py", "from .b import v\nfrom . import b\nw = b.v\n"),
        ("pkg/b.py", "v = 1\n"),
        ("main.py", "import pkg.a\nversion = pkg.VERSION\nvalue = pkg.a.w\n"),
    ]);
    assert_eq!(type_of(&mut program, "pkg/a.py", "v"), "int");
    assert_eq!(type_of(&mut program, "pkg/a.py", "w"), "int");
    assert_eq!(type_of(&mut program, "main.py", "version"), "str");
    assert_eq!(type_of(&mut program, "main.py", "value"), "int");

    let unit = program.store().get("pkg/__init__.py").expect("package unit");
    assert_eq!(unit.module_name(), "pkg");
    assert!(unit.is_package());
    assert_eq!(
        program.store().get("pkg/a.py").map(|u| u.module_name()),
        Some("pkg.a")
    );
}

#[test]
fn test_search_paths_come_from_options_and_host() {
    let fs = Arc::new(InMemoryFileSystem::with_files([
        ("main.py", "from ext import E\nfrom vendored import V\n"),
        ("lib/ext.py", "E = 'x'\n"),
        ("third_party/vendored.py", "V = 1.5\n"),
    ]));
    let options = AnalysisOptions {
        search_paths: vec!["third_party".to_string()],
        ..AnalysisOptions::default()
    };
    let host = StaticHost {
        search_paths: vec!["lib".to_string()],
        ..StaticHost::default()
    };
    let mut program = Program::new(options, fs, Arc::new(host));
    program.set_root_files(&["main.py"]);
    assert_eq!(type_of(&mut program, "main.py", "E"), "str");
    assert_eq!(type_of(&mut program, "main.py", "V"), "float");
    assert!(codes_of(&mut program, "main.py").is_empty());
}

#[test]
fn test_unresolved_imports_are_diagnosed() {
    let mut program = Program::in_memory(&[("main.py", "import missing\nx = missing.thing\n")]);
    assert_eq!(codes_of(&mut program, "main.py"), vec![codes::UNRESOLVED_IMPORT]);
    assert_eq!(type_of(&mut program, "main.py", "x"), "Unknown");
}

#[test]
fn test_diagnostics_combine_every_stage_in_source_order() {
    let mut program = Program::in_memory(&[(
        "main.py",
        "def f(x, x):\n    return zzz\nvalue = (\n",
    )]);
    let id = file(&program, "main.py");
    let diagnostics = program.get_diagnostics(id).expect("diagnostics");
    let kinds: Vec<FaultKind> = diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(diagnostics[0].code, codes::DUPLICATE_PARAMETER);
    assert_eq!(diagnostics[1].code, codes::UNDEFINED_NAME);
    assert!(kinds.contains(&FaultKind::Syntax));
    assert!(diagnostics.iter().all(|d| d.file == "main.py"));
    assert!(
        diagnostics
            .windows(2)
            .all(|w| w[0].span.start <= w[1].span.start)
    );
}

#[test]
fn test_repeated_diagnostics_queries_check_once() {
    let mut program = Program::in_memory(&[("main.py", "x: int = 'no'\n")]);
    let id = file(&program, "main.py");
    let first = program.get_diagnostics(id).expect("diagnostics");
    let second = program.get_diagnostics(id).expect("diagnostics");
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(program.stats().checks, 1);
    assert_eq!(
        program.store().unit(id).map(|u| u.state()),
        Some(UnitState::Evaluated { complete: true })
    );
}

#[test]
fn test_queries_on_unknown_files_fail() {
    let mut program = Program::in_memory(&[("main.py", "x = 1\n")]);
    assert!(matches!(
        program.get_diagnostics(FileId(42)),
        Err(ProgramError::FileNotFound { .. })
    ));

    // a root whose content cannot be read
    let ghost = program.set_root_files(&["ghost.py"])[0];
    assert_eq!(
        program.get_diagnostics(ghost),
        Err(ProgramError::file_not_found("ghost.py"))
    );
}

#[test]
fn test_type_at_position() {
    let mut program = Program::in_memory(&[("main.py", "count = 1\nname = 'x'\ntotal = count + 2.0\n")]);
    let id = file(&program, "main.py");
    let at = |program: &mut Program, line, character| {
        let ty = program
            .get_type_at(id, Position::new(line, character))
            .expect("query")
            .expect("type");
        program.format_type(ty)
    };
    assert_eq!(at(&mut program, 0, 0), "int");
    assert_eq!(at(&mut program, 1, 1), "str");
    assert_eq!(at(&mut program, 2, 8), "int");
    assert_eq!(at(&mut program, 2, 0), "float");
    assert_eq!(program.get_type_at(id, Position::new(40, 0)), Ok(None));
}

#[test]
fn test_type_of_node() {
    let mut program = Program::in_memory(&[("main.py", "value = [1, 2]\n")]);
    let id = file(&program, "main.py");
    assert!(program.get_diagnostics(id).expect("diagnostics").is_empty());
    let node = program
        .store()
        .unit(id)
        .and_then(|u| u.tree())
        .map(|tree| tree.node_at_offset(8))
        .expect("tree");
    let ty = program.get_type_of_node(id, node).expect("query").expect("type");
    assert_eq!(program.format_type(ty), "list[int]");
}

#[test]
fn test_declarations_follow_import_aliases() {
    let mut program = Program::in_memory(&[
        ("a.py", "def f(x: int) -> int: return x\n"),
        ("b.py", "from a import f as g\nimport a\ny = g(1)\nz = a.f\n"),
    ]);
    let a = file(&program, "a.py");
    let b = file(&program, "b.py");

    let via_alias = program
        .get_declarations_at(b, Position::new(2, 4))
        .expect("declarations");
    assert_eq!(via_alias.len(), 1);
    assert_eq!(via_alias[0].file, a);
    let declaration = program.declaration(via_alias[0]).expect("declaration");
    assert_eq!(declaration.kind, DeclarationKind::Function);
    assert_eq!(declaration.name, "f");

    let via_attribute = program
        .get_declarations_at(b, Position::new(3, 6))
        .expect("declarations");
    assert_eq!(via_attribute, via_alias);

    let local = program
        .get_declarations_at(b, Position::new(2, 0))
        .expect("declarations");
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].file, b);

    // the `=` sign names nothing
    assert!(
        program
            .get_declarations_at(b, Position::new(2, 2))
            .expect("declarations")
            .is_empty()
    );
}

#[test]
fn test_declarations_of_instance_members() {
    let mut program = Program::in_memory(&[(
        "main.py",
        "class C:\n    def m(self) -> int:\n        return 1\nc = C()\nr = c.m()\n",
    )]);
    let id = file(&program, "main.py");
    let decls = program
        .get_declarations_at(id, Position::new(4, 6))
        .expect("declarations");
    assert_eq!(decls.len(), 1);
    assert_eq!(
        program.declaration(decls[0]).map(|d| d.kind),
        Some(DeclarationKind::Function)
    );
}

#[test]
fn test_check_program_visits_roots_in_order() {
    let mut program = Program::in_memory(&[
        ("a.py", "x: int = 'bad'\n"),
        ("b.py", "from a import x\ny = x\n"),
    ]);
    let results = program.check_program(&CancellationToken::new()).expect("check");
    let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["a.py", "b.py"]);
    assert_eq!(results[0].diagnostics.len(), 1);
    assert_eq!(results[0].diagnostics[0].code, codes::ASSIGNMENT_TYPE_MISMATCH);
    assert!(results[1].diagnostics.is_empty());
}

#[test]
fn test_cancelled_check_returns_cancelled() {
    let mut program = Program::in_memory(&[("a.py", "x = 1\n")]);
    let token = CancellationToken::new();
    token.cancel();
    assert_eq!(program.check_program(&token), Err(ProgramError::Cancelled));
    assert_eq!(program.stats().checks, 0);
}

#[test]
fn test_program_over_real_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("main.py"), "from util import helper\nvalue = helper()\n")
        .expect("write");
    std::fs::write(dir.path().join("util.py"), "def helper() -> str:\n    return 'h'\n")
        .expect("write");

    let fs = Arc::new(RealFileSystem::new(dir.path()));
    let mut program = Program::new(AnalysisOptions::default(), fs, Arc::new(NoAccessHost));
    program.set_root_files(&["main.py"]);
    let results = program.check_program(&CancellationToken::new()).expect("check");
    assert_eq!(results.len(), 1);
    assert!(results[0].diagnostics.is_empty());
    assert_eq!(type_of(&mut program, "main.py", "value"), "str");
    assert_eq!(program.stats().units, 2);
}
