use super::*;
use crate::file_system::InMemoryFileSystem;
use crate::source_unit::StaleReason;
use pyz_common::diagnostics::codes;
use pyz_common::options::InvalidationMode;

const A_INT: &str = "def f(x: int) -> int: return x\n";
const A_STR: &str = "def f(x: int) -> str: return 'v'\n";
const B: &str = "from a import f\ny = f(1)\n";

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

fn unit_stats(program: &Program, path: &str) -> crate::source_unit::UnitStats {
    program
        .store()
        .get(path)
        .map(|u| u.stats())
        .unwrap_or_default()
}

fn shared_fs(files: &[(&str, &str)]) -> (Arc<InMemoryFileSystem>, Program) {
    let fs = Arc::new(InMemoryFileSystem::with_files(files.iter().copied()));
    let mut program = Program::new(
        AnalysisOptions::default(),
        Arc::clone(&fs) as Arc<dyn FileSystem>,
        Arc::new(NoAccessHost),
    );
    let roots: Vec<&str> = files.iter().map(|(path, _)| *path).collect();
    program.set_root_files(&roots);
    (fs, program)
}

#[test]
fn test_dependency_edit_retypes_dependent_without_reparsing_it() {
    let mut program = Program::in_memory(&[("a.py", A_INT), ("b.py", B)]);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");
    assert_eq!(unit_stats(&program, "b.py").parses, 1);

    program.update_file("a.py", A_STR);
    assert_eq!(type_of(&mut program, "b.py", "y"), "str");

    let b = unit_stats(&program, "b.py");
    assert_eq!(b.parses, 1);
    assert_eq!(b.binds, 2);
    assert_eq!(unit_stats(&program, "a.py").parses, 2);

    let stats = program.stats();
    assert_eq!(stats.generation, 2);
    assert_eq!(stats.local_invalidations, 1);
    assert_eq!(stats.full_invalidations, 0);
}

#[test]
fn test_update_is_visible_to_the_next_query() {
    let mut program = Program::in_memory(&[("a.py", A_INT), ("b.py", B)]);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");

    let a = program.update_file("a.py", A_STR);
    assert_eq!(
        program.store().unit(a).map(|u| u.state()),
        Some(UnitState::Stale(StaleReason::Content))
    );
    assert!(program.has_pending_changes());

    // the dependent is queried first; it still sees the new content
    assert_eq!(type_of(&mut program, "b.py", "y"), "str");
    assert!(!program.has_pending_changes());
}

#[test]
fn test_flush_marks_only_dependents_stale() {
    let mut program = Program::in_memory(&[("a.py", A_INT), ("b.py", B), ("c.py", "z = 1\n")]);
    for path in ["a.py", "b.py", "c.py"] {
        codes_of(&mut program, path);
    }

    program.update_file("a.py", A_STR);
    program.flush();
    let state = |path: &str| program.store().get(path).map(|u| u.state());
    assert_eq!(state("b.py"), Some(UnitState::Stale(StaleReason::Dependency)));
    assert_eq!(state("a.py"), Some(UnitState::Bound));
    assert_eq!(state("c.py"), Some(UnitState::Evaluated { complete: true }));

    // the unrelated unit keeps its memo table and its check
    assert!(codes_of(&mut program, "c.py").is_empty());
    let c = unit_stats(&program, "c.py");
    assert_eq!((c.parses, c.binds, c.checks), (1, 1, 1));
}

#[test]
fn test_export_changes_invalidate_everything() {
    let mut program = Program::in_memory(&[("a.py", A_INT), ("b.py", B), ("c.py", "z = 1\n")]);
    assert_eq!(type_of(&mut program, "c.py", "z"), "int");
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");
    let interner = Arc::clone(program.interner());

    program.update_file("a.py", "def f(x: int) -> int: return x\ndef g() -> None: pass\n");
    program.flush();
    assert_eq!(program.stats().full_invalidations, 1);
    assert!(!Arc::ptr_eq(&interner, program.interner()));
    assert_eq!(
        program.store().get("c.py").map(|u| u.state()),
        Some(UnitState::Stale(StaleReason::Dependency))
    );
    assert_eq!(type_of(&mut program, "c.py", "z"), "int");
    assert_eq!(unit_stats(&program, "c.py").parses, 1);
}

#[test]
fn test_configured_policy_is_used() {
    let fs = Arc::new(InMemoryFileSystem::with_files([("a.py", A_INT), ("b.py", B)]));
    let options = AnalysisOptions {
        invalidation: InvalidationMode::DependentsOnly,
        ..AnalysisOptions::default()
    };
    let mut program = Program::new(options, fs, Arc::new(NoAccessHost));
    program.set_root_files(&["a.py", "b.py"]);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");

    program.update_file("a.py", "def f(x: int) -> str: return 'v'\nextra = 1\n");
    assert_eq!(type_of(&mut program, "b.py", "y"), "str");
    assert_eq!(program.stats().full_invalidations, 0);

    program.set_invalidation_policy(Box::new(crate::invalidation::AlwaysFull));
    program.update_file("a.py", A_INT);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");
    assert_eq!(program.stats().full_invalidations, 1);
}

#[test]
fn test_identical_content_does_not_start_a_generation() {
    let mut program = Program::in_memory(&[("a.py", A_INT), ("b.py", B)]);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");
    let before = program.stats();

    program.update_file("a.py", A_INT);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");
    let after = program.stats();
    assert_eq!(after.generation, before.generation);
    assert_eq!(after.parses, before.parses);
    assert_eq!(after.binds, before.binds);
    assert_eq!(program.store().get("a.py").map(|u| u.version()), Some(1));
}

#[test]
fn test_diagnostics_are_replaced_after_a_fix() {
    let mut program = Program::in_memory(&[("main.py", "value = = 1\nx: int = 'a'\n")]);
    let broken = codes_of(&mut program, "main.py");
    assert!(!broken.is_empty());
    assert!(broken.contains(&codes::ASSIGNMENT_TYPE_MISMATCH));

    program.update_file("main.py", "value = 1\nx: int = 1\n");
    assert!(codes_of(&mut program, "main.py").is_empty());
}

#[test]
fn test_handles_do_not_survive_a_generation() {
    let mut program = Program::in_memory(&[("a.py", A_INT), ("b.py", B)]);
    let b = file(&program, "b.py");
    let decls = program
        .get_declarations_at(b, Position::new(1, 4))
        .expect("declarations");
    let decl = decls[0];
    let ty = program
        .get_type_of_symbol(b, "y")
        .expect("query")
        .expect("type");

    let decl_handle = program.register_declaration(decl).expect("handle");
    let type_handle = program.register_type(ty).expect("handle");
    assert_eq!(decl_handle, "g1:d1");
    assert_eq!(type_handle, "g1:t2");
    assert_eq!(program.register_declaration(decl).as_deref(), Some("g1:d1"));
    assert_eq!(program.resolve_declaration_handle(&decl_handle), Some(decl));
    assert_eq!(program.resolve_type_handle(&type_handle), Some(ty));

    program.update_file("a.py", A_STR);
    assert_eq!(program.resolve_declaration_handle(&decl_handle), None);
    assert_eq!(program.resolve_type_handle(&type_handle), None);

    let decls = program
        .get_declarations_at(b, Position::new(1, 4))
        .expect("declarations");
    let fresh = program.register_declaration(decls[0]).expect("handle");
    assert_eq!(fresh, "g2:d3");
    assert_eq!(program.resolve_declaration_handle(&fresh), Some(decls[0]));
}

#[test]
fn test_handles_of_removed_files_are_not_found() {
    let (fs, mut program) = shared_fs(&[("a.py", A_INT), ("b.py", B)]);
    let a = file(&program, "a.py");
    let decls = program
        .get_declarations_at(a, Position::new(0, 4))
        .expect("declarations");
    let handle = program.register_declaration(decls[0]).expect("handle");

    fs.remove("a.py");
    assert!(program.remove_file("a.py"));
    assert!(!program.remove_file("a.py"));
    assert_eq!(program.resolve_declaration_handle(&handle), None);
    assert_eq!(codes_of(&mut program, "b.py"), vec![codes::UNRESOLVED_IMPORT]);
    assert_eq!(program.root_files(), &[file(&program, "b.py")]);
}

#[test]
fn test_new_module_satisfies_unresolved_import() {
    let mut program = Program::in_memory(&[("main.py", "import helpers\nv = helpers.VALUE\n")]);
    assert_eq!(codes_of(&mut program, "main.py"), vec![codes::UNRESOLVED_IMPORT]);

    program.update_file("helpers.py", "VALUE = 2.5\n");
    assert!(codes_of(&mut program, "main.py").is_empty());
    assert_eq!(type_of(&mut program, "main.py", "v"), "float");
    assert_eq!(program.stats().full_invalidations, 1);
}

#[test]
fn test_root_gaining_content_resolves_its_importers() {
    let fs = Arc::new(InMemoryFileSystem::with_files([("a.py", "from b import v\ny = v\n")]));
    let mut program = Program::new(AnalysisOptions::default(), fs, Arc::new(NoAccessHost));
    program.set_root_files(&["a.py", "b.py"]);
    assert_eq!(codes_of(&mut program, "a.py"), vec![codes::UNRESOLVED_IMPORT]);
    assert_eq!(type_of(&mut program, "a.py", "y"), "Unknown");

    program.update_file("b.py", "v = 1\n");
    assert_eq!(type_of(&mut program, "a.py", "y"), "int");
    assert!(codes_of(&mut program, "a.py").is_empty());
    assert_eq!(program.stats().full_invalidations, 1);
    assert_eq!(unit_stats(&program, "a.py").parses, 1);
}

#[test]
fn test_recursive_returns_across_files_are_unknown() {
    let mut program = Program::in_memory(&[
        ("f.py", "from g import g\ndef f(n: int):\n    return g(n) + 1\n"),
        ("g.py", "import f\ndef g(n: int):\n    return f.f(n) + 1\n"),
        ("main.py", "from f import f\nx = f(1)\n"),
    ]);
    assert_eq!(type_of(&mut program, "main.py", "x"), "Unknown");
    assert!(codes_of(&mut program, "main.py").is_empty());
}

#[test]
fn test_disk_changes_are_picked_up_on_notification() {
    let (fs, mut program) = shared_fs(&[("a.py", A_INT), ("b.py", B)]);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");

    fs.write("a.py", A_STR);
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");
    program.notify_changed("a.py");
    assert_eq!(type_of(&mut program, "b.py", "y"), "str");
}

#[test]
fn test_overlays_win_until_closed() {
    let (_fs, mut program) = shared_fs(&[("a.py", A_INT), ("b.py", B)]);
    let a = program.open_file("a.py", A_STR);
    assert!(program.is_open(a));
    assert_eq!(type_of(&mut program, "b.py", "y"), "str");

    program.close_file("a.py");
    assert!(!program.is_open(a));
    assert_eq!(type_of(&mut program, "b.py", "y"), "int");
}

#[test]
fn test_circular_imports_terminate() {
    let mut program = Program::in_memory(&[
        ("a.py", "from b import g\ndef f() -> int:\n    return 1\nx = g()\n"),
        ("b.py", "from a import f\ndef g() -> int:\n    return f()\n"),
    ]);
    assert_eq!(type_of(&mut program, "a.py", "x"), "int");
    assert!(codes_of(&mut program, "a.py").is_empty());
    assert!(codes_of(&mut program, "b.py").is_empty());

    let a = file(&program, "a.py");
    let b = file(&program, "b.py");
    assert_eq!(program.store().get_dependents(a), vec![b]);
    assert_eq!(program.store().get_dependents(b), vec![a]);

    program.update_file("b.py", "from a import f\ndef g() -> str:\n    return 's'\n");
    assert_eq!(type_of(&mut program, "a.py", "x"), "str");
}

#[test]
fn test_wildcard_imports_track_exports() {
    let mut program = Program::in_memory(&[
        ("main.py", "from util import *\ny = helper()\n"),
        ("util.py", "def helper() -> str:\n    return 's'\n_private = 1\n"),
    ]);
    assert_eq!(type_of(&mut program, "main.py", "y"), "str");
    let main = file(&program, "main.py");
    let binding = program.store().unit(main).and_then(|u| u.binding()).cloned();
    let binding = binding.expect("binding");
    assert!(binding.module_symbol("helper").is_some());
    assert!(binding.module_symbol("_private").is_none());

    program.update_file("util.py", "def helper() -> int:\n    return 1\nextra = 1\n");
    assert_eq!(type_of(&mut program, "main.py", "y"), "int");
    assert_eq!(type_of(&mut program, "main.py", "extra"), "int");
}

#[test]
fn test_garbage_collection_keeps_reachable_units() {
    let (_fs, mut program) = shared_fs(&[
        ("main.py", "import a\n"),
        ("a.py", "x = 1\n"),
        ("scratch.py", "y = 2\n"),
    ]);
    program.set_root_files(&["main.py"]);
    codes_of(&mut program, "main.py");
    program.open_file("notes.py", "z = 3\n");
    assert_eq!(program.stats().units, 4);

    // scratch.py is neither a root, open, nor imported
    assert_eq!(program.collect_garbage(), 1);
    assert!(program.file_id("scratch.py").is_none());
    assert!(program.file_id("a.py").is_some());
    assert!(program.file_id("notes.py").is_some());

    program.close_file("notes.py");
    assert_eq!(program.collect_garbage(), 1);
    assert_eq!(program.stats().units, 2);
    assert!(codes_of(&mut program, "main.py").is_empty());
}
