use super::*;

const A: FileId = FileId(0);
const B: FileId = FileId(1);
const C: FileId = FileId(2);
const D: FileId = FileId(3);

fn set(files: &[FileId]) -> FxHashSet<FileId> {
    files.iter().copied().collect()
}

#[test]
fn test_affected_files_are_transitive() {
    let mut graph = DependencyGraph::new();
    // A imports B, B imports C, D imports C
    graph.add_dependency(A, B);
    graph.add_dependency(B, C);
    graph.add_dependency(D, C);

    assert_eq!(graph.get_affected_files(C), vec![A, B, D]);
    assert_eq!(graph.get_affected_files(B), vec![A]);
    assert!(graph.get_affected_files(A).is_empty());
}

#[test]
fn test_cycles_terminate_and_exclude_the_changed_file() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(A, B);
    graph.add_dependency(B, A);
    graph.add_dependency(C, A);

    assert_eq!(graph.get_affected_files(A), vec![B, C]);
    assert_eq!(graph.get_affected_files(B), vec![A, C]);
}

#[test]
fn test_update_file_replaces_edges() {
    let mut graph = DependencyGraph::new();
    graph.update_file(A, &set(&[B, C]));
    assert_eq!(graph.get_dependents(B), Some(&set(&[A])));

    graph.update_file(A, &set(&[C]));
    assert_eq!(graph.get_dependents(B), None);
    assert_eq!(graph.get_dependencies(A), Some(&set(&[C])));

    graph.update_file(A, &set(&[]));
    assert!(!graph.contains_file(A));
    assert_eq!(graph.file_count(), 0);
}

#[test]
fn test_self_imports_are_ignored() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(A, A);
    graph.update_file(B, &set(&[B]));
    assert_eq!(graph.file_count(), 0);
}

#[test]
fn test_remove_file_drops_both_directions() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(A, B);
    graph.add_dependency(B, C);
    graph.remove_file(B);

    assert_eq!(graph.get_dependencies(A), Some(&set(&[])));
    assert_eq!(graph.get_dependents(C), None);
    assert!(graph.get_affected_files(C).is_empty());
}

#[test]
fn test_reachable_from_roots() {
    let mut graph = DependencyGraph::new();
    graph.add_dependency(A, B);
    graph.add_dependency(B, C);
    graph.add_dependency(D, C);

    assert_eq!(graph.reachable_from([A]), set(&[A, B, C]));
    assert_eq!(graph.reachable_from([D]), set(&[D, C]));
}
