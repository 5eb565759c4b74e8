use super::*;
use pyz_common::position::Position;

const SAMPLE: &str = "\
import os
from .util import helper as h

class Point:
    def __init__(self, x: int, y: int) -> None:
        self.x = x
        self.y = y

def dist(p: Point) -> float:
    return (p.x ** 2 + p.y ** 2) ** 0.5

if os.name == 'nt':
    SEP = '\\\\'
else:
    SEP = '/'
";

#[test]
fn test_reparse_is_deterministic() {
    let first = parse::<u32>(SAMPLE);
    let second = parse::<u32>(SAMPLE);
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_reparse_of_malformed_input_is_deterministic() {
    let source = "def f(:\n    return (\nclass\n  x = = 2\n";
    let first = parse::<()>(source);
    let second = parse::<()>(source);
    assert!(!first.diagnostics.is_empty());
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_clean_is_idempotent() {
    let mut tree = parse::<u32>(SAMPLE).tree;
    let root = tree.root();
    let first_stmt = tree.statements()[0];
    tree.analysis.insert(root, 1);
    tree.analysis.insert(first_stmt, 2);
    tree.analysis.set_stamp(7);

    clean(&mut tree);
    let once = tree.clone();
    clean(&mut tree);
    assert_eq!(tree, once);
    assert!(tree.is_clean());
    assert_eq!(tree.analysis.stamp(), 0);
}

#[test]
fn test_clean_keeps_node_shapes() {
    let fresh = parse::<u32>(SAMPLE).tree;
    let mut used = fresh.clone();
    let mut nodes = Vec::new();
    used.arena().walk(used.root(), |idx, _| nodes.push(idx));
    for (i, idx) in nodes.into_iter().enumerate() {
        used.analysis.insert(idx, i as u32);
    }
    assert!(!used.is_clean());
    assert!(used.same_shape(&fresh));

    clean(&mut used);
    assert_eq!(used, fresh);
}

#[test]
fn test_side_table_entry_or_default() {
    let mut tree = parse::<Vec<u32>>("x = 1\n").tree;
    let stmt = tree.statements()[0];
    tree.analysis.entry_or_default(stmt).push(3);
    tree.analysis.entry_or_default(stmt).push(4);
    assert_eq!(tree.analysis.get(stmt), Some(&vec![3, 4]));
    assert_eq!(tree.analysis.remove(stmt), Some(vec![3, 4]));
    assert!(tree.is_clean());
}

#[test]
fn test_node_at_offset_finds_innermost_name() {
    let source = "value = compute(arg)\n";
    let tree = parse::<()>(source).tree;
    let offset = source.find("arg").expect("arg present") as u32 + 1;
    let idx = tree.node_at_offset(offset);
    assert_eq!(tree.arena().name_text(idx), Some("arg"));

    let at_end_of_name = tree.node_at_offset(5);
    assert_eq!(tree.arena().name_text(at_end_of_name), Some("value"));
}

#[test]
fn test_compound_statement_span_stops_at_its_last_token() {
    let source = "if x:\n    y = 1\nz = 2\n";
    let tree = parse::<()>(source).tree;
    let if_stmt = tree.statements()[0];
    let end = tree.span(if_stmt).end;
    assert_eq!(&source[..end as usize], "if x:\n    y = 1");

    let z_offset = source.find('z').expect("z present") as u32;
    let idx = tree.node_at_offset(z_offset);
    assert_eq!(tree.arena().name_text(idx), Some("z"));
}

#[test]
fn test_line_map_is_attached() {
    let tree = parse::<()>(SAMPLE).tree;
    let offset = SAMPLE.find("class").expect("class present") as u32;
    assert_eq!(
        tree.line_map().offset_to_position(offset, SAMPLE),
        Position::new(3, 0)
    );
}
