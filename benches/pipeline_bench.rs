//! Parse -> bind -> check pipeline benchmarks.
//!
//! Measures each stage on a synthetic module, and the cost of re-querying a
//! dependent after an edit compared to checking from scratch.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pyz::binder::bind;
use pyz::parser::parse;
use pyz::program::Program;
use pyz::CancellationToken;

/// A module with `n` classes, functions and module-level assignments.
fn synthetic_module(n: usize) -> String {
    let mut source = String::from("from base import Base, helper\n\n");
    for i in 0..n {
        source.push_str(&format!(
            "class C{i}(Base):\n    def __init__(self, v: int) -> None:\n        self.v = v\n\n    def get(self) -> int:\n        return self.v + {i}\n\n"
        ));
        source.push_str(&format!(
            "def f{i}(x: int, y: str = 'a') -> str:\n    if x > {i}:\n        return y * x\n    return helper(y)\n\n"
        ));
        source.push_str(&format!("v{i} = C{i}({i}).get() + len(f{i}({i}))\n\n"));
    }
    source
}

const BASE_MODULE: &str = "class Base:\n    name: str = 'base'\n\ndef helper(s: str) -> str:\n    return s\n";

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for n in [10, 100, 500] {
        let source = synthetic_module(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter(|| black_box(parse::<()>(black_box(source))));
        });
    }
    group.finish();
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");
    for n in [10, 100, 500] {
        let tree = parse::<()>(&synthetic_module(n)).tree;
        group.bench_with_input(BenchmarkId::from_parameter(n), &tree, |b, tree| {
            b.iter(|| black_box(bind(black_box(tree))));
        });
    }
    group.finish();
}

fn bench_check_program(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_program");
    for n in [10, 100] {
        let source = synthetic_module(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &source, |b, source| {
            b.iter(|| {
                let mut program =
                    Program::in_memory(&[("base.py", BASE_MODULE), ("main.py", source.as_str())]);
                black_box(program.check_program(&CancellationToken::new()))
            });
        });
    }
    group.finish();
}

/// Edit the imported module without changing its public symbols, then
/// re-check the importer. Only the edited file is reparsed.
fn bench_incremental_edit(c: &mut Criterion) {
    let source = synthetic_module(100);
    let mut program = Program::in_memory(&[("base.py", BASE_MODULE), ("main.py", source.as_str())]);
    let main = program.file_id("main.py").expect("main.py");
    let _ = program.get_diagnostics(main);

    let mut toggle = false;
    c.bench_function("incremental_edit/100", |b| {
        b.iter(|| {
            toggle = !toggle;
            let body = if toggle { "return s + ''" } else { "return s" };
            program.update_file(
                "base.py",
                &format!("class Base:\n    name: str = 'base'\n\ndef helper(s: str) -> str:\n    {body}\n"),
            );
            black_box(program.get_diagnostics(main))
        });
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_bind,
    bench_check_program,
    bench_incremental_edit
);
criterion_main!(benches);
