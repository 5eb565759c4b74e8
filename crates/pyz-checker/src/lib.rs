//! Type evaluator for the pyz analysis engine.
//!
//! - `TypeEvaluator` - demand-driven, memoized type computation for
//!   expressions and declarations
//! - `ProgramView` - the seam through which the evaluator reaches other
//!   files (pull-based binding, import resolution, memo tables)
//! - `builtins` - the implicit builtins scope
//! - `check_source_file` - evaluates every expression of a file so that all
//!   of its type diagnostics are reported
//!
//! Memo entries live in each tree's `AnalysisSideTable<NodeAnalysis>`, never
//! in the evaluator itself. An evaluator is cheap and short-lived: the
//! program creates one per query.

use pyz_binder::{Binding, DeclIndex};
use pyz_common::diagnostics::Diagnostic;
use pyz_common::ids::FileId;
use pyz_common::limits::MAX_EVAL_DEPTH;
use pyz_common::options::AnalysisOptions;
use pyz_parser::{AnalysisSideTable, NodeArena, NodeIndex};
use pyz_solver::TypeId;
use smallvec::SmallVec;
use std::sync::Arc;

pub mod builtins;

mod state;
pub use state::{EvalKey, TypeEvaluator};

mod state_calls;
mod state_checking;
mod state_declarations;
mod state_expressions;
mod state_members;

/// Per-node memo entry stored in a parse tree's side table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeAnalysis {
    /// Type of the expression rooted at this node.
    pub expr_type: Option<TypeId>,
    /// Types of the declarations introduced at this node. Usually one;
    /// `from m import *` introduces several at the same import node.
    pub decl_types: SmallVec<[(DeclIndex, TypeId); 1]>,
    /// Inferred return type, on `FunctionDef` and `Lambda` nodes.
    pub return_type: Option<TypeId>,
}

/// A parsed and bound file as the evaluator sees it.
#[derive(Clone, Debug)]
pub struct BoundFile {
    pub file: FileId,
    pub path: Arc<str>,
    /// Dotted module name (`pkg.mod`).
    pub module_name: Arc<str>,
    pub arena: Arc<NodeArena>,
    pub root: NodeIndex,
    pub binding: Arc<Binding>,
}

/// Access to program state from inside an evaluation.
///
/// Implemented by the program. Every method may do work on demand: asking
/// for a file that is not bound yet binds it.
pub trait ProgramView {
    /// The current parse tree and binding of `file`.
    fn bound_file(&mut self, file: FileId) -> Option<BoundFile>;

    /// Memo table of `file`, already validated against the current
    /// generation.
    fn analysis_mut(&mut self, file: FileId) -> Option<&mut AnalysisSideTable<NodeAnalysis>>;

    /// File an import of `module` (with `level` leading dots) in `from`
    /// refers to.
    fn resolve_import(&mut self, from: FileId, module: &str, level: u32) -> Option<FileId>;

    /// `package.name` when `package` is a package's `__init__` file.
    fn resolve_submodule(&mut self, package: FileId, name: &str) -> Option<FileId>;

    /// Record a diagnostic against `file`.
    fn report(&mut self, file: FileId, diagnostic: Diagnostic);
}

/// The part of `AnalysisOptions` the evaluator reads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CheckerOptions {
    pub max_depth: u32,
    pub report_unresolved_imports: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            max_depth: MAX_EVAL_DEPTH,
            report_unresolved_imports: true,
        }
    }
}

impl From<&AnalysisOptions> for CheckerOptions {
    fn from(options: &AnalysisOptions) -> Self {
        CheckerOptions {
            max_depth: options.max_evaluation_depth,
            report_unresolved_imports: options.report_unresolved_imports,
        }
    }
}

/// Evaluate every statement and expression of `file`.
///
/// Idempotent within a generation: memoized results are reused and
/// re-reported diagnostics are de-duplicated by the view.
pub fn check_source_file(
    view: &mut dyn ProgramView,
    interner: &pyz_solver::TypeInterner,
    options: CheckerOptions,
    file: FileId,
) {
    TypeEvaluator::new(view, interner, options).check_file(file);
}

#[cfg(test)]
#[path = "../tests/support.rs"]
mod support;

#[cfg(test)]
#[path = "../tests/evaluator_tests.rs"]
mod evaluator_tests;

#[cfg(test)]
#[path = "../tests/declaration_tests.rs"]
mod declaration_tests;

#[cfg(test)]
#[path = "../tests/call_tests.rs"]
mod call_tests;

#[cfg(test)]
#[path = "../tests/member_tests.rs"]
mod member_tests;

#[cfg(test)]
#[path = "../tests/checking_tests.rs"]
mod checking_tests;
