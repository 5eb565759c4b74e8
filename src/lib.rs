//! pyz: an incremental static analysis engine for Python sources.
//!
//! The pipeline is split across workspace crates; this crate re-exports
//! them under one roof:
//!
//! - [`scanner`] - tokens, with INDENT/DEDENT/NEWLINE synthesis
//! - [`parser`] - parse trees with an out-of-band analysis side table
//! - [`binder`] - scopes, symbols and the flat declaration table
//! - [`solver`] - interned types, unions and assignability
//! - [`checker`] - the demand-driven, memoized type evaluator
//! - [`program`] - source units, invalidation, queries, stable handles and
//!   the cooperative scheduler
//!
//! ```
//! use pyz::program::Program;
//!
//! let mut program = Program::in_memory(&[
//!     ("a.py", "def f(x: int) -> int: return x\n"),
//!     ("b.py", "from a import f\ny = f(1)\n"),
//! ]);
//! let b = program.file_id("b.py").unwrap();
//! let ty = program.get_type_of_symbol(b, "y").unwrap().unwrap();
//! assert_eq!(program.format_type(ty), "int");
//! ```

pub use pyz_binder as binder;
pub use pyz_checker as checker;
pub use pyz_common as common;
pub use pyz_parser as parser;
pub use pyz_program as program;
pub use pyz_scanner as scanner;
pub use pyz_solver as solver;

pub use pyz_common::{AnalysisOptions, Diagnostic, DiagnosticCategory, FaultKind, Position};
pub use pyz_program::{
    CancellationToken, FileDiagnostics, HandleRegistry, Program, ProgramError, ProgramResult,
    Scheduler,
};

// Tracing configuration (PYZ_LOG / PYZ_LOG_FORMAT)
pub mod tracing_config;
