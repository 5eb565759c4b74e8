//! Parser for the pyz analysis engine.
//!
//! - `node` - Node shapes and `NodeIndex`
//! - `NodeArena` - Flat storage for one tree's nodes and identifiers
//! - `ParserState` - Recursive-descent parser with error recovery
//! - `ParseTree` - A parsed file plus its out-of-band `AnalysisSideTable`
//!
//! `parse` and `clean` are the entry points used by the program.

pub mod node;
pub use node::{NodeData, NodeIndex, NodeList};

mod node_arena;
pub use node_arena::NodeArena;

mod state;
mod state_statements;
pub use state::{ParseDiagnostic, ParserState, decode_string_literal};

mod tree;
pub use tree::{AnalysisSideTable, ParseResult, ParseTree, clean, parse};

#[cfg(test)]
#[path = "../tests/parser_tests.rs"]
mod parser_tests;

#[cfg(test)]
#[path = "../tests/tree_tests.rs"]
mod tree_tests;
