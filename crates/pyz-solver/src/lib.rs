//! Type representation for the pyz analysis engine.
//!
//! - `TypeId` / `TypeData` - structural types, interned by `TypeInterner`
//! - Union normalization (`TypeInterner::union`)
//! - Assignability and method resolution order (`relations`)
//! - The builtin operator table (`binary_ops`)
//! - `TypeFormatter` for display
//! - `RecursionGuard` for walks over the cyclic type graph
//!
//! The solver knows nothing about files or bindings. Declared classes reach
//! it only through the `ClassHierarchy` trait.

pub mod binary_ops;
mod format;
mod intern;
pub mod recursion;
pub mod relations;
pub mod type_queries;
pub mod types;

pub use format::{TypeFormatter, format_type};
pub use intern::TypeInterner;
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
pub use relations::{AssignabilityChecker, BuiltinHierarchy, ClassHierarchy, is_assignable, mro};
pub use types::{
    BuiltinClass, ClassKey, DeclaredClass, FunctionShape, FunctionShapeId, ParamInfo, ParamKind,
    TypeArgs, TypeData, TypeId,
};
