//! Incremental program orchestrator for the pyz analysis engine.
//!
//! - `SourceUnitStore` - per-file analysis state, dirty set and import edges
//! - `Program` - drives parse, bind and evaluation on demand, decides what a
//!   content change invalidates and answers queries for the current
//!   generation
//! - `HandleRegistry` - generation-scoped handles for declarations and types
//! - `Scheduler` - cooperative task queue with cancellable whole-program
//!   checks
//!
//! The program is single-threaded. Concurrency between requests comes from
//! interleaving scheduler steps, never from parallel mutation.

pub mod cancellation;
pub use cancellation::CancellationToken;

pub mod dependency_graph;
pub use dependency_graph::DependencyGraph;

pub mod error;
pub use error::{ProgramError, ProgramResult};

pub mod file_system;
pub use file_system::{FileSystem, Host, InMemoryFileSystem, NoAccessHost, RealFileSystem, StaticHost};

pub mod handles;
pub use handles::{HandleKind, HandleRegistry, parse_handle};

pub mod invalidation;
pub use invalidation::{
    AlwaysFull, DependentsOnly, InvalidationPolicy, InvalidationScope, PublicSymbolPolicy,
};

pub mod module_resolver;
pub use module_resolver::ModuleResolver;

pub mod source_unit;
pub use source_unit::{SourceUnit, SourceUnitStore, StaleReason, UnitState, UnitStats};

mod program;
pub use program::{Program, ProgramStats};

mod program_pipeline;
mod program_queries;
pub use program_queries::FileDiagnostics;
mod program_view;

pub mod scheduler;
pub use scheduler::{Scheduler, Task};

