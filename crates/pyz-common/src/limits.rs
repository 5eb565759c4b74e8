//! Centralized limits and thresholds.
//!
//! Recursion limits for pipeline stages live here so that a deeply nested or
//! adversarial file degrades to diagnostics instead of a stack overflow.

/// Maximum nesting depth the parser descends before reporting the
/// expression as malformed.
///
/// ```python
/// x = ((((((((((((((((((((((((((((((1))))))))))))))))))))))))))))))
/// ```
pub const MAX_PARSE_DEPTH: u32 = 100;

/// Maximum depth of demand-driven type evaluation.
///
/// Each evaluation of a node or declaration that requires another one adds
/// a frame. Cycles are caught by in-progress markers long before this limit;
/// it only bounds legitimately deep chains such as
///
/// ```python
/// a0 = 1
/// a1 = a0
/// a2 = a1
/// # ... thousands of links ...
/// ```
pub const MAX_EVAL_DEPTH: u32 = 200;

/// Maximum number of classes visited while computing a method resolution order.
pub const MAX_MRO_LENGTH: usize = 64;

/// Maximum number of members kept in a normalized union before it widens to
/// `Unknown`.
pub const MAX_UNION_MEMBERS: usize = 64;

/// Maximum import chain followed when resolving an alias declaration
/// (`from a import x` where `a` re-exports `x` from `b`, ...).
pub const MAX_ALIAS_CHAIN: usize = 32;
