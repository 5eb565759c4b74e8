//! When does a content change invalidate more than its dependents?
//!
//! A local invalidation re-binds the changed unit and lazily re-binds and
//! re-evaluates its transitive dependents. A full invalidation drops every
//! memo table and the type interner, because name resolution itself may
//! have changed.

use pyz_binder::PublicSymbols;
use pyz_common::options::InvalidationMode;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InvalidationScope {
    Local,
    Full,
}

/// Decides the scope of an invalidation after a unit was re-bound.
pub trait InvalidationPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `before` and `after` are the unit's exported symbols around the
    /// content change.
    fn scope(&self, before: &PublicSymbols, after: &PublicSymbols) -> InvalidationScope;
}

/// Full invalidation when the set of exported names, or the kind of any of
/// them, changed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PublicSymbolPolicy;

impl InvalidationPolicy for PublicSymbolPolicy {
    fn name(&self) -> &'static str {
        "publicSymbols"
    }

    fn scope(&self, before: &PublicSymbols, after: &PublicSymbols) -> InvalidationScope {
        if before == after {
            InvalidationScope::Local
        } else {
            InvalidationScope::Full
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysFull;

impl InvalidationPolicy for AlwaysFull {
    fn name(&self) -> &'static str {
        "always"
    }

    fn scope(&self, _before: &PublicSymbols, _after: &PublicSymbols) -> InvalidationScope {
        InvalidationScope::Full
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DependentsOnly;

impl InvalidationPolicy for DependentsOnly {
    fn name(&self) -> &'static str {
        "dependentsOnly"
    }

    fn scope(&self, _before: &PublicSymbols, _after: &PublicSymbols) -> InvalidationScope {
        InvalidationScope::Local
    }
}

pub fn policy_for(mode: InvalidationMode) -> Box<dyn InvalidationPolicy> {
    match mode {
        InvalidationMode::PublicSymbols => Box::new(PublicSymbolPolicy),
        InvalidationMode::Always => Box::new(AlwaysFull),
        InvalidationMode::DependentsOnly => Box::new(DependentsOnly),
    }
}

#[cfg(test)]
#[path = "../tests/invalidation_tests.rs"]
mod invalidation_tests;
