//! Recursion guards for walks over the type graph.
//!
//! Types may refer to themselves (through `Recursive` references and class
//! hierarchies), so every structural walk carries a guard that combines
//! cycle detection with a depth bound.
//!
//! ```ignore
//! let mut guard = RecursionGuard::with_profile(RecursionProfile::Assignability);
//! match guard.enter((source, target)) {
//!     RecursionResult::Entered => {
//!         let result = compare(source, target);
//!         guard.leave((source, target));
//!         result
//!     }
//!     RecursionResult::Cycle => true,
//!     RecursionResult::DepthExceeded => false,
//! }
//! ```

use pyz_common::limits::MAX_MRO_LENGTH;
use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Named depth presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Structural assignability between two types.
    ///
    /// depth = 64
    Assignability,

    /// Rendering a type to text.
    ///
    /// depth = 32
    Formatting,

    /// Walking a class and its bases.
    ///
    /// depth = `MAX_MRO_LENGTH`
    MroWalk,
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::Assignability => 64,
            Self::Formatting => 32,
            Self::MroWalk => MAX_MRO_LENGTH as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already on the stack.
    Cycle,
    DepthExceeded,
}

/// Cycle detection plus depth limiting.
///
/// Every successful [`enter`](Self::enter) must be paired with a
/// [`leave`](Self::leave) for the same key. In debug builds dropping a guard
/// with entries still on the stack panics.
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    max_depth: u32,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            max_depth,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    pub fn enter(&mut self, key: K) -> RecursionResult {
        if self.depth >= self.max_depth {
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(was_present, "RecursionGuard::leave() without matching enter()");
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!(
                "RecursionGuard dropped with {} active entries",
                self.visiting.len()
            );
        }
    }
}

/// Depth-only counter for walks that may legitimately revisit a key.
#[derive(Debug)]
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Returns `false` at the limit.
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod recursion_tests;
