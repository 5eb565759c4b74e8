//! Identifier interning for parse trees.
//!
//! Every parse tree owns one `Interner`. Names are stored in nodes as `Atom`
//! handles, which are positions in an insertion-ordered set, so two parses
//! of the same text produce the same atoms.

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use serde::Serialize;

/// Position of an identifier in its tree's `Interner`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string, interned first by every interner.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Atom::NONE
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Names nearly every module mentions; interned up front so their atoms
/// are small and stable.
const PRELUDE: &[&str] = &[
    "self", "cls", "__init__", "__all__", "__name__", "None", "int", "str", "float", "bool",
    "bytes", "list", "dict", "tuple", "set", "object", "len", "print", "range", "isinstance",
];

/// # Example
/// ```
/// use pyz_common::interner::Interner;
/// let mut interner = Interner::new();
/// let a = interner.intern("spam");
/// assert_eq!(interner.intern("spam"), a);
/// assert_eq!(interner.resolve(a), "spam");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interner {
    names: IndexSet<Box<str>, FxBuildHasher>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let mut names = IndexSet::with_capacity_and_hasher(256, FxBuildHasher);
        names.insert(Box::from(""));
        Interner { names }
    }

    /// An interner with the prelude names already interned.
    pub fn with_prelude() -> Self {
        let mut interner = Self::new();
        for name in PRELUDE {
            interner.intern(name);
        }
        interner
    }

    #[inline]
    pub fn intern(&mut self, name: &str) -> Atom {
        if let Some(index) = self.names.get_index_of(name) {
            return Atom(index as u32);
        }
        let (index, _) = self.names.insert_full(Box::from(name));
        Atom(index as u32)
    }

    /// The atom of `name` if it was interned; never allocates.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<Atom> {
        self.names.get_index_of(name).map(|i| Atom(i as u32))
    }

    /// Text of `atom`; empty for atoms from another interner that are out
    /// of range here.
    #[inline]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.names
            .get_index(atom.0 as usize)
            .map(|name| name.as_ref())
            .unwrap_or("")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Only the empty string is interned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.len() <= 1
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod interner_tests;
