//! Program-wide identifiers shared by the binder, solver and program.

use serde::Serialize;
use std::fmt;

/// Identity of a source unit within one program. Never reused, even after
/// the unit is removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// A declaration in a specific file's declaration table.
///
/// Only meaningful together with the binding it was produced by; bindings are
/// replaced wholesale, so a `DeclId` must not outlive its generation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId {
    pub file: FileId,
    pub index: u32,
}

impl DeclId {
    pub const fn new(file: FileId, index: u32) -> Self {
        DeclId { file, index }
    }
}
