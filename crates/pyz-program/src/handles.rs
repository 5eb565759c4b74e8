//! Stable handles for declarations and types.
//!
//! External consumers hold handles across request boundaries instead of
//! references into analysis state. A handle reads `g{generation}:{d|t}{n}`;
//! `n` keeps counting across registries so a handle string is never issued
//! twice. Each generation has its own registry. A superseded registry is
//! retired: it drops its tables and answers "not found".

use dashmap::DashMap;
use pyz_common::ids::DeclId;
use pyz_solver::TypeId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Declaration,
    Type,
}

impl HandleKind {
    fn tag(self) -> char {
        match self {
            HandleKind::Declaration => 'd',
            HandleKind::Type => 't',
        }
    }
}

/// Generation and kind encoded in `handle`.
pub fn parse_handle(handle: &str) -> Option<(u64, HandleKind, u64)> {
    let rest = handle.strip_prefix('g')?;
    let (generation, rest) = rest.split_once(':')?;
    let mut chars = rest.chars();
    let kind = match chars.next()? {
        'd' => HandleKind::Declaration,
        't' => HandleKind::Type,
        _ => return None,
    };
    Some((generation.parse().ok()?, kind, chars.as_str().parse().ok()?))
}

#[derive(Debug)]
pub struct HandleRegistry {
    generation: u64,
    next: AtomicU64,
    retired: AtomicBool,
    declarations: DashMap<String, DeclId>,
    declaration_handles: DashMap<DeclId, String>,
    types: DashMap<String, TypeId>,
    type_handles: DashMap<TypeId, String>,
}

impl HandleRegistry {
    pub fn new(generation: u64) -> Self {
        Self::starting_at(generation, 1)
    }

    fn starting_at(generation: u64, next: u64) -> Self {
        HandleRegistry {
            generation,
            next: AtomicU64::new(next),
            retired: AtomicBool::new(false),
            declarations: DashMap::new(),
            declaration_handles: DashMap::new(),
            types: DashMap::new(),
            type_handles: DashMap::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.declarations.len() + self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate(&self, kind: HandleKind) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let handle = format!("g{}:{}{n}", self.generation, kind.tag());
        trace!(%handle, "allocated handle");
        handle
    }

    /// Handle for `decl`; the same handle when registered twice. `None` once
    /// the registry is retired.
    pub fn register_declaration(&self, decl: DeclId) -> Option<String> {
        if self.is_retired() {
            return None;
        }
        let handle = self
            .declaration_handles
            .entry(decl)
            .or_insert_with(|| {
                let handle = self.allocate(HandleKind::Declaration);
                self.declarations.insert(handle.clone(), decl);
                handle
            })
            .clone();
        Some(handle)
    }

    pub fn declaration(&self, handle: &str) -> Option<DeclId> {
        if self.is_retired() {
            return None;
        }
        self.declarations.get(handle).map(|entry| *entry.value())
    }

    pub fn register_type(&self, ty: TypeId) -> Option<String> {
        if self.is_retired() {
            return None;
        }
        let handle = self
            .type_handles
            .entry(ty)
            .or_insert_with(|| {
                let handle = self.allocate(HandleKind::Type);
                self.types.insert(handle.clone(), ty);
                handle
            })
            .clone();
        Some(handle)
    }

    pub fn type_of(&self, handle: &str) -> Option<TypeId> {
        if self.is_retired() {
            return None;
        }
        self.types.get(handle).map(|entry| *entry.value())
    }

    /// Drop every table. Later lookups return `None`.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
        self.declarations.clear();
        self.declaration_handles.clear();
        self.types.clear();
        self.type_handles.clear();
    }

    /// Retire this registry and start the one for `generation`, continuing
    /// the counter.
    pub fn successor(&self, generation: u64) -> HandleRegistry {
        self.retire();
        let next = self.next.load(Ordering::SeqCst);
        trace!(from = self.generation, to = generation, next, "handle registry superseded");
        Self::starting_at(generation, next)
    }
}

#[cfg(test)]
#[path = "../tests/handles_tests.rs"]
mod handles_tests;
