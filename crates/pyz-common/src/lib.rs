//! Common types and utilities for the pyz analysis engine.
//!
//! This crate provides foundational types used across all pyz crates:
//! - String interning (`Atom`, `Interner`)
//! - `FileId` / `DeclId` identities
//! - Position/Range types and the `LineMap` for offset conversion
//! - The diagnostic model shared by parser, binder, and checker
//! - Analysis options loaded from `pyzconfig.json`
//! - Centralized limits and thresholds

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Position, Range, TextSpan};

// File and declaration identities
pub mod ids;
pub use ids::{DeclId, FileId};

// Diagnostics shared by every pipeline stage
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, FaultKind};

// Configuration
pub mod options;
pub use options::{AnalysisOptions, InvalidationMode, PythonPlatform, PythonVersion};

// Centralized limits and thresholds
pub mod limits;
