//! Operational errors of the program API.
//!
//! Analysis problems never show up here: they are diagnostics attached to
//! the file they were found in.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// The file is not part of the program, or its content cannot be read.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A cancellable operation observed its token at a yield point.
    #[error("operation cancelled")]
    Cancelled,

    /// An internal invariant is broken; the program state should be
    /// discarded and rebuilt.
    #[error("fatal analysis error: {message}")]
    Fatal { message: String },
}

impl ProgramError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        ProgramError::FileNotFound { path: path.into() }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        ProgramError::Fatal {
            message: message.into(),
        }
    }
}

pub type ProgramResult<T> = Result<T, ProgramError>;
