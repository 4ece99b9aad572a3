//! Compile-call failure modes.
//!
//! Almost everything the compiler finds wrong with *source text* becomes a
//! diagnostic inside the [`CompileResult`](crate::session::CompileResult).
//! A [`CompileError`] is reserved for the cases where no result can be
//! produced at all: a root source that cannot be resolved, an unusable
//! source id, or cancellation.

use crate::resolver::ResolveError;

#[derive(Debug)]
pub enum CompileError {
    /// The cancellation token was signalled; no partial state is committed.
    Cancelled,
    /// The source id could not be canonicalized into a URI.
    InvalidSourceId(String),
    /// The root source could not be resolved.
    Root { uri: String, cause: ResolveError },
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Cancelled => write!(f, "Compilation cancelled"),
            CompileError::InvalidSourceId(id) => {
                write!(f, "Cannot canonicalize source id '{id}'")
            }
            CompileError::Root { uri, cause } => {
                write!(f, "Cannot compile '{uri}': {cause}")
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Root { cause, .. } => Some(cause),
            _ => None,
        }
    }
}
