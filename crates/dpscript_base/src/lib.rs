//! # dpscript-base
//!
//! Pure structural atoms shared by every crate in the DP compiler:
//! source positions, diagnostic records, the ordered diagnostic collector,
//! and the cancellation token.
//!
//! Nothing in this crate knows about tokens, syntax, or the IR; it is the
//! vocabulary the rest of the pipeline reports in.

pub mod cancel;
pub mod diagnostics;
pub mod span;

pub use cancel::CancelToken;
pub use diagnostics::{Diagnostic, DiagnosticBag, Severity};
pub use span::{Position, Span};
