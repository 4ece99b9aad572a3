//! # dpscript-compile
//!
//! The DP compiler back half: expression trees, statement IR, symbol
//! tables, import resolution, and the compilation session.
//!
//! ## Pipeline
//!
//! ```text
//! source text ──lex/parse──▶ parse tree ──lower──▶ SIR + symbol table
//!      ▲                                                  │
//!      │ resolver (async, injectable)                     ▼
//!      └───────── import recursion ◀──────── semantic check ──▶ CompileResult
//! ```
//!
//! A [`Compiler`] resolves a source id to a canonical URI, compiles the
//! file and its transitive imports depth-first (cycles terminate), runs the
//! semantic pass (duplicate imports, undefined/duplicate labels, undefined
//! variables), and caches one [`CompileResult`] per URI. Symbol queries
//! ([`Compiler::find_label_definition`],
//! [`Compiler::find_variable_definition`]) serve go-to-definition over the
//! last completed compile.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use dpscript_base::CancelToken;
//! use dpscript_compile::{Compiler, MemoryResolver};
//!
//! # async fn example() {
//! let resolver = MemoryResolver::new()
//!     .with("file:///story/main.dp", "label start:\n    Alice \"hi\"\n");
//! let mut compiler = Compiler::new(Arc::new(resolver));
//! let result = compiler
//!     .compile("file:///story/main.dp", &CancelToken::new())
//!     .await
//!     .expect("root resolves");
//! assert!(result.success);
//! # }
//! ```

pub mod error;
pub mod expr;
pub mod lower;
pub mod resolver;
pub mod session;
pub mod sir;
pub mod symbols;

pub use error::CompileError;
pub use expr::{Environment, EvalError, EvalResult, Expr, Value, ValueType, PLACEHOLDER};
pub use lower::Lowerer;
pub use resolver::{FsResolver, MemoryResolver, ResolveError, ResolveResult, SourceResolver};
pub use session::{canonicalize_source_id, CompileResult, Compiler};
pub use sir::{LabelSet, MenuArm, SirLabel, SirStmt, ENTRANCE_LABEL};
pub use symbols::{FileSymbolTable, SymbolPosition, SymbolTableManager};
