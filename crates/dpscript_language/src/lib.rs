//! # dpscript-language
//!
//! Lexer, parse tree, and parser for the DP dialogue scripting language.
//!
//! DP is indentation-structured: labels, menu arms, and conditionals open
//! indented blocks; quoted strings are f-strings with `{...}` embeds
//! evaluated in an expression sub-grammar. This crate turns source text
//! into a [`Program`]; the compile crate lowers that into the statement IR.
//!
//! ## Pipeline
//!
//! 1. **Lexer** ([`lexer`]) — line-oriented, mode-stacked tokenization with
//!    `Indent`/`Dedent` tracking.
//! 2. **Parser** ([`parser`]) — recursive descent with per-statement error
//!    recovery; always returns a program, problems land in the
//!    diagnostic bag.
//! 3. **Traversal** ([`visitor`]) — dispatch-by-kind walking;
//!    [`printer::dump_program`] is the built-in tree dump.
//!
//! ## Example
//!
//! ```
//! use dpscript_base::DiagnosticBag;
//! use dpscript_language::{Lexer, Parser};
//!
//! let source = "label start:\n    Alice \"hello\"\n";
//! let mut diagnostics = DiagnosticBag::new();
//! let tokens = Lexer::new(source).tokenize(&mut diagnostics);
//! let program = Parser::new(tokens).parse_program(&mut diagnostics);
//!
//! assert!(diagnostics.is_empty());
//! assert_eq!(program.labels.len(), 1);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;
pub mod visitor;

pub use ast::Program;
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenType};
pub use visitor::Visitor;
