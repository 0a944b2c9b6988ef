//! Tessel Patterns - instruction-selection patterns and their tables.
//!
//! This crate provides:
//! - Pattern model (`Pattern`, `PatternNode`): what a pattern matches and
//!   the template it emits
//! - Pattern-definition front end: `logos` lexer and recursive-descent
//!   parser producing an [`ast::Document`]
//! - Pattern compiler: resolves operations, captures and backreferences
//! - Pattern tables (`PatternTables`): the read-only registry the matcher
//!   consults, indexed by group, by root operation, and for stores by the
//!   stored value's operation
//!
//! # Pattern files
//!
//! ```text
//! src:
//!     (<r> LOCAL) -> [<r>]
//!   | (<c> CONSTANT) -> [<c>]
//!   ;
//! add: (I32 ADD (<a> LOCAL) <b> src) -> [MOV <out>, <a>] [ADD <out>, <b>];
//! ```
//!
//! Tables are built once at start-up; any error is an authoring defect in
//! the pattern file and is reported as a [`CompileError`].

pub mod ast;
mod compile;
mod errors;
mod lexer;
mod model;
mod parse;
mod tables;

pub use compile::compile_document;
pub use errors::{CompileError, DefinitionError, DefinitionErrorKind, SyntaxError, SyntaxErrorKind};
pub use lexer::Span;
pub use model::{is_reserved, Pattern, PatternNode, TempRef};
pub use parse::parse_document;
pub use tables::{PatternTables, BUILTIN_SOURCE};
