//! hashgram-core: schema-to-grammar compiler.
//!
//! Compiles declarations of nested scalar / array / mapping structures into
//! a production-rule grammar over the linearized tree token stream. A
//! backend turns that grammar into a structural validator.
//!
//! # Public API
//!
//! - [`compile()`] -- schema text to grammar text
//! - [`compile_grammar()`] -- schema text to the [`Grammar`] value
//! - [`compile_path()`] -- read through a [`SourceProvider`], then compile
//! - [`CompileOptions`] -- grammar name and root entity
//! - [`CompileError`] -- compile error type
//!
//! Individual pass entry functions are also re-exported for selective
//! pipeline execution.

pub mod ast;
pub mod compile;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod pass1_assemble;
pub mod pass2_index;
pub mod pass3_resolve;
pub mod pass4_emit;
pub mod pass5_serialize;
pub mod source;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Entity, EntityId, ItemToken, Kind};
pub use compile::CompileOptions;
pub use error::CompileError;
pub use grammar::{Grammar, Rule, Symbol, Terminal};
pub use pass2_index::SymbolTable;
pub use pass3_resolve::ResolvedSchema;
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use compile::{compile, compile_grammar, compile_path};
pub use lexer::lex;
pub use pass1_assemble::assemble;
pub use pass2_index::build_index;
pub use pass3_resolve::resolve;
pub use pass4_emit::emit;
pub use pass5_serialize::serialize;
