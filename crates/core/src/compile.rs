//! Five-pass compiler: schema text -> grammar text.
//!
//! This is a thin orchestrator that calls each pass module in order.
//! Compilation is all-or-nothing: the first error aborts it.

use crate::error::CompileError;
use crate::grammar::Grammar;
use crate::lexer;
use crate::pass1_assemble;
use crate::pass2_index;
use crate::pass3_resolve;
use crate::pass4_emit;
use crate::pass5_serialize;
use crate::source::SourceProvider;
use std::path::Path;

/// Default grammar name written to the `%grammar` directive.
pub const DEFAULT_GRAMMAR_NAME: &str = "Schema";

/// Per-compile settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name written to the `%grammar` directive.
    pub name: String,
    /// Start entity as `<sigil><name>`; the first declaration when unset.
    pub root: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            name: DEFAULT_GRAMMAR_NAME.to_owned(),
            root: None,
        }
    }
}

/// Run passes 0-4 and return the grammar value.
pub fn compile_grammar(
    src: &str,
    filename: &str,
    options: &CompileOptions,
) -> Result<Grammar, CompileError> {
    // Pass 0: tokenize declarations
    let decls = lexer::lex(src, filename)?;

    // Pass 1: entity assembly
    let entities = pass1_assemble::assemble(&decls, filename)?;

    // Pass 2: symbol table
    let table = pass2_index::build_index(entities, filename)?;

    // Pass 3: reference resolution
    let schema = pass3_resolve::resolve(table, options.root.as_deref(), filename)?;

    // Pass 4: grammar emission
    Ok(pass4_emit::emit(&schema, &options.name))
}

/// Compile schema text to grammar text.
pub fn compile(src: &str, filename: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let grammar = compile_grammar(src, filename, options)?;

    // Pass 5: serialization
    Ok(pass5_serialize::serialize(&grammar))
}

/// Read the schema at `path` through `provider` and compile it.
pub fn compile_path(
    provider: &dyn SourceProvider,
    path: &Path,
    options: &CompileOptions,
) -> Result<String, CompileError> {
    let filename = path.display().to_string();
    let src = provider
        .read_source(path)
        .map_err(|e| CompileError::Source {
            path: filename.clone(),
            message: e.to_string(),
        })?;
    tracing::debug!(file = %filename, bytes = src.len(), "compiling schema");
    compile(&src, &filename, options)
}
