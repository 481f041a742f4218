//! The pluggable backend seam: grammar text in, compiled artifact out.

use crate::error::BackendError;
use crate::reader;
use crate::validator::Validator;
use std::io::Write;
use std::process::Command;

/// Turns grammar text into something that can validate trees.
pub trait Backend {
    type Artifact;

    fn compile(&self, grammar_text: &str) -> Result<Self::Artifact, BackendError>;
}

/// Builds a [`Validator`] in the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessBackend;

impl Backend for InProcessBackend {
    type Artifact = Validator;

    fn compile(&self, grammar_text: &str) -> Result<Validator, BackendError> {
        let grammar = reader::read_grammar(grammar_text)?;
        Validator::new(&grammar)
    }
}

/// Placeholder in [`ExternalBackend::args`] replaced by the grammar file path.
pub const GRAMMAR_PLACEHOLDER: &str = "{grammar}";
/// Placeholder in [`ExternalBackend::args`] replaced by the `%grammar` name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Hands grammar text to an external grammar-compiler executable.
///
/// The grammar is written to a temporary file that lives until the program
/// exits. If no argument contains [`GRAMMAR_PLACEHOLDER`], the file path is
/// appended as the last argument.
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    pub program: String,
    pub args: Vec<String>,
}

/// Result of a successful external compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalArtifact {
    pub program: String,
    pub exit_code: i32,
    pub stdout: String,
}

impl ExternalBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ExternalBackend {
            program: program.into(),
            args,
        }
    }

    fn expand_args(&self, grammar_path: &str, name: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                a.replace(GRAMMAR_PLACEHOLDER, grammar_path)
                    .replace(NAME_PLACEHOLDER, name)
            })
            .collect();
        if !self.args.iter().any(|a| a.contains(GRAMMAR_PLACEHOLDER)) {
            args.push(grammar_path.to_owned());
        }
        args
    }
}

impl Backend for ExternalBackend {
    type Artifact = ExternalArtifact;

    fn compile(&self, grammar_text: &str) -> Result<ExternalArtifact, BackendError> {
        let mut file = tempfile::Builder::new()
            .prefix("hashgram-")
            .suffix(".grammar")
            .tempfile()?;
        file.write_all(grammar_text.as_bytes())?;
        file.flush()?;

        let grammar_path = file.path().display().to_string();
        let name = reader::grammar_name(grammar_text).unwrap_or("Schema");
        let args = self.expand_args(&grammar_path, name);

        tracing::info!(program = %self.program, ?args, "invoking grammar compiler");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| BackendError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BackendError::Invocation {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
            });
        }

        tracing::info!(program = %self.program, "grammar compiler finished");
        Ok(ExternalArtifact {
            program: self.program.clone(),
            exit_code: output.status.code().unwrap_or(0),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
