use crate::ast::Kind;

/// A compile error. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Malformed declaration line.
    #[error("{file}:{line}: {message}")]
    SpecSyntax {
        file: String,
        line: u32,
        message: String,
    },

    /// The same (kind, name) pair was declared twice.
    #[error("{file}:{line}: duplicate {kind} '{name}': first declared at line {first_line}")]
    DuplicateEntity {
        file: String,
        line: u32,
        kind: Kind,
        name: String,
        first_line: u32,
    },

    /// The configured root does not name a declared entity.
    #[error("root entity '{0}' is not declared")]
    UnknownRoot(String),

    /// Nothing to compile.
    #[error("{0}: schema declares no entities")]
    EmptySchema(String),

    /// The schema text could not be read.
    #[error("cannot read '{path}': {message}")]
    Source { path: String, message: String },
}

impl CompileError {
    pub fn syntax(file: &str, line: u32, message: impl Into<String>) -> Self {
        CompileError::SpecSyntax {
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::SpecSyntax { .. } => "SpecSyntaxError",
            CompileError::DuplicateEntity { .. } => "DuplicateEntityError",
            CompileError::UnknownRoot(_) => "UnknownRootError",
            CompileError::EmptySchema(_) => "EmptySchemaError",
            CompileError::Source { .. } => "SourceError",
        }
    }

    /// Line the error points at, when it points at one.
    pub fn line(&self) -> Option<u32> {
        match self {
            CompileError::SpecSyntax { line, .. } | CompileError::DuplicateEntity { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }

    /// Serialize for `--output json`. Always carries every field (null when absent).
    pub fn to_json_value(&self) -> serde_json::Value {
        let file = match self {
            CompileError::SpecSyntax { file, .. }
            | CompileError::DuplicateEntity { file, .. }
            | CompileError::EmptySchema(file) => Some(file.clone()),
            CompileError::Source { path, .. } => Some(path.clone()),
            CompileError::UnknownRoot(_) => None,
        };
        serde_json::json!({
            "error":   self.kind(),
            "file":    file,
            "line":    self.line(),
            "message": self.to_string(),
        })
    }
}
