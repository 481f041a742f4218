/// All errors that can be returned by a grammar backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The external grammar compiler ran and exited unsuccessfully.
    #[error("{program} failed with {}: {stderr}", exit_label(.code))]
    Invocation {
        program: String,
        /// `None` when the process was terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },

    /// The external grammar compiler could not be started.
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Staging the grammar artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Grammar text is malformed.
    #[error("grammar line {line}: {message}")]
    Grammar { line: u32, message: String },

    /// A rule refers to a nonterminal that has no rule.
    #[error("nonterminal '{name}' used in '{referenced_by}' has no rule")]
    UndefinedNonterminal { name: String, referenced_by: String },

    /// `%start` is missing or names no rule.
    #[error("start symbol '{0}' has no rule")]
    UndefinedStart(String),

    /// A tree document could not be loaded.
    #[error("invalid document: {0}")]
    Document(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {}", c),
        None => "no exit status".to_owned(),
    }
}

impl BackendError {
    pub fn grammar(line: u32, message: impl Into<String>) -> Self {
        BackendError::Grammar {
            line,
            message: message.into(),
        }
    }
}
