//! hashgram-backend: turn grammar text into a structural validator.
//!
//! [`Backend`] is the seam between the compiler and whatever builds the
//! executable validator. [`InProcessBackend`] reads the grammar back and
//! builds a [`Validator`] directly; [`ExternalBackend`] stages the grammar in
//! a temporary file and runs an external grammar compiler on it.

pub mod backend;
pub mod error;
pub mod reader;
pub mod tree;
pub mod validator;

pub use backend::{Backend, ExternalArtifact, ExternalBackend, InProcessBackend};
pub use error::BackendError;
pub use reader::read_grammar;
pub use tree::Node;
pub use validator::{Validator, Violation};
