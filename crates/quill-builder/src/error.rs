use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Malformed field specification: {reason}")]
    #[diagnostic(
        code(quill_builder::malformed_fields),
        help("A field specification is a name, a list of specifications, or an object with a non-empty `name`")
    )]
    MalformedFields { reason: String },

    #[error("Unknown operation type: {0}")]
    #[diagnostic(
        code(quill_builder::operation_type),
        help("Use one of `query`, `mutation` or `subscription`")
    )]
    UnknownOperationType(String),
}

impl BuildError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFields {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
