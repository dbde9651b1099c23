//! Error types for the quill binary.

use miette::Diagnostic;
use quill_builder::BuildError;
use quill_client::ClientError;
use quill_config::ConfigError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Error while {action}")]
    #[diagnostic(code(quill::io), help("Check that the file exists and is readable"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid operation file {path}: {reason}")]
    #[diagnostic(
        code(quill::operation_file),
        help("Operation files are JSON or TOML with `fields`, `variable_definitions` and `variables`")
    )]
    OperationFile { path: String, reason: String },

    #[error("Invalid header `{0}`")]
    #[diagnostic(code(quill::header), help("Headers are written as `Name: value`"))]
    InvalidHeader(String),

    #[error("Invalid variables: {0}")]
    #[diagnostic(code(quill::variables), help("Variables must be a JSON object"))]
    InvalidVariables(String),

    #[error(transparent)]
    #[diagnostic(code(quill::json))]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = std::result::Result<T, CliError>;

pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> CliResult<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> CliResult<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            CliError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
