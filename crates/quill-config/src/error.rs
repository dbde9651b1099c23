use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(quill_config::toml_serialize),
        help("A profile holds a value TOML cannot represent")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(quill_config::toml_deserialize),
        help("Check the syntax of the quill config file; `quill defconfig` writes a valid one")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(quill_config::already_exists),
        help("Remove the existing file or pass another path with `-c`")
    )]
    ConfigAlreadyExists,

    #[error("Missing default profile: {0}")]
    #[diagnostic(
        code(quill_config::missing_default_profile),
        help("`default_profile` must name a `[profile.<name>]` table")
    )]
    MissingDefaultProfile(String),

    #[error("Missing profile: {0}")]
    #[diagnostic(
        code(quill_config::missing_profile),
        help("Add a `[profile.<name>]` table or pick an existing profile with `-p`")
    )]
    MissingProfile(String),

    #[error("Invalid endpoint `{endpoint}` in profile `{profile}`: {reason}")]
    #[diagnostic(
        code(quill_config::invalid_endpoint),
        help("Endpoints must be absolute http:// or https:// URLs")
    )]
    InvalidEndpoint {
        profile: String,
        endpoint: String,
        reason: String,
    },

    #[error("Invalid timeout `{value}` in profile `{profile}`")]
    #[diagnostic(
        code(quill_config::invalid_timeout),
        help("Use a non-zero duration such as `30s`, `2m` or `1m30s`")
    )]
    InvalidTimeout { profile: String, value: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(quill_config::io))]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(quill_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(quill_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
