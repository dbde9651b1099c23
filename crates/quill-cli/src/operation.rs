//! Operation files: an [`OperationInput`] written as JSON or TOML.
//!
//! ```toml
//! operation_name = "GetUser"
//! fields = [{ name = "users", args = { where = { id = { _eq = { "$raw" = "$id" } } } }, fields = ["id", "name"] }]
//!
//! [variable_definitions]
//! id = "Int!"
//!
//! [variables]
//! id = 1
//! ```

use std::path::Path;

use quill_builder::{OperationInput, OperationType};
use serde_json::Value as JsonValue;

use crate::{
    error::{CliError, CliResult},
    utils::read_file,
};

fn invalid(path: &Path, reason: impl ToString) -> CliError {
    CliError::OperationFile {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Parses file contents; TOML when `path` ends in `.toml`, JSON otherwise.
pub fn parse_operation(path: &Path, content: &str) -> CliResult<OperationInput> {
    let json = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => {
            let table: toml::Table = toml::from_str(content).map_err(|err| invalid(path, err))?;
            serde_json::to_value(table)?
        }
        _ => serde_json::from_str::<JsonValue>(content).map_err(|err| invalid(path, err))?,
    };

    serde_json::from_value(json).map_err(|err| invalid(path, err))
}

pub fn load_operation(path: &Path) -> CliResult<OperationInput> {
    parse_operation(path, &read_file(path)?)
}

/// Applies command-line overrides of the kind and name.
pub fn with_overrides(
    mut input: OperationInput,
    kind: Option<OperationType>,
    name: Option<String>,
) -> OperationInput {
    if let Some(kind) = kind {
        input.operation_type = kind;
    }
    if let Some(name) = name {
        input.operation_name = Some(name);
    }
    input
}
