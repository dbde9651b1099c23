//! Operation assembly.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::{
    error::{BuildError, Result},
    fields::Fields,
    render::{render_fields, INDENT_STEP},
    variables::{declared_name, project_variables, VariableDefinitions, Variables},
};

/// Operation name used when the input does not provide one.
pub const DEFAULT_OPERATION_NAME: &str = "GeneratedOperation";

/// Selection used when the input does not provide one; always valid.
pub const SENTINEL_FIELD: &str = "__typename";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" => Ok(Self::Query),
            "mutation" => Ok(Self::Mutation),
            "subscription" => Ok(Self::Subscription),
            other => Err(BuildError::UnknownOperationType(other.to_string())),
        }
    }
}

/// Everything needed to assemble one operation.
///
/// Missing pieces fall back to defaults at assembly time: a `query`, named
/// [`DEFAULT_OPERATION_NAME`], selecting [`SENTINEL_FIELD`], with no variables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OperationInput {
    pub operation_type: OperationType,
    /// `Some("")` leaves the operation anonymous.
    pub operation_name: Option<String>,
    pub fields: Option<Fields>,
    pub variable_definitions: VariableDefinitions,
    pub variables: Variables,
}

impl OperationInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation_type(mut self, operation_type: OperationType) -> Self {
        self.operation_type = operation_type;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<Fields>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    /// Declares `$name` with the given type. The `$` prefix is optional.
    pub fn declare(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.variable_definitions.insert(name.into(), ty.into());
        self
    }

    /// Supplies a runtime value for a variable, keyed without the `$` prefix.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables.extend(variables);
        self
    }
}

/// An assembled document and the variables it declares values for.
///
/// Serializes to the request body `{"query": ..., "variables": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    pub query: String,
    pub variables: Variables,
}

/// Renders `<type> <name>(<$var>: <Type>, ...)`.
///
/// The name is omitted when empty and the parentheses when nothing is declared.
pub fn render_header(
    operation_type: OperationType,
    operation_name: &str,
    definitions: &VariableDefinitions,
) -> String {
    let mut header = operation_type.as_str().to_string();

    if !operation_name.is_empty() {
        header.push(' ');
        header.push_str(operation_name);
    }

    if !definitions.is_empty() {
        let defs = definitions
            .iter()
            .map(|(name, ty)| format!("{}: {}", declared_name(name), ty))
            .collect::<Vec<_>>()
            .join(", ");
        header.push('(');
        header.push_str(&defs);
        header.push(')');
    }

    header
}

/// Assembles the full document for `input` and projects its variables.
///
/// ```
/// use quill_builder::{args, assemble, Field, OperationInput, Value};
///
/// let input = OperationInput::new()
///     .name("GetUser")
///     .fields(
///         Field::new("users")
///             .arg("where", args! { "id" => args! { "_eq" => Value::variable("id") } })
///             .fields(["id", "name"]),
///     )
///     .declare("id", "Int!")
///     .variable("id", 1);
///
/// let op = assemble(&input).unwrap();
/// assert_eq!(
///     op.query,
///     "query GetUser($id: Int!) {\n  users(where: {id: {_eq: $id}}) {\n    id\n    name\n  }\n}"
/// );
/// assert_eq!(op.variables["id"], 1);
/// ```
pub fn assemble(input: &OperationInput) -> Result<OperationResult> {
    let name = input
        .operation_name
        .as_deref()
        .unwrap_or(DEFAULT_OPERATION_NAME);
    let header = render_header(input.operation_type, name, &input.variable_definitions);

    let body = match &input.fields {
        Some(fields) => render_fields(fields, INDENT_STEP)?,
        None => render_fields(&Fields::sentinel(), INDENT_STEP)?,
    };

    let query = format!("{header} {{\n{INDENT_STEP}{body}\n}}");
    let variables = project_variables(&input.variable_definitions, &input.variables);

    trace!(
        operation = %input.operation_type,
        name,
        variables = variables.len(),
        "assembled operation"
    );

    Ok(OperationResult {
        query,
        variables,
    })
}

/// Assembles `input` as a query, whatever its `operation_type`.
pub fn build_query(input: OperationInput) -> Result<OperationResult> {
    assemble(&input.operation_type(OperationType::Query))
}

/// Assembles `input` as a mutation, whatever its `operation_type`.
pub fn build_mutation(input: OperationInput) -> Result<OperationResult> {
    assemble(&input.operation_type(OperationType::Mutation))
}

/// Assembles `input` as a subscription, whatever its `operation_type`.
///
/// Assembly always succeeds for well-formed input; whether a subscription can
/// be dispatched is up to the caller.
pub fn build_subscription(input: OperationInput) -> Result<OperationResult> {
    assemble(&input.operation_type(OperationType::Subscription))
}
