//! Error types for quill-client.

use miette::Diagnostic;
use quill_builder::{BuildError, Variables};
use quill_config::ConfigError;
use quill_http::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Fallback message for an `errors` array whose first entry has none.
pub const GRAPHQL_ERRORS: &str = "GraphQL errors";

#[derive(Error, Diagnostic, Debug)]
pub enum ClientError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("{}", .0.message)]
    #[diagnostic(
        code(quill_client::graphql),
        help("The server rejected the document; inspect the returned errors")
    )]
    GraphQL(Box<GraphQLFailure>),

    #[error("Subscription is not supported yet. Please use execute for now.")]
    #[diagnostic(code(quill_client::subscription))]
    UnsupportedSubscription,

    #[error("Invalid response from server: {reason}")]
    #[diagnostic(code(quill_client::invalid_response))]
    InvalidResponse { reason: String },

    #[error("Failed to decode response data: {0}")]
    #[diagnostic(
        code(quill_client::decode),
        help("Check that the selection matches the type being decoded")
    )]
    Decode(#[from] serde_json::Error),

    #[error("page and page_size must be at least 1, page: {page}, page_size: {page_size}")]
    #[diagnostic(code(quill_client::pagination))]
    InvalidPagination { page: u64, page_size: u64 },
}

impl ClientError {
    /// The document-level failure, if this is one.
    pub fn graphql(&self) -> Option<&GraphQLFailure> {
        match self {
            Self::GraphQL(failure) => Some(failure),
            _ => None,
        }
    }
}

/// One entry of a response `errors` array. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, JsonValue>>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u64,
    pub column: u64,
}

impl GraphQLError {
    /// Reads one `errors` entry; entries that are not error objects keep
    /// their JSON text as the message.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::String(message) => Self {
                message,
                ..Self::default()
            },
            JsonValue::Object(_) => serde_json::from_value(value.clone()).unwrap_or_else(|_| Self {
                message: value.to_string(),
                ..Self::default()
            }),
            other => Self {
                message: other.to_string(),
                ..Self::default()
            },
        }
    }
}

/// A response that carried a non-empty `errors` array.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQLFailure {
    pub message: String,
    pub query: String,
    pub variables: Variables,
    /// Partial data returned alongside the errors, if any.
    pub data: Option<JsonValue>,
    pub errors: Vec<GraphQLError>,
}

impl GraphQLFailure {
    pub fn new(
        query: impl Into<String>,
        variables: Variables,
        data: Option<JsonValue>,
        errors: Vec<GraphQLError>,
    ) -> Self {
        let message = errors
            .first()
            .map(|err| err.message.as_str())
            .filter(|message| !message.is_empty())
            .unwrap_or(GRAPHQL_ERRORS)
            .to_string();

        Self {
            message,
            query: query.into(),
            variables,
            data,
            errors,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_graphql_error_keeps_unknown_keys() {
        let err: GraphQLError = serde_json::from_value(json!({
            "message": "field not found",
            "locations": [{"line": 2, "column": 3}],
            "extensions": {"code": "validation-failed"},
            "hint": "check the schema"
        }))
        .unwrap();

        assert_eq!(err.message, "field not found");
        assert_eq!(err.locations.unwrap()[0], Location { line: 2, column: 3 });
        assert_eq!(err.extensions.unwrap()["code"], "validation-failed");
        assert_eq!(err.extra["hint"], "check the schema");
    }

    #[test]
    fn test_graphql_error_from_odd_entries() {
        assert_eq!(GraphQLError::from_json(json!("boom")).message, "boom");
        assert_eq!(GraphQLError::from_json(json!(3)).message, "3");
        let err = GraphQLError::from_json(json!({"message": 5}));
        assert_eq!(err.message, r#"{"message":5}"#);
    }

    #[test]
    fn test_failure_message() {
        let failure = GraphQLFailure::new(
            "query { x }",
            Variables::new(),
            None,
            vec![
                GraphQLError::from_json(json!({"message": "first"})),
                GraphQLError::from_json(json!({"message": "second"})),
            ],
        );
        assert_eq!(failure.message, "first");

        let failure = GraphQLFailure::new(
            "query { x }",
            Variables::new(),
            None,
            vec![GraphQLError::from_json(json!({"extensions": {}}))],
        );
        assert_eq!(failure.message, "GraphQL errors");
    }

    #[test]
    fn test_client_error_messages() {
        let err = ClientError::GraphQL(Box::new(GraphQLFailure::new(
            "q",
            Variables::new(),
            None,
            vec![GraphQLError::from_json(json!({"message": "denied"}))],
        )));
        assert_eq!(err.to_string(), "denied");
        assert!(err.graphql().is_some());

        assert_eq!(
            ClientError::UnsupportedSubscription.to_string(),
            "Subscription is not supported yet. Please use execute for now."
        );
        assert!(ClientError::InvalidPagination {
            page: 0,
            page_size: 10,
        }
        .graphql()
        .is_none());
    }
}
