use miette::Diagnostic;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Status reported for failures that never produced an HTTP response.
pub const NETWORK_STATUS: u16 = 0;

/// Status reported when the request deadline expires.
pub const TIMEOUT_STATUS: u16 = 408;

#[derive(Error, Diagnostic, Debug)]
pub enum TransportError {
    #[error("Request timeout")]
    #[diagnostic(
        code(quill_http::timeout),
        help("Increase the profile timeout or check that the endpoint is responsive")
    )]
    Timeout,

    #[error("HTTP error! status: {status} {status_text}")]
    #[diagnostic(code(quill_http::status))]
    Status {
        status: u16,
        status_text: String,
        body: JsonValue,
    },

    #[error("{message}")]
    #[diagnostic(
        code(quill_http::network),
        help("Check your internet connection or try again later")
    )]
    Network {
        message: String,
        #[source]
        source: Option<Box<ureq::Error>>,
    },

    #[error("Invalid proxy: {url}")]
    #[diagnostic(code(quill_http::proxy))]
    InvalidProxy {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Failed to encode request body")]
    #[diagnostic(code(quill_http::body))]
    Body(#[from] serde_json::Error),
}

impl TransportError {
    /// HTTP status of the failure; `0` when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            Self::Timeout => TIMEOUT_STATUS,
            Self::Status {
                status, ..
            } => *status,
            Self::Network {
                ..
            }
            | Self::InvalidProxy {
                ..
            }
            | Self::Body(_) => NETWORK_STATUS,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => Self::Timeout,
            ureq::Error::StatusCode(status) => Self::Status {
                status,
                status_text: String::new(),
                body: JsonValue::Null,
            },
            other => Self::Network {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
