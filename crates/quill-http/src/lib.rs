//! HTTP transport for quill.
//!
//! The client talks to the network only through [`Transport`]. The default
//! implementation, [`UreqTransport`], is a blocking `ureq` agent; tests
//! substitute their own.

pub mod error;
pub mod request;
pub mod transport;

use serde::{Deserialize, Serialize};

pub use error::{Result, TransportError, NETWORK_STATUS, TIMEOUT_STATUS};
pub use request::{
    header, remove_header, set_header, Headers, HttpRequest, HttpResponse, Method, CONTENT_TYPE,
    DEFAULT_TIMEOUT, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
pub use transport::{AgentConfig, Transport, UreqTransport};

/// Header name written by [`AuthScheme::header_value`] callers.
pub const AUTHORIZATION: &str = "Authorization";

/// Scheme prefix of the `Authorization` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    #[default]
    Bearer,
    Basic,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bearer => "Bearer",
            Self::Basic => "Basic",
        }
    }

    /// `"<Scheme> <token>"`
    pub fn header_value(&self, token: &str) -> String {
        format!("{} {}", self.as_str(), token)
    }
}
