use std::time::Duration;

use documented::{Documented, DocumentedFields};
use indexmap::IndexMap;
use quill_http::{AuthScheme, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::{Host, Url};

use crate::{
    error::{ConfigError, Result},
    utils::parse_duration,
};

/// A profile describes one GraphQL endpoint and how to talk to it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Profile {
    /// GraphQL endpoint URL, e.g. `https://example.com/v1/graphql`.
    ///
    /// Overridden by the `QUILL_ENDPOINT` environment variable.
    pub endpoint: String,

    /// Extra headers sent with every request.
    pub headers: Option<IndexMap<String, String>>,

    /// Request timeout as a duration string such as `30s` or `1m30s`.
    /// Default: 30s
    pub timeout: Option<String>,

    /// Log assembled documents and listener failures.
    /// Default: false
    pub debug: Option<bool>,

    /// Token sent in the `Authorization` header.
    pub auth_token: Option<String>,

    /// Scheme of the `Authorization` header: `bearer` or `basic`.
    /// Default: bearer
    pub auth_scheme: Option<AuthScheme>,

    /// User agent reported to the endpoint.
    pub user_agent: Option<String>,

    /// Proxy URL used for every request.
    pub proxy: Option<String>,
}

impl Profile {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: None,
            timeout: None,
            debug: None,
            auth_token: None,
            auth_scheme: None,
            user_agent: None,
            proxy: None,
        }
    }

    /// The endpoint, honouring the `QUILL_ENDPOINT` override.
    pub fn get_endpoint(&self) -> String {
        std::env::var("QUILL_ENDPOINT").unwrap_or_else(|_| self.endpoint.clone())
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        match &self.timeout {
            Some(value) => parse_duration(value).filter(|d| !d.is_zero()),
            None => Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    pub fn get_auth_scheme(&self) -> AuthScheme {
        self.auth_scheme.unwrap_or_default()
    }

    pub(crate) fn validate(&self, name: &str) -> Result<()> {
        let endpoint = self.get_endpoint();
        let url = validate_endpoint(&endpoint).map_err(|reason| ConfigError::InvalidEndpoint {
            profile: name.to_string(),
            endpoint: endpoint.clone(),
            reason,
        })?;

        if self.auth_token.is_some() && url.scheme() == "http" && !is_loopback(&url) {
            warn!("profile `{name}` sends its auth token over plain http to {endpoint}");
        }

        if self.get_timeout().is_none() {
            return Err(ConfigError::InvalidTimeout {
                profile: name.to_string(),
                value: self.timeout.clone().unwrap_or_default(),
            });
        }

        Ok(())
    }
}

fn validate_endpoint(endpoint: &str) -> std::result::Result<Url, String> {
    if endpoint.trim().is_empty() {
        return Err("endpoint is empty".into());
    }
    let url = Url::parse(endpoint).map_err(|err| err.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme `{other}`")),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain == "localhost",
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
