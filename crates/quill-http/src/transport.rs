use serde_json::Value as JsonValue;
use tracing::trace;
use ureq::{
    http,
    typestate::{WithBody, WithoutBody},
    Agent, Body, Proxy, RequestBuilder,
};

use crate::{
    error::{Result, TransportError},
    request::{Headers, HttpRequest, HttpResponse, Method, JSON_CONTENT_TYPE},
};

/// Sends one request and returns the settled response.
///
/// Implementations fail with [`TransportError`] on timeouts, connection
/// failures and non-2xx statuses.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(format!("quill/{}", env!("CARGO_PKG_VERSION"))),
            proxy: None,
        }
    }
}

impl AgentConfig {
    /// Builds an `Agent` that reports non-2xx statuses as responses, so the
    /// transport can read their reason and body.
    pub fn build(&self) -> Result<Agent> {
        let proxy = match &self.proxy {
            Some(url) => Some(Proxy::new(url).map_err(|err| {
                TransportError::InvalidProxy {
                    url: url.clone(),
                    source: Box::new(err),
                }
            })?),
            None => None,
        };

        let mut config = Agent::config_builder()
            .proxy(proxy)
            .http_status_as_error(false);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        Ok(config.build().into())
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone, Debug)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        Ok(Self {
            agent: config.build()?,
        })
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let body = request.encoded_body()?;
        trace!(method = %request.method, url = %request.url, "sending request");

        let result = match request.method {
            Method::Get => call(self.agent.get(&request.url), request),
            Method::Head => call(self.agent.head(&request.url), request),
            Method::Delete => call(self.agent.delete(&request.url), request),
            Method::Options => call(self.agent.options(&request.url), request),
            Method::Post => send(self.agent.post(&request.url), request, body),
            Method::Put => send(self.agent.put(&request.url), request, body),
            Method::Patch => send(self.agent.patch(&request.url), request, body),
        };

        let response = result.map_err(TransportError::from)?;
        read_response(response)
    }
}

type UreqResult = std::result::Result<http::Response<Body>, ureq::Error>;

fn call(req: RequestBuilder<WithoutBody>, request: &HttpRequest) -> UreqResult {
    if request.body.is_some() {
        trace!(method = %request.method, "ignoring body for method without payload");
    }
    prepare(req, request).call()
}

fn send(req: RequestBuilder<WithBody>, request: &HttpRequest, body: Option<String>) -> UreqResult {
    let req = prepare(req, request);
    match body {
        Some(body) => req.send(body.as_str()),
        None => req.send_empty(),
    }
}

fn prepare<B>(mut req: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        req = req.header(name.as_str(), value.as_str());
    }
    req.config().timeout_global(request.timeout).build()
}

fn read_response(mut response: http::Response<Body>) -> Result<HttpResponse> {
    let status = response.status();
    let status_text = status.canonical_reason().unwrap_or_default().to_string();

    let headers: Headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect();

    let is_json = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE));

    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|err| TransportError::network(format!("Failed to read response: {err}")))?;

    let data = if is_json {
        if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|err| {
                trace!("response declared JSON but did not parse: {err}");
                JsonValue::String(text)
            })
        }
    } else {
        JsonValue::String(text)
    };

    trace!(status = status.as_u16(), "received response");

    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            status_text,
            body: data,
        });
    }

    Ok(HttpResponse {
        data,
        status: status.as_u16(),
        status_text,
        headers,
    })
}
