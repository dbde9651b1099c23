use std::{fmt, str::FromStr, time::Duration};

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Result, TransportError};

/// Ordered header map. Lookups through [`header`] ignore ASCII case.
pub type Headers = IndexMap<String, String>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Characters left as-is by `application/x-www-form-urlencoded` serializers.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH" => Ok(Self::Patch),
            other => Err(TransportError::network(format!(
                "Unsupported HTTP method: {other}"
            ))),
        }
    }
}

/// Case-insensitive header lookup.
pub fn header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Inserts `name: value`, replacing any entry whose name differs only in case.
pub fn set_header(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
    headers.insert(name, value.into());
}

/// Removes every entry matching `name` regardless of case.
pub fn remove_header(headers: &mut Headers, name: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub method: Method,
    pub headers: Headers,
    pub body: Option<JsonValue>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::default(),
            headers: Headers::new(),
            body: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    pub fn headers(mut self, headers: &Headers) -> Self {
        for (name, value) in headers {
            set_header(&mut self.headers, name.clone(), value.clone());
        }
        self
    }

    pub fn body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        header(&self.headers, CONTENT_TYPE)
    }

    /// Serializes the body for the wire.
    ///
    /// A string body is sent verbatim. Other values are JSON unless the
    /// content type is form-urlencoded, in which case the top-level entries
    /// of an object are form-encoded.
    pub fn encoded_body(&self) -> Result<Option<String>> {
        let Some(body) = &self.body else {
            return Ok(None);
        };

        if let JsonValue::String(text) = body {
            return Ok(Some(text.clone()));
        }

        let is_form = self
            .content_type()
            .is_some_and(|ct| ct.contains(FORM_CONTENT_TYPE));

        match body {
            JsonValue::Object(map) if is_form => Ok(Some(
                map.iter()
                    .map(|(key, value)| {
                        let value = match value {
                            JsonValue::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        format!("{}={}", form_encode(key), form_encode(&value))
                    })
                    .collect::<Vec<_>>()
                    .join("&"),
            )),
            other => Ok(Some(serde_json::to_string(other)?)),
        }
    }
}

fn form_encode(s: &str) -> String {
    utf8_percent_encode(s, FORM_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Parsed JSON for JSON content types, otherwise the body text as a string.
    pub data: JsonValue,
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_defaults() {
        let req = HttpRequest::new("https://example.com/graphql");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.timeout, Some(Duration::from_secs(30)));
        assert!(req.headers.is_empty());
        assert_eq!(req.encoded_body().unwrap(), None);
    }

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!(Method::Options.to_string(), "OPTIONS");
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let req = HttpRequest::new("u").header("content-type", "application/json");
        assert_eq!(req.content_type(), Some("application/json"));

        let req = req.header("Content-Type", "text/plain");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(header(&req.headers, "CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn test_remove_header() {
        let mut headers = Headers::new();
        set_header(&mut headers, "Authorization", "Bearer x");
        set_header(&mut headers, "X-Trace", "1");
        remove_header(&mut headers, "authorization");
        assert_eq!(headers.keys().collect::<Vec<_>>(), vec!["X-Trace"]);
    }

    #[test]
    fn test_json_body() {
        let req = HttpRequest::new("u")
            .method(Method::Post)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(json!({"query": "query { __typename }", "variables": {}}));
        assert_eq!(
            req.encoded_body().unwrap().unwrap(),
            r#"{"query":"query { __typename }","variables":{}}"#
        );
    }

    #[test]
    fn test_string_body_is_verbatim() {
        let req = HttpRequest::new("u").body(json!("a=1&b=2"));
        assert_eq!(req.encoded_body().unwrap().as_deref(), Some("a=1&b=2"));
    }

    #[test]
    fn test_form_body() {
        let req = HttpRequest::new("u")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(json!({"name": "Zach Doe", "age": 3, "q": "a&b=c"}));
        assert_eq!(
            req.encoded_body().unwrap().unwrap(),
            "name=Zach+Doe&age=3&q=a%26b%3Dc"
        );
    }

    #[test]
    fn test_form_content_type_with_non_object_falls_back_to_json() {
        let req = HttpRequest::new("u")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(json!([1, 2]));
        assert_eq!(req.encoded_body().unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_response_success_range() {
        let mut res = HttpResponse {
            data: JsonValue::Null,
            status: 204,
            status_text: "No Content".into(),
            headers: Headers::new(),
        };
        assert!(res.is_success());
        res.status = 301;
        assert!(!res.is_success());
    }
}
