use std::{sync::Arc, time::Duration};

use quill_builder::{
    build_mutation, build_query, build_subscription, OperationInput, OperationResult, Variables,
};
use quill_config::{ConfigError, Profile};
use quill_events::{ListenerHandle, ListenerId, Listeners, RequestLifecycle};
use quill_http::{
    remove_header, set_header, AgentConfig, AuthScheme, Headers, HttpRequest, HttpResponse,
    Method, Transport, TransportError, UreqTransport, AUTHORIZATION, CONTENT_TYPE,
    DEFAULT_TIMEOUT, JSON_CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::error::{ClientError, GraphQLError, GraphQLFailure, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: String,
    /// Sent with every request, beneath the client's dynamic headers.
    pub headers: Headers,
    pub timeout: Duration,
    pub debug: bool,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: Headers::new(),
            timeout: DEFAULT_TIMEOUT,
            debug: false,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Builds the client settings of a configuration profile.
    pub fn from_profile(name: &str, profile: &Profile) -> Result<Self> {
        let timeout = profile
            .get_timeout()
            .ok_or_else(|| ConfigError::InvalidTimeout {
                profile: name.to_string(),
                value: profile.timeout.clone().unwrap_or_default(),
            })?;

        let mut config = Self::new(profile.get_endpoint())
            .timeout(timeout)
            .debug(profile.is_debug());

        if let Some(headers) = &profile.headers {
            for (key, value) in headers {
                set_header(&mut config.headers, key.clone(), value.clone());
            }
        }

        Ok(config)
    }
}

/// Dispatches assembled documents to a GraphQL endpoint.
///
/// Headers come in two layers: the configured ones and a dynamic layer the
/// caller edits at runtime, the latter winning on conflicts.
pub struct GraphQLClient {
    config: ClientConfig,
    dynamic_headers: Headers,
    listeners: Listeners,
    transport: Arc<dyn Transport>,
}

impl GraphQLClient {
    /// Creates a client backed by a default `ureq` transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(&AgentConfig::default())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            dynamic_headers: Headers::new(),
            listeners: Listeners::new(),
            transport,
        }
    }

    /// Creates a client from a configuration profile, including its agent
    /// settings and `Authorization` token.
    pub fn from_profile(name: &str, profile: &Profile) -> Result<Self> {
        let config = ClientConfig::from_profile(name, profile)?;

        let mut agent = AgentConfig::default();
        if let Some(user_agent) = &profile.user_agent {
            agent.user_agent = Some(user_agent.clone());
        }
        agent.proxy = profile.proxy.clone();

        let mut client = Self::with_transport(config, Arc::new(UreqTransport::new(&agent)?));
        if let Some(token) = &profile.auth_token {
            client.set_auth_token(token, profile.get_auth_scheme());
        }
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replaces every dynamic header.
    pub fn set_headers(&mut self, headers: Headers) {
        self.dynamic_headers = headers;
    }

    /// Configured headers merged with the dynamic ones.
    pub fn headers(&self) -> Headers {
        let mut merged = self.config.headers.clone();
        for (name, value) in &self.dynamic_headers {
            set_header(&mut merged, name.clone(), value.clone());
        }
        merged
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        set_header(&mut self.dynamic_headers, name, value);
    }

    /// Removes a dynamic header. Configured headers are untouched.
    pub fn remove_header(&mut self, name: &str) {
        remove_header(&mut self.dynamic_headers, name);
    }

    pub fn clear_headers(&mut self) {
        self.dynamic_headers.clear();
    }

    pub fn set_auth_token(&mut self, token: &str, scheme: AuthScheme) {
        self.add_header(AUTHORIZATION, scheme.header_value(token));
    }

    pub fn remove_auth_token(&mut self) {
        self.remove_header(AUTHORIZATION);
    }

    pub fn add_listener(&self, listener: ListenerHandle) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }

    /// Sends one HTTP request, notifying listeners before and after.
    ///
    /// Listener failures never change the returned outcome.
    pub fn request(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let debug = self.config.debug;
        let mut lifecycle = RequestLifecycle::new(request);

        if debug {
            debug!(request_id = %lifecycle.id, "request: {:?}", lifecycle.request);
        }
        self.listeners.notify_request(&lifecycle, debug);

        let outcome = self.transport.send(&lifecycle.request);
        match &outcome {
            Ok(response) => lifecycle.succeed(response.clone()),
            Err(err) => lifecycle.fail(err),
        }

        if debug {
            debug!(
                request_id = %lifecycle.id,
                status = ?lifecycle.status,
                duration_ms = lifecycle.duration.map(|d| d.as_millis()).unwrap_or_default(),
                "response: {:?}",
                lifecycle.response.as_ref().map(|r| &r.data)
            );
        }
        self.listeners.notify_response(&lifecycle, debug);

        outcome
    }

    /// POSTs `{query, variables}` and decodes the response `data` into `T`.
    ///
    /// A non-empty `errors` array, or any other non-null `errors` value,
    /// fails with [`ClientError::GraphQL`] even on a 2xx status. A missing `data` decodes from `null`.
    pub fn execute<T: DeserializeOwned>(&self, query: &str, variables: Variables) -> Result<T> {
        let mut headers = Headers::new();
        set_header(&mut headers, CONTENT_TYPE, JSON_CONTENT_TYPE);
        for (name, value) in self.headers() {
            set_header(&mut headers, name, value);
        }

        let request = HttpRequest::new(&self.config.endpoint)
            .method(Method::Post)
            .headers(&headers)
            .body(json!({ "query": query, "variables": variables }))
            .timeout(self.config.timeout);

        let response = self.request(request)?;

        let mut body = match response.data {
            JsonValue::Object(body) => body,
            other => {
                return Err(ClientError::InvalidResponse {
                    reason: format!("expected a JSON object, got {other}"),
                });
            }
        };

        let data = body.remove("data");

        let errors = match body.remove("errors") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(errors)) => errors,
            Some(other) => vec![other],
        };
        if !errors.is_empty() {
            let errors = errors.into_iter().map(GraphQLError::from_json).collect();
            return Err(ClientError::GraphQL(Box::new(GraphQLFailure::new(
                query, variables, data, errors,
            ))));
        }

        Ok(serde_json::from_value(data.unwrap_or(JsonValue::Null))?)
    }

    /// Executes an already assembled operation.
    pub fn execute_operation<T: DeserializeOwned>(&self, operation: OperationResult) -> Result<T> {
        self.execute(&operation.query, operation.variables)
    }

    pub fn query<T: DeserializeOwned>(&self, input: OperationInput) -> Result<T> {
        let operation = build_query(input)?;
        self.log_operation("query", &operation);
        self.execute_operation(operation)
    }

    pub fn mutate<T: DeserializeOwned>(&self, input: OperationInput) -> Result<T> {
        let operation = build_mutation(input)?;
        self.log_operation("mutation", &operation);
        self.execute_operation(operation)
    }

    /// Assembles the subscription, then fails: subscriptions cannot be
    /// dispatched over this transport.
    pub fn subscribe<T: DeserializeOwned>(&self, input: OperationInput) -> Result<T> {
        let operation = build_subscription(input)?;
        self.log_operation("subscription", &operation);
        Err(ClientError::UnsupportedSubscription)
    }

    fn log_operation(&self, kind: &str, operation: &OperationResult) {
        if self.config.debug {
            debug!("GraphQL {kind}:\n{}", operation.query);
            debug!("GraphQL variables: {}", JsonValue::Object(operation.variables.clone()));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use quill_builder::{args, Field, Value};
    use quill_events::{CollectorListener, Hooks, RequestEvent, RequestStatus};
    use serde::Deserialize;

    use super::*;

    /// Transport that records requests and replays canned outcomes.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        pub requests: Mutex<Vec<HttpRequest>>,
        pub responses: Mutex<Vec<std::result::Result<JsonValue, TransportError>>>,
    }

    impl MockTransport {
        pub fn replying(body: JsonValue) -> Arc<Self> {
            let mock = Self::default();
            mock.responses.lock().unwrap().push(Ok(body));
            Arc::new(mock)
        }

        pub fn failing(err: TransportError) -> Arc<Self> {
            let mock = Self::default();
            mock.responses.lock().unwrap().push(Err(err));
            Arc::new(mock)
        }

        pub fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        pub fn last_body(&self) -> JsonValue {
            self.last_request().body.unwrap()
        }
    }

    impl Transport for MockTransport {
        fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self.responses.lock().unwrap().remove(0);
            next.map(|data| HttpResponse {
                data,
                status: 200,
                status_text: "OK".into(),
                headers: Headers::new(),
            })
        }
    }

    fn client(transport: Arc<MockTransport>) -> GraphQLClient {
        GraphQLClient::with_transport(
            ClientConfig::new("http://localhost:8080/v1/graphql").header("x-hasura-role", "user"),
            transport,
        )
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct Users {
        users: Vec<User>,
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("http://localhost/graphql");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.debug);
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_config_from_profile() {
        let mut profile = Profile::new("https://example.com/graphql");
        profile.timeout = Some("5s".into());
        profile.debug = Some(true);
        profile.headers = Some([("x-team".to_string(), "core".to_string())].into_iter().collect());

        let config = ClientConfig::from_profile("default", &profile).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.debug);
        assert_eq!(config.headers["x-team"], "core");

        profile.timeout = Some("later".into());
        assert!(matches!(
            ClientConfig::from_profile("default", &profile),
            Err(ClientError::Config(ConfigError::InvalidTimeout { .. }))
        ));
    }

    #[test]
    fn test_dynamic_headers_layer_over_configured() {
        let mut client = client(MockTransport::replying(json!({})));
        client.add_header("X-Hasura-Role", "admin");
        client.add_header("x-request-source", "tests");

        let headers = client.headers();
        assert_eq!(quill_http::header(&headers, "x-hasura-role"), Some("admin"));
        assert_eq!(headers.len(), 2);

        client.remove_header("x-hasura-role");
        assert_eq!(
            quill_http::header(&client.headers(), "x-hasura-role"),
            Some("user")
        );

        client.set_headers(Headers::from([("a".to_string(), "1".to_string())]));
        assert_eq!(client.headers().len(), 2);

        client.clear_headers();
        assert_eq!(client.headers().len(), 1);
    }

    #[test]
    fn test_auth_token() {
        let mut client = client(MockTransport::replying(json!({})));
        client.set_auth_token("abc", AuthScheme::Bearer);
        assert_eq!(client.headers()["Authorization"], "Bearer abc");

        client.set_auth_token("dXNlcg==", AuthScheme::Basic);
        assert_eq!(client.headers()["Authorization"], "Basic dXNlcg==");

        client.remove_auth_token();
        assert!(!client.headers().contains_key("Authorization"));
    }

    #[test]
    fn test_execute_posts_query_and_variables() {
        let transport = MockTransport::replying(json!({
            "data": {"users": [{"id": 1, "name": "Zach"}]}
        }));
        let client = client(transport.clone());

        let mut variables = Variables::new();
        variables.insert("id".into(), json!(1));
        let users: Users = client
            .execute("query GetUser($id: Int!) { users { id name } }", variables)
            .unwrap();

        assert_eq!(users.users, vec![User { id: 1, name: "Zach".into() }]);

        let request = transport.last_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://localhost:8080/v1/graphql");
        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(quill_http::header(&request.headers, "x-hasura-role"), Some("user"));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
        assert_eq!(transport.last_body()["variables"], json!({"id": 1}));
    }

    #[test]
    fn test_scenario_document_level_errors() {
        let transport = MockTransport::replying(json!({
            "errors": [{"message": "x"}],
            "data": null
        }));
        let client = client(transport);

        let err = client
            .execute::<JsonValue>("query { x }", Variables::new())
            .unwrap_err();

        assert_eq!(err.to_string(), "x");
        let failure = err.graphql().unwrap();
        assert_eq!(failure.query, "query { x }");
        assert_eq!(failure.errors[0].message, "x");
        assert_eq!(failure.data, Some(JsonValue::Null));
    }

    #[test]
    fn test_empty_errors_array_is_success() {
        let client = client(MockTransport::replying(json!({"errors": [], "data": {"ok": true}})));
        let data: JsonValue = client.execute("query { ok }", Variables::new()).unwrap();
        assert_eq!(data, json!({"ok": true}));
    }

    #[test]
    fn test_non_array_errors_value_fails() {
        let failing = client(MockTransport::replying(json!({
            "data": null,
            "errors": {"message": "x"}
        })));
        let err = failing
            .execute::<JsonValue>("query { x }", Variables::new())
            .unwrap_err();
        let failure = err.graphql().unwrap();
        assert_eq!(failure.errors.len(), 1);
        assert_eq!(failure.errors[0].message, "x");

        let passing = client(MockTransport::replying(json!({"errors": null, "data": 1})));
        let data: JsonValue = passing.execute("query { x }", Variables::new()).unwrap();
        assert_eq!(data, json!(1));
    }

    #[test]
    fn test_missing_data_decodes_from_null() {
        let client = client(MockTransport::replying(json!({})));
        let data: Option<Users> = client.execute("query { users { id } }", Variables::new()).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn test_non_object_response_is_invalid() {
        let client = client(MockTransport::replying(json!("<html>")));
        let err = client
            .execute::<JsonValue>("query { x }", Variables::new())
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse { .. }));
    }

    #[test]
    fn test_transport_failure_is_surfaced() {
        let client = client(MockTransport::failing(TransportError::Timeout));
        let err = client
            .execute::<JsonValue>("query { x }", Variables::new())
            .unwrap_err();
        match err {
            ClientError::Transport(err) => assert_eq!(err.status(), 408),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_query_builds_and_executes() {
        let transport = MockTransport::replying(json!({"data": {"users": []}}));
        let client = client(transport.clone());

        let users: Users = client
            .query(
                OperationInput::new()
                    .name("GetUser")
                    .fields(
                        Field::new("users")
                            .arg("where", args! { "id" => args! { "_eq" => Value::variable("id") } })
                            .fields(["id", "name"]),
                    )
                    .declare("id", "Int!")
                    .variable("id", 1)
                    .variable("unused", true),
            )
            .unwrap();
        assert!(users.users.is_empty());

        let body = transport.last_body();
        assert!(body["query"]
            .as_str()
            .unwrap()
            .starts_with("query GetUser($id: Int!) {"));
        assert_eq!(body["variables"], json!({"id": 1}));
    }

    #[test]
    fn test_mutate_fixes_operation_type() {
        let transport = MockTransport::replying(json!({"data": {}}));
        let client = client(transport.clone());
        let _: JsonValue = client
            .mutate(OperationInput::new().name("Touch").fields("affected_rows"))
            .unwrap();
        assert!(transport.last_body()["query"]
            .as_str()
            .unwrap()
            .starts_with("mutation Touch {"));
    }

    #[test]
    fn test_subscribe_is_unsupported_without_dispatch() {
        let transport = Arc::new(MockTransport::default());
        let client = client(transport.clone());
        let err = client
            .subscribe::<JsonValue>(OperationInput::new().fields("id"))
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedSubscription));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_build_errors_surface_before_dispatch() {
        let transport = Arc::new(MockTransport::default());
        let client = client(transport.clone());
        let err = client
            .query::<JsonValue>(OperationInput::new().fields(Field::new("")))
            .unwrap_err();
        assert!(matches!(err, ClientError::Build(_)));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_listeners_observe_lifecycle() {
        let collector = Arc::new(CollectorListener::default());
        let client = client(MockTransport::replying(json!({"data": {}})));
        client.add_listener(collector.clone());

        let _: JsonValue = client.execute("query { a }", Variables::new()).unwrap();

        let events = collector.events();
        assert_eq!(events.len(), 2);
        let started = match &events[0] {
            RequestEvent::Started(lc) => lc,
            other => panic!("unexpected event: {other:?}"),
        };
        assert_eq!(started.status, RequestStatus::Pending);
        match &events[1] {
            RequestEvent::Finished(lc) => {
                assert_eq!(lc.id, started.id);
                assert_eq!(lc.status, RequestStatus::Success);
                assert_eq!(lc.success, Some(true));
                assert!(lc.duration.is_some());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_failed_request_lifecycle() {
        let collector = Arc::new(CollectorListener::default());
        let client = client(MockTransport::failing(TransportError::network("refused")));
        client.add_listener(collector.clone());

        assert!(client.execute::<JsonValue>("query { a }", Variables::new()).is_err());
        match &collector.events()[1] {
            RequestEvent::Finished(lc) => {
                assert_eq!(lc.status, RequestStatus::Error);
                assert_eq!(lc.error.as_ref().unwrap().status, 0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_failing_listener_does_not_change_outcome() {
        let mut config = ClientConfig::new("http://localhost/graphql");
        config.debug = true;
        let client = GraphQLClient::with_transport(
            config,
            MockTransport::replying(json!({"data": {"ok": 1}})),
        );
        client.add_listener(Arc::new(
            Hooks::new()
                .on_request(|_| Err("request hook failed".into()))
                .on_response(|_| panic!("response hook failed")),
        ));

        let data: JsonValue = client.execute("query { ok }", Variables::new()).unwrap();
        assert_eq!(data, json!({"ok": 1}));
    }

    #[test]
    fn test_remove_and_clear_listeners() {
        let client = client(MockTransport::replying(json!({})));
        let id = client.add_listener(Arc::new(CollectorListener::default()));
        client.add_listener(Arc::new(CollectorListener::default()));
        assert!(client.remove_listener(id));
        assert!(!client.remove_listener(id));
        client.clear_listeners();
    }
}
