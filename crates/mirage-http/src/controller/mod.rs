//! The interception controller.
//!
//! A [`TestServer`] owns the interception configuration and the last captured
//! request. Tests configure it, issue requests through a
//! [`crate::ProtocolStack`] that has a [`crate::TestProtocolHandler`] for it
//! registered, then assert on what was captured and delivered.
//!
//! Each harness normally creates its own instance with [`TestServer::new`] and
//! hands clones to the handler; clones share state. [`TestServer::global`]
//! provides a lazily created process-wide instance for code that cannot thread
//! one through.

mod captured;

pub use captured::CapturedRequest;

use crate::config::InterceptionConfig;
use crate::matcher::{CompiledRequestMatcher, RequestMatcher};
use crate::protocol::InterceptedRequest;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

static GLOBAL: Lazy<TestServer> = Lazy::new(TestServer::new);

#[derive(Debug, Default)]
struct ServerState {
    config: InterceptionConfig,
    matcher: CompiledRequestMatcher,
    received_headers: Option<HeaderMap>,
    received_request: Option<CapturedRequest>,
    intercepted: u64,
}

impl ServerState {
    fn record(&mut self, request: &InterceptedRequest) {
        self.received_headers = Some(request.headers.clone());
        self.received_request = Some(CapturedRequest::from(request));
        self.intercepted += 1;
    }
}

/// Interception controller. Cloning yields a handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct TestServer {
    state: Arc<RwLock<ServerState>>,
}

impl TestServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance, created on first access.
    ///
    /// Tests sharing it must run serially and call [`TestServer::clean_up`]
    /// when done; otherwise configuration leaks into the next test.
    pub fn global() -> &'static TestServer {
        &GLOBAL
    }

    /// Build a controller from a loaded configuration.
    pub fn with_config(config: InterceptionConfig) -> Result<Self, regex::Error> {
        let server = Self::new();
        server.apply(config)?;
        Ok(server)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.write().config.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().config.enabled
    }

    pub fn set_echo_post_parameters(&self, echo: bool) {
        self.state.write().config.echo_post_parameters = echo;
    }

    pub fn echo_post_parameters(&self) -> bool {
        self.state.read().config.echo_post_parameters
    }

    pub fn set_expected_status(&self, status: StatusCode) {
        self.state.write().config.expected_status = status;
    }

    pub fn expected_status(&self) -> StatusCode {
        self.state.read().config.expected_status
    }

    pub fn set_expected_response_data(&self, data: impl Into<Bytes>) {
        self.state.write().config.expected_response_data = data.into();
    }

    pub fn expected_response_data(&self) -> Bytes {
        self.state.read().config.expected_response_data.clone()
    }

    /// Replace the response headers. Names are case-insensitive and a later
    /// duplicate replaces an earlier one. Pairs that are not valid HTTP
    /// headers are dropped.
    ///
    /// A configured `Content-Length` is not delivered as written: responses
    /// always carry the length of the body actually sent.
    pub fn set_expected_response_headers<I, K, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let (name, value) = (name.as_ref(), value.as_ref());
            match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
                (Ok(n), Ok(v)) => {
                    map.insert(n, v);
                }
                _ => warn!(header = name, "Dropping invalid expected response header"),
            }
        }
        self.set_expected_response_header_map(map);
    }

    pub fn set_expected_response_header_map(&self, headers: HeaderMap) {
        self.state.write().config.expected_response_headers = headers;
    }

    pub fn expected_response_headers(&self) -> HeaderMap {
        self.state.read().config.expected_response_headers.clone()
    }

    /// Restrict which requests are claimed while enabled.
    pub fn set_request_matcher(&self, matcher: RequestMatcher) -> Result<(), regex::Error> {
        let compiled = CompiledRequestMatcher::compile(&matcher)?;
        let mut state = self.state.write();
        state.config.matcher = matcher;
        state.matcher = compiled;
        Ok(())
    }

    pub fn received_http_header_fields(&self) -> Option<HeaderMap> {
        self.state.read().received_headers.clone()
    }

    pub fn set_received_http_header_fields(&self, headers: HeaderMap) {
        self.state.write().received_headers = Some(headers);
    }

    /// The full last intercepted request.
    pub fn received_request(&self) -> Option<CapturedRequest> {
        self.state.read().received_request.clone()
    }

    /// Requests intercepted since the last clean up.
    pub fn intercepted_count(&self) -> u64 {
        self.state.read().intercepted
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> InterceptionConfig {
        self.state.read().config.clone()
    }

    /// Replace the whole configuration. Captured state is left alone.
    pub fn apply(&self, config: InterceptionConfig) -> Result<(), regex::Error> {
        let matcher = CompiledRequestMatcher::compile(&config.matcher)?;
        let mut state = self.state.write();
        state.config = config;
        state.matcher = matcher;
        Ok(())
    }

    /// Reset configuration and captured state to defaults.
    pub fn clean_up(&self) {
        *self.state.write() = ServerState::default();
        debug!("Test server state reset");
    }

    /// Whether a request would be claimed right now.
    pub(crate) fn should_intercept(&self, request: &InterceptedRequest) -> bool {
        let state = self.state.read();
        state.config.enabled && state.matcher.matches(request)
    }

    /// Record a claimed request and return the configuration to answer it with.
    pub(crate) fn capture(&self, request: &InterceptedRequest) -> InterceptionConfig {
        let mut state = self.state.write();
        state.record(request);
        state.config.clone()
    }

    /// Capture `request` only if it would still be claimed. The check and the
    /// capture happen under one lock.
    pub(crate) fn try_capture(&self, request: &InterceptedRequest) -> Option<InterceptionConfig> {
        let mut state = self.state.write();
        if !(state.config.enabled && state.matcher.matches(request)) {
            return None;
        }
        state.record(request);
        Some(state.config.clone())
    }
}
