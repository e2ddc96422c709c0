//! Protocol handler backed by a [`TestServer`].

use super::{echo_body, InterceptedRequest, LoadingClient, ProtocolHandler};
use crate::config::InterceptionConfig;
use crate::controller::TestServer;
use crate::response::SyntheticResponseBuilder;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use tracing::{debug, trace};

/// Result of offering a request directly to [`TestProtocolHandler::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptionOutcome {
    Declined,
    Delivered,
}

/// Claims requests while its [`TestServer`] is enabled and answers them
/// with the server's configured response.
#[derive(Debug, Clone)]
pub struct TestProtocolHandler {
    server: TestServer,
}

impl TestProtocolHandler {
    pub fn new(server: TestServer) -> Self {
        Self { server }
    }

    /// Handler bound to [`TestServer::global`].
    pub fn global() -> Self {
        Self::new(TestServer::global().clone())
    }

    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Capture `request` and build its response without going through a
    /// loading client. Does not check whether the request would be claimed.
    pub fn respond(&self, request: &InterceptedRequest) -> Response<Full<Bytes>> {
        let config = self.server.capture(request);
        synthesize(&config, request).build_full()
    }

    /// Offer `request`, delivering to `client` if claimed.
    pub fn handle(
        &self,
        request: InterceptedRequest,
        client: &mut dyn LoadingClient,
    ) -> InterceptionOutcome {
        if !self.claims(&request) {
            return InterceptionOutcome::Declined;
        }
        self.start_loading(request, client);
        InterceptionOutcome::Delivered
    }
}

impl ProtocolHandler for TestProtocolHandler {
    fn name(&self) -> &str {
        "test-server"
    }

    fn claims(&self, request: &InterceptedRequest) -> bool {
        let claimed = self.server.should_intercept(request);
        if claimed {
            trace!(method = %request.method, uri = %request.uri, "Claimed request");
        } else {
            trace!(method = %request.method, uri = %request.uri, "Declined request");
        }
        claimed
    }

    fn start_loading(&self, request: InterceptedRequest, client: &mut dyn LoadingClient) {
        let Some(config) = self.server.try_capture(&request) else {
            debug!(method = %request.method, uri = %request.uri, "Interception disabled before load");
            client.did_fail("interception was disabled before the request loaded".into());
            return;
        };
        trace!(headers = request.headers.len(), "Captured request");

        let (parts, body) = synthesize(&config, &request).build_parts();
        debug!(
            method = %request.method,
            uri = %request.uri,
            status = parts.status.as_u16(),
            bytes = body.len(),
            "Delivering synthetic response"
        );

        client.did_receive_response(parts);
        if !body.is_empty() {
            client.did_load_data(body);
        }
        client.did_finish_loading();
    }
}

fn synthesize(config: &InterceptionConfig, request: &InterceptedRequest) -> SyntheticResponseBuilder {
    let builder = SyntheticResponseBuilder::new(config.expected_status)
        .headers(&config.expected_response_headers);

    let echoed = if config.echo_post_parameters {
        echo_body(request)
    } else {
        None
    };

    match echoed {
        Some(echo) => builder.body(echo.body).default_content_type(echo.content_type),
        None => builder.body(config.expected_response_data.clone()),
    }
}
