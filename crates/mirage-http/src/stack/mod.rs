//! The protocol stack requests are issued through.
//!
//! [`ProtocolStack`] plays the part of the networking stack: it offers each
//! request to its registered [`ProtocolHandler`]s, newest first, runs the one
//! that claims it on a blocking worker, and hands the caller the response that
//! handler delivered. Requests nobody claims go to the fallback
//! [`Transport`], if one is set.
//!
//! Clients take the stack by injection, either calling [`ProtocolStack::send`]
//! or using it as a `tower::Service`.

mod collector;
mod service;

use crate::controller::TestServer;
use crate::error::StackError;
use crate::metrics;
use crate::protocol::{InterceptedRequest, ProtocolHandler, TestProtocolHandler};
use crate::transport::Transport;
use bytes::Bytes;
use collector::{collect_response, ChannelClient};
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Ordered set of protocol handlers plus an optional fallback transport.
///
/// Clones share the handler list.
#[derive(Clone, Default)]
pub struct ProtocolStack {
    handlers: Arc<RwLock<Vec<Arc<dyn ProtocolHandler>>>>,
    fallback: Option<Arc<dyn Transport>>,
}

impl std::fmt::Debug for ProtocolStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolStack")
            .field("handlers", &self.handler_count())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl ProtocolStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack with a [`TestProtocolHandler`] for `server` already registered.
    pub fn with_test_server(server: &TestServer) -> Self {
        let stack = Self::new();
        stack.register_handler(Arc::new(TestProtocolHandler::new(server.clone())));
        stack
    }

    /// Send unclaimed requests to `transport`.
    pub fn with_fallback(mut self, transport: Arc<dyn Transport>) -> Self {
        self.fallback = Some(transport);
        self
    }

    /// Register `handler`; it is offered requests before earlier handlers.
    pub fn register_handler(&self, handler: Arc<dyn ProtocolHandler>) {
        debug!(handler = handler.name(), "Registered protocol handler");
        self.handlers.write().push(handler);
    }

    /// Remove `handler`. Returns false if it was not registered.
    pub fn unregister_handler(&self, handler: &Arc<dyn ProtocolHandler>) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, handler));
        let removed = handlers.len() != before;
        if removed {
            debug!(handler = handler.name(), "Unregistered protocol handler");
        }
        removed
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Buffer `request` and dispatch it.
    pub async fn send<B>(&self, request: Request<B>) -> Result<Response<Full<Bytes>>, StackError>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let request = InterceptedRequest::from_request(request).await?;
        self.dispatch(request).await
    }

    /// Offer `request` to the handlers, falling through to the transport.
    pub async fn dispatch(
        &self,
        request: InterceptedRequest,
    ) -> Result<Response<Full<Bytes>>, StackError> {
        if let Some(handler) = self.claiming_handler(&request) {
            return load(handler, request).await;
        }

        metrics::record_fallthrough(self.fallback.is_some());
        match &self.fallback {
            Some(transport) => {
                debug!(method = %request.method, uri = %request.uri, "No handler claimed request, using transport");
                transport.send(request).await
            }
            None => {
                warn!(method = %request.method, uri = %request.uri, "No handler claimed request");
                Err(StackError::Unsupported {
                    method: request.method,
                    uri: request.uri,
                })
            }
        }
    }

    fn claiming_handler(&self, request: &InterceptedRequest) -> Option<Arc<dyn ProtocolHandler>> {
        let handlers = self.handlers.read();
        for handler in handlers.iter().rev() {
            let claimed = handler.claims(request);
            metrics::record_offer(handler.name(), claimed);
            if claimed {
                return Some(Arc::clone(handler));
            }
        }
        None
    }
}

async fn load(
    handler: Arc<dyn ProtocolHandler>,
    request: InterceptedRequest,
) -> Result<Response<Full<Bytes>>, StackError> {
    trace!(handler = handler.name(), "Starting load");
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::task::spawn_blocking(move || {
        let mut client = ChannelClient::new(tx);
        handler.start_loading(request, &mut client);
    });

    let collected = collect_response(rx).await;
    match task.await {
        Ok(()) => collected,
        Err(e) if e.is_panic() => Err(StackError::Handler("protocol handler panicked".into())),
        Err(_) => Err(StackError::Canceled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::LoadingClient;
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use hyper::{Method, StatusCode};
    use tracing_test::traced_test;

    /// Claims everything and answers with a fixed tag.
    struct TagHandler(&'static str);

    impl ProtocolHandler for TagHandler {
        fn name(&self) -> &str {
            self.0
        }

        fn claims(&self, _request: &InterceptedRequest) -> bool {
            true
        }

        fn start_loading(&self, _request: InterceptedRequest, client: &mut dyn LoadingClient) {
            client.did_receive_response(Response::new(()).into_parts().0);
            client.did_load_data(Bytes::from_static(self.0.as_bytes()));
            client.did_finish_loading();
        }
    }

    struct BrokenHandler;

    impl ProtocolHandler for BrokenHandler {
        fn claims(&self, _request: &InterceptedRequest) -> bool {
            true
        }

        fn start_loading(&self, _request: InterceptedRequest, client: &mut dyn LoadingClient) {
            client.did_load_data(Bytes::from_static(b"no head"));
        }
    }

    struct PanickingHandler;

    impl ProtocolHandler for PanickingHandler {
        fn claims(&self, _request: &InterceptedRequest) -> bool {
            true
        }

        fn start_loading(&self, _request: InterceptedRequest, _client: &mut dyn LoadingClient) {
            panic!("handler bug");
        }
    }

    struct StaticTransport;

    #[async_trait]
    impl Transport for StaticTransport {
        async fn send(
            &self,
            _request: InterceptedRequest,
        ) -> Result<Response<Full<Bytes>>, StackError> {
            let mut response = Response::new(Full::new(Bytes::from_static(b"from transport")));
            *response.status_mut() = StatusCode::NON_AUTHORITATIVE_INFORMATION;
            Ok(response)
        }
    }

    fn get(uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_newest_handler_is_offered_first() {
        let stack = ProtocolStack::new();
        stack.register_handler(Arc::new(TagHandler("first")));
        stack.register_handler(Arc::new(TagHandler("second")));

        let response = stack.send(get("http://a.test/")).await.unwrap();
        assert_eq!(body_of(response).await, Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn test_unregister_restores_previous_handler() {
        let stack = ProtocolStack::new();
        stack.register_handler(Arc::new(TagHandler("first")));
        let second: Arc<dyn ProtocolHandler> = Arc::new(TagHandler("second"));
        stack.register_handler(Arc::clone(&second));

        assert!(stack.unregister_handler(&second));
        assert!(!stack.unregister_handler(&second));
        assert_eq!(stack.handler_count(), 1);

        let response = stack.send(get("http://a.test/")).await.unwrap();
        assert_eq!(body_of(response).await, Bytes::from_static(b"first"));
    }

    #[tokio::test]
    async fn test_unclaimed_without_fallback_is_unsupported() {
        let server = TestServer::new();
        let stack = ProtocolStack::with_test_server(&server);

        let err = stack.send(get("http://a.test/x")).await.unwrap_err();
        assert!(matches!(err, StackError::Unsupported { .. }));
        assert!(server.received_http_header_fields().is_none());
    }

    #[tokio::test]
    async fn test_unclaimed_falls_through_to_transport() {
        let server = TestServer::new();
        let stack =
            ProtocolStack::with_test_server(&server).with_fallback(Arc::new(StaticTransport));

        let response = stack.send(get("http://a.test/x")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
        assert_eq!(body_of(response).await, Bytes::from_static(b"from transport"));
        assert_eq!(server.intercepted_count(), 0);

        server.set_enabled(true);
        let response = stack.send(get("http://a.test/x")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(server.intercepted_count(), 1);
    }

    #[tokio::test]
    async fn test_contract_violation_is_reported() {
        let stack = ProtocolStack::new();
        stack.register_handler(Arc::new(BrokenHandler));

        let err = stack.send(get("http://a.test/")).await.unwrap_err();
        assert!(matches!(err, StackError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_reported() {
        let stack = ProtocolStack::new();
        stack.register_handler(Arc::new(PanickingHandler));

        let err = stack.send(get("http://a.test/")).await.unwrap_err();
        assert!(matches!(err, StackError::Handler(_)));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unclaimed_request_is_logged() {
        let stack = ProtocolStack::new();
        let _ = stack.send(get("http://a.test/quiet")).await;
        assert!(logs_contain("No handler claimed request"));
    }

    #[test]
    fn test_debug_shows_counts() {
        let stack = ProtocolStack::new();
        stack.register_handler(Arc::new(TagHandler("only")));
        let debug = format!("{stack:?}");
        assert!(debug.contains("handlers: 1"));
        assert!(debug.contains("fallback: false"));
    }
}
