//! Deterministic HTTP interception for testing HTTP clients.
//!
//! A test configures a [`TestServer`], issues requests through a
//! [`ProtocolStack`] with a [`TestProtocolHandler`] registered, and asserts on
//! both the captured request and the synthetic response. No sockets are
//! touched unless a request falls through to a [`HyperTransport`].
//!
//! ```no_run
//! use mirage_http::{ProtocolStack, TestServer};
//! # async fn run() -> Result<(), mirage_http::StackError> {
//! let server = TestServer::new();
//! server.set_enabled(true);
//! server.set_expected_response_data(r#"{"ok":true}"#);
//! server.set_expected_response_headers([("Content-Type", "application/json")]);
//!
//! let stack = ProtocolStack::with_test_server(&server);
//! let request = hyper::Request::get("http://api.test/status")
//!     .body(http_body_util::Empty::<bytes::Bytes>::new())
//!     .unwrap();
//! let response = stack.send(request).await?;
//! assert_eq!(response.status(), 200);
//! server.clean_up();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod protocol;
pub mod response;
pub mod stack;
pub mod transport;

pub use config::{InterceptionConfig, TransportConfig};
pub use controller::{CapturedRequest, TestServer};
pub use error::StackError;
pub use matcher::{PathMatcher, RequestMatcher};
pub use protocol::{
    InterceptedRequest, InterceptionOutcome, LoadingClient, ProtocolHandler, TestProtocolHandler,
};
pub use response::SyntheticResponseBuilder;
pub use stack::ProtocolStack;
pub use transport::{HyperTransport, Transport};
