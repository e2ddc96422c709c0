//! Protocol handlers and the loading contract.
//!
//! A [`ProtocolHandler`] is offered every outgoing request by the
//! [`crate::ProtocolStack`]. It may decline, letting the stack fall through to
//! the next handler or the real transport, or claim the request and deliver a
//! response through a [`LoadingClient`], the same contract real transports
//! complete through.
//!
//! # Module Structure
//!
//! - `request` - The request shape offered to handlers
//! - `handler` - The test handler driven by a [`crate::TestServer`]
//! - `echo` - Echo-mode body synthesis

mod echo;
mod handler;
mod request;

pub use echo::{decode_form, echo_body, EchoBody};
pub use handler::{InterceptionOutcome, TestProtocolHandler};
pub use request::InterceptedRequest;

use bytes::Bytes;
use hyper::http::response::Parts;

/// Receiver of a handler's loading events.
///
/// A well-behaved handler calls `did_receive_response` once, then
/// `did_load_data` zero or more times, then exactly one of
/// `did_finish_loading` or `did_fail`.
pub trait LoadingClient: Send {
    fn did_receive_response(&mut self, response: Parts);

    fn did_load_data(&mut self, data: Bytes);

    fn did_finish_loading(&mut self);

    fn did_fail(&mut self, error: String);
}

/// Capability interface for anything that can intercept requests.
pub trait ProtocolHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        "protocol-handler"
    }

    /// Whether this handler takes ownership of `request`.
    fn claims(&self, request: &InterceptedRequest) -> bool;

    /// Produce the response for a claimed request through `client`.
    fn start_loading(&self, request: InterceptedRequest, client: &mut dyn LoadingClient);
}
