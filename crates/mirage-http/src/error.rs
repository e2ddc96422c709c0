//! Error types for the protocol stack.
//!
//! The interception core never produces these on its own: a claimed request
//! always completes. They surface when the stack has nowhere to send a
//! request, when a handler breaks the loading contract, or when the
//! passthrough transport fails.

use hyper::{Method, Uri};

/// Errors returned by [`crate::ProtocolStack`] and [`crate::Transport`].
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("No protocol handler claimed {method} {uri} and no fallback transport is set")]
    Unsupported { method: Method, uri: Uri },
    #[error("Failed to read request body: {0}")]
    Body(String),
    #[error("Protocol handler failed: {0}")]
    Handler(String),
    #[error("Loading contract violated: {0}")]
    Protocol(&'static str),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request was abandoned before completion")]
    Canceled,
}
