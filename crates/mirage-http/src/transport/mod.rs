//! Real transports the stack falls through to.
//!
//! - `client` - hyper-based HTTP/HTTPS transport

mod client;

pub use client::{HttpClient, HyperTransport};

use crate::error::StackError;
use crate::protocol::InterceptedRequest;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;

/// Performs a request for real.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: InterceptedRequest) -> Result<Response<Full<Bytes>>, StackError>;
}
