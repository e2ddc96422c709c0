//! The most recent intercepted request, kept for test assertions.

use crate::protocol::{decode_form, InterceptedRequest};
use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedRequest {
    /// Body decoded as form parameters, in submission order.
    pub fn form_parameters(&self) -> Vec<(String, String)> {
        decode_form(&self.body)
    }
}

impl From<&InterceptedRequest> for CapturedRequest {
    fn from(request: &InterceptedRequest) -> Self {
        Self {
            method: request.method.clone(),
            uri: request.uri.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        }
    }
}
