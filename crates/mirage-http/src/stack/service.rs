//! `tower::Service` adapter so tower-based clients can take the stack as
//! their transport.

use super::ProtocolStack;
use crate::error::StackError;
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response};
use std::task::{Context, Poll};
use tower::Service;

impl<B> Service<Request<B>> for ProtocolStack
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    type Response = Response<Full<Bytes>>;
    type Error = StackError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let stack = self.clone();
        Box::pin(async move { stack.send(request).await })
    }
}
