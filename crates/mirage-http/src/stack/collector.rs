//! Turns a handler's loading events back into a response.

use crate::error::StackError;
use crate::protocol::LoadingClient;
use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use hyper::http::response::Parts;
use hyper::Response;
use tokio::sync::mpsc;

#[derive(Debug)]
pub(crate) enum LoadingEvent {
    Response(Parts),
    Data(Bytes),
    Finished,
    Failed(String),
}

/// [`LoadingClient`] that forwards every event to the waiting caller.
pub(crate) struct ChannelClient {
    tx: mpsc::UnboundedSender<LoadingEvent>,
}

impl ChannelClient {
    pub(crate) fn new(tx: mpsc::UnboundedSender<LoadingEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, event: LoadingEvent) {
        // Receiver gone means the caller stopped waiting; nothing to deliver to.
        let _ = self.tx.send(event);
    }
}

impl LoadingClient for ChannelClient {
    fn did_receive_response(&mut self, response: Parts) {
        self.emit(LoadingEvent::Response(response));
    }

    fn did_load_data(&mut self, data: Bytes) {
        self.emit(LoadingEvent::Data(data));
    }

    fn did_finish_loading(&mut self) {
        self.emit(LoadingEvent::Finished);
    }

    fn did_fail(&mut self, error: String) {
        self.emit(LoadingEvent::Failed(error));
    }
}

/// Assemble events until the handler finishes or fails.
pub(crate) async fn collect_response(
    mut rx: mpsc::UnboundedReceiver<LoadingEvent>,
) -> Result<Response<Full<Bytes>>, StackError> {
    let mut head: Option<Parts> = None;
    let mut body = BytesMut::new();

    while let Some(event) = rx.recv().await {
        match event {
            LoadingEvent::Response(parts) => {
                if head.is_some() {
                    return Err(StackError::Protocol("response delivered twice"));
                }
                head = Some(parts);
            }
            LoadingEvent::Data(data) => {
                if head.is_none() {
                    return Err(StackError::Protocol("data delivered before response"));
                }
                body.extend_from_slice(&data);
            }
            LoadingEvent::Finished => {
                let parts = head.ok_or(StackError::Protocol("finished without a response"))?;
                return Ok(Response::from_parts(parts, Full::new(body.freeze())));
            }
            LoadingEvent::Failed(error) => return Err(StackError::Handler(error)),
        }
    }

    Err(StackError::Protocol("handler returned without finishing"))
}
