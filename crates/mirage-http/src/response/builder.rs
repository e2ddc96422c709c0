use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::http::response::Parts;
use hyper::http::HeaderValue;
use hyper::{HeaderMap, Response, StatusCode};

/// Builds the synthetic responses delivered for intercepted requests.
pub struct SyntheticResponseBuilder {
    status: StatusCode,
    body: Bytes,
    headers: HeaderMap,
}

impl SyntheticResponseBuilder {
    pub fn new(status_code: StatusCode) -> Self {
        SyntheticResponseBuilder {
            status: status_code,
            body: Bytes::new(),
            headers: Default::default(),
        }
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace headers with those in `headers`, keeping multi-valued entries.
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        self.headers.extend(headers.clone());
        self
    }

    /// Set `Content-Type` unless one is already present.
    pub fn default_content_type(mut self, value: Option<HeaderValue>) -> Self {
        if let Some(value) = value {
            if !self.headers.contains_key(CONTENT_TYPE) {
                self.headers.insert(CONTENT_TYPE, value);
            }
        }
        self
    }

    /// Split into response head and body, for delivery through a loading client.
    pub fn build_parts(self) -> (Parts, Bytes) {
        let (head, body) = self.build_head();
        let (parts, ()) = head.into_parts();
        (parts, body)
    }

    pub fn build_full(self) -> Response<Full<Bytes>> {
        let (head, body) = self.build_head();
        head.map(|()| Full::new(body))
    }

    /// `Content-Length` always reflects the delivered body, replacing any
    /// configured value.
    fn build_head(self) -> (Response<()>, Bytes) {
        let mut head = Response::new(());
        *head.status_mut() = self.status;
        head.headers_mut().extend(self.headers);
        head.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        (head, self.body)
    }
}
