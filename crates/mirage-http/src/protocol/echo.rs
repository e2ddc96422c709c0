//! Echo-mode body synthesis.
//!
//! Form-encoded bodies are decoded and echoed back as a JSON object so tests
//! can read the submitted parameters. Any other body is echoed verbatim.

use super::InterceptedRequest;
use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{Map, Value};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Body and content type derived from a request in echo mode.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoBody {
    pub body: Bytes,
    pub content_type: Option<HeaderValue>,
}

/// Build the echoed body for `request`, or `None` when it has no body.
pub fn echo_body(request: &InterceptedRequest) -> Option<EchoBody> {
    if request.body.is_empty() {
        return None;
    }

    let is_form = request
        .content_type()
        .map(|ct| ct.to_ascii_lowercase().starts_with(FORM_URLENCODED))
        .unwrap_or(false);

    if is_form {
        let mut object = Map::new();
        for (key, value) in decode_form(&request.body) {
            object.insert(key, Value::String(value));
        }
        return Some(EchoBody {
            body: Bytes::from(Value::Object(object).to_string()),
            content_type: Some(HeaderValue::from_static("application/json")),
        });
    }

    Some(EchoBody {
        body: request.body.clone(),
        content_type: request.headers.get(CONTENT_TYPE).cloned(),
    })
}

/// Decode an `application/x-www-form-urlencoded` body into ordered pairs.
///
/// `+` decodes to a space. Pairs without `=` decode to an empty value.
pub fn decode_form(body: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(body);
    text.split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

/// Bytes that are not valid UTF-8 after decoding become U+FFFD.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}
