//! Interception configuration.
//!
//! [`InterceptionConfig`] is the state a [`crate::TestServer`] synthesizes
//! responses from. It can be built in code through the controller's setters
//! or loaded from a YAML/JSON fixture file:
//!
//! ```yaml
//! enabled: true
//! echoPostParameters: false
//! expectedStatus: 200
//! expectedResponseData: '{"ok":true}'
//! expectedResponseHeaders:
//!   Content-Type: application/json
//! match:
//!   method: GET
//!   path:
//!     prefix: /api
//! ```

mod serde_http;
mod transport;

use std::path::Path;

use bytes::Bytes;
use hyper::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::matcher::{CompiledRequestMatcher, RequestMatcher};

pub use transport::TransportConfig;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterceptionConfig {
    /// Whether the test handler claims requests at all
    #[serde(default)]
    pub enabled: bool,

    /// Derive the response body from the request body
    #[serde(default, alias = "echoRequestBody")]
    pub echo_post_parameters: bool,

    #[serde(default = "default_status", with = "serde_http::status")]
    pub expected_status: StatusCode,

    #[serde(default, with = "serde_http::body")]
    pub expected_response_data: Bytes,

    #[serde(default, with = "serde_http::headers")]
    pub expected_response_headers: HeaderMap,

    /// Extra conditions a request must meet to be claimed
    #[serde(default, rename = "match", skip_serializing_if = "RequestMatcher::is_any")]
    pub matcher: RequestMatcher,
}

fn default_status() -> StatusCode {
    StatusCode::OK
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            echo_post_parameters: false,
            expected_status: default_status(),
            expected_response_data: Bytes::new(),
            expected_response_headers: HeaderMap::new(),
            matcher: RequestMatcher::default(),
        }
    }
}

impl InterceptionConfig {
    /// Load a fixture file. `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config: InterceptionConfig = if is_json {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(method) = &self.matcher.method {
            if Method::from_bytes(method.as_bytes()).is_err() {
                anyhow::bail!("Invalid HTTP method in match rule: '{}'", method);
            }
        }

        CompiledRequestMatcher::compile(&self.matcher)
            .map_err(|e| anyhow::anyhow!("Invalid path regex in match rule: {}", e))?;

        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, anyhow::Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::PathMatcher;
    use std::io::Write;

    #[test]
    fn test_default_is_disabled_empty_ok() {
        let config = InterceptionConfig::default();
        assert!(!config.enabled);
        assert!(!config.echo_post_parameters);
        assert_eq!(config.expected_status, StatusCode::OK);
        assert!(config.expected_response_data.is_empty());
        assert!(config.expected_response_headers.is_empty());
        assert!(config.matcher.is_any());
    }

    #[test]
    fn test_parse_yaml_fixture() {
        let yaml = r#"
enabled: true
expectedStatus: 201
expectedResponseData: '{"ok":true}'
expectedResponseHeaders:
  Content-Type: application/json
  Set-Cookie: [a=1, b=2]
match:
  method: POST
  path:
    exact: /items
"#;
        let config: InterceptionConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.expected_status, StatusCode::CREATED);
        assert_eq!(config.expected_response_data, Bytes::from(r#"{"ok":true}"#));
        assert_eq!(
            config.expected_response_headers.get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(
            config
                .expected_response_headers
                .get_all("set-cookie")
                .iter()
                .count(),
            2
        );
        assert_eq!(
            config.matcher.path,
            Some(PathMatcher::Exact {
                exact: "/items".to_string()
            })
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_echo_request_body_alias() {
        let config: InterceptionConfig =
            serde_json::from_str(r#"{"echoRequestBody": true}"#).unwrap();
        assert!(config.echo_post_parameters);
    }

    #[test]
    fn test_invalid_status_rejected() {
        let result: Result<InterceptionConfig, _> = serde_yaml::from_str("expectedStatus: 42");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let result: Result<InterceptionConfig, _> =
            serde_yaml::from_str("expectedResponseHeaders:\n  'bad name': x\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_regex() {
        let config = InterceptionConfig {
            matcher: RequestMatcher::any().path_regex("(["),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid path regex"));
    }

    #[test]
    fn test_validate_rejects_bad_method() {
        let config = InterceptionConfig {
            matcher: RequestMatcher::any().method("GE T"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc".parse().unwrap());
        let config = InterceptionConfig {
            enabled: true,
            echo_post_parameters: true,
            expected_status: StatusCode::ACCEPTED,
            expected_response_data: Bytes::from_static(b"done"),
            expected_response_headers: headers,
            matcher: RequestMatcher::any().host("*.example.com"),
        };

        let yaml = config.to_yaml().unwrap();
        let parsed: InterceptionConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_file_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("fixture.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"{{"enabled": true, "expectedResponseData": "hi"}}"#).unwrap();
        let config = InterceptionConfig::from_file(&json_path).unwrap();
        assert!(config.enabled);
        assert_eq!(config.expected_response_data, Bytes::from_static(b"hi"));

        let yaml_path = dir.path().join("fixture.yaml");
        std::fs::write(&yaml_path, "match:\n  path:\n    regex: '(['\n").unwrap();
        assert!(InterceptionConfig::from_file(&yaml_path).is_err());
    }
}
