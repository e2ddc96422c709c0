//! HTTP client creation and configuration.
//!
//! This module provides the pooled hyper client used when interception is
//! off and a request has to reach a real server.

use super::Transport;
use crate::config::TransportConfig;
use crate::error::StackError;
use crate::protocol::InterceptedRequest;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Response;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Type alias for the HTTP client used by the transport.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Transport that sends requests over the network with hyper.
#[derive(Clone)]
pub struct HyperTransport {
    client: HttpClient,
}

impl HyperTransport {
    /// Create a transport with connection pooling.
    ///
    /// If the platform root certificates cannot be loaded the transport still
    /// serves plain HTTP; HTTPS requests will fail certificate verification.
    pub fn new(config: &TransportConfig) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.set_keepalive(Some(Duration::from_secs(config.keepalive_timeout_secs)));
        http_connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        http_connector.enforce_http(false); // Allow both HTTP and HTTPS

        let builder = match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
            Ok(builder) => builder,
            Err(e) => {
                warn!("Failed to load native root certificates, HTTPS disabled: {}", e);
                hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(
                    rustls::ClientConfig::builder()
                        .with_root_certificates(rustls::RootCertStore::empty())
                        .with_no_client_auth(),
                )
            }
        };
        let https_connector = builder
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build(https_connector);

        info!(
            "Passthrough transport configured (HTTP/1.1): max_idle={}, idle_timeout={}s, connect_timeout={}s",
            config.max_idle_per_host, config.idle_timeout_secs, config.connect_timeout_secs
        );

        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: InterceptedRequest) -> Result<Response<Full<Bytes>>, StackError> {
        if request.uri.scheme().is_none() || request.uri.host().is_none() {
            return Err(StackError::Transport(format!(
                "Cannot send request without an absolute URI: {}",
                request.uri
            )));
        }

        debug!("Forwarding to: {} {}", request.method, request.uri);

        let response = self
            .client
            .request(request.into_request())
            .await
            .map_err(|e| {
                error!("Failed to send request: {}", e);
                StackError::Transport(e.to_string())
            })?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| StackError::Transport(format!("Failed to read response body: {e}")))?
            .to_bytes();

        Ok(Response::from_parts(parts, Full::new(body)))
    }
}
