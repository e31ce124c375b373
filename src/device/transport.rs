//! HTTP transport for the device control API.
//!
//! The session layer talks to the device through `HttpTransport` so tests can
//! substitute a scripted device. `ReqwestTransport` is the production client.

use std::time::Duration;

use super::types::{DeviceError, DeviceRequest, DeviceResponse, Method};

const API_PREFIX: &str = "xled/v1";
const CONNECT_TIMEOUT_SECS: u64 = 3;
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// One request/response exchange with the device.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the raw status and JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Transport`] when the request cannot be completed.
    /// Non-2xx statuses are returned as responses, not errors.
    async fn send(&self, request: DeviceRequest) -> Result<DeviceResponse, DeviceError>;
}

// =============================================================================
// REQWEST CLIENT
// =============================================================================

pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a client for the device at `host` (IP or hostname, optional port).
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::HttpClientBuild`] if the TLS/HTTP stack fails to initialize.
    pub fn new(host: &str, timeout: Duration) -> Result<Self, DeviceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| DeviceError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: api_base_url(host) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

pub(crate) fn api_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}/{API_PREFIX}")
    } else {
        format!("http://{host}/{API_PREFIX}")
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
        };
        if let Some(token) = &request.token {
            builder = builder.header(AUTH_HEADER, token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DeviceError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| DeviceError::Transport(e.to_string()))?;

        Ok(DeviceResponse { status, body: parse_body(&text) })
    }
}

/// Parse a response body as JSON. Empty or non-JSON bodies become a string
/// value (or null) so error statuses still carry their text for logging.
fn parse_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_owned()))
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
