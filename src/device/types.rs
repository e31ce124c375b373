//! Device API types — requests, responses, metadata and errors.

use serde::{Deserialize, Serialize};

/// Vendor status code meaning success, embedded in every JSON response body.
pub const CODE_OK: i64 = 1000;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while talking to the device control API.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("device request failed: {0}")]
    Transport(String),

    /// The device answered 401 and the single re-authentication retry did not help.
    #[error("device rejected authentication token")]
    Unauthorized,

    /// The device returned a non-success HTTP status.
    #[error("device response error: status {status}")]
    Status { status: u16, body: String },

    /// The response body carried a vendor error code.
    #[error("device returned error code {code}")]
    Protocol { code: i64 },

    /// A response field was missing or could not be decoded.
    #[error("device response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One call against the device control API. `path` is relative to the API root.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRequest {
    pub method: Method,
    pub path: String,
    pub token: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl DeviceRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::Get, path: path.into(), token: None, body: None }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self { method: Method::Post, path: path.into(), token: None, body: Some(body) }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Raw HTTP status plus parsed JSON body (`Value::Null` when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl DeviceResponse {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Vendor code from the body, if present.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        self.body.get("code").and_then(serde_json::Value::as_i64)
    }
}

// =============================================================================
// DEVICE METADATA
// =============================================================================

const DEFAULT_FRAME_RATE: f64 = 25.0;
const MIN_FRAME_RATE: f64 = 1.0;
const MAX_FRAME_RATE: f64 = 1000.0;

/// Subset of the `gestalt` response the streaming engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "number_of_led")]
    pub number_of_leds: usize,
    pub bytes_per_led: usize,
    /// Missing on some firmware; decodes as 0 and falls back to the default rate.
    #[serde(default)]
    pub frame_rate: f64,
}

impl DeviceInfo {
    /// Interval between realtime frames.
    ///
    /// Falls back to 25 fps for a missing or non-positive rate and clamps
    /// anything else to 1..=1000 fps, so the period is never zero.
    #[must_use]
    pub fn frame_interval(&self) -> std::time::Duration {
        let fps = if self.frame_rate.is_finite() && self.frame_rate > 0.0 {
            self.frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE)
        } else {
            DEFAULT_FRAME_RATE
        };
        std::time::Duration::from_secs_f64(1.0 / fps)
    }
}

/// Device operating mode as reported by `led/mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedMode {
    Off,
    Color,
    Demo,
    Effect,
    Movie,
    Playlist,
    /// Realtime: frames pushed over UDP.
    Rt,
}

impl LedMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Color => "color",
            Self::Demo => "demo",
            Self::Effect => "effect",
            Self::Movie => "movie",
            Self::Playlist => "playlist",
            Self::Rt => "rt",
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
