//! Device session — login/verify handshake, token lifecycle, authorized calls.
//!
//! ARCHITECTURE
//! ============
//! The device issues a short-lived token after a challenge/response exchange:
//! `login` returns the token plus a server-computed challenge-response, and
//! `verify` echoes that response back with the token attached. Every other
//! endpoint requires the token in `X-Auth-Token` and answers 401 once it
//! expires.
//!
//! CONCURRENCY
//! ===========
//! Re-authentication runs under `login_lock`. `auth_epoch` counts completed
//! login attempts; a caller remembers the epoch it saw before its request
//! failed, and if the epoch has moved by the time it owns the lock, another
//! caller already re-authenticated and the fresh token is reused. A burst of
//! 401s (e.g. after a device reboot) therefore costs one login exchange.
//!
//! The token is written only under the login lock; everyone else reads it.

use std::fmt::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use rand::Rng;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::transport::HttpTransport;
use super::types::{CODE_OK, DeviceError, DeviceInfo, DeviceRequest, DeviceResponse, LedMode, Method};

/// Random bytes in each login challenge.
const CHALLENGE_LEN: usize = 256;

/// Current token string and its decoded bytes (used in UDP headers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub bytes: Vec<u8>,
}

impl AuthToken {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    authentication_token: String,
    #[serde(rename = "challenge-response")]
    challenge_response: String,
}

#[derive(Deserialize)]
struct ModeResponse {
    mode: LedMode,
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Fresh random login challenge, hex-encoded.
#[must_use]
pub(crate) fn generate_challenge() -> String {
    let mut bytes = [0u8; CHALLENGE_LEN];
    rand::rng().fill(&mut bytes[..]);
    bytes_to_hex(&bytes)
}

/// Map a raw response to its JSON body, or the error it represents.
///
/// Vendor error codes are logged here so every endpoint reports them the same way.
fn check_response(response: DeviceResponse, endpoint: &str) -> Result<serde_json::Value, DeviceError> {
    if response.is_unauthorized() {
        return Err(DeviceError::Unauthorized);
    }
    if !(200..300).contains(&response.status) {
        warn!(endpoint, status = response.status, body = %response.body, "device returned error status");
        return Err(DeviceError::Status { status: response.status, body: response.body.to_string() });
    }
    if let Some(code) = response.code()
        && code != CODE_OK
    {
        warn!(endpoint, code, "device returned error code");
        return Err(DeviceError::Protocol { code });
    }
    Ok(response.body)
}

// =============================================================================
// SESSION
// =============================================================================

/// Authenticated session with one device.
pub struct Session {
    transport: Arc<dyn HttpTransport>,
    auth: RwLock<AuthToken>,
    auth_epoch: AtomicU64,
    login_lock: Mutex<()>,
    info: RwLock<Option<DeviceInfo>>,
}

impl Session {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            auth: RwLock::new(AuthToken::default()),
            auth_epoch: AtomicU64::new(0),
            login_lock: Mutex::new(()),
            info: RwLock::new(None),
        }
    }

    /// Snapshot of the current token.
    pub async fn token(&self) -> AuthToken {
        self.auth.read().await.clone()
    }

    /// Device metadata from the last successful `get_device_info`.
    pub async fn device_info(&self) -> Option<DeviceInfo> {
        *self.info.read().await
    }

    // =========================================================================
    // AUTHENTICATION
    // =========================================================================

    /// Run a full login + verify exchange, replacing the token on success.
    ///
    /// # Errors
    ///
    /// Returns the transport or protocol error that aborted the exchange. The
    /// previous token is kept in that case.
    pub async fn login_and_verify(&self) -> Result<(), DeviceError> {
        let _guard = self.login_lock.lock().await;
        self.login_exchange().await
    }

    /// Re-authenticate unless someone else did since `observed_epoch`.
    async fn reauthenticate(&self, observed_epoch: u64) {
        let _guard = self.login_lock.lock().await;
        if self.auth_epoch.load(Ordering::Acquire) != observed_epoch {
            debug!("re-authentication already completed; reusing token");
            return;
        }
        // Failure is logged in login_exchange; the retry will surface it.
        let _ = self.login_exchange().await;
    }

    /// Caller must hold `login_lock`.
    async fn login_exchange(&self) -> Result<(), DeviceError> {
        let result = self.try_login_exchange().await;
        self.auth_epoch.fetch_add(1, Ordering::AcqRel);
        match &result {
            Ok(()) => info!("device session authenticated"),
            Err(e) => warn!(error = %e, "device login failed"),
        }
        result
    }

    async fn try_login_exchange(&self) -> Result<(), DeviceError> {
        let challenge = generate_challenge();
        let response = self
            .transport
            .send(DeviceRequest::post("login", serde_json::json!({ "challenge": challenge })))
            .await?;
        let body = check_response(response, "login")?;
        let login: LoginResponse = serde_json::from_value(body).map_err(|e| DeviceError::Decode(e.to_string()))?;
        let bytes = BASE64_STANDARD
            .decode(login.authentication_token.as_bytes())
            .map_err(|e| DeviceError::Decode(format!("authentication_token: {e}")))?;

        let verify = DeviceRequest::post(
            "verify",
            serde_json::json!({ "challenge-response": login.challenge_response }),
        )
        .with_token(login.authentication_token.clone());
        let response = self.transport.send(verify).await?;
        check_response(response, "verify")?;

        *self.auth.write().await = AuthToken { token: login.authentication_token, bytes };
        Ok(())
    }

    // =========================================================================
    // AUTHORIZED REQUESTS
    // =========================================================================

    /// Call a token-protected endpoint, re-authenticating once on 401.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unauthorized`] if the retry is also rejected, or
    /// the transport/protocol error of the final attempt.
    pub async fn authorized_request(
        &self,
        path: &str,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, DeviceError> {
        let mut retried = false;
        loop {
            // Epoch before token: a login landing in between only costs a reuse.
            let epoch = self.auth_epoch.load(Ordering::Acquire);
            let token = self.auth.read().await.token.clone();
            let request = DeviceRequest { method, path: path.to_owned(), token: Some(token), body: body.clone() };

            let response = self.transport.send(request).await?;
            if !response.is_unauthorized() {
                return check_response(response, path);
            }
            if retried {
                warn!(path, "device still unauthorized after re-authentication");
                return Err(DeviceError::Unauthorized);
            }
            retried = true;
            debug!(path, "device token rejected; re-authenticating");
            self.reauthenticate(epoch).await;
        }
    }

    // =========================================================================
    // CONTROL API
    // =========================================================================

    /// Read and store `number_of_led`, `bytes_per_led` and `frame_rate`.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the request fails or fields are missing.
    pub async fn get_device_info(&self) -> Result<DeviceInfo, DeviceError> {
        let body = self.authorized_request("gestalt", Method::Get, None).await?;
        let info: DeviceInfo = serde_json::from_value(body).map_err(|e| DeviceError::Decode(e.to_string()))?;
        *self.info.write().await = Some(info);
        Ok(info)
    }

    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the request fails or the mode is unknown.
    pub async fn get_mode(&self) -> Result<LedMode, DeviceError> {
        let body = self.authorized_request("led/mode", Method::Get, None).await?;
        let parsed: ModeResponse = serde_json::from_value(body).map_err(|e| DeviceError::Decode(e.to_string()))?;
        Ok(parsed.mode)
    }

    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the request fails.
    pub async fn set_mode(&self, mode: LedMode) -> Result<(), DeviceError> {
        self.authorized_request("led/mode", Method::Post, Some(serde_json::json!({ "mode": mode.as_str() })))
            .await?;
        Ok(())
    }

    /// Set output brightness as an integer percentage (clamped to 0–100).
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] if the request fails.
    pub async fn set_brightness(&self, percent: u8) -> Result<(), DeviceError> {
        let body = serde_json::json!({ "mode": "enabled", "type": "A", "value": percent.min(100) });
        self.authorized_request("led/out/brightness", Method::Post, Some(body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
