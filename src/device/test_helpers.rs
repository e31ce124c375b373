//! Scripted in-memory device used by session, client and driver tests.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use super::transport::HttpTransport;
use super::types::{DeviceError, DeviceInfo, DeviceRequest, DeviceResponse, LedMode, Method};

#[derive(Default)]
struct MockState {
    logins: usize,
    verifies: usize,
    issued: Option<String>,
    valid: Option<String>,
    requests: Vec<DeviceRequest>,
    mode: Option<LedMode>,
    brightness: Vec<u64>,
}

/// Fake device: issues `token-N` (base64) on the N-th login, accepts it after
/// verify, and answers 401 to anything carrying another token.
pub struct MockDevice {
    state: Mutex<MockState>,
    pub info: DeviceInfo,
    pub login_delay: Duration,
    pub request_delay: Duration,
    pub login_error_code: Option<i64>,
    pub always_unauthorized: bool,
}

impl MockDevice {
    #[must_use]
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            info,
            login_delay: Duration::ZERO,
            request_delay: Duration::ZERO,
            login_error_code: None,
            always_unauthorized: false,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn logins(&self) -> usize {
        self.state().logins
    }

    pub fn verifies(&self) -> usize {
        self.state().verifies
    }

    pub fn requests(&self) -> Vec<DeviceRequest> {
        self.state().requests.clone()
    }

    pub fn mode(&self) -> Option<LedMode> {
        self.state().mode
    }

    /// Put the device in `mode` as if set from the vendor app.
    pub fn preset_mode(&self, mode: LedMode) {
        self.state().mode = Some(mode);
    }

    pub fn brightness_calls(&self) -> Vec<u64> {
        self.state().brightness.clone()
    }

    /// Expire the current token, as the device does after its session timeout.
    pub fn expire_token(&self) {
        self.state().valid = None;
    }

    pub fn encoded_token(n: usize) -> String {
        BASE64_STANDARD.encode(format!("token-{n}"))
    }

    fn reply(status: u16, body: serde_json::Value) -> Result<DeviceResponse, DeviceError> {
        Ok(DeviceResponse { status, body })
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockDevice {
    async fn send(&self, request: DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        self.state().requests.push(request.clone());

        match request.path.as_str() {
            "login" => {
                let n = {
                    let mut state = self.state();
                    state.logins += 1;
                    state.logins
                };
                if !self.login_delay.is_zero() {
                    tokio::time::sleep(self.login_delay).await;
                }
                if let Some(code) = self.login_error_code {
                    return Self::reply(200, serde_json::json!({ "code": code }));
                }
                let token = Self::encoded_token(n);
                self.state().issued = Some(token.clone());
                Self::reply(
                    200,
                    serde_json::json!({
                        "authentication_token": token,
                        "authentication_token_expires_in": 14400,
                        "challenge-response": format!("response-{n}"),
                        "code": 1000
                    }),
                )
            }
            "verify" => {
                let mut state = self.state();
                state.verifies += 1;
                if request.token.is_some() && request.token == state.issued {
                    state.valid = state.issued.clone();
                    Self::reply(200, serde_json::json!({ "code": 1000 }))
                } else {
                    Self::reply(401, serde_json::Value::Null)
                }
            }
            path => {
                if !self.request_delay.is_zero() {
                    tokio::time::sleep(self.request_delay).await;
                }
                let mut state = self.state();
                if self.always_unauthorized || request.token.is_none() || request.token != state.valid {
                    return Self::reply(401, serde_json::Value::Null);
                }
                match (path, request.method) {
                    ("gestalt", Method::Get) => Self::reply(
                        200,
                        serde_json::json!({
                            "number_of_led": self.info.number_of_leds,
                            "bytes_per_led": self.info.bytes_per_led,
                            "frame_rate": self.info.frame_rate,
                            "code": 1000
                        }),
                    ),
                    ("led/mode", Method::Get) => {
                        let mode = state.mode.unwrap_or(LedMode::Movie);
                        Self::reply(200, serde_json::json!({ "mode": mode, "code": 1000 }))
                    }
                    ("led/mode", Method::Post) => {
                        let mode = request
                            .body
                            .as_ref()
                            .and_then(|b| b.get("mode").cloned())
                            .and_then(|m| serde_json::from_value(m).ok());
                        state.mode = mode;
                        Self::reply(200, serde_json::json!({ "code": 1000 }))
                    }
                    ("led/out/brightness", Method::Post) => {
                        let value = request
                            .body
                            .as_ref()
                            .and_then(|b| b.get("value"))
                            .and_then(serde_json::Value::as_u64)
                            .unwrap_or_default();
                        state.brightness.push(value);
                        Self::reply(200, serde_json::json!({ "code": 1000 }))
                    }
                    _ => Self::reply(404, serde_json::json!("not found")),
                }
            }
        }
    }
}
