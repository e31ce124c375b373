//! Control routes — on/off switch and brightness.
//!
//! Malformed bodies never fail the request: the handler logs and echoes the
//! current state, which is what a polling switch integration expects.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::state::{AppState, percent};

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveResponse {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct BrightnessRequest {
    value: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrightnessResponse {
    pub value: u8,
}

/// `GET /api/active`
pub async fn get_active(State(state): State<AppState>) -> Json<ActiveResponse> {
    Json(ActiveResponse { active: state.is_active() })
}

/// `POST /api/active`: fade opacity to 1 (on) or 0 (off).
pub async fn set_active(
    State(state): State<AppState>,
    body: Result<Json<ActiveRequest>, JsonRejection>,
) -> Json<ActiveResponse> {
    match body {
        Ok(Json(ActiveRequest { active: Some(active) })) => {
            info!(active, "active state changed");
            state.set_active(active);
        }
        Ok(Json(ActiveRequest { active: None })) => debug!("active request without `active`; ignoring"),
        Err(e) => debug!(error = %e, "malformed active request; ignoring"),
    }
    Json(ActiveResponse { active: state.is_active() })
}

/// `GET /api/brightness`: current animated output level.
pub async fn get_brightness(State(state): State<AppState>) -> Json<BrightnessResponse> {
    Json(BrightnessResponse { value: percent(state.brightness.value()) })
}

/// `POST /api/brightness`: fade to `value` (0–100). Responds with the target.
pub async fn set_brightness(
    State(state): State<AppState>,
    body: Result<Json<BrightnessRequest>, JsonRejection>,
) -> Json<BrightnessResponse> {
    match body {
        Ok(Json(BrightnessRequest { value: Some(value) })) => {
            info!(value, "brightness target changed");
            state.set_brightness(value);
        }
        Ok(Json(BrightnessRequest { value: None })) => debug!("brightness request without `value`; ignoring"),
        Err(e) => debug!(error = %e, "malformed brightness request; ignoring"),
    }
    Json(BrightnessResponse { value: percent(state.brightness.target()) })
}

#[cfg(test)]
#[path = "control_test.rs"]
mod tests;
